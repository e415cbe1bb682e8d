//! jobup.ch URL building.

use crate::domain::{DomainError, SearchQuery};
use url::Url;

pub const DEFAULT_SEARCH_URL: &str = "https://www.jobup.ch/fr/emplois/";
pub const DEFAULT_SITE_URL: &str = "https://www.jobup.ch";

/// Search URL for `query`. No filters and no page yields the bare base URL.
pub fn search_url(base: &str, query: &SearchQuery, page: Option<u32>) -> Result<Url, DomainError> {
    let mut url =
        Url::parse(base).map_err(|e| DomainError::Config(format!("bad search URL {}: {}", base, e)))?;

    let mut pairs: Vec<(&str, String)> = Vec::new();
    if let Some(page) = page {
        pairs.push(("page", page.to_string()));
    }
    if let Some(term) = query.term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        pairs.push(("term", term.to_string()));
    }
    if let Some(min) = query.employment_grade_min {
        pairs.push(("employment-grade-min", min.to_string()));
    }
    if let Some(max) = query.employment_grade_max {
        pairs.push(("employment-grade-max", max.to_string()));
    }
    if let Some(days) = query.publication_date {
        pairs.push(("publication-date", days.to_string()));
    }
    pairs.extend(query.categories.iter().map(|c| ("category", c.to_string())));
    if let Some(benefit) = query.benefit {
        pairs.push(("benefit", benefit.to_string()));
    }
    pairs.extend(query.regions.iter().map(|r| ("region", r.to_string())));

    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(url)
}

/// Application form of a posting.
pub fn application_url(site: &str, external_id: &str) -> String {
    format!(
        "{}/fr/application/create/{}/",
        site.trim_end_matches('/'),
        external_id
    )
}

/// External id from a posting link: `jobid=<id>` parameter or a `/detail/<id>` segment.
pub fn external_id_from_link(link: &str) -> Option<String> {
    if let Some(pos) = link.find("jobid=") {
        let id: String = link[pos + "jobid=".len()..]
            .chars()
            .take_while(|c| *c != '&' && *c != '#')
            .collect();
        if !id.is_empty() {
            return Some(id);
        }
    }
    let mut segments = link.split(['/', '?', '#']);
    while let Some(segment) = segments.next() {
        if segment == "detail" {
            return segments.next().filter(|s| !s.is_empty()).map(str::to_string);
        }
    }
    None
}

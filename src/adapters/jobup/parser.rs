//! jobup.ch search result parsing. Maps result cards into `JobPosting`s.
//!
//! Cards are located by their `data-cy` attributes; the DOM is walked directly instead of
//! going through a selector engine.

use crate::adapters::jobup::urls::external_id_from_link;
use crate::domain::{DomainError, JobPosting, Platform, SearchPage};
use tl::{HTMLTag, Node, Parser};
use tracing::debug;
use url::Url;

const CARD_MARKERS: [&str; 2] = ["vacancy-serp-item", "vacancy-serp-item-active"];
const PAGINATION_CLASSES: [&str; 3] = ["d_flex", "ai_center", "gap_s4"];

/// Parse one search result page fetched from `page_url`.
pub fn parse_search_page(html: &str, page_url: &Url) -> Result<SearchPage, DomainError> {
    let dom = tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| DomainError::Parse(format!("jobup HTML: {}", e)))?;
    let parser = dom.parser();

    let mut postings = Vec::new();
    let mut total_pages = 1;
    for tag in dom.nodes().iter().filter_map(Node::as_tag) {
        if attr(tag, "data-cy").is_some_and(|cy| CARD_MARKERS.contains(&cy.as_str())) {
            match parse_card(tag, parser, page_url) {
                Some(posting) => postings.push(posting),
                None => debug!("skipping result card without external id or description"),
            }
        } else if is_pagination(tag) {
            total_pages = total_pages.max(pagination_max(tag, parser));
        }
    }

    Ok(SearchPage {
        postings,
        total_pages,
    })
}

fn parse_card(card: &HTMLTag, parser: &Parser, page_url: &Url) -> Option<JobPosting> {
    let link = card
        .children()
        .all(parser)
        .iter()
        .filter_map(Node::as_tag)
        .filter(|t| t.name().as_utf8_str() == "a")
        .filter_map(|t| attr(t, "href"))
        .map(|href| decode_entities(&href))
        .find(|href| external_id_from_link(href).is_some())?;
    let external_id = external_id_from_link(&link)?;
    let url = page_url
        .join(&link)
        .map(String::from)
        .unwrap_or_else(|_| link.clone());

    let description = text_by_cy(card, parser, "vacancy-description")
        .or_else(|| Some(clean_text(&card.inner_text(parser))).filter(|t| !t.is_empty()))?;

    let mut posting = JobPosting::new(Platform::JobUp, external_id, description, url);
    posting.title = text_by_cy(card, parser, "vacancy-title");
    posting.company = text_by_cy(card, parser, "vacancy-logo");
    posting.posted_date = text_by_cy(card, parser, "info-publication");
    posting.activity_rate = text_by_cy(card, parser, "info-workload");
    posting.contract_type = text_by_cy(card, parser, "info-contract");
    posting.work_location = text_by_cy(card, parser, "info-location-link").map(strip_location_prefix);
    posting.company_info = nested_texts(card, parser, "vacancy-lead", "p").into_iter().next();
    posting.company_contact = text_by_cy(card, parser, "vacancy-contact");
    posting.company_url = find_by_cy(card, parser, "company-url")
        .and_then(|t| attr(t, "href"))
        .map(|href| decode_entities(&href));
    posting.categories = nested_texts(card, parser, "vacancy-meta", "a");
    posting.quick_apply = find_by_cy(card, parser, "quick-apply").is_some();
    Some(posting)
}

fn attr(tag: &HTMLTag, name: &str) -> Option<String> {
    tag.attributes()
        .get(name)
        .flatten()
        .map(|v| v.as_utf8_str().into_owned())
}

fn find_by_cy<'p, 'b>(
    root: &'p HTMLTag<'b>,
    parser: &'p Parser<'b>,
    cy: &str,
) -> Option<&'p HTMLTag<'b>> {
    root.children()
        .all(parser)
        .iter()
        .filter_map(Node::as_tag)
        .find(|t| attr(t, "data-cy").as_deref() == Some(cy))
}

fn text_by_cy(root: &HTMLTag, parser: &Parser, cy: &str) -> Option<String> {
    find_by_cy(root, parser, cy)
        .map(|t| clean_text(&t.inner_text(parser)))
        .filter(|t| !t.is_empty())
}

/// Non-empty texts of `tag_name` elements inside the `cy` element.
fn nested_texts(root: &HTMLTag, parser: &Parser, cy: &str, tag_name: &str) -> Vec<String> {
    let Some(container) = find_by_cy(root, parser, cy) else {
        return Vec::new();
    };
    container
        .children()
        .all(parser)
        .iter()
        .filter_map(Node::as_tag)
        .filter(|t| t.name().as_utf8_str() == tag_name)
        .map(|t| clean_text(&t.inner_text(parser)))
        .filter(|t| !t.is_empty())
        .collect()
}

fn is_pagination(tag: &HTMLTag) -> bool {
    attr(tag, "class").is_some_and(|class| {
        let classes: Vec<&str> = class.split_whitespace().collect();
        PAGINATION_CLASSES.iter().all(|c| classes.contains(c))
    })
}

/// Largest page number among the text nodes of the pagination block.
fn pagination_max(tag: &HTMLTag, parser: &Parser) -> u32 {
    tag.children()
        .all(parser)
        .iter()
        .filter_map(Node::as_raw)
        .map(|text| max_number(&text.as_utf8_str()))
        .max()
        .unwrap_or(1)
}

fn max_number(text: &str) -> u32 {
    text.split(|c: char| !c.is_ascii_digit())
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(1)
        .max(1)
}

/// "Location: Lausanne" -> "Lausanne"
fn strip_location_prefix(text: String) -> String {
    if text.contains("Location") || text.contains("Place") {
        text.rsplit(':').next().unwrap_or(&text).trim().to_string()
    } else {
        text
    }
}

fn decode_entities(s: &str) -> String {
    html_escape::decode_html_entities(s).into_owned()
}

/// Decodes entities and collapses whitespace runs.
fn clean_text(raw: &str) -> String {
    decode_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

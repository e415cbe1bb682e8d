//! CSV export of stored postings. Uses the `csv` crate for quoting.

use crate::domain::{DomainError, JobRecord};
use std::path::Path;

const HEADER: [&str; 11] = [
    "id",
    "platform",
    "external_id",
    "title",
    "company",
    "location",
    "contract",
    "workload",
    "posted",
    "quick_apply",
    "url",
];

/// Serialize postings to CSV (comma-delimited, header row).
pub fn postings_to_csv(records: &[JobRecord]) -> Result<String, DomainError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    wtr.write_record(HEADER)
        .map_err(|e| DomainError::Repo(e.to_string()))?;

    for record in records {
        let p = &record.posting;
        // Newlines inside cells confuse spreadsheet imports.
        let clean = |v: &Option<String>| v.as_deref().unwrap_or("").replace(['\n', '\r'], " ");
        wtr.write_record([
            record.id.to_string(),
            p.platform.to_string(),
            p.external_id.clone(),
            clean(&p.title),
            clean(&p.company),
            clean(&p.work_location),
            clean(&p.contract_type),
            clean(&p.activity_rate),
            clean(&p.posted_date),
            p.quick_apply.to_string(),
            p.url.clone(),
        ])
        .map_err(|e| DomainError::Repo(e.to_string()))?;
    }

    wtr.flush().map_err(|e| DomainError::Repo(e.to_string()))?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| DomainError::Repo(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DomainError::Repo(e.to_string()))
}

/// Write postings to `path`. Returns the number of rows written.
pub async fn export_postings(path: &Path, records: &[JobRecord]) -> Result<usize, DomainError> {
    let content = postings_to_csv(records)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| DomainError::Repo(format!("write {}: {}", path.display(), e)))?;
    Ok(records.len())
}

//! Application record and its lifecycle.
//!
//! Created either by an automated submission (`Submitted`) or by manual review approval
//! (`Approved`). `Approved` may move to `Submitted`; a submitted application never changes.

use super::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Approved,
    Submitted,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Submitted => "submitted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approved" => Some(Self::Approved),
            "submitted" => Some(Self::Submitted),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApplication {
    pub user_id: i64,
    pub job_id: i64,
    pub cover_letter: String,
    pub pdf_path: Option<PathBuf>,
    pub status: ApplicationStatus,
}

/// Stored application. Unique per (user, posting).
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub id: i64,
    pub user_id: i64,
    pub job_id: i64,
    pub cover_letter: String,
    pub pdf_path: Option<PathBuf>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

impl Application {
    pub fn is_submitted(&self) -> bool {
        self.status == ApplicationStatus::Submitted
    }

    /// Fails with `ApplicationImmutable` once submitted.
    pub fn ensure_mutable(&self) -> Result<(), DomainError> {
        if self.is_submitted() {
            return Err(DomainError::ApplicationImmutable { id: self.id });
        }
        Ok(())
    }

    /// Only `Approved -> Submitted` is allowed.
    pub fn transition(&mut self, to: ApplicationStatus) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        match (self.status, to) {
            (ApplicationStatus::Approved, ApplicationStatus::Submitted) => {
                self.status = to;
                Ok(())
            }
            (from, to) => Err(DomainError::Validation(format!(
                "application {}: cannot move from {} to {}",
                self.id, from, to
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approved() -> Application {
        Application {
            id: 7,
            user_id: 1,
            job_id: 2,
            cover_letter: "text".into(),
            pdf_path: None,
            status: ApplicationStatus::Approved,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn approved_moves_to_submitted_once() {
        let mut app = approved();
        app.transition(ApplicationStatus::Submitted).unwrap();
        assert!(app.is_submitted());

        let err = app.transition(ApplicationStatus::Submitted).unwrap_err();
        assert!(matches!(err, DomainError::ApplicationImmutable { id: 7 }));
    }

    #[test]
    fn approved_cannot_be_reapproved() {
        let mut app = approved();
        assert!(matches!(
            app.transition(ApplicationStatus::Approved),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in [ApplicationStatus::Approved, ApplicationStatus::Submitted] {
            assert_eq!(ApplicationStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(ApplicationStatus::parse("pending"), None);
    }
}

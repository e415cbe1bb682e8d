//! SQLite-backed store via libsql. Implements the job, profile, letter and application ports.
//!
//! One database file (`jobfinder.db`) in the data directory. Uniqueness rules live in the schema:
//! postings per (platform, external_id), letters and applications per (user, posting),
//! form answers per (user, site).

use crate::domain::{
    Application, ApplicationStatus, CoverLetter, CoverLetterDraft, Document, DocumentKind,
    DomainError, FormProfile, JobPosting, JobRecord, NewApplication, NewProfile, Platform,
    Preferences, UserProfile,
};
use crate::ports::{ApplicationRepo, JobRepo, LetterRepo, ProfileRepo};
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, Row, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    contact_info TEXT,
    cv_text TEXT,
    cv_document_id INTEGER,
    reference_letter TEXT,
    preferences_json TEXT NOT NULL DEFAULT '{}'
)"#;

const DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    content BLOB NOT NULL
)"#;

const JOB_OFFERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS job_offers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    platform TEXT NOT NULL,
    external_id TEXT NOT NULL,
    title TEXT,
    company TEXT,
    description TEXT NOT NULL,
    url TEXT NOT NULL,
    discovered_at TEXT NOT NULL,
    posted_date TEXT,
    work_location TEXT,
    contract_type TEXT,
    activity_rate TEXT,
    company_info TEXT,
    company_contact TEXT,
    company_url TEXT,
    categories_json TEXT NOT NULL DEFAULT '[]',
    quick_apply INTEGER NOT NULL DEFAULT 0,
    UNIQUE (platform, external_id)
)"#;

const COVER_LETTERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cover_letters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    job_id INTEGER NOT NULL,
    draft_json TEXT NOT NULL,
    recipient_info TEXT,
    pdf BLOB,
    UNIQUE (user_id, job_id)
)"#;

const APPLICATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS applications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    job_id INTEGER NOT NULL,
    cover_letter TEXT NOT NULL,
    pdf_path TEXT,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (user_id, job_id)
)"#;

const APPLY_FORMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS apply_forms (
    user_id INTEGER NOT NULL,
    site TEXT NOT NULL,
    form_json TEXT NOT NULL,
    PRIMARY KEY (user_id, site)
)"#;

const JOB_OFFERS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_job_offers_quick_apply ON job_offers (quick_apply, id DESC)";

const POSTING_COLUMNS: &str = "id, platform, external_id, title, company, description, url, \
    discovered_at, posted_date, work_location, contract_type, activity_rate, company_info, \
    company_contact, company_url, categories_json, quick_apply";

const USER_COLUMNS: &str = "id, first_name, last_name, email, username, contact_info, cv_text, \
    cv_document_id, reference_letter, preferences_json";

const APPLICATION_COLUMNS: &str =
    "id, user_id, job_id, cover_letter, pdf_path, status, created_at";

fn repo_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Repo(e.to_string())
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::Repo(format!("bad timestamp {:?}: {}", s, e)))
}

/// SQLite store. Safe to share via Arc; every call opens its own connection.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) the database under `base_dir` and ensure the schema exists.
    /// Sets WAL mode and synchronous=NORMAL.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Repo(e.to_string()))?;
        let db_path = base.join("jobfinder.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let conn = db.connect().map_err(|e| DomainError::Repo(e.to_string()))?;

        // PRAGMA returns a row; execute fails when rows come back, so drain a query instead.
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DomainError::Repo(format!("{} failed: {}", pragma, e)))?;
            while rows
                .next()
                .await
                .map_err(|e| DomainError::Repo(e.to_string()))?
                .is_some()
            {}
        }

        for ddl in [
            USERS_TABLE,
            DOCUMENTS_TABLE,
            JOB_OFFERS_TABLE,
            JOB_OFFERS_INDEX,
            COVER_LETTERS_TABLE,
            APPLICATIONS_TABLE,
            APPLY_FORMS_TABLE,
        ] {
            conn.execute(ddl, ())
                .await
                .map_err(|e| DomainError::Repo(e.to_string()))?;
        }

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<Connection, DomainError> {
        self.db.connect().map_err(repo_err)
    }

    fn posting_from_row(row: &Row) -> Result<JobRecord, DomainError> {
        let id: i64 = row.get(0).map_err(repo_err)?;
        let platform_raw: String = row.get(1).map_err(repo_err)?;
        let platform = Platform::parse(&platform_raw)
            .ok_or_else(|| DomainError::Repo(format!("unknown platform {:?}", platform_raw)))?;
        let discovered: String = row.get(7).map_err(repo_err)?;
        let categories: Vec<String> = row
            .get::<String>(15)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();
        let quick_apply: i64 = row.get(16).unwrap_or(0);
        Ok(JobRecord {
            id,
            posting: JobPosting {
                platform,
                external_id: row.get(2).map_err(repo_err)?,
                title: row.get::<String>(3).ok(),
                company: row.get::<String>(4).ok(),
                description: row.get(5).map_err(repo_err)?,
                url: row.get(6).map_err(repo_err)?,
                discovered_at: parse_time(&discovered)?,
                posted_date: row.get::<String>(8).ok(),
                work_location: row.get::<String>(9).ok(),
                contract_type: row.get::<String>(10).ok(),
                activity_rate: row.get::<String>(11).ok(),
                company_info: row.get::<String>(12).ok(),
                company_contact: row.get::<String>(13).ok(),
                company_url: row.get::<String>(14).ok(),
                categories,
                quick_apply: quick_apply != 0,
            },
        })
    }

    fn profile_from_row(row: &Row) -> Result<UserProfile, DomainError> {
        let preferences: Preferences = row
            .get::<String>(9)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();
        Ok(UserProfile {
            id: row.get(0).map_err(repo_err)?,
            first_name: row.get(1).map_err(repo_err)?,
            last_name: row.get(2).map_err(repo_err)?,
            email: row.get(3).map_err(repo_err)?,
            username: row.get(4).map_err(repo_err)?,
            contact_info: row.get::<String>(5).ok(),
            cv_text: row.get::<String>(6).ok(),
            cv_document_id: row.get::<i64>(7).ok(),
            reference_letter: row.get::<String>(8).ok(),
            preferences,
        })
    }

    fn document_from_row(row: &Row) -> Result<Document, DomainError> {
        let kind_raw: String = row.get(3).map_err(repo_err)?;
        Ok(Document {
            id: row.get(0).map_err(repo_err)?,
            user_id: row.get(1).map_err(repo_err)?,
            name: row.get(2).map_err(repo_err)?,
            kind: DocumentKind::parse(&kind_raw).unwrap_or(DocumentKind::Other),
            content: row.get(4).map_err(repo_err)?,
        })
    }

    fn letter_from_row(row: &Row) -> Result<CoverLetter, DomainError> {
        let draft_json: String = row.get(3).map_err(repo_err)?;
        let draft: CoverLetterDraft = serde_json::from_str(&draft_json)
            .map_err(|e| DomainError::Repo(format!("bad letter draft: {}", e)))?;
        Ok(CoverLetter {
            id: row.get(0).map_err(repo_err)?,
            user_id: row.get(1).map_err(repo_err)?,
            job_id: row.get(2).map_err(repo_err)?,
            draft,
            recipient_info: row.get::<String>(4).ok(),
            pdf: row.get::<Vec<u8>>(5).ok(),
        })
    }

    fn application_from_row(row: &Row) -> Result<Application, DomainError> {
        let status_raw: String = row.get(5).map_err(repo_err)?;
        let status = ApplicationStatus::parse(&status_raw)
            .ok_or_else(|| DomainError::Repo(format!("unknown status {:?}", status_raw)))?;
        let created: String = row.get(6).map_err(repo_err)?;
        Ok(Application {
            id: row.get(0).map_err(repo_err)?,
            user_id: row.get(1).map_err(repo_err)?,
            job_id: row.get(2).map_err(repo_err)?,
            cover_letter: row.get(3).map_err(repo_err)?,
            pdf_path: row.get::<String>(4).ok().map(PathBuf::from),
            status,
            created_at: parse_time(&created)?,
        })
    }

    async fn query_postings(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<JobRecord>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn.query(sql, params).await.map_err(repo_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            out.push(Self::posting_from_row(&row)?);
        }
        Ok(out)
    }

    async fn query_applications(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Application>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn.query(sql, params).await.map_err(repo_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            out.push(Self::application_from_row(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl JobRepo for SqliteRepo {
    async fn upsert_posting(&self, posting: &JobPosting) -> Result<(JobRecord, bool), DomainError> {
        posting.validate()?;
        let categories =
            serde_json::to_string(&posting.categories).map_err(|e| DomainError::Repo(e.to_string()))?;
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                r#"
                INSERT INTO job_offers (platform, external_id, title, company, description, url,
                    discovered_at, posted_date, work_location, contract_type, activity_rate,
                    company_info, company_contact, company_url, categories_json, quick_apply)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                ON CONFLICT (platform, external_id) DO NOTHING
                RETURNING id
                "#,
                params![
                    posting.platform.as_str(),
                    posting.external_id.as_str(),
                    posting.title.clone(),
                    posting.company.clone(),
                    posting.description.as_str(),
                    posting.url.as_str(),
                    posting.discovered_at.to_rfc3339(),
                    posting.posted_date.clone(),
                    posting.work_location.clone(),
                    posting.contract_type.clone(),
                    posting.activity_rate.clone(),
                    posting.company_info.clone(),
                    posting.company_contact.clone(),
                    posting.company_url.clone(),
                    categories,
                    i64::from(posting.quick_apply)
                ],
            )
            .await
            .map_err(repo_err)?;

        if let Some(row) = rows.next().await.map_err(repo_err)? {
            let id: i64 = row.get(0).map_err(repo_err)?;
            debug!(id, external_id = %posting.external_id, "posting inserted");
            return Ok((
                JobRecord {
                    id,
                    posting: posting.clone(),
                },
                true,
            ));
        }
        drop(rows);

        let existing = self
            .find_posting(posting.platform, &posting.external_id)
            .await?
            .ok_or_else(|| {
                DomainError::Repo(format!(
                    "posting {} conflicted but is missing",
                    posting.external_id
                ))
            })?;
        Ok((existing, false))
    }

    async fn get_posting(&self, id: i64) -> Result<Option<JobRecord>, DomainError> {
        let sql = format!("SELECT {} FROM job_offers WHERE id = ?1", POSTING_COLUMNS);
        Ok(self.query_postings(&sql, params![id]).await?.into_iter().next())
    }

    async fn find_posting(
        &self,
        platform: Platform,
        external_id: &str,
    ) -> Result<Option<JobRecord>, DomainError> {
        let sql = format!(
            "SELECT {} FROM job_offers WHERE platform = ?1 AND external_id = ?2",
            POSTING_COLUMNS
        );
        Ok(self
            .query_postings(&sql, params![platform.as_str(), external_id])
            .await?
            .into_iter()
            .next())
    }

    async fn list_postings(&self) -> Result<Vec<JobRecord>, DomainError> {
        let sql = format!("SELECT {} FROM job_offers ORDER BY id DESC", POSTING_COLUMNS);
        self.query_postings(&sql, ()).await
    }

    async fn list_quick_apply(&self) -> Result<Vec<JobRecord>, DomainError> {
        let sql = format!(
            "SELECT {} FROM job_offers WHERE quick_apply = 1 ORDER BY id DESC",
            POSTING_COLUMNS
        );
        self.query_postings(&sql, ()).await
    }

    async fn delete_posting(&self, id: i64) -> Result<(), DomainError> {
        let conn = self.conn()?;
        let tx = conn.transaction().await.map_err(repo_err)?;
        tx.execute("DELETE FROM cover_letters WHERE job_id = ?1", params![id])
            .await
            .map_err(repo_err)?;
        tx.execute(
            "DELETE FROM applications WHERE job_id = ?1 AND status != 'submitted'",
            params![id],
        )
        .await
        .map_err(repo_err)?;
        tx.execute("DELETE FROM job_offers WHERE id = ?1", params![id])
            .await
            .map_err(repo_err)?;
        tx.commit().await.map_err(repo_err)?;
        info!(id, "posting deleted with its letters and pending applications");
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProfileRepo for SqliteRepo {
    async fn create_profile(&self, profile: &NewProfile) -> Result<UserProfile, DomainError> {
        let preferences = serde_json::to_string(&profile.preferences)
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                r#"
                INSERT INTO users (first_name, last_name, email, username, contact_info, cv_text,
                    reference_letter, preferences_json)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                RETURNING id
                "#,
                params![
                    profile.first_name.as_str(),
                    profile.last_name.as_str(),
                    profile.email.as_str(),
                    profile.username.as_str(),
                    profile.contact_info.clone(),
                    profile.cv_text.clone(),
                    profile.reference_letter.clone(),
                    preferences
                ],
            )
            .await
            .map_err(repo_err)?;
        let row = rows
            .next()
            .await
            .map_err(repo_err)?
            .ok_or_else(|| DomainError::Repo("insert returned no id".into()))?;
        let id: i64 = row.get(0).map_err(repo_err)?;
        info!(id, username = %profile.username, "profile created");
        Ok(UserProfile {
            id,
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            username: profile.username.clone(),
            contact_info: profile.contact_info.clone(),
            cv_text: profile.cv_text.clone(),
            cv_document_id: None,
            reference_letter: profile.reference_letter.clone(),
            preferences: profile.preferences.clone(),
        })
    }

    async fn get_profile(&self, id: i64) -> Result<Option<UserProfile>, DomainError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        let mut rows = conn.query(&sql, params![id]).await.map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(Self::profile_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_profile(&self, profile: &UserProfile) -> Result<(), DomainError> {
        let preferences = serde_json::to_string(&profile.preferences)
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let conn = self.conn()?;
        let changed = conn
            .execute(
                r#"
                UPDATE users SET first_name = ?1, last_name = ?2, email = ?3, username = ?4,
                    contact_info = ?5, cv_text = ?6, cv_document_id = ?7, reference_letter = ?8,
                    preferences_json = ?9
                WHERE id = ?10
                "#,
                params![
                    profile.first_name.as_str(),
                    profile.last_name.as_str(),
                    profile.email.as_str(),
                    profile.username.as_str(),
                    profile.contact_info.clone(),
                    profile.cv_text.clone(),
                    profile.cv_document_id,
                    profile.reference_letter.clone(),
                    preferences,
                    profile.id
                ],
            )
            .await
            .map_err(repo_err)?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("profile {}", profile.id)));
        }
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, DomainError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let mut rows = conn.query(&sql, ()).await.map_err(repo_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            out.push(Self::profile_from_row(&row)?);
        }
        Ok(out)
    }

    async fn save_document(
        &self,
        user_id: i64,
        name: &str,
        kind: DocumentKind,
        content: &[u8],
    ) -> Result<Document, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "INSERT INTO documents (user_id, name, kind, content) VALUES (?1, ?2, ?3, ?4) RETURNING id",
                params![user_id, name, kind.as_str(), content.to_vec()],
            )
            .await
            .map_err(repo_err)?;
        let row = rows
            .next()
            .await
            .map_err(repo_err)?
            .ok_or_else(|| DomainError::Repo("insert returned no id".into()))?;
        let id: i64 = row.get(0).map_err(repo_err)?;
        info!(id, user_id, kind = kind.as_str(), bytes = content.len(), "document stored");
        Ok(Document {
            id,
            user_id,
            name: name.to_string(),
            kind,
            content: content.to_vec(),
        })
    }

    async fn get_document(&self, id: i64) -> Result<Option<Document>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, user_id, name, kind, content FROM documents WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(Self::document_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn documents_by_kind(
        &self,
        user_id: i64,
        kind: DocumentKind,
    ) -> Result<Vec<Document>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, user_id, name, kind, content FROM documents \
                 WHERE user_id = ?1 AND kind = ?2 ORDER BY id DESC",
                params![user_id, kind.as_str()],
            )
            .await
            .map_err(repo_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            out.push(Self::document_from_row(&row)?);
        }
        Ok(out)
    }

    async fn save_form_profile(
        &self,
        user_id: i64,
        platform: Platform,
        form: &FormProfile,
    ) -> Result<(), DomainError> {
        form.validate()?;
        let json = serde_json::to_string(form).map_err(|e| DomainError::Repo(e.to_string()))?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO apply_forms (user_id, site, form_json) VALUES (?1, ?2, ?3)
            ON CONFLICT (user_id, site) DO UPDATE SET form_json = excluded.form_json
            "#,
            params![user_id, platform.as_str(), json],
        )
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn get_form_profile(
        &self,
        user_id: i64,
        platform: Platform,
    ) -> Result<Option<FormProfile>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT form_json FROM apply_forms WHERE user_id = ?1 AND site = ?2",
                params![user_id, platform.as_str()],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => {
                let json: String = row.get(0).map_err(repo_err)?;
                serde_json::from_str(&json)
                    .map(Some)
                    .map_err(|e| DomainError::Repo(format!("bad form profile: {}", e)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl LetterRepo for SqliteRepo {
    async fn save_letter(
        &self,
        user_id: i64,
        job_id: i64,
        draft: &CoverLetterDraft,
        recipient_info: Option<&str>,
    ) -> Result<CoverLetter, DomainError> {
        let draft_json =
            serde_json::to_string(draft).map_err(|e| DomainError::Repo(e.to_string()))?;
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                r#"
                INSERT INTO cover_letters (user_id, job_id, draft_json, recipient_info, pdf)
                VALUES (?1, ?2, ?3, ?4, NULL)
                ON CONFLICT (user_id, job_id) DO UPDATE SET
                    draft_json = excluded.draft_json,
                    recipient_info = excluded.recipient_info,
                    pdf = NULL
                RETURNING id
                "#,
                params![user_id, job_id, draft_json, recipient_info],
            )
            .await
            .map_err(repo_err)?;
        let row = rows
            .next()
            .await
            .map_err(repo_err)?
            .ok_or_else(|| DomainError::Repo("letter upsert returned no id".into()))?;
        let id: i64 = row.get(0).map_err(repo_err)?;
        Ok(CoverLetter {
            id,
            user_id,
            job_id,
            draft: draft.clone(),
            recipient_info: recipient_info.map(str::to_string),
            pdf: None,
        })
    }

    async fn get_letter(
        &self,
        user_id: i64,
        job_id: i64,
    ) -> Result<Option<CoverLetter>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, user_id, job_id, draft_json, recipient_info, pdf FROM cover_letters \
                 WHERE user_id = ?1 AND job_id = ?2",
                params![user_id, job_id],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(Self::letter_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn attach_pdf(&self, letter_id: i64, pdf: &[u8]) -> Result<(), DomainError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE cover_letters SET pdf = ?1 WHERE id = ?2",
                params![pdf.to_vec(), letter_id],
            )
            .await
            .map_err(repo_err)?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("cover letter {}", letter_id)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ApplicationRepo for SqliteRepo {
    async fn record_application(&self, app: &NewApplication) -> Result<Application, DomainError> {
        let created_at = Utc::now();
        let pdf_path = app
            .pdf_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                r#"
                INSERT INTO applications (user_id, job_id, cover_letter, pdf_path, status, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT (user_id, job_id) DO NOTHING
                RETURNING id
                "#,
                params![
                    app.user_id,
                    app.job_id,
                    app.cover_letter.as_str(),
                    pdf_path,
                    app.status.as_str(),
                    created_at.to_rfc3339()
                ],
            )
            .await
            .map_err(repo_err)?;
        let row = rows.next().await.map_err(repo_err)?.ok_or_else(|| {
            DomainError::Validation(format!(
                "user {} already has an application for posting {}",
                app.user_id, app.job_id
            ))
        })?;
        let id: i64 = row.get(0).map_err(repo_err)?;
        info!(id, user_id = app.user_id, job_id = app.job_id, status = %app.status, "application recorded");
        Ok(Application {
            id,
            user_id: app.user_id,
            job_id: app.job_id,
            cover_letter: app.cover_letter.clone(),
            pdf_path: app.pdf_path.clone(),
            status: app.status,
            created_at,
        })
    }

    async fn find_application(
        &self,
        user_id: i64,
        job_id: i64,
    ) -> Result<Option<Application>, DomainError> {
        let sql = format!(
            "SELECT {} FROM applications WHERE user_id = ?1 AND job_id = ?2",
            APPLICATION_COLUMNS
        );
        Ok(self
            .query_applications(&sql, params![user_id, job_id])
            .await?
            .into_iter()
            .next())
    }

    async fn get_application(&self, id: i64) -> Result<Option<Application>, DomainError> {
        let sql = format!("SELECT {} FROM applications WHERE id = ?1", APPLICATION_COLUMNS);
        Ok(self
            .query_applications(&sql, params![id])
            .await?
            .into_iter()
            .next())
    }

    async fn list_applications(&self, user_id: i64) -> Result<Vec<Application>, DomainError> {
        let sql = format!(
            "SELECT {} FROM applications WHERE user_id = ?1 ORDER BY id DESC",
            APPLICATION_COLUMNS
        );
        self.query_applications(&sql, params![user_id]).await
    }

    async fn update_application(&self, app: &Application) -> Result<(), DomainError> {
        let pdf_path = app
            .pdf_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE applications SET cover_letter = ?1, pdf_path = ?2, status = ?3 \
                 WHERE id = ?4 AND status != 'submitted'",
                params![app.cover_letter.as_str(), pdf_path, app.status.as_str(), app.id],
            )
            .await
            .map_err(repo_err)?;
        if changed > 0 {
            return Ok(());
        }
        match self.get_application(app.id).await? {
            Some(_) => Err(DomainError::ApplicationImmutable { id: app.id }),
            None => Err(DomainError::NotFound(format!("application {}", app.id))),
        }
    }
}

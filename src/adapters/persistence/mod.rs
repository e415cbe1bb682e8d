//! Persistence adapters: SQLite store, search settings file, CSV export.

pub mod csv_export;
pub mod search_settings;
pub mod sqlite_repo;

pub use search_settings::SearchSettingsFile;
pub use sqlite_repo::SqliteRepo;

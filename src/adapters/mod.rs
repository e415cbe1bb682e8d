//! Infrastructure adapters. Implement outbound ports.
//!
//! jobup.ch, language models, PDF documents, SQLite and files, terminal UI.
//! Map errors to DomainError.

pub mod ai;
pub mod documents;
pub mod jobup;
pub mod persistence;
pub mod ui;

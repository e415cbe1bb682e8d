//! jobfinder: job board scraping, LLM cover letters, PDF rendering and automated applications
//! with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;

//! Document adapters: letter PDF rendering and CV text extraction.

pub mod cv_reader;
pub mod metrics;
pub mod pdf_builder;

pub use cv_reader::PdfTextReader;
pub use pdf_builder::LopdfRenderer;

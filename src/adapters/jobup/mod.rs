//! jobup.ch adapters: search scraping over HTTP and application forms over WebDriver.

pub mod form_filler;
pub mod form_plan;
pub mod parser;
pub mod scraper;
pub mod urls;

pub use form_filler::{JobUpFormFiller, WebDriverSettings};
pub use scraper::JobUpSource;

//! Finds the fine print on a promotional page and the terms pages it links
//! to, renders it with a headless browser when plain HTTP comes back thin,
//! and hands the cleaned text to an LLM for a risk analysis.

pub mod analysis;
pub mod browser;
pub mod cli;
pub mod error;
pub mod limits;
pub mod page;
pub mod scraping;
pub mod service;
pub mod text;
pub mod utils;

pub use error::{AnalysisError, FetchError, ScrapeError, ServiceError};
pub use scraping::{ScrapeMode, ScrapeOrchestrator, ScrapeRequest, ScrapeResult};
pub use service::{AnalysisReport, FinePrintService};

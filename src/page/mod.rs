pub mod document;
pub mod extractor;
pub mod fetcher;
pub mod links;

// Re-export common types
pub use document::{Anchor, Document};
pub use extractor::FinePrintExtractor;
pub use fetcher::{normalize_url, FetchedPage, PageFetcher};
pub use links::{LinkDiscoverer, TERMS_PATTERNS};

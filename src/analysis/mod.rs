pub mod client;
pub mod prompt;
pub mod report;

// Re-export common types
pub use client::{prepare_input, AnalysisClient, OpenAiClient};
pub use report::{parse_analysis, summarize, CancellationDifficulty, FinePrintAnalysis};

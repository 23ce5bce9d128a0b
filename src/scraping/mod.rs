pub mod dynamic_strategy;
pub mod orchestrator;
pub mod result;
pub mod static_strategy;
pub mod strategy;

// Re-export common types
pub use dynamic_strategy::DynamicStrategy;
pub use orchestrator::ScrapeOrchestrator;
pub use result::{FailureKind, ScrapeFailure, ScrapeMode, ScrapeRequest, ScrapeResult, StrategyKind};
pub use static_strategy::StaticStrategy;
pub use strategy::ScrapeStrategy;

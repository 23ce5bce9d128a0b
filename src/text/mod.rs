pub mod normalize;

pub use normalize::{normalize, DEFAULT_MAX_LENGTH, TRUNCATION_MARKER};

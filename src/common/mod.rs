//! Shared types, errors and the TTL cache

pub mod cache;
pub mod errors;
pub mod types;

pub use cache::TtlCache;
pub use errors::{EngineError, ProviderError, Result};

//! In-memory query executor
//!
//! Answers existence probes from rows registered per query text and counts
//! every handle it hands out, so callers can check that nothing leaks.

mod executor;

pub use executor::{ExecutedQuery, MemoryCursor, MemoryExecutor, MemoryStatement};

//! Retrying key-value facade.
//!
//! # Data Flow
//! ```text
//! caller → facade.rs (validate input, pick read/write policy)
//!        → RetryExecutor::run (attempts + backoff)
//!        → KvStore primitive (one round trip per attempt)
//!        → read: exhausted → empty | write: exhausted → Err(last error)
//! ```
//!
//! # Design Decisions
//! - Reads favour availability: exhaustion looks like "not found"
//! - Writes favour consistency: a failed mutation always surfaces
//! - Fatal errors surface from reads and writes alike, unchanged

pub mod facade;

pub use facade::RetryingKv;

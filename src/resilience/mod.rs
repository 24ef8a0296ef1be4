//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call into the store:
//!     → retries.rs (attempt the operation)
//!     → On failure: classify.rs (retryable or fatal?)
//!     → Retryable with attempts left: backoff.rs (wait base * (n + 1)), retry
//!     → Otherwise: RetryError::{Fatal, Exhausted} back to the caller
//! ```
//!
//! # Design Decisions
//! - Linear, deterministic schedule; no jitter
//! - Typed error kinds decide first, message text is the fallback
//! - Cancellation is observed between attempts, never mid-attempt
//! - The executor is stateless; concurrent calls do not coordinate

pub mod backoff;
pub mod classify;
pub mod retries;

pub use backoff::{linear_backoff, RetryPolicy};
pub use classify::{classify_message, Classify, ErrorClass};
pub use retries::{RetryError, RetryExecutor};

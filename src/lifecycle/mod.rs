//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Build store → Ping through executor → Started { kv, readiness }
//!
//! Shutdown (shutdown.rs):
//!     Trigger → executors stop between attempts → callers get Cancelled
//!
//! Signals (signals.rs):
//!     Ctrl-C → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Readiness is a value returned from startup, not a process-wide flag
//! - Fatal startup errors fail fast; an unreachable store only degrades

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{start, Readiness, Started, StartupError};

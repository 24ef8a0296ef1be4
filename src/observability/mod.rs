//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Executor and facade produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (attempt / retry / failure / degraded-read counters)
//!
//! Consumers:
//!     → stderr (plain or JSON lines)
//!     → whatever metrics recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - Every failed attempt is logged with operation name and attempt number
//! - The crate never installs a metrics exporter; counters are no-ops
//!   until the embedding process sets a recorder

pub mod logging;
pub mod metrics;

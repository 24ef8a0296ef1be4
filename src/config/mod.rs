//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → KvConfig (validated, immutable)
//!     → startup builds the store and retry policy from it
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so a missing file or section still works
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets are referenced by environment variable name only

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{KvConfig, ObservabilityConfig, RetryConfig, StoreConfig, StoreKind};
pub use validation::{validate_config, ValidationError};

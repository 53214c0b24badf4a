//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Config (validated, immutable)
//!     → PoolConfig handed to Pool, DialConfig to TcpDialer
//! ```
//!
//! # Design Decisions
//! - Pool policy is fixed at construction; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::Config;
pub use schema::DialConfig;
pub use schema::ObservabilityConfig;
pub use schema::PoolConfig;
pub use schema::TargetConfig;
pub use validation::ValidationError;

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → AgentConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Secrets never live in the config file; the private key is read from the
//!   environment by `blockchain::wallet`
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_default, ConfigError};
pub use schema::AgentConfig;
pub use schema::ConfirmationConfig;
pub use schema::FeePolicy;
pub use schema::LendingConfig;
pub use schema::NetworkConfig;
pub use schema::TokenConfig;

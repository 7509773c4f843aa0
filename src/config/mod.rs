//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! GATEWAY_CONFIG (optional TOML file)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (PORT, OCM_*, ...)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all handlers
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never mutated afterwards
//! - All fields have defaults so an empty environment still boots
//! - Validation separates syntactic (serde/parse) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from, ConfigError};
pub use schema::{
    Credentials, GatewayConfig, ListenerConfig, ObservabilityConfig, RetryConfig,
    ScheduleConfig, SecurityConfig, TimeoutConfig, UpstreamConfig,
};

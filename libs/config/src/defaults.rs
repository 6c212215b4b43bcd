//! Default configuration values
//!
//! Constants shared by the configuration loader and the adapter so that
//! file, environment and code defaults never drift apart.

/// Default location of the base configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/adapter.toml";

/// Directory (relative to the base file) holding per-environment overlays
pub const ENVIRONMENTS_DIR: &str = "environments";

/// Prefix for environment variable overrides (`ADAPTER_ROUTER`, ...)
pub const ENV_PREFIX: &str = "ADAPTER";

/// Routing limits
pub mod routing {
    /// Maximum number of hops in a single multi-hop swap
    pub const DEFAULT_MAX_HOPS: usize = 4;
}

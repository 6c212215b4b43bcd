//! # Adapter Configuration
//!
//! Layered configuration loading and shared defaults for the AMM adapter,
//! keeping deployment wiring (adapter account, factory and router
//! addresses, routing limits) out of the code.
//!
//! ## Features
//!
//! - **Layered Loading**: base TOML file, per-environment overlay, then
//!   `ADAPTER_`-prefixed environment variables
//! - **Defaults**: default paths and routing limits shared by every consumer
//!
//! ## Usage
//!
//! ```rust,no_run
//! use adapter_config::{defaults, ConfigLoader};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Settings {
//!     router: String,
//! }
//!
//! let settings: Settings = ConfigLoader::new(defaults::DEFAULT_CONFIG_PATH)
//!     .environment("testnet")
//!     .load()
//!     .unwrap();
//! println!("router = {}", settings.router);
//! ```

pub mod defaults;
pub mod loader;

// Re-export commonly used types
pub use loader::{load_config, ConfigLoader};

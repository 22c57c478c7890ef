//! # Hearth Configuration
//!
//! Typed configuration for the daemon connector and the `hearth` binary.
//!
//! Values are resolved with the precedence `defaults < file < environment`;
//! command-line overrides are applied by the caller on top of the loaded
//! [`HearthConfig`].
//!
//! ```rust,no_run
//! use hearth_config::HearthConfig;
//!
//! let config = HearthConfig::load(None)?;
//! println!("connect timeout: {:?}", config.connector.connect_timeout());
//! # Ok::<(), hearth_config::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod components;
mod loader;

pub use components::*;
pub use loader::*;

//! # fennec-types
//!
//! Shared types for the Fennec device-debugging tools.
//!
//! - Settings: layered configuration (defaults, config file, env, CLI)
//! - Errors: the error type shared by the library crates
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fennec_types::Settings;
//!
//! let settings = Settings::load(None).unwrap();
//! println!("package: {}", settings.package_name("alice"));
//! ```

pub mod config;
pub mod error;

pub use config::{LogSettings, Settings};
pub use error::FennecError;

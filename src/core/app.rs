//! Application identity from Cargo.toml.
//!
//! Single source of truth for the app name and vendor used for
//! platform directories and environment variable prefixes.

/// Application name (from Cargo.toml `package.name`).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Vendor / organization, used in ProjectDirs.
pub const VENDOR: &str = "polymorphl";

/// Prefix for every environment variable read by the crate.
pub const ENV_PREFIX: &str = "CHAT_MATH_";

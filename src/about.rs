//! Package identity

pub const PLUGIN_NAME: &str = "xtractor";
pub const PACKAGE_TITLE: &str = "Xtractor";
pub const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ProjectDirs qualifier and organization
pub const QUALIFIER: &str = "pro";
pub const ORGANIZATION: &str = "jakab";

/// One-line version banner, e.g. "Xtractor(xtractor) v0.4.0"
pub fn version_banner() -> String {
    format!("{}({}) v{}", PACKAGE_TITLE, PACKAGE_NAME, VERSION)
}

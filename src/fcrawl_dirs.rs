//! Filesystem locations used by fcrawl.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Config | `~/Library/Application Support/fcrawl/` | `~/.config/fcrawl/` |
//!
//! Set `FCRAWL_CONFIG_DIR` to override the config directory.

use std::path::PathBuf;

/// Environment variable that overrides [`config_dir`].
pub const CONFIG_DIR_ENV: &str = "FCRAWL_CONFIG_DIR";

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/fcrawl/` by default.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("fcrawl"))
        .unwrap_or_else(|| std::env::temp_dir().join("fcrawl-config"))
}

/// Path of the main config file (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

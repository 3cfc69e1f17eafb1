//! # Configuration Loader / 配置加载器
//!
//! Reads a TOML file into [`PairingConfig`]. Missing keys take the defaults
//! declared on the DTO; no other validation happens here.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;

use cp_core::PairingConfig;

const CONFIG_DIR_NAME: &str = "classic-pairing";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not a valid pairing config.
pub fn load_config(config_path: &Path) -> anyhow::Result<PairingConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let config: PairingConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
    Ok(config)
}

/// `<config dir>/classic-pairing/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load `explicit` if given, else the default path if that file exists, else
/// the built-in defaults.
///
/// An explicit path that cannot be loaded is an error; a missing default file
/// is not.
pub fn load_config_or_default(explicit: Option<&Path>) -> anyhow::Result<PairingConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => load_config(&path),
        _ => {
            debug!("no config file, using defaults");
            Ok(PairingConfig::default())
        }
    }
}

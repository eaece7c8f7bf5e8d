//! Configuration schema for cache-pack
//!
//! Configuration is read from `~/.config/cache-pack/config.toml` unless a
//! path is given with `--config` or `CACHE_PACK_CONFIG`.

use crate::format::PLACEHOLDER;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pack behaviour
    pub pack: PackConfig,

    /// Extra formats, keyed by format id
    pub formats: BTreeMap<String, FormatConfig>,
}

impl Config {
    /// Check what serde cannot: every custom format needs an extension and
    /// commands that reference the pack file.
    pub fn validate(&self) -> Result<(), String> {
        for (id, format) in &self.formats {
            if format.extension.trim().is_empty() {
                return Err(format!("format '{id}' has an empty extension"));
            }
            for (name, template) in [("pack", &format.pack), ("unpack", &format.unpack)] {
                if !template.contains(PLACEHOLDER) {
                    return Err(format!(
                        "format '{id}' {name} command does not contain {PLACEHOLDER}"
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Pack behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Format used on Linux/macOS when CACHE_PACK_FORMAT is unset
    pub posix_default: String,

    /// Format used on Windows when CACHE_PACK_FORMAT is unset
    pub windows_default: String,

    /// Root for staging directories (CACHE_PACK_TEMP takes precedence)
    pub temp_root: Option<PathBuf>,

    /// Remove partial pack output when the pack command fails
    pub cleanup_partial: bool,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            posix_default: "tar".to_string(),
            windows_default: "zip".to_string(),
            temp_root: None,
            cleanup_partial: true,
        }
    }
}

/// A user-defined format
///
/// Commands are templates; `$0` is replaced by the pack file path, already
/// quoted for the shell, so templates use it bare.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Pack file extension, without the leading dot
    pub extension: String,

    /// Pack command template
    pub pack: String,

    /// Unpack command template
    pub unpack: String,

    /// Executable the commands need (probed during init)
    #[serde(default)]
    pub tool: Option<String>,
}

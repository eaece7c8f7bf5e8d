//! Registry of pack formats, addressed by id

use crate::config::Config;
use crate::error::{PackError, PackResult};
use crate::format::{first_volume, shell_path, CommandSpec, FormatDescriptor, Platform};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Volume size passed to 7z for the split format
pub const SPLIT_VOLUME_SIZE: &str = "100m";

fn split_pack_command(pack_file: &Path) -> String {
    format!(
        "7z a -t7z {} -mx=1 -v{} \"*\"",
        shell_path(pack_file),
        SPLIT_VOLUME_SIZE
    )
}

/// Built-in formats
fn builtin_formats() -> Vec<FormatDescriptor> {
    vec![
        FormatDescriptor::from_templates("tar", "tar", "tar -cvpf $0 .", "tar -xvf $0")
            .with_tool("tar"),
        FormatDescriptor::from_templates(
            "zip",
            "zip",
            "7z a -tzip $0 -mx=1 \"*\"",
            "7z x -y $0",
        )
        .with_tool("7z"),
        FormatDescriptor::from_templates(
            "7z",
            "7z",
            "7z a -t7z $0 -mx=1 \"*\"",
            "7z x -y $0",
        )
        .with_tool("7z"),
        FormatDescriptor {
            id: "7z-split".to_string(),
            extension: "7z".to_string(),
            tool: Some("7z".to_string()),
            pack: CommandSpec::Builder(split_pack_command),
            unpack: CommandSpec::Template("7z x -y $0".to_string()),
            actual_path: Some(first_volume),
        },
    ]
}

/// Fixed table of formats plus the per-platform defaults
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: BTreeMap<String, FormatDescriptor>,
    posix_default: String,
    windows_default: String,
}

impl FormatRegistry {
    /// Registry holding only the built-in formats
    pub fn builtin() -> Self {
        let mut registry = Self {
            formats: BTreeMap::new(),
            posix_default: "tar".to_string(),
            windows_default: "zip".to_string(),
        };
        for format in builtin_formats() {
            registry.register(format);
        }
        registry
    }

    /// Built-in formats extended with the formats and defaults from config
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::builtin();
        registry.posix_default = config.pack.posix_default.clone();
        registry.windows_default = config.pack.windows_default.clone();

        for (id, format) in &config.formats {
            let mut descriptor = FormatDescriptor::from_templates(
                id.as_str(),
                format.extension.as_str(),
                format.pack.as_str(),
                format.unpack.as_str(),
            );
            descriptor.tool = format.tool.clone();
            registry.register(descriptor);
        }
        registry
    }

    /// Add a format, replacing any format with the same id
    pub fn register(&mut self, format: FormatDescriptor) {
        if self.formats.contains_key(&format.id) {
            debug!("Replacing pack format '{}'", format.id);
        }
        self.formats.insert(format.id.clone(), format);
    }

    /// Look up a format by id
    pub fn get(&self, id: &str) -> Option<&FormatDescriptor> {
        self.formats.get(id)
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    /// Id of the format used when no override is given
    pub fn default_id(&self, platform: Platform) -> &str {
        match platform {
            Platform::Windows => &self.windows_default,
            Platform::Posix => &self.posix_default,
        }
    }

    /// Resolve the active format.
    ///
    /// A non-empty override must name a registered format. Without one the
    /// platform default applies.
    pub fn resolve(
        &self,
        override_id: Option<&str>,
        platform: Platform,
    ) -> PackResult<&FormatDescriptor> {
        let id = match override_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => self.default_id(platform),
        };

        let format = self.get(id).ok_or_else(|| PackError::UnknownFormat {
            id: id.to_string(),
            known: self.ids().collect::<Vec<_>>().join(", "),
        })?;

        debug!("Using pack format '{}' ({})", format.id, platform);
        Ok(format)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

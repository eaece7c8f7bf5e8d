//! Pack formats
//!
//! A format describes one archive tool invocation: which extension the pack
//! file gets, how to build the pack and unpack command lines, and where the
//! tool actually leaves its output. Formats are plain data looked up by id in
//! the [`FormatRegistry`], so adding a format never touches the stage logic.

pub mod platform;
pub mod registry;

pub use platform::Platform;
pub use registry::FormatRegistry;

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

/// Token replaced by the pack file path in command templates
pub const PLACEHOLDER: &str = "$0";

/// File stem of every pack file (`_cache.<extension>`)
pub const PACK_FILE_STEM: &str = "_cache";

/// How a pack or unpack command line is produced
#[derive(Debug, Clone)]
pub enum CommandSpec {
    /// Command line with [`PLACEHOLDER`] standing in for the pack file path
    Template(String),
    /// Function building the whole command line from the pack file path
    Builder(fn(&Path) -> String),
}

impl CommandSpec {
    /// Produce the command line for a pack file.
    ///
    /// Templates receive the path with forward slashes, which both tar and 7z
    /// accept on every host, already quoted for the host shell. Builders are
    /// handed the raw path and their output is used as-is.
    pub fn materialize(&self, pack_file: &Path) -> String {
        match self {
            Self::Template(template) => template.replace(PLACEHOLDER, &shell_path(pack_file)),
            Self::Builder(build) => build(pack_file),
        }
    }
}

/// Render a path the way archive tools expect it: forward slashes only
pub fn tool_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// [`tool_path`] quoted as a single word for the shell the runner uses.
///
/// `sh` gets POSIX quoting, so `$`, backticks and quotes in the path stay
/// literal. `cmd` gets plain double quotes.
pub fn shell_path(path: &Path) -> String {
    let rendered = tool_path(path);
    if cfg!(windows) {
        return format!("\"{rendered}\"");
    }
    shlex::try_quote(&rendered)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| format!("'{}'", rendered.replace('\'', r"'\''")))
}

/// Describes one pack format
#[derive(Debug, Clone)]
pub struct FormatDescriptor {
    /// Registry key (e.g. "tar", "7z-split")
    pub id: String,
    /// Pack file extension, without the leading dot
    pub extension: String,
    /// Executable the commands depend on, if known
    pub tool: Option<String>,
    /// Command creating the pack file
    pub pack: CommandSpec,
    /// Command extracting the pack file
    pub unpack: CommandSpec,
    /// Maps the default pack file path to the file the tool really writes
    pub actual_path: Option<fn(&Path) -> PathBuf>,
}

impl FormatDescriptor {
    /// Create a descriptor from command templates
    pub fn from_templates(
        id: impl Into<String>,
        extension: impl Into<String>,
        pack: impl Into<String>,
        unpack: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            extension: extension.into(),
            tool: None,
            pack: CommandSpec::Template(pack.into()),
            unpack: CommandSpec::Template(unpack.into()),
            actual_path: None,
        }
    }

    /// Set the executable this format depends on
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Default pack file path inside `base_dir`
    pub fn pack_file_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(format!("{}.{}", PACK_FILE_STEM, self.extension))
    }

    /// Where the pack file really lives on disk
    pub fn resolve_actual_path(&self, default_path: &Path) -> PathBuf {
        match self.actual_path {
            Some(resolve) => resolve(default_path),
            None => default_path.to_path_buf(),
        }
    }

    /// Command line that packs the current directory into `pack_file`
    pub fn pack_command(&self, pack_file: &Path) -> String {
        self.pack.materialize(pack_file)
    }

    /// Command line that extracts `pack_file` into the current directory
    pub fn unpack_command(&self, pack_file: &Path) -> String {
        self.unpack.materialize(pack_file)
    }

    /// Files a pack attempt may have left behind.
    ///
    /// Covers the default path, the actual path and any numbered volumes
    /// (`<default>.001`, `<default>.002`, ...) next to them. Only existing
    /// files are returned.
    pub fn partial_outputs(&self, default_path: &Path) -> Vec<PathBuf> {
        let mut outputs = Vec::new();
        let actual = self.resolve_actual_path(default_path);

        for candidate in [default_path.to_path_buf(), actual] {
            if candidate.is_file() && !outputs.contains(&candidate) {
                outputs.push(candidate);
            }
        }

        let (Some(dir), Some(name)) = (default_path.parent(), default_path.file_name()) else {
            return outputs;
        };
        let prefix = format!("{}.", name.to_string_lossy());

        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let file_name = entry.file_name();
                let file_name = file_name.to_string_lossy();
                let is_volume = file_name.strip_prefix(&prefix).is_some_and(|suffix| {
                    !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit())
                });
                let path = entry.path();
                if is_volume && path.is_file() && !outputs.contains(&path) {
                    outputs.push(path);
                }
            }
        }

        outputs
    }
}

/// First volume of a multi-volume archive: `<default>.001`
pub fn first_volume(default_path: &Path) -> PathBuf {
    let mut path = default_path.as_os_str().to_owned();
    path.push(".001");
    PathBuf::from(path)
}

//! Lifecycle stages
//!
//! The pipeline invokes the tool once per stage, in the order
//! `init -> pre-restore -> (restore task) -> post-restore -> (build) ->
//! pre-save -> (save task)`. Ordering is not checked here; each stage only
//! validates the variables it needs, which the previous stage provides.
//!
//! | Stage | Needs | Produces |
//! |-------|-------|----------|
//! | init | CACHE_PATH, CACHE_KEY (soft) | CACHE_PACK_TOOLS_DIR, CACHE_PACK_TOOLS_INIT |
//! | pre-restore | PIPELINE_WORKSPACE, CACHE_PATH | staging dir, CACHE_PATH_ORIGINAL, CACHE_PATH, CACHE_RESTORED |
//! | post-restore | CACHE_PATH, CACHE_PATH_ORIGINAL | unpacked cache |
//! | pre-save | CACHE_PATH, CACHE_PATH_ORIGINAL | pack file |

pub mod init;
pub mod post_restore;
pub mod pre_restore;
pub mod pre_save;

use crate::config::PackConfig;
use crate::error::{PackError, PackResult};
use crate::format::{FormatDescriptor, FormatRegistry, Platform};
use crate::pipeline::vars::CACHE_PACK_FORMAT;
use crate::pipeline::PipelineVars;
use crate::runner::CommandRunner;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;

/// One of the four lifecycle stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    PreRestore,
    PostRestore,
    PreSave,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 4] = [
        Stage::Init,
        Stage::PreRestore,
        Stage::PostRestore,
        Stage::PreSave,
    ];

    /// Name used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::PreRestore => "pre-restore",
            Stage::PostRestore => "post-restore",
            Stage::PreSave => "pre-save",
        }
    }

    /// Parse the positional stage argument
    pub fn from_arg(arg: Option<&str>) -> PackResult<Self> {
        arg.ok_or(PackError::MissingStage)?.parse()
    }
}

impl FromStr for Stage {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| PackError::UnknownStage(s.to_string()))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a stage did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// init found its inputs missing and did nothing
    Skipped,
    /// init exported its markers
    Initialized { tools_dir: PathBuf },
    /// pre-restore created a staging directory and redirected CACHE_PATH to it
    Staged { staging_dir: PathBuf },
    /// post-restore found nothing restored
    RestoreSkipped,
    /// post-restore extracted the pack file
    Unpacked { pack_file: PathBuf },
    /// pre-save created the pack file
    Packed { pack_file: PathBuf },
}

/// Everything a stage needs besides the variables
pub struct StageContext<'a> {
    /// Available pack formats
    pub registry: &'a FormatRegistry,
    /// Executes archive commands
    pub runner: &'a dyn CommandRunner,
    /// Host platform, for the default format
    pub platform: Platform,
    /// Pack settings from config
    pub settings: &'a PackConfig,
    /// Directory the tool was started from
    pub working_dir: PathBuf,
}

impl StageContext<'_> {
    /// Active pack format: CACHE_PACK_FORMAT, else the platform default
    pub fn resolve_format(&self, vars: &PipelineVars) -> PackResult<&FormatDescriptor> {
        self.registry
            .resolve(vars.get(CACHE_PACK_FORMAT), self.platform)
    }
}

/// Run one stage against the variable store
pub async fn run(
    stage: Stage,
    ctx: &StageContext<'_>,
    vars: &mut PipelineVars,
) -> PackResult<StageOutcome> {
    match stage {
        Stage::Init => init::execute(ctx, vars).await,
        Stage::PreRestore => pre_restore::execute(ctx, vars).await,
        Stage::PostRestore => post_restore::execute(ctx, vars).await,
        Stage::PreSave => pre_save::execute(ctx, vars).await,
    }
}

/// Create a directory and its parents; an existing directory is fine
pub(crate) async fn ensure_dir(dir: &Path) -> PackResult<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| PackError::io(format!("creating directory {}", dir.display()), e))
}

/// Render a path for storage in a pipeline variable
pub(crate) fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

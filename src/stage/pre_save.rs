//! pre-save stage - pack the cache for the save task

use crate::error::{PackError, PackResult};
use crate::format::FormatDescriptor;
use crate::pipeline::vars::{CACHE_PATH, CACHE_PATH_ORIGINAL};
use crate::pipeline::PipelineVars;
use crate::stage::{ensure_dir, StageContext, StageOutcome};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Execute the pre-save stage.
///
/// Packs the contents of CACHE_PATH_ORIGINAL into a pack file inside
/// CACHE_PATH, where the save task picks it up.
pub async fn execute(ctx: &StageContext<'_>, vars: &mut PipelineVars) -> PackResult<StageOutcome> {
    vars.check(&[CACHE_PATH, CACHE_PATH_ORIGINAL])?;

    let format = ctx.resolve_format(vars)?;
    let pack_dir = PathBuf::from(vars.require(CACHE_PATH)?);
    let source_dir = PathBuf::from(vars.require(CACHE_PATH_ORIGINAL)?);
    let pack_file = format.pack_file_path(&pack_dir);

    ensure_dir(&pack_dir).await?;

    // A restored archive is still in the staging directory, and 7z would
    // update it in place instead of replacing it.
    for stale in format.partial_outputs(&pack_file) {
        fs::remove_file(&stale).await.map_err(|e| {
            PackError::io(format!("removing stale pack file {}", stale.display()), e)
        })?;
        info!("Removed stale pack file {}", stale.display());
    }

    let command = format.pack_command(&pack_file);
    info!("Creating pack file with \"{}\"", command);
    if let Err(err) = ctx.runner.run(&command, &source_dir).await {
        if ctx.settings.cleanup_partial {
            remove_partial_outputs(format, &pack_file).await;
        }
        return Err(err);
    }

    // Some tools exit zero without writing anything
    let actual = format.resolve_actual_path(&pack_file);
    if !actual.exists() {
        return Err(PackError::PackFileNotCreated(actual));
    }

    info!("Pack file created: {}", actual.display());
    Ok(StageOutcome::Packed { pack_file: actual })
}

/// Delete whatever a failed pack command left behind
async fn remove_partial_outputs(format: &FormatDescriptor, pack_file: &Path) {
    for path in format.partial_outputs(pack_file) {
        match fs::remove_file(&path).await {
            Ok(()) => info!("Removed partial pack output {}", path.display()),
            Err(e) => warn!("Failed to remove partial pack output {}: {}", path.display(), e),
        }
    }
}

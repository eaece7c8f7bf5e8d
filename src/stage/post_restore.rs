//! post-restore stage - unpack the restored pack file

use crate::error::{PackError, PackResult};
use crate::pipeline::vars::{CACHE_PATH, CACHE_PATH_ORIGINAL, CACHE_RESTORED, RESTORED_TRUE};
use crate::pipeline::PipelineVars;
use crate::stage::{ensure_dir, StageContext, StageOutcome};
use std::path::{Path, PathBuf};
use tracing::info;

/// Execute the post-restore stage.
///
/// Does nothing unless CACHE_RESTORED is exactly "true". A restore that
/// claims success without a pack file on disk is an error: the cache entry
/// was produced by another format or tool.
pub async fn execute(ctx: &StageContext<'_>, vars: &mut PipelineVars) -> PackResult<StageOutcome> {
    vars.check(&[CACHE_PATH, CACHE_PATH_ORIGINAL])?;

    if vars.raw(CACHE_RESTORED) != Some(RESTORED_TRUE) {
        info!("Cache was not restored. Not attempting to unpack.");
        return Ok(StageOutcome::RestoreSkipped);
    }

    let format = ctx.resolve_format(vars)?;
    let default_path = format.pack_file_path(Path::new(vars.require(CACHE_PATH)?));
    let pack_file = format.resolve_actual_path(&default_path);

    info!("Checking for pack file: {}", pack_file.display());
    if !pack_file.exists() {
        return Err(PackError::RestoredPackFileMissing(pack_file));
    }

    let target = PathBuf::from(vars.require(CACHE_PATH_ORIGINAL)?);
    ensure_dir(&target).await?;

    let command = format.unpack_command(&pack_file);
    info!("Unpacking into {} with \"{}\"", target.display(), command);
    ctx.runner.run(&command, &target).await?;

    Ok(StageOutcome::Unpacked { pack_file })
}

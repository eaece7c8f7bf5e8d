//! pre-restore stage - redirect CACHE_PATH to a staging directory
//!
//! The restore task downloads the pack file into CACHE_PATH. Pointing it at a
//! fresh staging directory keeps the archive out of the real cache location;
//! post-restore then unpacks from there into CACHE_PATH_ORIGINAL.

use crate::error::{PackError, PackResult};
use crate::pipeline::vars::{
    CACHE_PACK_TEMP, CACHE_PATH, CACHE_PATH_ORIGINAL, CACHE_RESTORED, PIPELINE_WORKSPACE,
};
use crate::pipeline::PipelineVars;
use crate::stage::{ensure_dir, path_value, StageContext, StageOutcome};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// Prefix of staging directory names
pub const STAGING_PREFIX: &str = "cache-pack-";

/// Execute the pre-restore stage
pub async fn execute(ctx: &StageContext<'_>, vars: &mut PipelineVars) -> PackResult<StageOutcome> {
    vars.check(&[PIPELINE_WORKSPACE, CACHE_PATH])?;

    let cache_path = vars.require(CACHE_PATH)?.to_string();
    let temp_root = match vars.get(CACHE_PACK_TEMP) {
        Some(root) => PathBuf::from(root),
        None => match &ctx.settings.temp_root {
            Some(root) => root.clone(),
            None => PathBuf::from(vars.require(PIPELINE_WORKSPACE)?),
        },
    };

    info!(
        "Creating staging directory for pack file under {}",
        temp_root.display()
    );
    let staging_dir = create_staging_dir(&temp_root).await?;
    info!("  Pack directory: {}", staging_dir.display());

    vars.set(CACHE_PATH_ORIGINAL, cache_path);
    vars.set(CACHE_PATH, path_value(&staging_dir));
    vars.set(CACHE_RESTORED, "");

    Ok(StageOutcome::Staged { staging_dir })
}

/// Create a uniquely named directory under `root`, creating `root` first
async fn create_staging_dir(root: &Path) -> PackResult<PathBuf> {
    ensure_dir(root).await?;

    let dir = root.join(format!("{}{}", STAGING_PREFIX, Uuid::new_v4().simple()));
    fs::create_dir(&dir)
        .await
        .map_err(|e| PackError::io(format!("creating staging directory {}", dir.display()), e))?;
    Ok(dir)
}

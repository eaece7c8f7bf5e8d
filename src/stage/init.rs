//! init stage - mark the pack tools as set up

use crate::error::PackResult;
use crate::pipeline::vars::{CACHE_KEY, CACHE_PACK_TOOLS_DIR, CACHE_PACK_TOOLS_INIT, CACHE_PATH};
use crate::pipeline::PipelineVars;
use crate::stage::{path_value, StageContext, StageOutcome};
use tracing::{debug, info, warn};

/// Execute the init stage.
///
/// Best-effort: missing inputs, an unknown format or a missing tool are
/// logged and never fail the stage.
pub async fn execute(ctx: &StageContext<'_>, vars: &mut PipelineVars) -> PackResult<StageOutcome> {
    if let Err(err) = vars.check(&[CACHE_PATH, CACHE_KEY]) {
        info!("{}. Skipping init.", err);
        return Ok(StageOutcome::Skipped);
    }

    info!("Initializing {} and {}", CACHE_PACK_TOOLS_DIR, CACHE_PACK_TOOLS_INIT);
    vars.set(CACHE_PACK_TOOLS_DIR, path_value(&ctx.working_dir));
    vars.set(CACHE_PACK_TOOLS_INIT, "true");

    match ctx.resolve_format(vars) {
        Ok(format) => match format.tool.as_deref() {
            Some(tool) if !ctx.runner.tool_available(tool) => {
                warn!(
                    "Pack format '{}' needs '{}', which was not found on PATH",
                    format.id, tool
                );
            }
            Some(tool) => debug!("Found '{}' for pack format '{}'", tool, format.id),
            None => debug!("Pack format '{}' does not name its tool", format.id),
        },
        Err(err) => warn!("{}", err),
    }

    Ok(StageOutcome::Initialized {
        tools_dir: ctx.working_dir.clone(),
    })
}

//! cache-pack - CI cache packing helper
//!
//! CLI entry point that runs one lifecycle stage.

use cache_pack::cli::{Cli, LogFormat};
use cache_pack::config::ConfigManager;
use cache_pack::error::{PackError, PackResult};
use cache_pack::format::{FormatRegistry, Platform};
use cache_pack::pipeline::{emit_exports, PipelineVars};
use cache_pack::runner::ShellRunner;
use cache_pack::stage::{self, Stage, StageContext};
use clap::Parser;
use console::style;
use std::io;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            if e.is_usage() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run() -> PackResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    // Nothing else happens without a valid stage
    let stage = Stage::from_arg(cli.stage.as_deref())?;

    let config_manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    let registry = FormatRegistry::from_config(&config);
    let runner = ShellRunner::new();
    let working_dir =
        std::env::current_dir().map_err(|e| PackError::io("getting current directory", e))?;
    let ctx = StageContext {
        registry: &registry,
        runner: &runner,
        platform: Platform::detect(),
        settings: &config.pack,
        working_dir,
    };

    let mut vars = PipelineVars::from_env();

    info!("Running stage {}", stage);
    let outcome = stage::run(stage, &ctx, &mut vars).await?;
    debug!("Stage {} finished: {:?}", stage, outcome);

    let exports = vars.take_exports();
    emit_exports(&mut io::stdout().lock(), &exports)
        .map_err(|e| PackError::io("writing pipeline variables", e))?;

    Ok(())
}

/// Logs go to stderr; stdout is reserved for tool output and pipeline
/// logging commands. `RUST_LOG` overrides the verbosity flags.
fn init_logging(verbose: u8, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("cache_pack=info"),
        1 => EnvFilter::new("cache_pack=debug"),
        _ => EnvFilter::new("cache_pack=trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

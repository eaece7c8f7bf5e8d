//! Archive tool execution
//!
//! Stages hand a finished command line to a [`CommandRunner`] and wait for it.
//! [`ShellRunner`] runs it through the host shell; tests substitute their own
//! runner to observe commands without spawning anything.

use crate::error::{PackError, PackResult};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Executes archive tool command lines
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` with `cwd` as working directory and wait for it.
    ///
    /// Fails if the command cannot be started or exits non-zero.
    async fn run(&self, command: &str, cwd: &Path) -> PackResult<()>;

    /// Whether `tool` can be found
    fn tool_available(&self, tool: &str) -> bool;
}

/// Runs commands through `sh -c` (or `cmd /C` on Windows)
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    /// Create a new shell runner
    pub fn new() -> Self {
        Self
    }

    #[cfg(windows)]
    fn shell_command(command: &str) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").raw_arg(command);
        cmd
    }

    #[cfg(not(windows))]
    fn shell_command(command: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str, cwd: &Path) -> PackResult<()> {
        debug!("Executing in {}: {}", cwd.display(), command);

        let status = Self::shell_command(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| PackError::command_failed(command, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(PackError::CommandExit {
                command: command.to_string(),
                code: status.code(),
            })
        }
    }

    fn tool_available(&self, tool: &str) -> bool {
        find_on_path(tool, std::env::var_os("PATH").as_deref()).is_some()
    }
}

/// Search a PATH-style list of directories for an executable
pub fn find_on_path(tool: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    let names: Vec<String> = if cfg!(windows) && Path::new(tool).extension().is_none() {
        vec![format!("{tool}.exe"), format!("{tool}.cmd"), tool.to_string()]
    } else {
        vec![tool.to_string()]
    };

    std::env::split_paths(path_var)
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

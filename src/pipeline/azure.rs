//! Azure Pipelines logging commands
//!
//! A line of the form `##vso[task.setvariable variable=NAME]VALUE` on stdout
//! makes the agent set `NAME` for every later step of the job.

use crate::pipeline::Export;
use std::io::{self, Write};
use tracing::info;

/// Escape a value for the data part of a logging command
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%AZP25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Build the logging command that sets a pipeline variable
pub fn set_variable_command(name: &str, value: &str) -> String {
    format!(
        "##vso[task.setvariable variable={}]{}",
        name,
        escape_data(value)
    )
}

/// Write one logging command per export
pub fn emit_exports<W: Write>(out: &mut W, exports: &[Export]) -> io::Result<()> {
    for export in exports {
        info!("Setting variable '{}' to '{}'", export.name, export.value);
        writeln!(out, "{}", set_variable_command(&export.name, &export.value))?;
    }
    out.flush()
}

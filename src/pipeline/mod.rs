//! Cross-stage state
//!
//! Stages communicate only through pipeline variables. [`vars`] holds the
//! in-process store; [`azure`] turns recorded assignments into the logging
//! commands Azure Pipelines picks up for later steps.

pub mod azure;
pub mod vars;

pub use azure::{emit_exports, set_variable_command};
pub use vars::{Export, PipelineVars};

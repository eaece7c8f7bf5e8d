//! Pipeline variable store
//!
//! Stages never touch the process environment directly. They read from and
//! write to a [`PipelineVars`] snapshot; writes are recorded as exports and
//! handed to the CI host once the stage has finished.

use crate::error::{PackError, PackResult};
use std::collections::HashMap;
use std::ffi::OsString;
use tracing::debug;

/// Active cache directory, redirected to the staging directory by pre-restore
pub const CACHE_PATH: &str = "CACHE_PATH";
/// The cache's real location, saved by pre-restore
pub const CACHE_PATH_ORIGINAL: &str = "CACHE_PATH_ORIGINAL";
/// Opaque cache fingerprint owned by the pipeline
pub const CACHE_KEY: &str = "CACHE_KEY";
/// Set to "true" by the restore task when a cache entry was downloaded
pub const CACHE_RESTORED: &str = "CACHE_RESTORED";
/// Pack format override
pub const CACHE_PACK_FORMAT: &str = "CACHE_PACK_FORMAT";
/// Staging root override
pub const CACHE_PACK_TEMP: &str = "CACHE_PACK_TEMP";
/// Pipeline workspace root, provided by the CI agent
pub const PIPELINE_WORKSPACE: &str = "PIPELINE_WORKSPACE";
/// Directory the tool ran from during init
pub const CACHE_PACK_TOOLS_DIR: &str = "CACHE_PACK_TOOLS_DIR";
/// Marker that init ran
pub const CACHE_PACK_TOOLS_INIT: &str = "CACHE_PACK_TOOLS_INIT";

/// The exact value CACHE_RESTORED must hold for a restore to count
pub const RESTORED_TRUE: &str = "true";

/// A variable assignment to pass on to later pipeline steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub value: String,
}

/// Key-value view of the pipeline's variables for one stage invocation
#[derive(Debug, Clone, Default)]
pub struct PipelineVars {
    values: HashMap<String, String>,
    exports: Vec<Export>,
}

impl PipelineVars {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment
    pub fn from_env() -> Self {
        Self::from_os_pairs(std::env::vars_os())
    }

    /// Store seeded from raw environment entries.
    ///
    /// Entries whose name or value is not valid UTF-8 are left out; no
    /// pipeline variable the stages read can be one of them.
    pub fn from_os_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        Self::from_pairs(pairs.into_iter().filter_map(|(name, value)| {
            match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (Ok(name), Err(_)) => {
                    debug!("Ignoring non UTF-8 value of {}", name);
                    None
                }
                (Err(name), _) => {
                    debug!("Ignoring non UTF-8 variable {:?}", name);
                    None
                }
            }
        }))
    }

    /// Store seeded from name/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            exports: Vec::new(),
        }
    }

    /// Value of a variable, if set and non-empty
    pub fn get(&self, name: &str) -> Option<&str> {
        self.raw(name).filter(|value| !value.is_empty())
    }

    /// Value of a variable exactly as stored, empty strings included
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Check that every named variable is set and non-empty
    pub fn check(&self, names: &[&str]) -> PackResult<()> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| self.get(name).is_none())
            .map(|name| (*name).to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PackError::MissingVariables(missing))
        }
    }

    /// Like [`check`](Self::check), but returns the value of a single variable
    pub fn require(&self, name: &str) -> PackResult<&str> {
        self.get(name)
            .ok_or_else(|| PackError::MissingVariables(vec![name.to_string()]))
    }

    /// Assign a variable and record it for export
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        self.values.insert(name.to_string(), value.clone());
        self.exports.push(Export {
            name: name.to_string(),
            value,
        });
    }

    /// Assignments made so far, in order
    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    /// Take the recorded assignments, leaving none behind
    pub fn take_exports(&mut self) -> Vec<Export> {
        std::mem::take(&mut self.exports)
    }
}

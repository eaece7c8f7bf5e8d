//! cache-pack - CI cache packing helper
//!
//! Packs a cache directory into a single archive before the pipeline's save
//! task runs, and unpacks it after the restore task. The archive format is
//! picked per platform or by `CACHE_PACK_FORMAT`; the archive itself is made
//! by an external tool (tar, 7z).

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod runner;
pub mod stage;

pub use error::{PackError, PackResult};

//! PhotoSift - photo triage toolkit
//!
//! Flags candidates for deletion in a folder of images along three
//! independent axes (blur, darkness or low resolution, near-duplication)
//! and moves selected files into a recoverable per-folder trash directory.
//!
//! - [`scanner`]: folder walk and parallel per-image quality scoring
//! - [`duplicates`]: embedding-based near-duplicate grouping
//! - [`actions`]: move-to-trash and restore
//! - [`session`]: in-memory owner of one folder's results

pub mod actions;
mod app;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod session;

pub use app::run_app;

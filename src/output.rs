//! Result types returned by a render pass.

use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of rendering one HTML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// Source HTML file.
    pub html: PathBuf,
    /// Destination PDF file (same directory, same stem).
    pub pdf: PathBuf,
    /// URL the browser loaded.
    pub url: String,
    /// Size of the written PDF; 0 on failure.
    pub bytes_written: usize,
    /// Wall-clock time spent on this file.
    pub duration_ms: u64,
    /// Set when the file failed.
    pub error: Option<FileError>,
}

/// Counters for a whole pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderStats {
    /// HTML files found in the build directory.
    pub discovered: usize,
    /// PDFs written.
    pub rendered: usize,
    /// PDFs deleted by the cleanup step.
    pub removed_pdfs: usize,
    pub total_duration_ms: u64,
}

/// Everything a successful pass produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderReport {
    pub files: Vec<FileResult>,
    pub stats: RenderStats,
}

impl RenderReport {
    /// Paths of the PDFs written in this pass, in render order.
    pub fn pdfs(&self) -> impl Iterator<Item = &PathBuf> {
        self.files
            .iter()
            .filter(|f| f.error.is_none())
            .map(|f| &f.pdf)
    }
}

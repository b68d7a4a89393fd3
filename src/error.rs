//! Error types for the html2pdf library.
//!
//! Two error types mirror the two scopes a failure can have:
//!
//! * [`Html2PdfError`] — **Fatal**: the pass cannot continue (build directory
//!   missing, server down, browser will not start, build command failed).
//!   Returned as `Err(Html2PdfError)` from the top-level entry points.
//!
//! * [`FileError`] — a single HTML file could not be rendered. Recorded in
//!   [`crate::output::FileResult`] and, because a pass stops at the first
//!   failing file, also carried by [`Html2PdfError::FileFailed`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the html2pdf library.
#[derive(Debug, Error)]
pub enum Html2PdfError {
    // ── Build directory ───────────────────────────────────────────────────
    /// The build directory does not exist.
    #[error("Build directory not found: '{path}'\nRun the HTML generator first (html2pdf run).")]
    BuildDirNotFound { path: PathBuf },

    /// The build directory path exists but is a file.
    #[error("'{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    /// The build directory is not below the server root, so it has no URL.
    #[error("Build directory '{build_dir}' is not inside the server root '{root}'")]
    RootMismatch { build_dir: PathBuf, root: PathBuf },

    /// Listing the build directory failed.
    #[error("Failed to read build directory '{path}': {source}")]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removing a previously derived PDF failed for a reason other than
    /// "not found".
    #[error("Failed to remove stale PDF '{path}': {source}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Static server ─────────────────────────────────────────────────────
    /// Nothing answered at the server's base URL.
    #[error("Static server is not reachable at {url}: {reason}\nStart it with: html2pdf start-server")]
    ServerUnreachable { url: String, reason: String },

    /// The listener could not bind (usually: port already in use).
    #[error("Failed to bind static server to {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server loop exited with an I/O error.
    #[error("Static server failed: {0}")]
    ServerFailed(#[source] std::io::Error),

    // ── Browser ───────────────────────────────────────────────────────────
    /// Chrome could not be found or started.
    #[error(
        "Failed to launch headless Chrome: {0}\n\n\
Install Chrome or Chromium, or point at an existing binary with --chrome <PATH>.\n\
Inside containers you may also need --no-sandbox.\n"
    )]
    BrowserLaunchFailed(String),

    /// A file failed; the pass stopped here.
    #[error("Rendering stopped after {rendered} of {total} files: {source}")]
    FileFailed {
        rendered: usize,
        total: usize,
        #[source]
        source: FileError,
    },

    // ── Build command ─────────────────────────────────────────────────────
    /// The build command could not be spawned at all.
    #[error("Failed to start build command '{command}': {source}")]
    BuildCommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The build command ran and exited unsuccessfully.
    #[error("Build command '{command}' exited with {}", exit_code_display(.code))]
    BuildCommandFailed { command: String, code: Option<i32> },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn exit_code_display(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Failure to render one HTML file.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The preflight fetch could not connect to the server.
    #[error("{url}: source unreachable: {detail}")]
    SourceUnreachable { url: String, detail: String },

    /// The server answered with a non-success status.
    #[error("{url}: server returned HTTP {status}")]
    SourceStatus { url: String, status: u16 },

    /// The browser could not open or load the page.
    #[error("{url}: navigation failed: {detail}")]
    Navigation { url: String, detail: String },

    /// `Page.printToPDF` failed.
    #[error("{url}: PDF export failed: {detail}")]
    Print { url: String, detail: String },

    /// The PDF bytes could not be written to disk.
    #[error("failed to write '{path}': {detail}")]
    Write { path: PathBuf, detail: String },
}

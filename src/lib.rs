//! # html2pdf
//!
//! Render a directory of generated HTML files to PDF through a local static
//! HTTP server and headless Chrome.
//!
//! ## Pipeline Overview
//!
//! ```text
//! build/*.html
//!  │
//!  ├─ 0. Build    run the generator (`cargo run --release`)     html2pdf run
//!  ├─ 1. Serve    static server on :8888 rooted at `.`          html2pdf start-server
//!  ├─ 2. Probe    fail early if nothing answers on the port     ┐
//!  ├─ 3. Discover <build-dir>/*.html → sibling .pdf paths       │
//!  ├─ 4. Cleanup  delete previously derived PDFs                │ html2pdf generate-pdf
//!  └─ 5. Render   one Chrome tab per file, "N / M" footer       ┘
//! ```
//!
//! Files are rendered one after another and the pass stops at the first
//! failure; there is no retry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use html2pdf::{generate_pdfs, RenderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Host the server in-process for this pass instead of relying on
//!     // a separately started `html2pdf start-server`.
//!     let config = RenderConfig::builder()
//!         .build_dir("build")
//!         .serve(true)
//!         .build()?;
//!     let report = generate_pdfs(&config).await?;
//!     for pdf in report.pdfs() {
//!         println!("{}", pdf.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `html2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    CleanupScope, RenderConfig, RenderConfigBuilder, DEFAULT_BUILD_DIR, DEFAULT_PORT,
    FOOTER_TEMPLATE, HEADER_TEMPLATE, MAX_TIMEOUT_SECS,
};
pub use error::{FileError, Html2PdfError};
pub use generate::{clean, generate_pdfs, generate_pdfs_sync, planned_outputs};
pub use output::{FileResult, RenderReport, RenderStats};
pub use pipeline::builder::{run_build, run_build_status, BuildCommand};
pub use pipeline::server::{run_server, ServerHandle, StaticServer};
pub use progress::{NoopProgressCallback, ProgressCallback, RenderProgressCallback};

//! Pipeline stages of a render pass, plus the two standalone operator
//! commands (build and serve).
//!
//! ## Data Flow
//!
//! ```text
//! probe ──▶ discover ──▶ cleanup ──▶ render (per file, sequential)
//! (server)  (*.html)     (*.pdf)     (preflight → Chrome → atomic write)
//! ```
//!
//! 1. [`server`]   — the static file server and its reachability probe
//! 2. [`discover`] — list `<build-dir>/*.html` and derive each `.pdf` path
//! 3. [`cleanup`]  — idempotently delete previously derived PDFs
//! 4. [`render`]   — drive headless Chrome on a blocking thread
//! 5. [`builder`]  — run the external HTML-generating build command

pub mod builder;
pub mod cleanup;
pub mod discover;
pub mod render;
pub mod server;

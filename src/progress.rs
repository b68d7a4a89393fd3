//! Progress-callback trait for per-file render events.
//!
//! Inject an [`Arc<dyn RenderProgressCallback>`] via
//! [`crate::config::RenderConfigBuilder::progress_callback`] to receive
//! events as the pass walks the build directory.
//!
//! # Example
//!
//! ```rust
//! use html2pdf::{RenderConfig, RenderProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl RenderProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, pdf: &Path, bytes: usize) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {} ({} bytes)", index, total, pdf.display(), bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//! let config = RenderConfig::builder()
//!     .progress_callback(counter as Arc<dyn RenderProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the render pass as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 1-based.
pub trait RenderProgressCallback: Send + Sync {
    /// Called once after discovery and cleanup, before the first render.
    fn on_pass_start(&self, total_files: usize, removed_pdfs: usize) {
        let _ = (total_files, removed_pdfs);
    }

    /// Called just before a file's URL is loaded.
    fn on_file_start(&self, index: usize, total: usize, html: &Path) {
        let _ = (index, total, html);
    }

    /// Called after a PDF has been written.
    fn on_file_complete(&self, index: usize, total: usize, pdf: &Path, bytes: usize) {
        let _ = (index, total, pdf, bytes);
    }

    /// Called when a file fails. The pass stops after this call.
    fn on_file_error(&self, index: usize, total: usize, html: &Path, error: &str) {
        let _ = (index, total, html, error);
    }

    /// Called once when the pass ends, successfully or not.
    fn on_pass_complete(&self, total_files: usize, rendered: usize) {
        let _ = (total_files, rendered);
    }
}

/// A no-op implementation, equivalent to configuring no callback.
pub struct NoopProgressCallback;

impl RenderProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RenderConfig`].
pub type ProgressCallback = Arc<dyn RenderProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        total: AtomicUsize,
    }

    impl RenderProgressCallback for TrackingCallback {
        fn on_pass_start(&self, total_files: usize, _removed_pdfs: usize) {
            self.total.store(total_files, Ordering::SeqCst);
        }

        fn on_file_start(&self, _index: usize, _total: usize, _html: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _total: usize, _pdf: &Path, _bytes: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_error(&self, _index: usize, _total: usize, _html: &Path, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_pass_start(2, 0);
        cb.on_file_start(1, 2, Path::new("build/a.html"));
        cb.on_file_complete(1, 2, Path::new("build/a.pdf"), 1024);
        cb.on_file_error(2, 2, Path::new("build/b.html"), "HTTP 404");
        cb.on_pass_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_pass_start(2, 1);
        tracker.on_file_start(1, 2, Path::new("a.html"));
        tracker.on_file_complete(1, 2, Path::new("a.pdf"), 10);
        tracker.on_file_start(2, 2, Path::new("b.html"));
        tracker.on_file_error(2, 2, Path::new("b.html"), "boom");

        assert_eq!(tracker.total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }
}

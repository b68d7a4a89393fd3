//! Cleanup: delete previously derived PDFs before a pass.
//!
//! Removal is idempotent. A PDF that is already gone (or disappears between
//! listing and deleting) is not an error, so running cleanup twice in a row
//! is a no-op the second time.

use crate::config::CleanupScope;
use crate::error::Html2PdfError;
use crate::pipeline::discover::{is_html_name, is_pdf_name, list_files, pdf_path_for};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Remove `path` if it exists. Returns whether a file was removed.
pub fn remove_if_present(path: &Path) -> Result<bool, Html2PdfError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Html2PdfError::CleanupFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// The PDFs `scope` selects in `build_dir`.
pub fn stale_pdfs(build_dir: &Path, scope: CleanupScope) -> Result<Vec<PathBuf>, Html2PdfError> {
    match scope {
        CleanupScope::AllPdfs => list_files(build_dir, is_pdf_name),
        CleanupScope::Derived => {
            let derived: HashSet<PathBuf> = list_files(build_dir, is_html_name)?
                .iter()
                .map(|html| pdf_path_for(html))
                .collect();
            let mut pdfs: Vec<PathBuf> = list_files(build_dir, is_pdf_name)?
                .into_iter()
                .filter(|pdf| derived.contains(pdf))
                .collect();
            pdfs.sort();
            Ok(pdfs)
        }
    }
}

/// Delete the PDFs `scope` selects in `build_dir` and return how many were removed.
pub fn clean_pdfs(build_dir: &Path, scope: CleanupScope) -> Result<usize, Html2PdfError> {
    let mut removed = 0;
    for pdf in stale_pdfs(build_dir, scope)? {
        if remove_if_present(&pdf)? {
            removed += 1;
        }
    }
    info!(
        "Cleanup removed {} PDF(s) from {} ({:?})",
        removed,
        build_dir.display(),
        scope
    );
    Ok(removed)
}

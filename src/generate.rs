//! Render-pass entry points.
//!
//! A pass runs strictly in order and stops at the first failure:
//!
//! 1. probe the static server (nothing on disk is touched if it is down)
//! 2. discover `<build-dir>/*.html`
//! 3. delete previously derived PDFs
//! 4. render each file in turn, one browser tab per file

use crate::config::RenderConfig;
use crate::error::{FileError, Html2PdfError};
use crate::output::{FileResult, RenderReport, RenderStats};
use crate::pipeline::discover::RenderJob;
use crate::pipeline::render::{preflight, render_job, Renderer, RendererOptions};
use crate::pipeline::{cleanup, discover, server};
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Delete derived PDFs and render one PDF per HTML file in the build directory.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// - the static server does not answer at [`RenderConfig::base_url`]
/// - the build directory is missing or unreadable
/// - a stale PDF cannot be removed
/// - Chrome cannot be launched
/// - any single file fails ([`Html2PdfError::FileFailed`]); files after it
///   are not attempted and have no PDF
pub async fn generate_pdfs(config: &RenderConfig) -> Result<RenderReport, Html2PdfError> {
    if !config.serve {
        return run_pass(config, &config.base_url()).await;
    }

    let handle = server::StaticServer::bind(&config.root, &config.host, config.port)
        .await?
        .spawn();
    let result = run_pass(config, handle.base_url()).await;
    if let Err(e) = handle.shutdown().await {
        warn!("In-process server did not shut down cleanly: {}", e);
    }
    result
}

/// Synchronous wrapper around [`generate_pdfs`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_pdfs_sync(config: &RenderConfig) -> Result<RenderReport, Html2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Html2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_pdfs(config))
}

/// Run only the cleanup step for `config`'s build directory.
pub fn clean(config: &RenderConfig) -> Result<usize, Html2PdfError> {
    cleanup::clean_pdfs(&config.build_dir, config.cleanup)
}

async fn run_pass(config: &RenderConfig, base_url: &str) -> Result<RenderReport, Html2PdfError> {
    let total_start = Instant::now();
    info!(
        "Starting render pass: {} via {}",
        config.build_dir.display(),
        base_url
    );

    // ── Step 1: Server must be up before anything is deleted ─────────────
    let client = server::http_client(config.timeout())?;
    server::probe(&client, base_url).await?;

    // ── Step 2: Discover ─────────────────────────────────────────────────
    let base = Url::parse(base_url)
        .map_err(|e| Html2PdfError::InvalidConfig(format!("Bad server URL '{base_url}': {e}")))?;
    let prefix = config.build_dir_url_prefix()?;
    let jobs = discover::discover_html(&config.build_dir, &base, &prefix)?;
    let total = jobs.len();

    // ── Step 3: Cleanup ──────────────────────────────────────────────────
    let removed_pdfs = cleanup::clean_pdfs(&config.build_dir, config.cleanup)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_pass_start(total, removed_pdfs);
    }

    if jobs.is_empty() {
        info!("No HTML files in {}; nothing to render", config.build_dir.display());
        if let Some(ref cb) = config.progress_callback {
            cb.on_pass_complete(0, 0);
        }
        return Ok(RenderReport {
            files: Vec::new(),
            stats: RenderStats {
                removed_pdfs,
                total_duration_ms: total_start.elapsed().as_millis() as u64,
                ..Default::default()
            },
        });
    }

    // ── Step 4: Render, sequentially, stopping at the first failure ──────
    // Chrome is launched on the first file whose preflight succeeds, so a
    // pass that fails on its first URL never starts a browser.
    let mut renderer: Option<Arc<Renderer>> = None;
    let mut files: Vec<FileResult> = Vec::with_capacity(total);

    for (i, job) in jobs.iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(index, total, &job.html);
        }
        debug!("[{}/{}] {}", index, total, job.url);

        if let Err(err) = preflight(&client, job.url.as_str()).await {
            return Err(file_failed(config, index, total, job, files.len(), err));
        }

        let active = match renderer {
            Some(ref r) => Arc::clone(r),
            None => match Renderer::launch(RendererOptions::from(config)).await {
                Ok(r) => Arc::clone(renderer.insert(Arc::new(r))),
                Err(e) => {
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_pass_complete(total, files.len());
                    }
                    return Err(e);
                }
            },
        };

        let result = render_job(&active, job).await;
        if let Some(err) = result.error.clone() {
            return Err(file_failed(config, index, total, job, files.len(), err));
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_file_complete(index, total, &result.pdf, result.bytes_written);
        }
        files.push(result);
    }

    let stats = RenderStats {
        discovered: total,
        rendered: files.len(),
        removed_pdfs,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Render pass complete: {}/{} PDFs in {}ms",
        stats.rendered, total, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_pass_complete(total, stats.rendered);
    }

    Ok(RenderReport { files, stats })
}

/// Report a failed file and build the error that ends the pass.
fn file_failed(
    config: &RenderConfig,
    index: usize,
    total: usize,
    job: &RenderJob,
    rendered: usize,
    err: FileError,
) -> Html2PdfError {
    warn!("Failed to render {}: {}", job.html.display(), err);
    if let Some(ref cb) = config.progress_callback {
        cb.on_file_error(index, total, &job.html, &err.to_string());
        cb.on_pass_complete(total, rendered);
    }
    Html2PdfError::FileFailed {
        rendered,
        total,
        source: err,
    }
}

/// The PDFs a pass over `build_dir` would produce, without touching anything.
pub fn planned_outputs(build_dir: &Path) -> Result<Vec<PathBuf>, Html2PdfError> {
    Ok(discover::list_files(build_dir, discover::is_html_name)?
        .iter()
        .map(|html| discover::pdf_path_for(html))
        .collect())
}

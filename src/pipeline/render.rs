//! PDF export: load a URL in headless Chrome and print it.
//!
//! ## Why spawn_blocking?
//!
//! `headless_chrome` talks to the browser over a synchronous DevTools
//! WebSocket and blocks the calling thread while it waits for events.
//! Launching the browser and every navigate/print round-trip therefore runs
//! on Tokio's blocking pool, keeping the async workers (and an in-process
//! static server, if any) responsive.
//!
//! ## Why a preflight fetch?
//!
//! When a URL cannot be loaded Chrome still "navigates" successfully, to its
//! own error page, and will happily print that page. Fetching the URL with
//! reqwest first turns a dead server or a 404 into a real error.

use crate::config::RenderConfig;
use crate::error::{FileError, Html2PdfError};
use crate::output::FileResult;
use crate::pipeline::discover::RenderJob;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Browser settings extracted from [`RenderConfig`] so they can cross into
/// a blocking task.
#[derive(Debug, Clone)]
pub struct RendererOptions {
    pub chrome_path: Option<PathBuf>,
    pub sandbox: bool,
    pub timeout: Duration,
    pub header_template: String,
    pub footer_template: String,
}

impl From<&RenderConfig> for RendererOptions {
    fn from(c: &RenderConfig) -> Self {
        Self {
            chrome_path: c.chrome_path.clone(),
            sandbox: c.sandbox,
            timeout: c.timeout(),
            header_template: c.header_template.clone(),
            footer_template: c.footer_template.clone(),
        }
    }
}

/// Fixed print options: header and footer on, with the given templates.
pub fn print_options(header_template: &str, footer_template: &str) -> PrintToPdfOptions {
    PrintToPdfOptions {
        display_header_footer: Some(true),
        header_template: Some(header_template.to_string()),
        footer_template: Some(footer_template.to_string()),
        ..Default::default()
    }
}

/// How long the DevTools connection may sit idle. It must outlive the
/// slowest single file.
fn idle_timeout(timeout: Duration) -> Duration {
    timeout.max(Duration::from_secs(30)).saturating_mul(2)
}

/// A running headless browser. One per pass; each file gets a fresh tab.
pub struct Renderer {
    browser: Browser,
    options: RendererOptions,
}

impl Renderer {
    /// Launch Chrome. Blocking.
    pub fn launch_blocking(options: RendererOptions) -> Result<Self, Html2PdfError> {
        let idle = idle_timeout(options.timeout);

        let launch = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(options.sandbox)
            .path(options.chrome_path.clone())
            .idle_browser_timeout(idle)
            .build()
            .map_err(|e| Html2PdfError::BrowserLaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch).map_err(|e| Html2PdfError::BrowserLaunchFailed(format!("{e:#}")))?;

        match browser.get_version() {
            Ok(v) => info!("Headless browser ready: {}", v.product),
            Err(e) => warn!("Browser started but version query failed: {e:#}"),
        }

        Ok(Self { browser, options })
    }

    /// Launch Chrome on the blocking pool.
    pub async fn launch(options: RendererOptions) -> Result<Self, Html2PdfError> {
        tokio::task::spawn_blocking(move || Self::launch_blocking(options))
            .await
            .map_err(|e| Html2PdfError::Internal(format!("Browser launch task panicked: {e}")))?
    }

    /// Load `url` in a new tab and return the printed PDF bytes. Blocking.
    pub fn print_blocking(&self, url: &str) -> Result<Vec<u8>, FileError> {
        let tab = self.browser.new_tab().map_err(|e| FileError::Navigation {
            url: url.to_string(),
            detail: format!("cannot open tab: {e:#}"),
        })?;
        tab.set_default_timeout(self.options.timeout);

        let result = self.print_in_tab(&tab, url);

        if let Err(e) = tab.close(true) {
            debug!("Closing tab for {} failed: {e:#}", url);
        }
        result
    }

    fn print_in_tab(&self, tab: &Arc<Tab>, url: &str) -> Result<Vec<u8>, FileError> {
        tab.navigate_to(url)
            .and_then(|t| t.wait_until_navigated())
            .map_err(|e| FileError::Navigation {
                url: url.to_string(),
                detail: format!("{e:#}"),
            })?;

        let options = print_options(&self.options.header_template, &self.options.footer_template);
        tab.print_to_pdf(Some(options)).map_err(|e| FileError::Print {
            url: url.to_string(),
            detail: format!("{e:#}"),
        })
    }
}

/// Fetch `url` and require a 2xx answer.
pub async fn preflight(client: &reqwest::Client, url: &str) -> Result<(), FileError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| FileError::SourceUnreachable {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FileError::SourceStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(())
}

/// Write `bytes` to `path` via a temp file in the same directory + rename,
/// so a crash never leaves a truncated PDF behind.
pub fn write_pdf_atomic(path: &Path, bytes: &[u8]) -> Result<(), FileError> {
    let write_err = |detail: String| FileError::Write {
        path: path.to_path_buf(),
        detail,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".html2pdf-")
        .suffix(".pdf.tmp")
        .tempfile_in(dir)
        .map_err(|e| write_err(e.to_string()))?;
    tmp.write_all(bytes).map_err(|e| write_err(e.to_string()))?;
    tmp.flush().map_err(|e| write_err(e.to_string()))?;
    tmp.persist(path).map_err(|e| write_err(e.error.to_string()))?;
    Ok(())
}

/// Render one job: print in a fresh tab, then write the PDF.
///
/// Never returns `Err`; the outcome lives in [`FileResult::error`]. Callers
/// are expected to have run [`preflight`] on the job's URL first.
pub async fn render_job(renderer: &Arc<Renderer>, job: &RenderJob) -> FileResult {
    let start = Instant::now();
    let url = job.url.to_string();

    let task_renderer = Arc::clone(renderer);
    let pdf = job.pdf.clone();
    let task_url = url.clone();
    let outcome = tokio::task::spawn_blocking(move || -> Result<usize, FileError> {
        let bytes = task_renderer.print_blocking(&task_url)?;
        write_pdf_atomic(&pdf, &bytes)?;
        Ok(bytes.len())
    })
    .await
    .unwrap_or_else(|e| {
        Err(FileError::Print {
            url: url.clone(),
            detail: format!("render task panicked: {e}"),
        })
    });

    let duration_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(bytes_written) => {
            debug!(
                "Rendered {} → {} ({} bytes, {}ms)",
                url,
                job.pdf.display(),
                bytes_written,
                duration_ms
            );
            FileResult {
                html: job.html.clone(),
                pdf: job.pdf.clone(),
                url,
                bytes_written,
                duration_ms,
                error: None,
            }
        }
        Err(e) => FileResult {
            html: job.html.clone(),
            pdf: job.pdf.clone(),
            url,
            bytes_written: 0,
            duration_ms,
            error: Some(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FOOTER_TEMPLATE, HEADER_TEMPLATE};
    use crate::pipeline::server::{http_client, StaticServer};

    #[test]
    fn print_options_enable_header_footer() {
        let opts = print_options(HEADER_TEMPLATE, FOOTER_TEMPLATE);
        assert_eq!(opts.display_header_footer, Some(true));
        assert_eq!(opts.header_template.as_deref(), Some("<div></div>"));
        assert!(opts
            .footer_template
            .as_deref()
            .unwrap_or_default()
            .contains("pageNumber"));
        assert_eq!(opts.landscape, None);
    }

    #[test]
    fn options_from_config() {
        let config = RenderConfig::builder()
            .sandbox(false)
            .timeout_secs(5)
            .chrome_path("/usr/bin/chromium")
            .build()
            .unwrap();
        let opts = RendererOptions::from(&config);
        assert!(!opts.sandbox);
        assert_eq!(opts.timeout, Duration::from_secs(5));
        assert_eq!(opts.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));
    }

    #[test]
    fn idle_timeout_has_a_floor_and_saturates() {
        assert_eq!(idle_timeout(Duration::from_secs(5)), Duration::from_secs(60));
        assert_eq!(idle_timeout(Duration::from_secs(45)), Duration::from_secs(90));
        assert_eq!(idle_timeout(Duration::from_secs(u64::MAX)), Duration::MAX);
    }

    #[test]
    fn atomic_write_replaces_content_and_leaves_no_temp() {
        let tmp = tempfile::tempdir().unwrap();
        let pdf = tmp.path().join("a.pdf");
        std::fs::write(&pdf, b"old").unwrap();

        write_pdf_atomic(&pdf, b"%PDF-1.4 new").unwrap();

        assert_eq!(std::fs::read(&pdf).unwrap(), b"%PDF-1.4 new");
        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "temp file left behind");
    }

    #[test]
    fn atomic_write_into_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = write_pdf_atomic(&tmp.path().join("nope/a.pdf"), b"%PDF").unwrap_err();
        assert!(matches!(err, FileError::Write { .. }));
    }

    #[tokio::test]
    async fn preflight_reports_status_and_success() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.html"), "<p>a</p>").unwrap();
        let handle = StaticServer::bind(tmp.path(), "127.0.0.1", 0)
            .await
            .unwrap()
            .spawn();
        let client = http_client(Duration::from_secs(5)).unwrap();

        preflight(&client, &format!("{}a.html", handle.base_url()))
            .await
            .unwrap();

        let err = preflight(&client, &format!("{}b.html", handle.base_url()))
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::SourceStatus { status: 404, .. }), "got: {err}");

        handle.shutdown().await.unwrap();
    }
}

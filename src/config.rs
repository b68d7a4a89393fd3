//! Configuration types for a render pass.
//!
//! Everything a pass needs is carried by [`RenderConfig`], built via
//! [`RenderConfigBuilder`]. The CLI maps flags (and their `HTML2PDF_*`
//! environment fallbacks) onto the builder; library callers set only the
//! fields they care about.

use crate::error::Html2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default port of the static server.
pub const DEFAULT_PORT: u16 = 8888;

/// Default build directory, relative to the working directory.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Upper bound for the per-file timeout (one day).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Header printed on every page: a single blank element.
pub const HEADER_TEMPLATE: &str = "<div></div>";

/// Footer printed on every page: `<pageNumber> / <totalPages>`, centered.
///
/// Chrome substitutes the content of elements carrying the `pageNumber` and
/// `totalPages` classes when it lays out the print header and footer.
pub const FOOTER_TEMPLATE: &str = "<div style=\"width: 100%; text-align: center; \
font-size: 12px; color: black; padding-left: 10px;\">\
<span class=\"pageNumber\"></span> / <span class=\"totalPages\"></span></div>";

/// Configuration for one `generate-pdf` pass.
///
/// # Example
/// ```rust
/// use html2pdf::RenderConfig;
///
/// let config = RenderConfig::builder()
///     .build_dir("build")
///     .port(8888)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url(), "http://localhost:8888/");
/// ```
#[derive(Clone)]
pub struct RenderConfig {
    /// Directory holding the generated `.html` files. Default: `build`.
    pub build_dir: PathBuf,

    /// Directory the static server serves. Default: `.`.
    ///
    /// URLs are computed from the build directory's position below this root,
    /// so `build/a.html` becomes `http://localhost:8888/build/a.html`.
    pub root: PathBuf,

    /// Host name used in URLs and for binding the in-process server. Default: `localhost`.
    pub host: String,

    /// Static server port. Default: 8888.
    pub port: u16,

    /// Which PDFs are removed before rendering. Default: [`CleanupScope::AllPdfs`].
    pub cleanup: CleanupScope,

    /// Path to a Chrome/Chromium binary. `None` lets headless_chrome search
    /// the usual install locations and `PATH`.
    pub chrome_path: Option<PathBuf>,

    /// Run Chrome with its sandbox enabled. Default: true.
    ///
    /// Containers running as root usually need this off.
    pub sandbox: bool,

    /// Per-file navigation and print timeout in seconds. Default: 30.
    pub timeout_secs: u64,

    /// Print header HTML. Default: [`HEADER_TEMPLATE`].
    pub header_template: String,

    /// Print footer HTML. Default: [`FOOTER_TEMPLATE`].
    pub footer_template: String,

    /// Host the static server in-process for the duration of the pass. Default: false.
    pub serve: bool,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            root: PathBuf::from("."),
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            cleanup: CleanupScope::default(),
            chrome_path: None,
            sandbox: true,
            timeout_secs: 30,
            header_template: HEADER_TEMPLATE.to_string(),
            footer_template: FOOTER_TEMPLATE.to_string(),
            serve: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("build_dir", &self.build_dir)
            .field("root", &self.root)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cleanup", &self.cleanup)
            .field("chrome_path", &self.chrome_path)
            .field("sandbox", &self.sandbox)
            .field("timeout_secs", &self.timeout_secs)
            .field("serve", &self.serve)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RenderProgressCallback>"),
            )
            .finish()
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }

    /// Base URL of the static server, always ending in `/`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    /// Per-file timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// URL path prefix of the build directory below the server root
    /// (`"build/"`, or `""` when the build directory is the root).
    pub fn build_dir_url_prefix(&self) -> Result<String, Html2PdfError> {
        relative_url_prefix(&self.root, &self.build_dir)
    }
}

/// Compute the URL path of `dir` relative to `root`, with a trailing `/`.
///
/// Both paths are canonicalised when they exist; if either does not, both
/// are made absolute lexically against the working directory instead.
pub(crate) fn relative_url_prefix(root: &Path, dir: &Path) -> Result<String, Html2PdfError> {
    let (root_abs, dir_abs) = match (root.canonicalize(), dir.canonicalize()) {
        (Ok(r), Ok(d)) => (r, d),
        _ => {
            let abs = |p: &Path| {
                std::path::absolute(p)
                    .map_err(|e| Html2PdfError::Internal(format!("cannot resolve {p:?}: {e}")))
            };
            (abs(root)?, abs(dir)?)
        }
    };

    let rel = dir_abs
        .strip_prefix(&root_abs)
        .map_err(|_| Html2PdfError::RootMismatch {
            build_dir: dir.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let mut prefix = String::new();
    for component in rel.components() {
        match component {
            std::path::Component::Normal(part) => {
                prefix.push_str(&part.to_string_lossy());
                prefix.push('/');
            }
            std::path::Component::CurDir => {}
            _ => {
                return Err(Html2PdfError::RootMismatch {
                    build_dir: dir.to_path_buf(),
                    root: root.to_path_buf(),
                })
            }
        }
    }
    Ok(prefix)
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.build_dir = dir.into();
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn cleanup(mut self, scope: CleanupScope) -> Self {
        self.config.cleanup = scope;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn sandbox(mut self, v: bool) -> Self {
        self.config.sandbox = v;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs.max(1);
        self
    }

    pub fn header_template(mut self, html: impl Into<String>) -> Self {
        self.config.header_template = html.into();
        self
    }

    pub fn footer_template(mut self, html: impl Into<String>) -> Self {
        self.config.footer_template = html.into();
        self
    }

    pub fn serve(mut self, v: bool) -> Self {
        self.config.serve = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, Html2PdfError> {
        let c = &self.config;
        if c.port == 0 && !c.serve {
            return Err(Html2PdfError::InvalidConfig(
                "Port 0 is only valid when the pass hosts its own server (--serve)".into(),
            ));
        }
        if c.host.trim().is_empty() {
            return Err(Html2PdfError::InvalidConfig("Host must not be empty".into()));
        }
        if c.build_dir.as_os_str().is_empty() {
            return Err(Html2PdfError::InvalidConfig(
                "Build directory must not be empty".into(),
            ));
        }
        if c.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(Html2PdfError::InvalidConfig(format!(
                "Timeout of {}s exceeds the maximum of {}s",
                c.timeout_secs, MAX_TIMEOUT_SECS
            )));
        }
        relative_url_prefix(&c.root, &c.build_dir)?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which existing PDFs the cleanup step removes before a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CleanupScope {
    /// Every top-level `*.pdf` in the build directory. (default)
    ///
    /// Also removes PDFs whose HTML source has since disappeared, so the
    /// directory holds exactly one PDF per HTML file after a pass.
    #[default]
    AllPdfs,
    /// Only PDFs whose stem matches an HTML file present now.
    Derived,
}

impl std::str::FromStr for CleanupScope {
    type Err = Html2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "all-pdfs" => Ok(CleanupScope::AllPdfs),
            "derived" => Ok(CleanupScope::Derived),
            other => Err(Html2PdfError::InvalidConfig(format!(
                "Unknown cleanup scope '{other}' (expected 'all' or 'derived')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_timeout_is_rejected() {
        let err = RenderConfig::builder()
            .timeout_secs(u64::MAX)
            .build()
            .unwrap_err();
        assert!(matches!(err, Html2PdfError::InvalidConfig(_)), "got: {err}");

        let ok = RenderConfig::builder()
            .timeout_secs(MAX_TIMEOUT_SECS)
            .build()
            .unwrap();
        assert_eq!(ok.timeout_secs, MAX_TIMEOUT_SECS);
    }

    #[test]
    fn defaults_match_fixed_constants() {
        let c = RenderConfig::default();
        assert_eq!(c.port, 8888);
        assert_eq!(c.build_dir, PathBuf::from("build"));
        assert_eq!(c.base_url(), "http://localhost:8888/");
        assert_eq!(c.cleanup, CleanupScope::AllPdfs);
        assert!(c.sandbox);
    }

    #[test]
    fn footer_carries_page_counters() {
        assert!(FOOTER_TEMPLATE.contains("class=\"pageNumber\""));
        assert!(FOOTER_TEMPLATE.contains("class=\"totalPages\""));
        assert!(FOOTER_TEMPLATE.contains("font-size: 12px"));
        assert!(FOOTER_TEMPLATE.contains("text-align: center"));
        assert!(FOOTER_TEMPLATE.contains("color: black"));
        assert!(FOOTER_TEMPLATE.contains("padding-left"));
    }

    #[test]
    fn url_prefix_for_nested_build_dir() {
        let prefix = relative_url_prefix(Path::new("."), Path::new("build")).unwrap();
        assert_eq!(prefix, "build/");

        let prefix = relative_url_prefix(Path::new("."), Path::new("./out/html")).unwrap();
        assert_eq!(prefix, "out/html/");
    }

    #[test]
    fn url_prefix_empty_when_dir_is_root() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = relative_url_prefix(tmp.path(), tmp.path()).unwrap();
        assert_eq!(prefix, "");
    }

    #[test]
    fn build_dir_outside_root_rejected() {
        let root = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let err = RenderConfig::builder()
            .root(root.path())
            .build_dir(other.path())
            .build()
            .unwrap_err();
        assert!(matches!(err, Html2PdfError::RootMismatch { .. }), "got: {err}");
    }

    #[test]
    fn port_zero_requires_serve() {
        assert!(RenderConfig::builder().port(0).build().is_err());
        assert!(RenderConfig::builder().port(0).serve(true).build().is_ok());
    }

    #[test]
    fn timeout_clamped_to_one_second() {
        let c = RenderConfig::builder().timeout_secs(0).build().unwrap();
        assert_eq!(c.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn cleanup_scope_parses() {
        assert_eq!("all".parse::<CleanupScope>().unwrap(), CleanupScope::AllPdfs);
        assert_eq!("Derived".parse::<CleanupScope>().unwrap(), CleanupScope::Derived);
        assert!("some".parse::<CleanupScope>().is_err());
    }
}

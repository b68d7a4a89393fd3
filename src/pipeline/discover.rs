//! File discovery: list `<build-dir>/*.html` and derive the sibling `.pdf`.
//!
//! Matching follows shell-glob rules for `*.html`: one directory level only,
//! extension compared case-sensitively, and dot-files are not matched.

use crate::error::Html2PdfError;
use reqwest::Url;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One HTML file to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    /// Source HTML file.
    pub html: PathBuf,
    /// Destination PDF (same stem, `.pdf` extension, same directory).
    pub pdf: PathBuf,
    /// Where the static server exposes `html`.
    pub url: Url,
}

/// Derive the PDF path for an HTML path by swapping the extension.
pub fn pdf_path_for(html: &Path) -> PathBuf {
    html.with_extension("pdf")
}

/// True when `name` would match the glob `*.html`.
pub fn is_html_name(name: &str) -> bool {
    !name.starts_with('.') && has_extension(name, "html")
}

/// True when `name` would match the glob `*.pdf`.
pub fn is_pdf_name(name: &str) -> bool {
    !name.starts_with('.') && has_extension(name, "pdf")
}

fn has_extension(name: &str, ext: &str) -> bool {
    Path::new(name).extension().is_some_and(|e| e == ext)
}

/// Build the URL of `file_name` inside the directory `prefix` (e.g. `"build/"`)
/// below `base`. Each path segment is percent-encoded.
pub fn file_url(base: &Url, prefix: &str, file_name: &str) -> Result<Url, Html2PdfError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Html2PdfError::InvalidConfig(format!("'{base}' cannot be a base URL")))?;
        segments.pop_if_empty();
        segments.extend(prefix.split('/').filter(|s| !s.is_empty()));
        segments.push(file_name);
    }
    Ok(url)
}

/// Check that `build_dir` exists and is a directory.
pub fn ensure_build_dir(build_dir: &Path) -> Result<(), Html2PdfError> {
    match std::fs::metadata(build_dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Html2PdfError::NotADirectory {
            path: build_dir.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Html2PdfError::BuildDirNotFound {
            path: build_dir.to_path_buf(),
        }),
        Err(e) => Err(Html2PdfError::ReadDirFailed {
            path: build_dir.to_path_buf(),
            source: e,
        }),
    }
}

/// List the top-level file names in `build_dir` accepted by `accept`, sorted.
pub(crate) fn list_files(
    build_dir: &Path,
    accept: impl Fn(&str) -> bool,
) -> Result<Vec<PathBuf>, Html2PdfError> {
    ensure_build_dir(build_dir)?;

    let read_err = |e: std::io::Error| Html2PdfError::ReadDirFailed {
        path: build_dir.to_path_buf(),
        source: e,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(build_dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            debug!("Skipping non-UTF-8 file name {:?}", name);
            continue;
        };
        if !accept(name) {
            continue;
        }
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Discover every HTML file in `build_dir` and pair it with its PDF and URL.
///
/// `base` is the server's base URL and `prefix` the build directory's path
/// below the server root (see [`crate::RenderConfig::build_dir_url_prefix`]).
pub fn discover_html(
    build_dir: &Path,
    base: &Url,
    prefix: &str,
) -> Result<Vec<RenderJob>, Html2PdfError> {
    let jobs = list_files(build_dir, is_html_name)?
        .into_iter()
        .map(|html| {
            let name = html
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let url = file_url(base, prefix, &name)?;
            Ok(RenderJob {
                pdf: pdf_path_for(&html),
                html,
                url,
            })
        })
        .collect::<Result<Vec<_>, Html2PdfError>>()?;

    info!("Discovered {} HTML files in {}", jobs.len(), build_dir.display());
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:8888/").unwrap()
    }

    #[test]
    fn pdf_path_swaps_extension() {
        assert_eq!(pdf_path_for(Path::new("build/aops.html")), PathBuf::from("build/aops.pdf"));
        assert_eq!(
            pdf_path_for(Path::new("build/aops.v2.html")),
            PathBuf::from("build/aops.v2.pdf")
        );
    }

    #[test]
    fn glob_matching_rules() {
        assert!(is_html_name("a.html"));
        assert!(!is_html_name("a.htm"));
        assert!(!is_html_name("a.HTML"));
        assert!(!is_html_name(".hidden.html"));
        assert!(!is_html_name("html"));
        assert!(is_pdf_name("a.pdf"));
        assert!(!is_pdf_name("a.pdf.tmp"));
    }

    #[test]
    fn url_for_file_in_build_dir() {
        let url = file_url(&base(), "build/", "aops.html").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8888/build/aops.html");
    }

    #[test]
    fn url_for_file_at_root() {
        let url = file_url(&base(), "", "aops.html").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8888/aops.html");
    }

    #[test]
    fn url_encodes_special_characters() {
        let url = file_url(&base(), "out dir/", "a b#1.html").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8888/out%20dir/a%20b%231.html");
    }

    #[test]
    fn discover_lists_only_top_level_html_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join("b.html"), "<p>b</p>").unwrap();
        std::fs::write(dir.join("a.html"), "<p>a</p>").unwrap();
        std::fs::write(dir.join("notes.txt"), "x").unwrap();
        std::fs::write(dir.join("old.pdf"), "%PDF").unwrap();
        std::fs::create_dir(dir.join("nested")).unwrap();
        std::fs::write(dir.join("nested/c.html"), "<p>c</p>").unwrap();
        std::fs::create_dir(dir.join("dir.html")).unwrap();

        let jobs = discover_html(dir, &base(), "build/").unwrap();
        let names: Vec<_> = jobs
            .iter()
            .map(|j| j.html.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.html", "b.html"]);
        assert_eq!(jobs[0].pdf, dir.join("a.pdf"));
        assert_eq!(jobs[1].url.as_str(), "http://localhost:8888/build/b.html");
    }

    #[test]
    fn discover_empty_dir_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let jobs = discover_html(tmp.path(), &base(), "").unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn discover_missing_dir_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let err = discover_html(&tmp.path().join("nope"), &base(), "").unwrap_err();
        assert!(matches!(err, Html2PdfError::BuildDirNotFound { .. }), "got: {err}");
    }

    #[test]
    fn discover_file_instead_of_dir_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("build");
        std::fs::write(&file, "").unwrap();
        let err = discover_html(&file, &base(), "").unwrap_err();
        assert!(matches!(err, Html2PdfError::NotADirectory { .. }), "got: {err}");
    }
}

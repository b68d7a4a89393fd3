//! CLI binary for html2pdf.
//!
//! A thin shim over the library crate: three subcommands mapping onto
//! `run_build`, `run_server` and `generate_pdfs`.

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use html2pdf::{
    generate_pdfs, planned_outputs, run_build_status, run_server, BuildCommand, CleanupScope,
    ProgressCallback, RenderConfig, RenderProgressCallback, DEFAULT_BUILD_DIR, DEFAULT_PORT,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a bar anchored at the bottom of the terminal
/// plus one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the file currently rendering (files run one at a time).
    file_start: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_pass_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Probing server, cleaning old PDFs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            file_start: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    /// Remove the bar from the terminal so an error is printed cleanly.
    fn abandon(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
    }

    fn take_elapsed_ms(&self) -> u128 {
        self.file_start
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl RenderProgressCallback for CliProgressCallback {
    fn on_pass_start(&self, total_files: usize, removed_pdfs: usize) {
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold(&format!("Rendering {total_files} HTML files…")),
            dim(&format!("({removed_pdfs} stale PDFs removed)")),
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, html: &Path) {
        if let Ok(mut s) = self.file_start.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(html.display().to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, pdf: &Path, bytes: usize) {
        let elapsed_ms = self.take_elapsed_ms();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            index,
            total,
            pdf.display(),
            dim(&format!("{:>7} bytes", bytes)),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, html: &Path, error: &str) {
        let elapsed_ms = self.take_elapsed_ms();
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index,
            total,
            html.display(),
            red(&msg),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_pass_complete(&self, total_files: usize, rendered: usize) {
        self.bar.finish_and_clear();

        if self.errors.load(Ordering::SeqCst) == 0 && rendered == total_files {
            eprintln!(
                "{} {} PDFs rendered successfully",
                green("✔"),
                bold(&rendered.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} PDFs rendered  ({} not rendered)",
                red("✘"),
                bold(&rendered.to_string()),
                total_files,
                red(&total_files.saturating_sub(rendered).to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate the HTML (runs `cargo run --release`)
  html2pdf run

  # Use a different generator command
  html2pdf run -- make html

  # Terminal 1: serve the working directory on :8888
  html2pdf start-server

  # Terminal 2: rebuild every build/*.html as build/*.pdf
  html2pdf generate-pdf

  # One-shot: host the server for the duration of the pass
  html2pdf generate-pdf --serve

  # See which PDFs a pass would produce
  html2pdf generate-pdf --dry-run

PAGE LAYOUT:
  Header: blank.  Footer: "<pageNumber> / <totalPages>", centered, 12px, black.

ENVIRONMENT VARIABLES:
  HTML2PDF_BUILD_DIR    Directory containing the generated .html files (default: build)
  HTML2PDF_ROOT         Directory served by the static server (default: .)
  HTML2PDF_HOST         Server host name (default: localhost)
  HTML2PDF_PORT         Server port (default: 8888)
  HTML2PDF_CHROME       Path to a Chrome/Chromium binary
  HTML2PDF_NO_SANDBOX   Launch Chrome with --no-sandbox
  HTML2PDF_TIMEOUT      Per-file timeout in seconds (default: 30)
  HTML2PDF_CLEANUP      Stale-PDF cleanup scope: all | derived (default: all)
  RUST_LOG              Overrides the log filter (e.g. html2pdf=debug)
"#;

/// Render a directory of generated HTML files to PDF via headless Chrome.
#[derive(Parser, Debug)]
#[command(
    name = "html2pdf",
    version,
    about = "Render generated HTML files to PDF via a local static server and headless Chrome",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "HTML2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "HTML2PDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the external build command that generates the HTML files.
    Run {
        /// Command to run instead of `cargo run --release`.
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Serve the root directory over HTTP until Ctrl-C.
    StartServer {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Delete derived PDFs, then render one PDF per HTML file.
    GeneratePdf(GenerateArgs),
}

#[derive(Args, Debug, Clone)]
struct ServerArgs {
    /// Directory served by the static server.
    #[arg(long, env = "HTML2PDF_ROOT", default_value = ".")]
    root: PathBuf,

    /// Server host name.
    #[arg(long, env = "HTML2PDF_HOST", default_value = "localhost")]
    host: String,

    /// Server port.
    #[arg(short, long, env = "HTML2PDF_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    server: ServerArgs,

    /// Directory containing the generated .html files.
    #[arg(short, long, env = "HTML2PDF_BUILD_DIR", default_value = DEFAULT_BUILD_DIR)]
    build_dir: PathBuf,

    /// Path to a Chrome/Chromium binary (auto-detected if unset).
    #[arg(long, env = "HTML2PDF_CHROME")]
    chrome: Option<PathBuf>,

    /// Launch Chrome without its sandbox (needed as root in most containers).
    #[arg(long, env = "HTML2PDF_NO_SANDBOX", value_parser = FalseyValueParser::new())]
    no_sandbox: bool,

    /// Per-file navigation/print timeout in seconds.
    #[arg(long, env = "HTML2PDF_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Which existing PDFs to delete first: all, derived.
    #[arg(long, env = "HTML2PDF_CLEANUP", default_value = "all")]
    cleanup: CleanupScope,

    /// Host the static server in-process for this pass.
    #[arg(long, env = "HTML2PDF_SERVE", value_parser = FalseyValueParser::new())]
    serve: bool,

    /// List the PDFs that would be produced and exit.
    #[arg(long)]
    dry_run: bool,

    /// Print the render report as JSON on stdout.
    #[arg(long, env = "HTML2PDF_JSON", value_parser = FalseyValueParser::new())]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "HTML2PDF_NO_PROGRESS", value_parser = FalseyValueParser::new())]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar provides all the feedback that matters during a
    // pass, so library INFO logs are hidden while it is active.
    let show_progress = match &cli.command {
        Commands::GeneratePdf(args) => !cli.quiet && !args.no_progress && !args.json && !args.dry_run,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Run { command } => {
            let command = BuildCommand::from_argv(command);
            let workdir = std::env::current_dir().context("Failed to read working directory")?;
            let status = run_build_status(&command, &workdir)
                .await
                .context("Build command failed to start")?;
            if !status.success() {
                // Mirror the child's exit code; killed-by-signal maps to 1.
                std::process::exit(status.code().unwrap_or(1));
            }
            Ok(())
        }
        Commands::StartServer { server } => run_server(&server.root, &server.host, server.port)
            .await
            .context("Static server failed"),
        Commands::GeneratePdf(args) => generate(args, cli.quiet, show_progress).await,
    }
}

async fn generate(args: GenerateArgs, quiet: bool, show_progress: bool) -> Result<()> {
    if args.dry_run {
        let outputs = planned_outputs(&args.build_dir)
            .with_context(|| format!("Failed to list {:?}", args.build_dir))?;
        for pdf in outputs {
            println!("{}", pdf.display());
        }
        return Ok(());
    }

    let cli_cb = show_progress.then(CliProgressCallback::new_dynamic);
    let progress_cb: Option<ProgressCallback> = cli_cb
        .clone()
        .map(|cb| cb as Arc<dyn RenderProgressCallback>);

    let result = match build_config(&args, progress_cb) {
        Ok(config) => generate_pdfs(&config)
            .await
            .context("PDF generation failed"),
        Err(e) => Err(e),
    };
    if result.is_err() {
        // A pass can fail before on_pass_start ever replaces the spinner.
        if let Some(ref cb) = cli_cb {
            cb.abandon();
        }
    }
    let report = result?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !quiet && !show_progress {
        eprintln!(
            "Rendered {}/{} PDFs in {}ms ({} stale PDFs removed)",
            report.stats.rendered,
            report.stats.discovered,
            report.stats.total_duration_ms,
            report.stats.removed_pdfs
        );
    }

    Ok(())
}

/// Map CLI args to `RenderConfig`.
fn build_config(args: &GenerateArgs, progress: Option<ProgressCallback>) -> Result<RenderConfig> {
    let mut builder = RenderConfig::builder()
        .build_dir(&args.build_dir)
        .root(&args.server.root)
        .host(&args.server.host)
        .port(args.server.port)
        .cleanup(args.cleanup)
        .sandbox(!args.no_sandbox)
        .timeout_secs(args.timeout)
        .serve(args.serve);

    if let Some(ref chrome) = args.chrome {
        builder = builder.chrome_path(chrome);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_generate(argv: &[&str]) -> GenerateArgs {
        let mut full = vec!["html2pdf", "generate-pdf"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).expect("valid args").command {
            Commands::GeneratePdf(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn generate_defaults() {
        let args = parse_generate(&["--build-dir", "out"]);
        assert_eq!(args.build_dir, PathBuf::from("out"));
        assert_eq!(args.server.port, 8888);
        assert_eq!(args.timeout, 30);
        assert!(!args.dry_run);
    }

    #[test]
    fn boolean_env_vars_accept_numeric_values() {
        std::env::set_var("HTML2PDF_NO_SANDBOX", "1");
        std::env::set_var("HTML2PDF_SERVE", "0");
        let args = parse_generate(&[]);
        std::env::remove_var("HTML2PDF_NO_SANDBOX");
        std::env::remove_var("HTML2PDF_SERVE");

        assert!(args.no_sandbox);
        assert!(!args.serve);
    }

    #[test]
    fn oversized_timeout_is_a_config_error() {
        let args = parse_generate(&["--timeout", "18446744073709551615", "--serve"]);
        let err = build_config(&args, None).unwrap_err();
        assert!(format!("{err:#}").contains("exceeds the maximum"), "got: {err:#}");
    }

    #[test]
    fn abandon_clears_the_preparing_spinner() {
        let cb = CliProgressCallback::new_dynamic();
        cb.bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        assert!(!cb.bar.is_finished());
        cb.abandon();
        assert!(cb.bar.is_finished());
        // A second call after a finished pass is harmless.
        cb.abandon();
    }
}

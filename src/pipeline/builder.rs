//! Run the external program that generates the HTML files.
//!
//! The command is opaque: its stdio is inherited so the operator sees the
//! compiler and program output directly, and its exit status is reported
//! back unchanged.

use crate::error::Html2PdfError;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::info;

/// The default build-and-run command.
pub const DEFAULT_BUILD_COMMAND: [&str; 3] = ["cargo", "run", "--release"];

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for BuildCommand {
    fn default() -> Self {
        Self {
            program: DEFAULT_BUILD_COMMAND[0].to_string(),
            args: DEFAULT_BUILD_COMMAND[1..].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl BuildCommand {
    /// Build from an argv list. An empty list yields the default command.
    pub fn from_argv<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut it = argv.into_iter().map(Into::into);
        match it.next() {
            Some(program) => Self {
                program,
                args: it.collect(),
            },
            None => Self::default(),
        }
    }

    /// Shell-like rendering for logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Run `command` in `workdir` with inherited stdio and return its exit status.
///
/// A status is returned even when it is non-zero; use [`run_build`] to turn
/// that into an error.
pub async fn run_build_status(
    command: &BuildCommand,
    workdir: &Path,
) -> Result<ExitStatus, Html2PdfError> {
    info!("Running build command: {}", command.display());
    Command::new(&command.program)
        .args(&command.args)
        .current_dir(workdir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| Html2PdfError::BuildCommandSpawn {
            command: command.display(),
            source: e,
        })
}

/// Run `command` and fail unless it exits successfully.
pub async fn run_build(command: &BuildCommand, workdir: &Path) -> Result<(), Html2PdfError> {
    let status = run_build_status(command, workdir).await?;
    if status.success() {
        info!("Build command finished successfully");
        Ok(())
    } else {
        Err(Html2PdfError::BuildCommandFailed {
            command: command.display(),
            code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_cargo_run_release() {
        assert_eq!(BuildCommand::default().display(), "cargo run --release");
    }

    #[test]
    fn from_argv_splits_program_and_args() {
        let cmd = BuildCommand::from_argv(["make", "html", "-j4"]);
        assert_eq!(cmd.program, "make");
        assert_eq!(cmd.args, vec!["html", "-j4"]);
    }

    #[test]
    fn from_empty_argv_is_default() {
        let cmd = BuildCommand::from_argv(Vec::<String>::new());
        assert_eq!(cmd, BuildCommand::default());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_command() {
        let tmp = tempfile::tempdir().unwrap();
        let cmd = BuildCommand::from_argv(["sh", "-c", "echo '<p>x</p>' > a.html"]);
        run_build(&cmd, tmp.path()).await.unwrap();
        assert!(tmp.path().join("a.html").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_reports_exit_code() {
        let tmp = tempfile::tempdir().unwrap();
        let cmd = BuildCommand::from_argv(["sh", "-c", "exit 3"]);
        let err = run_build(&cmd, tmp.path()).await.unwrap_err();
        assert!(
            matches!(err, Html2PdfError::BuildCommandFailed { code: Some(3), .. }),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let tmp = tempfile::tempdir().unwrap();
        let cmd = BuildCommand::from_argv(["definitely-not-a-real-program-html2pdf"]);
        let err = run_build(&cmd, tmp.path()).await.unwrap_err();
        assert!(matches!(err, Html2PdfError::BuildCommandSpawn { .. }), "got: {err}");
    }
}

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::{io::AsyncWriteExt, process::Command, time};
use tracing::debug;

use crate::{error::Error, types::ProcessOutput};

/// Runs an external command to completion and captures its output.
///
/// A non-zero exit code is a normal outcome and is returned in
/// [`ProcessOutput`]; only failures of the environment (missing binary,
/// spawn or I/O errors, timeout) are errors.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// `command[0]` is the program, the rest are passed verbatim as arguments.
    /// When `input` is given it is written to stdin, which is then closed,
    /// before the output is collected; otherwise stdin is null.
    async fn execute(
        &self,
        command: &[String],
        input: Option<&str>,
        working_dir: &Path,
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, Error>;
}

/// [`ProcessRunner`] backed by the host OS.
///
/// Arguments are handed to the OS as an argument vector and never pass
/// through a shell, so whitespace and shell metacharacters in paths or
/// source-derived values are not interpreted.
#[derive(Debug, Default, Clone)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn resolve_program(program: &str) -> Result<PathBuf, Error> {
        let path = Path::new(program);
        if path.components().count() > 1 || path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        which::which(program).map_err(|_| Error::ToolNotFound(program.to_string()))
    }
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn execute(
        &self,
        command: &[String],
        input: Option<&str>,
        working_dir: &Path,
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, Error> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Config("empty command".to_string()))?;
        let program_path = Self::resolve_program(program)?;

        debug!("Process execute - Program: {:?}", program_path);
        debug!("Process execute - Args: {:?}", args);
        debug!("Process execute - Working dir: {:?}", working_dir);

        let mut child = Command::new(&program_path)
            .args(args)
            .current_dir(working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn {
                command: program.clone(),
                source,
            })?;

        if let Some(input_str) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input_str.as_bytes()).await?;
                // Explicitly close stdin to signal EOF
                drop(stdin);
            }
        }

        // On timeout the child future is dropped, and kill_on_drop kills the process
        let output = match timeout {
            Some(limit) => time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| Error::Timeout(limit))??,
            None => child.wait_with_output().await?,
        };

        Ok(ProcessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Renders a command for log output: arguments under `base_dir` are shown
/// relative to it as `./name`, and arguments containing whitespace are quoted.
pub fn render_command(command: &[String], base_dir: &Path) -> String {
    command
        .iter()
        .map(|arg| {
            let shown = Path::new(arg)
                .strip_prefix(base_dir)
                .ok()
                .filter(|rel| !rel.as_os_str().is_empty())
                .map(|rel| Path::new(".").join(rel).display().to_string())
                .unwrap_or_else(|| arg.clone());
            if shown.contains(char::is_whitespace) {
                format!("\"{}\"", shown)
            } else {
                shown
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

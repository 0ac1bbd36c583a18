use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use which::which;

use crate::{BridgeConfig, Error, ProcessOutput, ProcessRunner, ToolchainConfig};

pub mod defaults {
    use super::*;

    /// Config rooted at `base_dir` with the default Kotlin toolchain
    pub fn test_config(base_dir: &Path) -> BridgeConfig {
        BridgeConfig::new(base_dir)
            .with_toolchain(ToolchainConfig::kotlin())
            .with_max_concurrent(4)
    }

    pub fn count_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .map(|entries| entries.count())
            .unwrap_or_default()
    }
}

pub(crate) fn skip_if_not_available(tools: &[&str]) -> bool {
    let missing: Vec<_> = tools
        .iter()
        .filter(|tool| which(**tool).is_err())
        .map(|s| (*s).to_string())
        .collect();

    if !missing.is_empty() {
        eprintln!("Skipping test: {} not available", missing.join(", "));
        return true;
    }
    false
}

/// One invocation seen by [`ScriptedRunner`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub command: Vec<String>,
    pub input: Option<String>,
    pub working_dir: PathBuf,
    pub timeout: Option<Duration>,
}

type Handler = dyn Fn(&[String]) -> Result<ProcessOutput, Error> + Send + Sync;

/// Process runner that answers from a closure instead of spawning anything
pub struct ScriptedRunner {
    handler: Box<Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&[String]) -> Result<ProcessOutput, Error> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Compiler succeeds and leaves an artifact; the program prints `stdout`
    /// and `stderr` and exits with `exit_code`.
    pub fn compiles_and_prints(stdout: &str, stderr: &str, exit_code: i32) -> Self {
        let stdout = stdout.to_string();
        let stderr = stderr.to_string();
        Self::new(move |command| {
            if is_compile(command) {
                std::fs::write(&command[4], b"PK")?;
                Ok(exit_with(0, "", ""))
            } else {
                Ok(exit_with(exit_code, &stdout, &stderr))
            }
        })
    }

    /// Compiler exits 1 with `stderr`
    pub fn fails_to_compile(stderr: &str) -> Self {
        let stderr = stderr.to_string();
        Self::new(move |_| Ok(exit_with(1, "", &stderr)))
    }

    /// "Compiles" by copying the source into the artifact; "running" the
    /// artifact prints its content. Output therefore depends only on the
    /// request that produced the artifact.
    pub fn echoes_source() -> Self {
        Self::new(|command| {
            if is_compile(command) {
                std::fs::copy(&command[1], &command[4])?;
                Ok(exit_with(0, "", ""))
            } else {
                let content = std::fs::read_to_string(&command[2])?;
                Ok(exit_with(0, &content, ""))
            }
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn execute(
        &self,
        command: &[String],
        input: Option<&str>,
        working_dir: &Path,
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, Error> {
        self.calls.lock().unwrap().push(RecordedCall {
            command: command.to_vec(),
            input: input.map(str::to_string),
            working_dir: working_dir.to_path_buf(),
            timeout,
        });
        (self.handler)(command)
    }
}

/// Process runner whose processes never finish
#[derive(Default)]
pub struct HangingRunner {
    started: Notify,
}

impl HangingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once the first process has been started
    pub async fn started(&self) {
        self.started.notified().await
    }
}

#[async_trait]
impl ProcessRunner for HangingRunner {
    async fn execute(
        &self,
        _command: &[String],
        _input: Option<&str>,
        _working_dir: &Path,
        _timeout: Option<Duration>,
    ) -> Result<ProcessOutput, Error> {
        self.started.notify_one();
        std::future::pending().await
    }
}

pub fn is_compile(command: &[String]) -> bool {
    command.first().map(String::as_str) == Some("kotlinc")
}

pub fn exit_with(exit_code: i32, stdout: &str, stderr: &str) -> ProcessOutput {
    ProcessOutput {
        exit_code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

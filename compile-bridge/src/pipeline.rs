//! Per-request compile-and-run orchestration
//!
//! Validating -> Preparing -> Compiling -> (CompileFailed | Compiled)
//! -> Running -> Cleanup -> Done. Cleanup runs on every path that allocated
//! a workspace, and every failure is folded into a [`CompileRunResult`].

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    config::BridgeConfig,
    diagnostics::parse_diagnostics,
    error::Error,
    process::{render_command, ProcessRunner},
    types::{CompileRequest, CompileRunResult},
    workspace::Workspace,
};

/// Pipeline stage, recorded on log events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Preparing,
    Compiling,
    CompileFailed,
    Compiled,
    Running,
    Cleanup,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Preparing => "preparing",
            Stage::Compiling => "compiling",
            Stage::CompileFailed => "compile_failed",
            Stage::Compiled => "compiled",
            Stage::Running => "running",
            Stage::Cleanup => "cleanup",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

pub struct CompileRunPipeline {
    config: Arc<BridgeConfig>,
    runner: Arc<dyn ProcessRunner>,
}

impl CompileRunPipeline {
    pub fn new(config: Arc<BridgeConfig>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Runs one request to completion. Never fails: validation, compile and
    /// environment errors are all reported through the returned result.
    pub async fn run(&self, request: CompileRequest) -> CompileRunResult {
        let request_id = new_request_id();
        let span = info_span!("request", id = %request_id);
        self.run_stages(&request_id, request).instrument(span).await
    }

    /// Rejects requests whose file name does not carry the source extension
    pub fn validate(&self, request: &CompileRequest) -> Result<(), Error> {
        let extension = &self.config.toolchain.source_extension;
        if request.has_extension(extension) {
            Ok(())
        } else {
            Err(Error::UnsupportedExtension(extension.clone()))
        }
    }

    async fn run_stages(&self, request_id: &str, request: CompileRequest) -> CompileRunResult {
        info!(stage = %Stage::Validating, "Received request for {}", request.file_name);

        if let Err(e) = self.validate(&request) {
            warn!(stage = %Stage::Validating, "Rejected request: {}", e);
            return CompileRunResult::fatal(e.to_string());
        }

        let mut workspace = Workspace::allocate(
            &self.config.base_dir,
            &self.config.toolchain,
            request_id,
        );

        let result = match self.compile_and_run(&mut workspace, &request.code).await {
            Ok(result) => result,
            Err(e) => {
                error!("Fatal error: {}", e);
                CompileRunResult::fatal(e.to_string())
            }
        };

        workspace.dispose().await;
        info!(stage = %Stage::Cleanup, "Request cleaned up");
        info!(stage = %Stage::Done, ok = result.ok, errors = result.errors.len(), "Request finished");

        result
    }

    async fn compile_and_run(
        &self,
        workspace: &mut Workspace,
        code: &str,
    ) -> Result<CompileRunResult, Error> {
        let toolchain = &self.config.toolchain;
        let base_dir = &self.config.base_dir;

        info!(stage = %Stage::Preparing, workspace = workspace.id(), "Preparing workspace");
        workspace.materialize(code).await?;

        let compile_cmd =
            toolchain.compile_command(workspace.source_path(), workspace.artifact_path());
        info!(stage = %Stage::Compiling, "{}", render_command(&compile_cmd, base_dir));
        let compiled = self
            .runner
            .execute(&compile_cmd, None, base_dir, self.config.compile_timeout)
            .await?;

        if !compiled.success() {
            let errors = parse_diagnostics(&compiled.stderr);
            error!(
                stage = %Stage::CompileFailed,
                exit_code = compiled.exit_code,
                diagnostics = errors.len(),
                "Compilation failed"
            );
            return Ok(CompileRunResult::failure(errors));
        }
        info!(stage = %Stage::Compiled, "Compilation succeeded");

        // stdin is always present and empty; reserved for interactive input
        let run_cmd = toolchain.run_command(workspace.artifact_path());
        info!(stage = %Stage::Running, "{}", render_command(&run_cmd, base_dir));
        let ran = self
            .runner
            .execute(&run_cmd, Some(""), base_dir, self.config.run_timeout)
            .await?;
        info!(
            stage = %Stage::Running,
            exit_code = ran.exit_code,
            "Execution finished"
        );

        Ok(CompileRunResult::success(ran.combined_output()))
    }
}

/// Short id used in log spans and generated file names
fn new_request_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

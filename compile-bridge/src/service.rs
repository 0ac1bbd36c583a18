use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::{
    config::BridgeConfig,
    error::Error,
    pipeline::CompileRunPipeline,
    process::{ProcessRunner, SystemProcessRunner},
    types::{CompileRequest, CompileRunResult},
};

/// Shares one pipeline across concurrent requests and caps how many run at once
#[derive(Clone)]
pub struct CompileService {
    pipeline: Arc<CompileRunPipeline>,
    semaphore: Arc<Semaphore>,
}

impl CompileService {
    /// Service running the configured toolchain on the host
    pub fn new(config: BridgeConfig) -> Result<Self, Error> {
        Self::with_runner(config, Arc::new(SystemProcessRunner::new()))
    }

    pub fn with_runner(config: BridgeConfig, runner: Arc<dyn ProcessRunner>) -> Result<Self, Error> {
        let config = config.validate()?;
        let max_concurrent = config.max_concurrent;

        info!(
            base_dir = %config.base_dir.display(),
            compiler = %config.toolchain.compiler,
            runtime = %config.toolchain.runtime,
            max_concurrent,
            "Compile service ready"
        );
        warn!("Submitted programs run unsandboxed with the privileges of this service");

        Ok(Self {
            pipeline: Arc::new(CompileRunPipeline::new(Arc::new(config), runner)),
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        self.pipeline.config()
    }

    pub async fn execute(&self, request: CompileRequest) -> CompileRunResult {
        // Acquire execution permit
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                error!("Failed to acquire execution permit: {}", e);
                return CompileRunResult::fatal(format!(
                    "Failed to acquire execution permit: {}",
                    e
                ));
            }
        };

        debug!(
            "Starting compile-and-run for {} ({} available slots)",
            request.file_name,
            self.semaphore.available_permits()
        );

        self.pipeline.run(request).await
    }

    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }
}

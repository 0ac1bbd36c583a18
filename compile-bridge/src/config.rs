use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

/// External compiler and runtime for the one supported language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainConfig {
    /// Source file extension, without the leading dot
    pub source_extension: String,
    /// Artifact file extension, without the leading dot
    pub artifact_extension: String,
    /// Compiler executable (name on PATH or absolute path)
    pub compiler: String,
    /// Flag that makes the compiler bundle its runtime into the artifact
    pub bundle_runtime_flag: String,
    /// Flag preceding the artifact output path
    pub output_flag: String,
    /// Runtime launcher executable
    pub runtime: String,
    /// Flag preceding the artifact path when launching it
    pub run_flag: String,
}

impl ToolchainConfig {
    /// kotlinc + java, producing a self-contained jar
    pub fn kotlin() -> Self {
        Self {
            source_extension: "kt".to_string(),
            artifact_extension: "jar".to_string(),
            compiler: "kotlinc".to_string(),
            bundle_runtime_flag: "-include-runtime".to_string(),
            output_flag: "-d".to_string(),
            runtime: "java".to_string(),
            run_flag: "-jar".to_string(),
        }
    }

    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = compiler.into();
        self
    }

    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self
    }

    /// `[compiler, source, bundle-runtime flag, output flag, artifact]`
    pub fn compile_command(&self, source: &Path, artifact: &Path) -> Vec<String> {
        vec![
            self.compiler.clone(),
            source.to_string_lossy().into_owned(),
            self.bundle_runtime_flag.clone(),
            self.output_flag.clone(),
            artifact.to_string_lossy().into_owned(),
        ]
    }

    /// `[runtime, run flag, artifact]`
    pub fn run_command(&self, artifact: &Path) -> Vec<String> {
        vec![
            self.runtime.clone(),
            self.run_flag.clone(),
            artifact.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self::kotlin()
    }
}

/// Process-wide configuration, built once at startup and shared read-only
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub toolchain: ToolchainConfig,
    /// Directory holding every generated source and artifact file
    pub base_dir: PathBuf,
    /// Upper bound on the compiler invocation; `None` waits indefinitely
    pub compile_timeout: Option<Duration>,
    /// Upper bound on the artifact invocation; `None` waits indefinitely
    pub run_timeout: Option<Duration>,
    /// Maximum number of pipelines running at once
    pub max_concurrent: usize,
}

impl BridgeConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            toolchain: ToolchainConfig::kotlin(),
            base_dir: base_dir.into(),
            compile_timeout: Some(Duration::from_secs(120)),
            run_timeout: None,
            max_concurrent: 10,
        }
    }

    pub fn with_toolchain(mut self, toolchain: ToolchainConfig) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn with_timeouts(
        mut self,
        compile_timeout: Option<Duration>,
        run_timeout: Option<Duration>,
    ) -> Self {
        self.compile_timeout = compile_timeout;
        self.run_timeout = run_timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Checks invariants and makes `base_dir` absolute
    pub fn validate(mut self) -> Result<Self, Error> {
        if self.max_concurrent == 0 {
            return Err(Error::Config(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.toolchain.source_extension.is_empty() {
            return Err(Error::Config("source extension is empty".to_string()));
        }
        if !self.base_dir.is_dir() {
            return Err(Error::Config(format!(
                "base directory {} does not exist",
                self.base_dir.display()
            )));
        }
        if self.base_dir.is_relative() {
            self.base_dir = std::path::absolute(&self.base_dir)?;
        }
        Ok(self)
    }
}

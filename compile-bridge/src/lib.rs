//! # Compile Bridge
//!
//! Compile-and-run service core for a single compiled language. Each request
//! gets its own uniquely named source and artifact files, is compiled with the
//! external compiler, and on success the artifact is launched with the
//! external runtime. Compiler errors come back as structured diagnostics and
//! the generated files are removed on every path.

mod config;
mod diagnostics;
mod error;
mod pipeline;
mod process;
mod service;
mod types;
mod workspace;

#[cfg(test)]
mod tests;

pub use config::{BridgeConfig, ToolchainConfig};
pub use diagnostics::parse_diagnostics;
pub use error::Error;
pub use pipeline::{CompileRunPipeline, Stage};
pub use process::{render_command, ProcessRunner, SystemProcessRunner};
pub use service::CompileService;
pub use types::{CompileRequest, CompileRunResult, Diagnostic, ProcessOutput};
pub use workspace::Workspace;

/// Result type for compile bridge operations
pub type Result<T> = std::result::Result<T, Error>;

use serde::{Deserialize, Serialize};

/// Compile-and-run request as posted by the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
    /// Declared name of the source file; only its extension is used
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// Raw source text
    #[serde(default)]
    pub code: String,
}

fn default_file_name() -> String {
    "Main.kt".to_string()
}

impl CompileRequest {
    pub fn new(file_name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            code: code.into(),
        }
    }

    /// Case-insensitive check of the declared file name against `extension`
    /// (given without the leading dot).
    pub fn has_extension(&self, extension: &str) -> bool {
        let suffix = format!(".{}", extension.to_ascii_lowercase());
        self.file_name.to_ascii_lowercase().ends_with(&suffix)
    }
}

/// One compiler error record. `line == 0` means no line information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: u64,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: u64, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    /// Diagnostic without line information
    pub fn unlocated(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }
}

/// Outcome of one pipeline run, serialized as the HTTP response body.
///
/// Built only through [`CompileRunResult::success`] and
/// [`CompileRunResult::failure`], so a successful result never carries
/// errors and a failed one never carries output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRunResult {
    pub ok: bool,
    pub output: String,
    pub errors: Vec<Diagnostic>,
}

impl CompileRunResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            ok: true,
            output: output.into(),
            errors: Vec::new(),
        }
    }

    pub fn failure(errors: Vec<Diagnostic>) -> Self {
        Self {
            ok: false,
            output: String::new(),
            errors,
        }
    }

    /// Failure carrying a single unlocated diagnostic
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::failure(vec![Diagnostic::unlocated(message)])
    }
}

/// Captured result of one external process invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or -1 when the process was terminated by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout, falling back to stderr when stdout is empty
    pub fn combined_output(self) -> String {
        if self.stdout.is_empty() {
            self.stderr
        } else {
            self.stdout
        }
    }
}

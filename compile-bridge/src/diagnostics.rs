//! Compiler diagnostic parsing
//!
//! kotlinc reports errors one per line as `path:line:column: message`,
//! followed by context lines (the offending source line, a caret marker).
//! Only the located lines become diagnostics.

use crate::types::Diagnostic;

/// Parses a compiler's stderr into structured diagnostics.
///
/// Falls back to a single unlocated diagnostic carrying the whole trimmed
/// stream when no line matches, so a failed compile with any stderr output
/// always produces at least one record.
pub fn parse_diagnostics(stderr: &str) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = stderr.lines().filter_map(parse_line).collect();

    let trimmed = stderr.trim();
    if diagnostics.is_empty() && !trimmed.is_empty() {
        diagnostics.push(Diagnostic::unlocated(trimmed));
    }

    diagnostics
}

/// Line numbers that do not fit in a `u64` make the line unstructured.
fn parse_line(line: &str) -> Option<Diagnostic> {
    let parts: Vec<&str> = line.splitn(4, ':').collect();
    if parts.len() < 4 {
        return None;
    }

    let line_no = parts[1].trim();
    if line_no.is_empty() || !line_no.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(Diagnostic::new(line_no.parse().ok()?, parts[3].trim()))
}

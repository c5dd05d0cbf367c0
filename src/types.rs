use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity tier of a reported finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Normal,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Normal => "normal",
            Severity::Low => "low",
        };
        f.write_str(s)
    }
}

/// A reportable finding attributed to a file and optionally a line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Name of the plugin that produced the finding
    pub plugin: String,
    /// File path as reported by the tool
    pub file: String,
    /// First affected line (1-indexed), unknown when the change starts the file
    pub line: Option<u32>,
    pub severity: Severity,
    /// Rendered message, usually a fenced diff snippet
    pub message: String,
}

//! Turns a fixer report into violations.
//!
//! Every hunk of every file becomes one violation located at the first
//! modified line of the hunk. Files that list applied fixers get one extra,
//! unlocated, summary violation.

use tracing::debug;

use super::report::FixerReport;
use crate::error::PluginError;
use crate::types::{Severity, Violation};
use crate::util::diff::{self, Chunk, LineKind};

/// Tracks the first modified line while walking a hunk.
///
/// Starts `Counting` from the hunk's declared start and advances over
/// unchanged lines. The first added or removed line freezes it. A hunk that
/// starts at line 0 is frozen immediately with no usable line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FirstModifiedLine {
    Counting(u32),
    Frozen(Option<u32>),
}

impl FirstModifiedLine {
    fn new(start: u32) -> Self {
        if start == 0 {
            Self::Frozen(None)
        } else {
            Self::Counting(start)
        }
    }

    fn observe(self, kind: LineKind) -> Self {
        match (self, kind) {
            (Self::Counting(line), LineKind::Unchanged) => Self::Counting(line.saturating_add(1)),
            (Self::Counting(line), _) => Self::Frozen(Some(line)),
            (frozen, _) => frozen,
        }
    }

    fn line(self) -> Option<u32> {
        match self {
            Self::Counting(line) => Some(line),
            Self::Frozen(line) => line,
        }
    }
}

/// Violations found in one report
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub violations: Vec<Violation>,
    /// Number of hunks; fixer summaries are not counted
    pub count: u64,
}

/// Locate the first modified line of a hunk and render it as diff text
fn walk_chunk(chunk: &Chunk) -> (Option<u32>, Vec<String>) {
    let mut cursor = FirstModifiedLine::new(chunk.start);
    let mut snippet = Vec::with_capacity(chunk.lines.len());
    for line in &chunk.lines {
        snippet.push(line.render());
        cursor = cursor.observe(line.kind);
    }
    (cursor.line(), snippet)
}

/// Extract violations from a fixer report.
///
/// `label` is the human name of the tool used in messages.
pub fn extract(report: &FixerReport, plugin: &str, label: &str) -> Result<Extraction, PluginError> {
    let mut extraction = Extraction::default();

    for file in &report.files {
        let diffs = diff::parse(&file.diff).map_err(|source| PluginError::Diff {
            file: file.name.clone(),
            source,
        })?;

        for chunk in diffs.iter().flat_map(|d| &d.chunks) {
            let (line, snippet) = walk_chunk(chunk);
            extraction.count += 1;
            extraction.violations.push(Violation {
                plugin: plugin.to_string(),
                file: file.name.clone(),
                line,
                severity: Severity::Low,
                message: format!("{} suggestion:\n```diff\n{}\n```", label, snippet.join("\n")),
            });
        }

        if !file.applied_fixers.is_empty() {
            extraction.violations.push(Violation {
                plugin: plugin.to_string(),
                file: file.name.clone(),
                line: None,
                severity: Severity::Low,
                message: format!("{} failed fixers: {}", label, file.applied_fixers.join(", ")),
            });
        }
    }

    debug!(
        "Extracted {} violation(s) from {} hunk(s) in {} file(s)",
        extraction.violations.len(),
        extraction.count,
        report.files.len()
    );
    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::report::{FileReport, parse_report};

    fn file(name: &str, diff: &str, fixers: &[&str]) -> FileReport {
        FileReport {
            name: name.into(),
            applied_fixers: fixers.iter().map(|s| s.to_string()).collect(),
            diff: diff.into(),
        }
    }

    fn run(files: Vec<FileReport>) -> Extraction {
        extract(&FixerReport { files }, "cs_fixer", "Fixer").unwrap()
    }

    #[test]
    fn test_first_change_after_context() {
        let out = run(vec![file("a.php", "@@ -3,2 +3,3 @@\n unchanged\n-old\n+new\n", &[])]);
        assert_eq!(out.count, 1);
        assert_eq!(out.violations.len(), 1);
        let v = &out.violations[0];
        assert_eq!(v.line, Some(4));
        assert_eq!(v.severity, Severity::Low);
        assert_eq!(v.file, "a.php");
        assert_eq!(v.message, "Fixer suggestion:\n```diff\n unchanged\n-old\n+new\n```");
    }

    #[test]
    fn test_start_zero_has_no_line() {
        let out = run(vec![file("a.php", "@@ -0,0 +1,2 @@\n+<?php\n+\n", &[])]);
        assert_eq!(out.violations[0].line, None);
    }

    #[test]
    fn test_change_on_first_line() {
        let out = run(vec![file("a.php", "@@ -1,2 +1,2 @@\n-a\n+b\n c\n", &[])]);
        assert_eq!(out.violations[0].line, Some(1));
    }

    #[test]
    fn test_cursor_freezes_after_first_change() {
        let out = run(vec![file(
            "a.php",
            "@@ -10,6 +10,6 @@\n a\n b\n-c\n+C\n d\n e\n-f\n+F\n",
            &[],
        )]);
        assert_eq!(out.violations[0].line, Some(12));
    }

    #[test]
    fn test_one_violation_per_chunk_not_per_line() {
        let out = run(vec![
            file("a.php", "@@ -1 +1 @@\n-a\n+b\n@@ -20,2 +20,2 @@\n x\n-y\n+z\n", &[]),
            file("b.php", "@@ -5,3 +5,1 @@\n-p\n-q\n-r\n+s\n", &[]),
        ]);
        assert_eq!(out.count, 3);
        let lines: Vec<_> = out.violations.iter().map(|v| v.line).collect();
        assert_eq!(lines, vec![Some(1), Some(21), Some(5)]);
    }

    #[test]
    fn test_applied_fixers_add_summary() {
        let out = run(vec![
            file("a.php", "@@ -1 +1 @@\n-a\n+b\n", &["braces", "no_trailing_whitespace"]),
            file("b.php", "@@ -2 +2 @@\n-a\n+b\n", &[]),
        ]);
        assert_eq!(out.count, 2);
        assert_eq!(out.violations.len(), 3);
        let summary = &out.violations[1];
        assert_eq!(summary.file, "a.php");
        assert_eq!(summary.line, None);
        assert_eq!(summary.message, "Fixer failed fixers: braces, no_trailing_whitespace");
    }

    #[test]
    fn test_single_chunk_per_file_yields_one_violation_each() {
        let files: Vec<_> = (1..=5)
            .map(|i| file(&format!("f{i}.php"), "@@ -7,2 +7,2 @@\n x\n-y\n+z\n", &[]))
            .collect();
        let out = run(files);
        assert_eq!(out.count, 5);
        assert_eq!(out.violations.len(), 5);
        assert!(out.violations.iter().all(|v| v.line == Some(8)));
    }

    #[test]
    fn test_unparsable_diff_is_fatal() {
        let report = FixerReport {
            files: vec![file("a.php", "garbage\n", &[])],
        };
        let err = extract(&report, "cs_fixer", "Fixer").unwrap_err();
        assert!(matches!(err, PluginError::Diff { ref file, .. } if file == "a.php"));
    }

    #[test]
    fn test_end_to_end_report() {
        let report = parse_report(
            "cs_fixer",
            r#"{"files":[{"name":"a.php","diff":"@@ -3,2 +3,3 @@\n unchanged\n-old\n+new\n"}]}"#,
        )
        .unwrap();
        let out = extract(&report, "cs_fixer", "Fixer").unwrap();
        assert_eq!(out.count, 1);
        assert_eq!(out.violations[0].line, Some(4));
    }

    #[test]
    fn test_state_machine() {
        let s = FirstModifiedLine::new(5)
            .observe(LineKind::Unchanged)
            .observe(LineKind::Added)
            .observe(LineKind::Unchanged);
        assert_eq!(s, FirstModifiedLine::Frozen(Some(6)));
        assert_eq!(FirstModifiedLine::new(0).observe(LineKind::Unchanged).line(), None);
    }
}

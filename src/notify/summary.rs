//! Condenses a build log into a per-plugin Markdown summary.

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{trace, warn};

use crate::context::SECTION_MARKER;

/// SGR colour sequences introduced by ESC
static ANSI_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[(?:\d{1,3};)*\d{0,3}m").expect("valid ANSI regex"));

/// Colour codes that reach the log with their ESC byte already lost.
/// `/[0m` must come before `[0m`.
const BARE_COLOR_CODES: &[&str] = &["[0;32m", "[0;31m", "/[0m", "[0m"];

pub fn strip_ansi(text: &str) -> String {
    let mut out = ANSI_COLOR.replace_all(text, "").into_owned();
    for code in BARE_COLOR_CODES {
        out = out.replace(code, "");
    }
    out
}

/// Decides which log sections appear in a summary and how
#[derive(Debug, Clone)]
pub struct LogSummary {
    skip: GlobSet,
    header_only: GlobSet,
}

impl LogSummary {
    /// Build from glob patterns; invalid patterns are logged and ignored
    pub fn new(skip: &[String], header_only: &[String]) -> Self {
        Self {
            skip: build_globset(skip),
            header_only: build_globset(header_only),
        }
    }

    /// Render `log` as Markdown: a bold header per plugin section followed by
    /// its output in a code fence.
    ///
    /// Sections matching the skip patterns or named in `quiet` are left out;
    /// header-only sections keep their header but not their output. Text
    /// before the first section marker is ignored.
    pub fn summarize(&self, log: &str, quiet: &BTreeSet<String>) -> String {
        let log = strip_ansi(log);
        let mut out = String::new();

        for section in log.split(SECTION_MARKER).skip(1) {
            let (name, body) = match section.split_once('\n') {
                Some((name, body)) => (name.trim(), body),
                None => (section.trim(), ""),
            };
            if name.is_empty() {
                continue;
            }
            if self.skip.is_match(name) || quiet.contains(name) {
                trace!("Skipping log section '{}'", name);
                continue;
            }

            out.push_str(&format!("*{}{}*\n", SECTION_MARKER, name));
            if !self.header_only.is_match(name) {
                out.push_str(&format!("```\n{}\n```\n", body.trim_end()));
            }
        }

        out
    }
}

fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!("Invalid section pattern '{}': {}", pattern, e),
        }
    }
    builder.build().unwrap_or_else(|e| {
        warn!("Failed to build section patterns: {}", e);
        GlobSet::empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> LogSummary {
        LogSummary::new(
            &["php_loc".into(), "*_notify".into()],
            &["composer".into()],
        )
    }

    fn sections(out: &str) -> usize {
        out.matches("*RUNNING PLUGIN: ").count()
    }

    #[test]
    fn test_skipped_section_is_omitted() {
        let log = "RUNNING PLUGIN: php_cs_fixer\nall good\nRUNNING PLUGIN: php_loc\nlots of numbers\n";
        let out = summary().summarize(log, &BTreeSet::new());
        assert_eq!(sections(&out), 1);
        assert_eq!(out, "*RUNNING PLUGIN: php_cs_fixer*\n```\nall good\n```\n");
    }

    #[test]
    fn test_header_only_section() {
        let log = "RUNNING PLUGIN: composer\nInstalling 200 packages\n";
        let out = summary().summarize(log, &BTreeSet::new());
        assert_eq!(out, "*RUNNING PLUGIN: composer*\n");
    }

    #[test]
    fn test_glob_and_quiet_sections() {
        let log = "RUNNING PLUGIN: slack_notify\nx\nRUNNING PLUGIN: lint\ny\nRUNNING PLUGIN: phpunit\nz\n";
        let quiet = BTreeSet::from(["lint".to_string()]);
        let out = summary().summarize(log, &quiet);
        assert_eq!(sections(&out), 1);
        assert!(out.contains("phpunit"));
    }

    #[test]
    fn test_preamble_is_ignored() {
        let log = "Build started\nRUNNING PLUGIN: phpunit\nok\n";
        let out = summary().summarize(log, &BTreeSet::new());
        assert!(!out.contains("Build started"));
        assert_eq!(sections(&out), 1);
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[0;32mOK\x1b[0m"), "OK");
        assert_eq!(strip_ansi("[0;31mFAIL[0m done"), "FAIL done");
        assert_eq!(strip_ansi("a\x1b[1;33;40mb"), "ab");
        assert_eq!(strip_ansi("done/[0m"), "done");
    }

    #[test]
    fn test_strip_ansi_keeps_bracketed_text() {
        let text = "[main 1a2b3c] Fix [my link](x) arr[5m]";
        assert_eq!(strip_ansi(text), text);
        assert_eq!(strip_ansi("a[1;33;40mb"), "a[1;33;40mb");
    }

    #[test]
    fn test_git_output_survives_summary() {
        let log = "RUNNING PLUGIN: git\n[master abc123] Initial commit\n";
        let out = summary().summarize(log, &BTreeSet::new());
        assert_eq!(out, "*RUNNING PLUGIN: git*\n```\n[master abc123] Initial commit\n```\n");
    }

    #[test]
    fn test_colours_removed_from_names() {
        let log = "RUNNING PLUGIN: \x1b[0;32mphp_loc\x1b[0m\nstats\n";
        let out = summary().summarize(log, &BTreeSet::new());
        assert_eq!(out, "");
    }
}

//! Per-build state shared by the plugins of one pipeline run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::trace;

use crate::types::Violation;

/// Number of characters kept for `%SHORT_COMMIT_ID%`
const SHORT_COMMIT_LEN: usize = 7;

/// Precedes each plugin's output in the build log
pub const SECTION_MARKER: &str = "RUNNING PLUGIN: ";

/// Static facts about the build, supplied by the scheduler
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BuildInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub project_title: String,
    #[serde(default)]
    pub project_link: String,
    #[serde(default)]
    pub build_link: String,
    #[serde(default)]
    pub commit_id: String,
    #[serde(default)]
    pub committer_email: String,
    #[serde(default)]
    pub commit_link: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub branch_link: String,
    /// Checkout the plugins run in
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Debug builds keep full tool output in the log
    #[serde(default)]
    pub debug: bool,
}

fn default_path() -> PathBuf {
    PathBuf::from(".")
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            id: String::new(),
            project_title: String::new(),
            project_link: String::new(),
            build_link: String::new(),
            commit_id: String::new(),
            committer_email: String::new(),
            commit_link: String::new(),
            branch: String::new(),
            branch_link: String::new(),
            path: default_path(),
            debug: false,
        }
    }
}

/// Violations reported during the build, in report order
#[derive(Debug, Default, Clone)]
pub struct ViolationCollector {
    violations: Vec<Violation>,
}

impl ViolationCollector {
    pub fn report(&mut self, violation: Violation) {
        trace!(
            "Reporting violation in {}:{:?} from '{}'",
            violation.file, violation.line, violation.plugin
        );
        self.violations.push(violation);
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }
}

#[derive(Debug)]
pub struct BuildContext {
    pub info: BuildInfo,
    /// Overall status; notifiers read it for the build icon
    pub success: bool,
    log: String,
    pub violations: ViolationCollector,
    pub meta: BTreeMap<String, Value>,
    /// Plugin names whose log sections are left out of notifications
    pub quiet_sections: BTreeSet<String>,
}

impl BuildContext {
    pub fn new(info: BuildInfo) -> Self {
        Self {
            info,
            success: true,
            log: String::new(),
            violations: ViolationCollector::default(),
            meta: BTreeMap::new(),
            quiet_sections: BTreeSet::new(),
        }
    }

    /// Append text to the build log, terminating it with a newline
    pub fn log(&mut self, text: &str) {
        self.log.push_str(text);
        if !text.ends_with('\n') {
            self.log.push('\n');
        }
    }

    /// Open a new log section for the named plugin
    pub fn start_section(&mut self, plugin: &str) {
        self.log(&format!("{}{}", SECTION_MARKER, plugin));
    }

    pub fn log_text(&self) -> &str {
        &self.log
    }

    pub fn store_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Replace build placeholders in `text`.
    ///
    /// `%env:NAME%` reads the process environment (unset is empty). Unknown
    /// placeholders are left as they are.
    pub fn interpolate(&self, text: &str) -> String {
        let short_commit: String = self.info.commit_id.chars().take(SHORT_COMMIT_LEN).collect();
        let path = self.info.path.display().to_string();
        let vars: [(&str, &str); 11] = [
            ("%BUILD_ID%", self.info.id.as_str()),
            ("%PROJECT_TITLE%", self.info.project_title.as_str()),
            ("%PROJECT_LINK%", self.info.project_link.as_str()),
            ("%BUILD_LINK%", self.info.build_link.as_str()),
            ("%SHORT_COMMIT_ID%", short_commit.as_str()),
            ("%COMMIT_ID%", self.info.commit_id.as_str()),
            ("%COMMITTER_EMAIL%", self.info.committer_email.as_str()),
            ("%COMMIT_LINK%", self.info.commit_link.as_str()),
            ("%BRANCH_LINK%", self.info.branch_link.as_str()),
            ("%BRANCH%", self.info.branch.as_str()),
            ("%BUILD_PATH%", path.as_str()),
        ];

        let mut out = text.to_string();
        for (key, value) in vars {
            out = out.replace(key, value);
        }
        interpolate_env(&out)
    }
}

fn interpolate_env(text: &str) -> String {
    const PREFIX: &str = "%env:";

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(PREFIX) {
        let after = &rest[start + PREFIX.len()..];
        let Some(end) = after.find('%') else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&std::env::var(&after[..end]).unwrap_or_default());
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

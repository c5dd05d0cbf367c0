use anyhow::Context;
use serde::Deserialize;
use std::fs;

use crate::context::BuildInfo;
use crate::plugin::PluginConfig;

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub build: BuildInfo,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Violation report path (.md or .json)
    #[serde(default)]
    pub path: Option<String>,
}

/// Written by `buildgate init`
pub const DEFAULT_CONFIG: &str = r#"# Facts about the build, usually filled in by the scheduler.
# Any of these may be overridden on the command line.
[build]
# Build number
id = "1"
# Project name and link shown in notifications
project_title = "My Project"
project_link = ""
build_link = ""
commit_id = ""
committer_email = ""
commit_link = ""
branch = "main"
branch_link = ""
# Checkout the plugins run in
path = "."
# Keep full tool output in the build log
debug = false

[output]
# Write violations to a file (.md or .json)
# path = "violations.md"

# Check coding standards without changing files.
[[plugins]]
kind = "php_cs_fixer"
# Report what would change instead of fixing (--dry-run)
errors = true
# Record each suggestion as a violation
report_errors = true
# Violations tolerated before the step fails, -1 for unlimited
allowed_warnings = 0
# rules = "@PSR12"
# config = "%BUILD_PATH%/.php-cs-fixer.dist.php"

# Post the result to Telegram once the build is done.
# [[plugins]]
# kind = "telegram_notify"
# auth_token = "%env:TELEGRAM_TOKEN%"
# Chat ids; append /<thread id> to post into a topic
# recipients = ["-1001234567890/42"]
# Also send a per-plugin summary of the build log
# send_log = true
# best_effort or fail_fast
# on_failure = "best_effort"
"#;

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
        Self::parse(&content).with_context(|| format!("Invalid config {}", path))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_parses() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.build.id, "1");
        assert_eq!(config.plugins.len(), 1);
        assert_eq!(config.plugins[0].name(), "php_cs_fixer");
        assert!(config.output.path.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [build]
            id = "9"
            branch = "feature"

            [output]
            path = "out.json"
            "#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.build.id, "9");
        assert_eq!(config.build.branch, "feature");
        assert_eq!(config.build.path, std::path::PathBuf::from("."));
        assert_eq!(config.output.path.as_deref(), Some("out.json"));
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        assert!(Config::parse("[biuld]\nid = \"1\"\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/nonexistent/buildgate.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}

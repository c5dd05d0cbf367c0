//! PHP Coding Standards Fixer.
//!
//! Without `errors` the fixer rewrites the checkout and the plugin result is
//! the fixer's exit status. With `errors` it runs as a dry-run check: the
//! JSON report is turned into violations and the verdict gate decides.

use semver::Version;
use serde::Deserialize;
use tracing::{debug, info};

use super::Stage;
use super::extract::extract;
use super::report::parse_report;
use crate::context::BuildContext;
use crate::error::PluginError;
use crate::gate::{self, Allowance};
use crate::runner::CommandRunner;
use crate::util::{find_binary, shell_quote};
use crate::version::{VersionRange, parse_version};

pub const NAME: &str = "php_cs_fixer";
const LABEL: &str = "PHP CS Fixer";
const CANDIDATES: &[&str] = &["php-cs-fixer", "php-cs-fixer.phar"];

/// Versions that understand `--diff-format udiff` (added in 2.8.0, the
/// default from 3.0.0 on)
fn udiff_range() -> VersionRange {
    VersionRange::new(Version::new(2, 8, 0), Version::new(3, 0, 0))
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CsFixerOptions {
    /// Extra arguments passed verbatim
    #[serde(default)]
    pub args: String,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub diff: bool,
    /// Value for `--rules=`
    #[serde(default)]
    pub rules: Option<String>,
    /// Path for `--config=`, build placeholders allowed
    #[serde(default)]
    pub config: Option<String>,
    /// Check only (`--dry-run`) and report what would change
    #[serde(default)]
    pub errors: bool,
    /// Record each finding in the build's violation list
    #[serde(default)]
    pub report_errors: bool,
    /// Findings tolerated before failing, -1 for unlimited (default 0)
    #[serde(default)]
    pub allowed_warnings: Option<Allowance>,
    /// Path to fix, relative to the build directory
    #[serde(default)]
    pub directory: Option<String>,
    /// Explicit command line for the tool, skipping discovery. Used as
    /// written, e.g. `php tools/php-cs-fixer.phar`
    #[serde(default)]
    pub executable: Option<String>,
    #[serde(default)]
    pub stage: Option<Stage>,
    /// Include this plugin's output in notification summaries (default true)
    #[serde(default)]
    pub summarize: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsFixer {
    args: String,
    has_config: bool,
    errors: bool,
    report_errors: bool,
    allowance: Allowance,
    directory: Option<String>,
    executable: Option<String>,
}

impl CsFixer {
    pub fn new(options: &CsFixerOptions, ctx: &BuildContext) -> Result<Self, PluginError> {
        if !options.errors {
            if options.report_errors {
                return Err(PluginError::config(NAME, "report_errors requires errors = true"));
            }
            if options.allowed_warnings.is_some() {
                return Err(PluginError::config(NAME, "allowed_warnings requires errors = true"));
            }
        }

        let mut args = options.args.trim().to_string();
        let mut push = |flag: String| {
            if !args.is_empty() {
                args.push(' ');
            }
            args.push_str(&flag);
        };
        if options.verbose {
            push("--verbose".into());
        }
        if options.diff {
            push("--diff".into());
        }
        if let Some(rules) = options.rules.as_deref().filter(|r| !r.is_empty()) {
            push(format!("--rules={}", shell_quote(rules)));
        }
        let config = options.config.as_deref().filter(|c| !c.is_empty());
        if let Some(config) = config {
            push(format!("--config={}", shell_quote(&ctx.interpolate(config))));
        }
        if options.errors {
            push("--dry-run".into());
        }

        Ok(Self {
            args,
            has_config: config.is_some(),
            errors: options.errors,
            report_errors: options.report_errors,
            allowance: options.allowed_warnings.unwrap_or_default(),
            directory: options.directory.clone().filter(|d| !d.is_empty()),
            executable: options.executable.clone(),
        })
    }

    pub async fn execute<R: CommandRunner>(
        &self,
        ctx: &mut BuildContext,
        runner: &R,
    ) -> Result<bool, PluginError> {
        let executable = self.locate(ctx)?;

        let mut args = self.args.clone();
        if self.errors {
            args.push_str(" --verbose --format json --diff");
            if self.supports_udiff(&executable, runner).await? {
                args.push_str(" --diff-format udiff");
            }
        }

        let template = format!("{} fix {} %s", executable, self.target_directory());
        let output = runner.run_with_args(&template, args.trim()).await?;

        // Report-mode output is JSON; keep it out of the log unless debugging
        if !self.errors || ctx.info.debug {
            ctx.log(&output.combined());
        }

        if !self.errors {
            info!("{} finished, success: {}", LABEL, output.success);
            return Ok(output.success);
        }

        let report = parse_report(NAME, &output.stdout)?;
        let extraction = extract(&report, NAME, LABEL)?;
        if self.report_errors {
            for violation in extraction.violations {
                let location = match violation.line {
                    Some(line) => format!("{}:{}", violation.file, line),
                    None => violation.file.clone(),
                };
                ctx.log(&format!("{}\n{}", location, violation.message));
                ctx.violations.report(violation);
            }
            ctx.log(&format!(
                "{} suggestion(s), allowed: {}",
                extraction.count, self.allowance
            ));
        }

        Ok(gate::evaluate(ctx, NAME, extraction.count, self.allowance))
    }

    fn locate(&self, ctx: &BuildContext) -> Result<String, PluginError> {
        if let Some(executable) = &self.executable {
            return Ok(ctx.interpolate(executable).trim().to_string());
        }
        find_binary(CANDIDATES, &ctx.info.path)
            .map(|path| shell_quote(&path.display().to_string()))
            .ok_or_else(|| PluginError::ToolNotFound {
                plugin: NAME.to_string(),
                candidates: CANDIDATES.iter().map(|c| c.to_string()).collect(),
            })
    }

    /// Probe the tool version; done on every run since the tool may change
    /// between builds
    async fn supports_udiff<R: CommandRunner>(
        &self,
        executable: &str,
        runner: &R,
    ) -> Result<bool, PluginError> {
        let probe = runner.run(&format!("{} --version", executable)).await?;
        let version = parse_version(&probe.combined())?;
        let supported = udiff_range().contains(&version);
        debug!("{} version {}, udiff flag: {}", LABEL, version, supported);
        Ok(supported)
    }

    /// Explicit directory, else `.` unless a config file decides the paths
    fn target_directory(&self) -> String {
        match &self.directory {
            Some(dir) => shell_quote(dir),
            None if !self.has_config => ".".to_string(),
            None => String::new(),
        }
    }
}

//! Runs a build's plugins one after another against a shared build context.

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::context::BuildContext;
use crate::error::PluginError;
use crate::plugin::{Plugin, PluginConfig, Stage};
use crate::render;
use crate::runner::CommandRunner;

/// What happened to one plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    Failed,
    /// Fatal plugin error, with its message
    Errored(String),
    /// Not run because an earlier stage failed
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub plugin: &'static str,
    pub stage: Stage,
    pub outcome: StepOutcome,
}

struct Step {
    plugin: Plugin,
    stage: Stage,
}

/// Validated plugins in configuration order
pub struct Pipeline {
    steps: Vec<Step>,
    quiet: Vec<&'static str>,
}

impl Pipeline {
    /// Construct every plugin up front so a misconfigured one stops the
    /// build before anything runs
    pub fn new(configs: &[PluginConfig], ctx: &BuildContext) -> Result<Self, PluginError> {
        let mut steps = Vec::with_capacity(configs.len());
        let mut quiet = Vec::new();
        for config in configs {
            debug!("Constructing plugin '{}' for stage {:?}", config.name(), config.stage());
            steps.push(Step {
                plugin: Plugin::from_config(config, ctx)?,
                stage: config.stage(),
            });
            if !config.summarize() {
                quiet.push(config.name());
            }
        }
        Ok(Self { steps, quiet })
    }

    /// Plugin names and stages in the order they would run for a passing build
    pub fn plan(&self) -> Vec<(&'static str, Stage)> {
        self.ordered(&[Stage::Setup, Stage::Test, Stage::Complete, Stage::Success])
            .map(|s| (s.plugin.name(), s.stage))
            .collect()
    }

    fn ordered<'a>(&'a self, stages: &'a [Stage]) -> impl Iterator<Item = &'a Step> + 'a {
        stages
            .iter()
            .flat_map(move |stage| self.steps.iter().filter(move |s| s.stage == *stage))
    }

    /// Run all stages and return per-plugin results.
    ///
    /// Setup and test plugins decide the build outcome; a failed setup
    /// skips the test stage. Complete plugins always run afterwards,
    /// followed by either the success or the failure stage.
    pub async fn run<R: CommandRunner>(
        &self,
        ctx: &mut BuildContext,
        runner: &R,
    ) -> Vec<StepResult> {
        ctx.quiet_sections.extend(self.quiet.iter().map(|n| n.to_string()));
        let mut results = Vec::with_capacity(self.steps.len());

        for stage in [Stage::Setup, Stage::Test] {
            for step in self.steps.iter().filter(|s| s.stage == stage) {
                if stage == Stage::Test && setup_failed(&results) {
                    results.push(StepResult {
                        plugin: step.plugin.name(),
                        stage,
                        outcome: StepOutcome::Skipped,
                    });
                    continue;
                }
                let outcome = run_step(step, ctx, runner).await;
                if outcome != StepOutcome::Passed && stage.affects_outcome() {
                    ctx.success = false;
                }
                results.push(StepResult {
                    plugin: step.plugin.name(),
                    stage,
                    outcome,
                });
            }
        }

        let closing = if ctx.success {
            Stage::Success
        } else {
            Stage::Failure
        };
        for stage in [Stage::Complete, closing] {
            for step in self.steps.iter().filter(|s| s.stage == stage) {
                let outcome = run_step(step, ctx, runner).await;
                results.push(StepResult {
                    plugin: step.plugin.name(),
                    stage,
                    outcome,
                });
            }
        }

        let failed = results
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::Failed | StepOutcome::Errored(_)))
            .count();
        info!(
            "Build complete: {} plugin(s) run, {} failed, {} violation(s) reported, success: {}",
            results.len(),
            failed,
            ctx.violations.len(),
            ctx.success
        );
        results
    }
}

fn setup_failed(results: &[StepResult]) -> bool {
    results
        .iter()
        .any(|r| r.stage == Stage::Setup && r.outcome != StepOutcome::Passed)
}

async fn run_step<R: CommandRunner>(
    step: &Step,
    ctx: &mut BuildContext,
    runner: &R,
) -> StepOutcome {
    let name = step.plugin.name();
    info!("Running plugin '{}'", name);
    ctx.start_section(name);

    match step.plugin.execute(ctx, runner).await {
        Ok(true) => {
            ctx.log("PLUGIN: SUCCESS");
            StepOutcome::Passed
        }
        Ok(false) => {
            warn!("Plugin '{}' failed", name);
            ctx.log("PLUGIN: FAILED");
            StepOutcome::Failed
        }
        Err(e) => {
            error!("Plugin '{}' aborted: {}", name, e);
            let message = e.to_string();
            ctx.log(&message);
            ctx.log("PLUGIN: FAILED");
            StepOutcome::Errored(message)
        }
    }
}

/// Write collected violations to `path`, as JSON or Markdown by extension
pub fn write_output(path: &str, ctx: &BuildContext) -> anyhow::Result<()> {
    let content = if path.ends_with(".json") {
        serde_json::to_string_pretty(&render::format_json(ctx))?
    } else if path.ends_with(".md") {
        render::format_violations(ctx)
    } else {
        anyhow::bail!("Output file must end with .md or .json");
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output file {}", path))?;
    info!("Results written to {}", path);
    Ok(())
}

pub mod cs_fixer;
pub mod extract;
pub mod report;
pub mod telegram;

use serde::Deserialize;

use crate::context::BuildContext;
use crate::error::PluginError;
use crate::runner::CommandRunner;
use cs_fixer::{CsFixer, CsFixerOptions};
use telegram::{TelegramNotify, TelegramOptions};

/// Pipeline phase a plugin runs in
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Setup,
    Test,
    /// Always runs once the build outcome is known
    Complete,
    /// Runs only if the build succeeded
    Success,
    /// Runs only if the build failed
    Failure,
}

impl Stage {
    /// Whether a failed plugin in this stage fails the build
    pub fn affects_outcome(self) -> bool {
        matches!(self, Stage::Setup | Stage::Test)
    }
}

/// One `[[plugins]]` entry
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PluginConfig {
    PhpCsFixer(CsFixerOptions),
    TelegramNotify(TelegramOptions),
}

impl PluginConfig {
    pub fn name(&self) -> &'static str {
        match self {
            PluginConfig::PhpCsFixer(_) => cs_fixer::NAME,
            PluginConfig::TelegramNotify(_) => telegram::NAME,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            PluginConfig::PhpCsFixer(o) => o.stage.unwrap_or(Stage::Test),
            PluginConfig::TelegramNotify(o) => o.stage.unwrap_or(Stage::Complete),
        }
    }

    /// Whether the plugin's log section belongs in notification summaries
    pub fn summarize(&self) -> bool {
        match self {
            PluginConfig::PhpCsFixer(o) => o.summarize.unwrap_or(true),
            PluginConfig::TelegramNotify(o) => o.summarize.unwrap_or(false),
        }
    }
}

/// A constructed, validated plugin ready to run against a build
pub enum Plugin {
    CsFixer(CsFixer),
    TelegramNotify(TelegramNotify),
}

impl Plugin {
    /// Validate options and build the plugin; invalid options fail here,
    /// before anything runs
    pub fn from_config(config: &PluginConfig, ctx: &BuildContext) -> Result<Self, PluginError> {
        match config {
            PluginConfig::PhpCsFixer(o) => CsFixer::new(o, ctx).map(Plugin::CsFixer),
            PluginConfig::TelegramNotify(o) => {
                TelegramNotify::new(o, ctx).map(Plugin::TelegramNotify)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Plugin::CsFixer(_) => cs_fixer::NAME,
            Plugin::TelegramNotify(_) => telegram::NAME,
        }
    }

    /// Run against the build. `Ok(false)` is an ordinary failed step;
    /// `Err` is fatal for this plugin.
    pub async fn execute<R: CommandRunner>(
        &self,
        ctx: &mut BuildContext,
        runner: &R,
    ) -> Result<bool, PluginError> {
        match self {
            Plugin::CsFixer(p) => p.execute(ctx, runner).await,
            Plugin::TelegramNotify(p) => p.execute(ctx).await,
        }
    }
}

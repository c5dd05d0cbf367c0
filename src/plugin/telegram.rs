use serde::Deserialize;
use tracing::info;

use super::Stage;
use crate::context::BuildContext;
use crate::error::PluginError;
use crate::notify::client::{DEFAULT_API_URL, MessageSender, TelegramClient};
use crate::notify::recipient::Recipient;
use crate::notify::summary::LogSummary;
use crate::notify::{FailurePolicy, dispatch};

pub const NAME: &str = "telegram_notify";

const DEFAULT_MESSAGE: &str = "[%ICON_BUILD%] [%PROJECT_TITLE%](%PROJECT_LINK%) \
- [Build #%BUILD_ID%](%BUILD_LINK%) has finished \
for commit [%SHORT_COMMIT_ID% (%COMMITTER_EMAIL%)](%COMMIT_LINK%) \
on branch [%BRANCH%](%BRANCH_LINK%)";

const ICON_PLACEHOLDER: &str = "%ICON_BUILD%";
const ICON_SUCCESS: &str = "✅";
const ICON_FAILURE: &str = "❌";

/// A single recipient or a list of them
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Default for Recipients {
    fn default() -> Self {
        Recipients::Many(Vec::new())
    }
}

impl Recipients {
    fn into_vec(self) -> Vec<String> {
        match self {
            Recipients::One(r) => vec![r],
            Recipients::Many(rs) => rs,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelegramOptions {
    /// Bot token, build placeholders allowed (e.g. `%env:TELEGRAM_TOKEN%`)
    #[serde(default)]
    pub auth_token: String,
    /// Chat ids, optionally `chat/thread`
    #[serde(default)]
    pub recipients: Recipients,
    /// Message template
    #[serde(default)]
    pub message: Option<String>,
    /// Also send a per-plugin summary of the build log
    #[serde(default)]
    pub send_log: bool,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub on_failure: FailurePolicy,
    /// Log sections (glob patterns) left out of the summary
    #[serde(default = "default_skip_sections")]
    pub skip_sections: Vec<String>,
    /// Log sections summarised by their header only
    #[serde(default = "default_header_only_sections")]
    pub header_only_sections: Vec<String>,
    #[serde(default)]
    pub stage: Option<Stage>,
    /// Include this plugin's output in notification summaries (default false)
    #[serde(default)]
    pub summarize: Option<bool>,
}

impl Default for TelegramOptions {
    fn default() -> Self {
        Self {
            auth_token: String::new(),
            recipients: Recipients::default(),
            message: None,
            send_log: false,
            api_url: default_api_url(),
            on_failure: FailurePolicy::default(),
            skip_sections: default_skip_sections(),
            header_only_sections: default_header_only_sections(),
            stage: None,
            summarize: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Plugins whose output is too long to be useful in a chat message
fn default_skip_sections() -> Vec<String> {
    vec!["slack_notify".into(), "php_loc".into(), NAME.into()]
}

fn default_header_only_sections() -> Vec<String> {
    vec!["composer".into()]
}

pub struct TelegramNotify {
    client: TelegramClient,
    recipients: Vec<String>,
    message: String,
    send_log: bool,
    on_failure: FailurePolicy,
    summary: LogSummary,
}

impl TelegramNotify {
    pub fn new(options: &TelegramOptions, ctx: &BuildContext) -> Result<Self, PluginError> {
        let token = ctx.interpolate(options.auth_token.trim());
        if token.is_empty() {
            return Err(PluginError::config(NAME, "'auth_token' is not set"));
        }

        let recipients: Vec<String> = options
            .recipients
            .clone()
            .into_vec()
            .into_iter()
            .filter(|r| !r.trim().is_empty())
            .collect();
        if recipients.is_empty() {
            return Err(PluginError::config(NAME, "'recipients' is not set"));
        }

        Ok(Self {
            client: TelegramClient::new(&options.api_url, &token),
            recipients,
            message: options
                .message
                .clone()
                .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            send_log: options.send_log,
            on_failure: options.on_failure,
            summary: LogSummary::new(&options.skip_sections, &options.header_only_sections),
        })
    }

    pub async fn execute(&self, ctx: &mut BuildContext) -> Result<bool, PluginError> {
        self.notify(ctx, &self.client).await
    }

    async fn notify<S: MessageSender>(
        &self,
        ctx: &mut BuildContext,
        sender: &S,
    ) -> Result<bool, PluginError> {
        let message = self.build_message(ctx);
        let excerpt = self
            .send_log
            .then(|| self.summary.summarize(ctx.log_text(), &ctx.quiet_sections));
        let recipients: Vec<Recipient> = self
            .recipients
            .iter()
            .map(|r| Recipient::parse(&ctx.interpolate(r)))
            .collect();

        let report = dispatch(
            sender,
            &recipients,
            &message,
            excerpt.as_deref(),
            self.on_failure,
        )
        .await?;

        ctx.log(&format!(
            "Sent {} message(s) to {} recipient(s), {} failed",
            report.delivered,
            recipients.len(),
            report.failed
        ));
        info!("{} finished: {:?}", NAME, report);
        Ok(true)
    }

    fn build_message(&self, ctx: &BuildContext) -> String {
        let icon = if ctx.success { ICON_SUCCESS } else { ICON_FAILURE };
        ctx.interpolate(&self.message.replace(ICON_PLACEHOLDER, icon))
    }
}

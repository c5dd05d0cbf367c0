pub mod client;
pub mod recipient;
pub mod summary;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::PluginError;
use client::MessageSender;
use recipient::Recipient;

/// What to do when delivery to one recipient fails
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and keep going with the other recipients
    #[default]
    BestEffort,
    /// Stop at the first failure and return it
    FailFast,
}

/// Outcome of a fan-out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Send `message`, then `log_excerpt` if given, to every recipient in turn.
///
/// Each recipient is independent: a failure for one never rolls back what
/// was already sent to another.
pub async fn dispatch<S: MessageSender>(
    sender: &S,
    recipients: &[Recipient],
    message: &str,
    log_excerpt: Option<&str>,
    policy: FailurePolicy,
) -> Result<DispatchReport, PluginError> {
    let mut report = DispatchReport::default();

    for recipient in recipients {
        let mut texts = vec![message];
        texts.extend(log_excerpt.filter(|e| !e.trim().is_empty()));

        for text in texts {
            match sender.send(recipient, text).await {
                Ok(()) => report.delivered += 1,
                Err(e) if policy == FailurePolicy::BestEffort => {
                    warn!("Notification to {} failed: {}", recipient, e);
                    report.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    info!(
        "Notified {} recipient(s): {} delivered, {} failed",
        recipients.len(),
        report.delivered,
        report.failed
    );
    Ok(report)
}

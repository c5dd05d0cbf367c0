use serde::{Deserialize, Deserializer};
use std::fmt;
use tracing::{info, warn};

use crate::context::BuildContext;

/// Sentinel accepted in configuration for "no limit"
const UNLIMITED: i64 = -1;

/// How many violations a plugin may report before it fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    Unlimited,
    AtMost(u64),
}

impl Default for Allowance {
    fn default() -> Self {
        Allowance::AtMost(0)
    }
}

impl TryFrom<i64> for Allowance {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            UNLIMITED => Ok(Allowance::Unlimited),
            v if v >= 0 => Ok(Allowance::AtMost(v as u64)),
            v => Err(format!(
                "allowance must be >= 0 or {} for unlimited, got {}",
                UNLIMITED, v
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Allowance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Allowance::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl Allowance {
    /// Boundary is inclusive: a count equal to the allowance passes
    pub fn permits(self, count: u64) -> bool {
        match self {
            Allowance::Unlimited => true,
            Allowance::AtMost(max) => count <= max,
        }
    }
}

impl fmt::Display for Allowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Allowance::Unlimited => f.write_str("unlimited"),
            Allowance::AtMost(max) => write!(f, "{}", max),
        }
    }
}

/// Metadata key under which a plugin's violation count is stored
pub fn warnings_key(plugin: &str) -> String {
    format!("{}-warnings", plugin)
}

/// Record `count` for trending and decide pass/fail.
///
/// The count is stored whether or not the gate passes.
pub fn evaluate(ctx: &mut BuildContext, plugin: &str, count: u64, allowance: Allowance) -> bool {
    ctx.store_meta(warnings_key(plugin), count);

    let passed = allowance.permits(count);
    if passed {
        info!("'{}' reported {} violation(s), allowance {}", plugin, count, allowance);
    } else {
        warn!(
            "'{}' reported {} violation(s), exceeding allowance {}",
            plugin, count, allowance
        );
    }
    passed
}

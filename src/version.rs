//! Tool version probing and feature negotiation.

use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

use crate::error::PluginError;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid version regex"));

/// Half-open version range `[min, max)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub min: Version,
    pub max_exclusive: Version,
}

impl VersionRange {
    pub const fn new(min: Version, max_exclusive: Version) -> Self {
        Self { min, max_exclusive }
    }

    pub fn contains(&self, version: &Version) -> bool {
        *version >= self.min && *version < self.max_exclusive
    }
}

/// Extract the first `x.y.z` version from free-form tool output
pub fn parse_version(output: &str) -> Result<Version, PluginError> {
    let not_found = || PluginError::VersionProbe {
        output: output.trim().to_string(),
    };
    let caps = VERSION_PATTERN.captures(output).ok_or_else(not_found)?;
    let part = |idx: usize| -> Result<u64, PluginError> {
        caps[idx].parse().map_err(|_| not_found())
    };
    Ok(Version::new(part(1)?, part(2)?, part(3)?))
}

use thiserror::Error;

use crate::util::diff::DiffError;

/// Fatal plugin failures.
///
/// A plugin that merely finds too many violations does not produce one of
/// these; it returns `Ok(false)` instead.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Missing or invalid option, raised while constructing the plugin
    #[error("plugin '{plugin}' is misconfigured: {message}")]
    Config { plugin: String, message: String },

    /// None of the candidate executables could be located
    #[error("could not find any of {candidates:?} for plugin '{plugin}'")]
    ToolNotFound {
        plugin: String,
        candidates: Vec<String>,
    },

    /// The external process could not be started at all
    #[error("failed to execute '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool's version output contained no `x.y.z` version
    #[error("cannot determine tool version from output: {output}")]
    VersionProbe { output: String },

    /// The tool's report was not the expected JSON document
    #[error("could not process the report generated by '{plugin}': {message}\n{raw}")]
    ReportParse {
        plugin: String,
        message: String,
        /// Raw tool output, kept for diagnosis in the build log
        raw: String,
    },

    /// A file entry in the report carried an unparsable diff
    #[error("invalid diff for '{file}': {source}")]
    Diff {
        file: String,
        #[source]
        source: DiffError,
    },

    /// A notification could not be delivered
    #[error("failed to notify '{recipient}': {message}")]
    Transport { recipient: String, message: String },
}

impl PluginError {
    pub fn config(plugin: &str, message: impl Into<String>) -> Self {
        Self::Config {
            plugin: plugin.to_string(),
            message: message.into(),
        }
    }
}

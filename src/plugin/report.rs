use serde::Deserialize;

use crate::error::PluginError;

/// JSON report written by the fixer in `--format json` mode
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FixerReport {
    pub files: Vec<FileReport>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub name: String,
    #[serde(default, rename = "appliedFixers")]
    pub applied_fixers: Vec<String>,
    /// Unified diff for this file only
    #[serde(default)]
    pub diff: String,
}

/// Parse the fixer's stdout, keeping the raw text on failure
pub fn parse_report(plugin: &str, output: &str) -> Result<FixerReport, PluginError> {
    serde_json::from_str(output.trim()).map_err(|e| PluginError::ReportParse {
        plugin: plugin.to_string(),
        message: e.to_string(),
        raw: output.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report() {
        let output = r#"
            {"files":[
                {"name":"a.php","appliedFixers":["braces","indentation_type"],"diff":"@@ -1 +1 @@\n-a\n+b\n"},
                {"name":"b.php"}
            ],"time":{"total":0.5},"memory":12}
        "#;
        let report = parse_report("cs_fixer", output).unwrap();
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].applied_fixers, vec!["braces", "indentation_type"]);
        assert!(report.files[1].applied_fixers.is_empty());
        assert_eq!(report.files[1].diff, "");
    }

    #[test]
    fn test_parse_report_keeps_raw_output() {
        let err = parse_report("cs_fixer", "PHP Fatal error: boom").unwrap_err();
        match err {
            PluginError::ReportParse { plugin, raw, .. } => {
                assert_eq!(plugin, "cs_fixer");
                assert_eq!(raw, "PHP Fatal error: boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_report_requires_files() {
        assert!(parse_report("cs_fixer", "{}").is_err());
    }
}

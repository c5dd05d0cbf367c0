use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;

use crate::context::BuildContext;
use crate::types::Violation;

/// Group violations by file, keeping report order within a file
fn by_file<'a>(violations: impl Iterator<Item = &'a Violation>) -> BTreeMap<&'a str, Vec<&'a Violation>> {
    let mut grouped: BTreeMap<&str, Vec<&Violation>> = BTreeMap::new();
    for violation in violations {
        grouped.entry(violation.file.as_str()).or_default().push(violation);
    }
    grouped
}

pub fn format_violations(ctx: &BuildContext) -> String {
    if ctx.violations.is_empty() {
        return "No violations found".to_string();
    }

    let mut output = String::new();
    for (file, violations) in by_file(ctx.violations.iter()) {
        output.push_str(&format!("# Violations in {}\n\n", file));
        for violation in violations {
            let location = match violation.line {
                Some(line) => format!("Line {}", line),
                None => "File".to_string(),
            };
            output.push_str(&format!(
                "- {} ({}, {}): {}\n",
                location, violation.severity, violation.plugin, violation.message
            ));
        }
        output.push('\n');
    }
    output.trim_end().to_string()
}

pub fn format_json(ctx: &BuildContext) -> serde_json::Value {
    json!({
        "build": ctx.info.id,
        "success": ctx.success,
        "generated_at": Utc::now().to_rfc3339(),
        "violations": by_file(ctx.violations.iter()),
        "meta": ctx.meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BuildInfo;
    use crate::types::Severity;

    fn violation(file: &str, line: Option<u32>, message: &str) -> Violation {
        Violation {
            plugin: "php_cs_fixer".into(),
            file: file.into(),
            line,
            severity: Severity::Low,
            message: message.into(),
        }
    }

    #[test]
    fn test_format_empty() {
        let ctx = BuildContext::new(BuildInfo::default());
        assert_eq!(format_violations(&ctx), "No violations found");
    }

    #[test]
    fn test_format_groups_by_file() {
        let mut ctx = BuildContext::new(BuildInfo::default());
        ctx.violations.report(violation("b.php", Some(4), "fix b"));
        ctx.violations.report(violation("a.php", None, "fix a"));
        ctx.violations.report(violation("b.php", Some(9), "fix b again"));

        assert_eq!(
            format_violations(&ctx),
            "# Violations in a.php\n\n\
             - File (low, php_cs_fixer): fix a\n\n\
             # Violations in b.php\n\n\
             - Line 4 (low, php_cs_fixer): fix b\n\
             - Line 9 (low, php_cs_fixer): fix b again"
        );
    }

    #[test]
    fn test_format_json() {
        let mut ctx = BuildContext::new(BuildInfo {
            id: "3".into(),
            ..Default::default()
        });
        ctx.violations.report(violation("a.php", Some(1), "x"));
        ctx.store_meta("php_cs_fixer-warnings", 1);

        let value = format_json(&ctx);
        assert_eq!(value["build"], "3");
        assert_eq!(value["violations"]["a.php"][0]["line"], 1);
        assert_eq!(value["violations"]["a.php"][0]["severity"], "low");
        assert_eq!(value["meta"]["php_cs_fixer-warnings"], 1);
    }
}

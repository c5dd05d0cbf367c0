pub mod diff;

use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Placeholder replaced by the argument string in a command template
const ARGS_PLACEHOLDER: &str = "%s";

/// Locate the first candidate executable.
///
/// Search order: `<build_dir>/vendor/bin`, `<build_dir>`, then each `PATH`
/// entry. Returns the full path of the first regular file found.
pub fn find_binary(candidates: &[&str], build_dir: &Path) -> Option<PathBuf> {
    let mut dirs = vec![build_dir.join("vendor").join("bin"), build_dir.to_path_buf()];
    if let Some(path) = std::env::var_os("PATH") {
        dirs.extend(std::env::split_paths(&path));
    }

    for dir in &dirs {
        for candidate in candidates {
            let path = dir.join(candidate);
            trace!("Probing {}", path.display());
            if path.is_file() {
                debug!("Found '{}' at {}", candidate, path.display());
                return Some(path);
            }
        }
    }

    None
}

/// Substitute the argument string into a command template.
///
/// Only the first `%s` is replaced; a template without one gets the
/// arguments appended.
pub fn interpolate_command(template: &str, args: &str) -> String {
    let command = if template.contains(ARGS_PLACEHOLDER) {
        template.replacen(ARGS_PLACEHOLDER, args, 1)
    } else {
        format!("{} {}", template, args)
    };
    command.trim().to_string()
}

/// Quote a string for safe use as one POSIX shell word
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

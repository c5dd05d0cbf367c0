//! Unified diff parsing.
//!
//! Produces one [`Diff`] per file section. A section may omit the
//! `---`/`+++` header pair, in which case the first hunk opens an anonymous
//! section. Hunk line counts are not trusted: fixers are known to emit
//! headers whose ranges disagree with the body, so the body is read until
//! the next header instead.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("valid hunk regex")
});

/// Git metadata lines tolerated between file sections
const METADATA_PREFIXES: &[&str] = &[
    "diff ",
    "index ",
    "new file mode",
    "deleted file mode",
    "old mode",
    "new mode",
    "similarity index",
    "dissimilarity index",
    "rename ",
    "copy ",
    "Binary files",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    #[error("line {line}: malformed hunk header '{header}'")]
    InvalidHunkHeader { line: usize, header: String },
    #[error("line {line}: unexpected content outside of a hunk: '{content}'")]
    OutsideHunk { line: usize, content: String },
    #[error("line {line}: unrecognised hunk line: '{content}'")]
    InvalidLine { line: usize, content: String },
    #[error("diff text contains no hunks")]
    NoHunks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Added,
    Removed,
    Unchanged,
}

impl LineKind {
    /// Prefix used when rendering the line back into diff form
    pub fn symbol(self) -> char {
        match self {
            LineKind::Added => '+',
            LineKind::Removed => '-',
            LineKind::Unchanged => ' ',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub content: String,
}

impl Line {
    pub fn render(&self) -> String {
        format!("{}{}", self.kind.symbol(), self.content)
    }
}

/// A single hunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Starting line in the original file; 0 means the hunk starts the file
    pub start: u32,
    pub start_range: u32,
    pub end: u32,
    pub end_range: u32,
    pub lines: Vec<Line>,
}

/// All hunks for one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub from: Option<String>,
    pub to: Option<String>,
    pub chunks: Vec<Chunk>,
}

/// Parse unified diff text into per-file diffs.
///
/// Blank input yields no diffs. Any other input must contain at least one
/// hunk.
pub fn parse(text: &str) -> Result<Vec<Diff>, DiffError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let lines: Vec<&str> = text.lines().collect();
    let mut diffs: Vec<Diff> = Vec::new();
    let mut in_hunk = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let line_no = i + 1;

        if line.starts_with("--- ") && lines.get(i + 1).is_some_and(|n| n.starts_with("+++ ")) {
            diffs.push(Diff {
                from: Some(header_path(&line[4..])),
                to: Some(header_path(&lines[i + 1][4..])),
                chunks: Vec::new(),
            });
            in_hunk = false;
            i += 2;
            continue;
        }

        if line.starts_with("@@") {
            let chunk = parse_hunk_header(line, line_no)?;
            if diffs.is_empty() {
                diffs.push(Diff::default());
            }
            if let Some(diff) = diffs.last_mut() {
                diff.chunks.push(chunk);
            }
            in_hunk = true;
            i += 1;
            continue;
        }

        if is_metadata(line) {
            in_hunk = false;
            i += 1;
            continue;
        }

        if !in_hunk {
            if line.trim().is_empty() {
                i += 1;
                continue;
            }
            return Err(DiffError::OutsideHunk {
                line: line_no,
                content: line.to_string(),
            });
        }

        if let Some(parsed) = parse_hunk_line(line, line_no)? {
            if let Some(chunk) = diffs.last_mut().and_then(|d| d.chunks.last_mut()) {
                chunk.lines.push(parsed);
            }
        }
        i += 1;
    }

    if diffs.iter().all(|d| d.chunks.is_empty()) {
        return Err(DiffError::NoHunks);
    }

    Ok(diffs)
}

fn is_metadata(line: &str) -> bool {
    METADATA_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Strip the optional tab-separated timestamp from a `---`/`+++` path
fn header_path(raw: &str) -> String {
    raw.split('\t').next().unwrap_or(raw).trim_end().to_string()
}

fn parse_hunk_header(line: &str, line_no: usize) -> Result<Chunk, DiffError> {
    let invalid = || DiffError::InvalidHunkHeader {
        line: line_no,
        header: line.to_string(),
    };
    let caps = HUNK_HEADER.captures(line).ok_or_else(invalid)?;
    let number = |idx: usize, default: u32| -> Result<u32, DiffError> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().map_err(|_| invalid()),
            None => Ok(default),
        }
    };

    Ok(Chunk {
        start: number(1, 0)?,
        start_range: number(2, 1)?,
        end: number(3, 0)?,
        end_range: number(4, 1)?,
        lines: Vec::new(),
    })
}

fn parse_hunk_line(line: &str, line_no: usize) -> Result<Option<Line>, DiffError> {
    let mut chars = line.chars();
    let kind = match chars.next() {
        Some('+') => LineKind::Added,
        Some('-') => LineKind::Removed,
        Some(' ') => LineKind::Unchanged,
        // "\ No newline at end of file"
        Some('\\') => return Ok(None),
        // Some tools drop the leading space of empty context lines
        None => LineKind::Unchanged,
        Some(_) => {
            return Err(DiffError::InvalidLine {
                line: line_no,
                content: line.to_string(),
            });
        }
    };

    Ok(Some(Line {
        kind,
        content: chars.as_str().to_string(),
    }))
}

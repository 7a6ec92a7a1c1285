use super::{content_lines, is_separator};
use crate::constants::STATUS_WRAP_BUFFER_LIMIT;
use crate::model::{ChangeKind, PendingChange};
use regex::Regex;
use std::sync::LazyLock;

static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}|\t").expect("valid column regex"));
static SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d+\s+(detected\s+)?change\(s\)").expect("valid summary regex")
});
static CHANGE_PROPERTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^change\s*:\s*(.+)$").expect("valid property regex"));
static DRIVE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:[\\/]").expect("valid drive regex"));

/// what a single line of brief status output amounted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// the line completed a row
    Change(PendingChange),
    /// server folder header, applies to the rows below it
    Folder(String),
    /// header, rule, summary or other chrome
    Banner,
    /// incomplete row held back waiting for its wrapped continuation
    Buffered,
    /// the wrap buffer grew past its limit and was thrown away
    Discarded(usize),
}

enum Row {
    Complete {
        kind: ChangeKind,
        local: String,
    },
    /// name and change only, the local path column is missing or wrapped
    NameOnly {
        name: String,
        kind: ChangeKind,
    },
    Incomplete,
}

fn has_column_gap(line: &str) -> bool {
    COLUMN_GAP.is_match(line)
}

fn looks_like_path(text: &str) -> bool {
    text.starts_with("$/")
        || text.starts_with('/')
        || text.starts_with("\\\\")
        || DRIVE_PATH.is_match(text)
}

fn is_banner(line: &str) -> bool {
    let lower = line.to_lowercase();
    is_separator(line)
        || lower.starts_with("file name")
        || lower.starts_with("there are no")
        || SUMMARY.is_match(line)
        || (line.ends_with(':') && !looks_like_path(line) && !has_column_gap(line))
}

fn is_folder_header(line: &str) -> bool {
    line.starts_with("$/") && !has_column_gap(line)
}

fn classify(line: &str) -> Row {
    let columns: Vec<&str> = COLUMN_GAP
        .split(line)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    match columns.as_slice() {
        [_, change, local @ ..] if !local.is_empty() => {
            let local = local.join("  ");
            if looks_like_path(&local) {
                Row::Complete {
                    kind: ChangeKind::from_column(change),
                    local,
                }
            } else {
                Row::Incomplete
            }
        }
        [name, change] => {
            let kind = ChangeKind::from_column(change);
            if kind.is_known() {
                Row::NameOnly {
                    name: (*name).to_string(),
                    kind,
                }
            } else {
                Row::Incomplete
            }
        }
        _ => Row::Incomplete,
    }
}

/// incremental parser for `tf status /format:brief`
///
/// rows are split on runs of two or more spaces into name, change and local
/// path. lines that don't make a full row are joined with the following lines
/// until they do, or until the buffer passes `STATUS_WRAP_BUFFER_LIMIT`.
#[derive(Debug, Default)]
pub struct BriefStatusParser {
    folder: Option<String>,
    pending: String,
    changes: Vec<PendingChange>,
    /// characters of text that never became part of a row
    unparsed: usize,
}

impl BriefStatusParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) -> LineOutcome {
        let line = line.trim();
        if line.is_empty() || is_banner(line) {
            self.flush_pending();
            return LineOutcome::Banner;
        }
        if is_folder_header(line) {
            self.flush_pending();
            self.folder = Some(line.trim_end_matches('/').to_string());
            return LineOutcome::Folder(line.to_string());
        }

        match classify(line) {
            Row::Complete { kind, local } => {
                self.flush_pending();
                return self.emit(local, kind);
            }
            Row::NameOnly { .. } => {
                self.flush_pending();
                self.pending = line.to_string();
                return LineOutcome::Buffered;
            }
            Row::Incomplete => {}
        }

        let candidate = if self.pending.is_empty() {
            line.to_string()
        } else {
            format!("{}  {}", self.pending, line)
        };
        if let Row::Complete { kind, local } = classify(&candidate) {
            self.pending.clear();
            return self.emit(local, kind);
        }

        // a held name-only row is a record in its own right; a line that
        // doesn't continue it must not swallow it
        if matches!(classify(&self.pending), Row::NameOnly { .. }) {
            self.flush_pending();
            return self.hold(line.to_string());
        }
        self.hold(candidate)
    }

    pub fn finish(self) -> Vec<PendingChange> {
        self.finish_counted().0
    }

    /// records plus the number of characters that could not be placed in any row
    pub fn finish_counted(mut self) -> (Vec<PendingChange>, usize) {
        self.flush_pending();
        (self.changes, self.unparsed)
    }

    fn hold(&mut self, text: String) -> LineOutcome {
        if text.len() > STATUS_WRAP_BUFFER_LIMIT {
            self.unparsed += text.len();
            return LineOutcome::Discarded(text.len());
        }
        self.pending = text;
        LineOutcome::Buffered
    }

    fn emit(&mut self, file: String, action: ChangeKind) -> LineOutcome {
        let change = PendingChange { file, action };
        self.changes.push(change.clone());
        LineOutcome::Change(change)
    }

    /// a held name-only row with no continuation is a complete record after
    /// all, addressed relative to the current folder header
    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let held = std::mem::take(&mut self.pending);
        match classify(&held) {
            Row::NameOnly { name, kind } => {
                let file = match &self.folder {
                    Some(folder) => format!("{folder}/{name}"),
                    None => name,
                };
                self.changes.push(PendingChange { file, action: kind });
            }
            _ => self.unparsed += held.len(),
        }
    }
}

/// parse `tf status /format:brief` output
pub fn parse_brief_status(text: &str) -> Vec<PendingChange> {
    parse_brief_status_counted(text).0
}

/// parse `tf status /format:brief` output, also returning how many characters
/// of it were skipped as unrecognisable
pub fn parse_brief_status_counted(text: &str) -> (Vec<PendingChange>, usize) {
    let mut parser = BriefStatusParser::new();
    for line in content_lines(text) {
        parser.feed(line);
    }
    parser.finish_counted()
}

/// parse `tf status /format:detailed` output
///
/// an item path opens a block, its `Change :` property closes it with one
/// record, and a rule line abandons whatever block is open
pub fn parse_detailed_status(text: &str) -> Vec<PendingChange> {
    let mut changes = Vec::new();
    let mut open: Option<&str> = None;

    for line in content_lines(text) {
        if is_separator(line) {
            open = None;
        } else if let Some(caps) = CHANGE_PROPERTY.captures(line) {
            if let Some(file) = open.take() {
                changes.push(PendingChange {
                    file: file.to_string(),
                    action: ChangeKind::from_column(&caps[1]),
                });
            }
        } else if looks_like_path(line) {
            open = Some(line);
        }
    }

    changes
}

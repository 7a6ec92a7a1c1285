use super::is_separator;
use crate::model::{ChangeKind, HistoryEntry, HistoryItem};
use chrono::{DateTime, NaiveDateTime};

/// locale formats tf is known to print, tried in order
const DATE_FORMATS: &[&str] = &[
    "%A, %B %d, %Y %I:%M:%S %p",
    "%A, %d %B %Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// result of parsing one dashed-rule delimited block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    Entry(HistoryEntry),
    /// no parseable `Changeset:` line, the block is ignored
    Skipped,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Comment,
    Items,
    Trailer,
}

/// `Key: value` with a case-insensitive key match
fn label_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let (label, value) = line.split_once(':')?;
    label.trim().eq_ignore_ascii_case(key).then(|| value.trim())
}

/// "edit $/Proj/A.cs", "merge, edit $/Proj/B.cs;C12"
fn parse_item(line: &str) -> Option<HistoryItem> {
    let start = line.find("$/")?;
    let path = line[start..].trim();
    if path.is_empty() {
        return None;
    }
    Some(HistoryItem {
        path: path.to_string(),
        change: ChangeKind::from_column(&line[..start]),
    })
}

/// best effort, the date is whatever the server's locale produced
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// parse the text between two rule lines of `tf history /format:detailed`
pub fn parse_history_block(block: &str) -> BlockOutcome {
    let mut changeset_id = None;
    let mut author = None;
    let mut checked_in_by = None;
    let mut date = None;
    let mut comment: Vec<&str> = Vec::new();
    let mut files = Vec::new();
    let mut section = Section::Header;

    for raw in block.lines() {
        let line = raw.trim();

        if section != Section::Trailer && label_value(line, "items").is_some_and(str::is_empty) {
            section = Section::Items;
            continue;
        }
        if section == Section::Header
            && let Some(rest) = label_value(line, "comment")
        {
            section = Section::Comment;
            if !rest.is_empty() {
                comment.push(rest);
            }
            continue;
        }

        match section {
            Section::Header => {
                if let Some(value) = label_value(line, "changeset") {
                    changeset_id = changeset_id.or_else(|| value.parse::<u64>().ok());
                } else if let Some(value) = label_value(line, "user") {
                    author.get_or_insert_with(|| value.to_string());
                } else if let Some(value) = label_value(line, "checked in by") {
                    checked_in_by.get_or_insert_with(|| value.to_string());
                } else if let Some(value) = label_value(line, "date") {
                    date.get_or_insert_with(|| value.to_string());
                }
            }
            Section::Comment => comment.push(line),
            Section::Items => {
                if line.is_empty() {
                    continue;
                }
                // "Check-in Notes:", "Policy Warnings:" end the item list
                if line.ends_with(':') && !line.contains("$/") {
                    section = Section::Trailer;
                } else if let Some(item) = parse_item(line) {
                    files.push(item);
                }
            }
            Section::Trailer => {}
        }
    }

    let Some(changeset_id) = changeset_id else {
        return BlockOutcome::Skipped;
    };
    let timestamp = date.as_deref().and_then(parse_date);

    BlockOutcome::Entry(HistoryEntry {
        changeset_id,
        author: author.or(checked_in_by).filter(|a| !a.is_empty()),
        date: date.filter(|d| !d.is_empty()),
        timestamp,
        comment: comment.join("\n").trim().to_string(),
        files,
    })
}

/// split raw text on dashed rules, yielding each non-empty block
pub fn history_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if is_separator(line.trim()) {
            if current.trim().is_empty() {
                current.clear();
            } else {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if !current.trim().is_empty() {
        blocks.push(current);
    }
    blocks
}

/// parse `tf history /format:detailed` output in the order tf printed it
pub fn parse_history(text: &str) -> Vec<HistoryEntry> {
    history_blocks(text)
        .iter()
        .filter_map(|block| match parse_history_block(block) {
            BlockOutcome::Entry(entry) => Some(entry),
            BlockOutcome::Skipped => None,
        })
        .collect()
}

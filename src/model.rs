use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// kind of change tf reports against an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Edit,
    Add,
    Delete,
    Rename,
    Merge,
    Unknown,
}

impl ChangeKind {
    const VOCABULARY: [(&'static str, ChangeKind); 5] = [
        ("edit", ChangeKind::Edit),
        ("add", ChangeKind::Add),
        ("delete", ChangeKind::Delete),
        ("rename", ChangeKind::Rename),
        ("merge", ChangeKind::Merge),
    ];

    /// match tf's change column ("edit", "merge, edit", "Rename, Edit" ...)
    /// against the known vocabulary; the first recognised word wins
    pub fn from_column(text: &str) -> Self {
        text.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|word| !word.is_empty())
            .find_map(|word| {
                Self::VOCABULARY
                    .iter()
                    .find(|(name, _)| word.eq_ignore_ascii_case(name))
                    .map(|(_, kind)| *kind)
            })
            .unwrap_or(ChangeKind::Unknown)
    }

    pub fn is_known(self) -> bool {
        self != ChangeKind::Unknown
    }

    /// single character used in terminal listings
    pub fn status_char(self) -> char {
        match self {
            ChangeKind::Edit => 'M',
            ChangeKind::Add => 'A',
            ChangeKind::Delete => 'D',
            ChangeKind::Rename => 'R',
            ChangeKind::Merge => 'G',
            ChangeKind::Unknown => '?',
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::Edit => "edit",
            ChangeKind::Add => "add",
            ChangeKind::Delete => "delete",
            ChangeKind::Rename => "rename",
            ChangeKind::Merge => "merge",
            ChangeKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// a local modification not yet checked in
///
/// transient: reflects the working copy at the time of the query and must be
/// re-queried after anything that can alter it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PendingChange {
    pub file: String,
    pub action: ChangeKind,
}

/// one item touched by a changeset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryItem {
    pub path: String,
    pub change: ChangeKind,
}

/// a committed changeset as reported by `tf history /format:detailed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub changeset_id: u64,
    pub author: Option<String>,
    /// date exactly as tf printed it (locale dependent)
    pub date: Option<String>,
    /// best-effort parse of `date`, no timezone applied
    pub timestamp: Option<NaiveDateTime>,
    pub comment: String,
    pub files: Vec<HistoryItem>,
}

/// server-side branch path, e.g. `$/Project/Main`
pub type BranchPath = String;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_column_vocabulary() {
        assert_eq!(ChangeKind::from_column("edit"), ChangeKind::Edit);
        assert_eq!(ChangeKind::from_column("Merge, Edit"), ChangeKind::Merge);
        assert_eq!(ChangeKind::from_column("rename, edit"), ChangeKind::Rename);
        assert_eq!(ChangeKind::from_column("DELETE"), ChangeKind::Delete);
        assert_eq!(ChangeKind::from_column("branch"), ChangeKind::Unknown);
        assert_eq!(ChangeKind::from_column("encoding, edit"), ChangeKind::Edit);
        // whole words only
        assert_eq!(ChangeKind::from_column("added"), ChangeKind::Unknown);
    }

    #[test]
    fn pending_change_serialises_lowercase_action() {
        let change = PendingChange {
            file: "C:\\ws\\Foo.cs".to_string(),
            action: ChangeKind::Edit,
        };
        let json = serde_json::to_string(&change).unwrap();
        assert_eq!(json, r#"{"file":"C:\\ws\\Foo.cs","action":"edit"}"#);
    }
}

//! parsers for the plain-text tables and blocks that `tf` prints
//!
//! every parser is a pure function of its input: unrecognised lines are
//! skipped rather than reported as errors, and each known output variant has
//! a fixture under `tests/fixtures/`.

pub mod branches;
pub mod history;
pub mod status;

use regex::Regex;
use std::sync::LazyLock;

pub use branches::parse_branches;
pub use history::{BlockOutcome, parse_history, parse_history_block};
pub use status::{
    LineOutcome, parse_brief_status, parse_brief_status_counted, parse_detailed_status,
};

/// rule lines tf prints between blocks and under table headers
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s-]*-{5,}[\s-]*$").expect("valid separator regex"));

pub(crate) fn is_separator(line: &str) -> bool {
    SEPARATOR.is_match(line)
}

/// trimmed, non-empty lines
pub(crate) fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

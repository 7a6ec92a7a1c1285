use super::content_lines;
use crate::model::BranchPath;

/// parse `tf branches` output into server paths, first occurrence wins
///
/// lines look like `>>   $/Proj/Dev   Branched from version 120 <<`; the
/// `>>`/`<<` markers flag the queried item and the trailer is informational.
pub fn parse_branches(text: &str) -> Vec<BranchPath> {
    let mut branches: Vec<BranchPath> = Vec::new();

    for line in content_lines(text) {
        let Some(start) = line.find("$/") else {
            continue;
        };
        let rest = &line[start..];
        let end = [
            rest.find("<<"),
            rest.find("  "),
            rest.find('\t'),
            rest.to_ascii_lowercase().find("branched from"),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rest.len());

        let path = rest[..end].trim().trim_end_matches('/');
        if path.len() <= 2 {
            continue;
        }
        if !branches.iter().any(|b| b.eq_ignore_ascii_case(path)) {
            branches.push(path.to_string());
        }
    }

    branches
}

//! Shell-style name filtering for `list_*_by_pattern` operations.
//! `*` matches any sequence, `|` separates alternatives, matching ignores case.

use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

fn wildcard_to_regex(sub_pattern: &str) -> Option<Regex> {
    // Escape regex meta, then restore the wildcard
    let body = regex::escape(sub_pattern.trim()).replace("\\*", ".*");
    Regex::new(&format!("(?i)^{}$", body)).ok()
}

/// Names matching any alternative of `pattern`, de-duplicated and sorted.
pub fn filter_pattern<I, S>(names: I, pattern: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let regexes: Vec<Regex> = pattern.trim().split('|').filter_map(wildcard_to_regex).collect();
    let out: BTreeSet<String> = names
        .into_iter()
        .filter(|n| regexes.iter().any(|rx| rx.is_match(n.as_ref())))
        .map(|n| n.as_ref().to_string())
        .collect();
    debug!(target: "metacat::pattern", "filter_pattern: pattern='{}' matched={}", pattern, out.len());
    out.into_iter().collect()
}

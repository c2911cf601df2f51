//! Table selection by allow-list or deny-list.

use regex::Regex;
use std::collections::HashSet;

use crate::error::{Result, SchemaError};

/// Compiled table filter.
///
/// A non-empty allow-list takes precedence over everything else: only the
/// listed names pass and the deny-list is never consulted. Otherwise a name
/// is rejected when it equals a deny-list literal or matches any deny-list
/// pattern. Entries written as `^...$` are patterns, all others literals.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    only: Vec<String>,
    literals: HashSet<String>,
    patterns: Vec<Regex>,
}

impl TableFilter {
    pub fn new(only_table: &[String], disable_table: &[String]) -> Result<Self> {
        let mut only: Vec<String> = Vec::new();
        for name in only_table.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if !only.iter().any(|seen| seen == name) {
                only.push(name.to_string());
            }
        }

        let mut literals = HashSet::new();
        let mut patterns = Vec::new();
        for entry in disable_table.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if is_pattern(entry) {
                let regex = Regex::new(entry).map_err(|source| SchemaError::InvalidPattern {
                    pattern: entry.to_string(),
                    source,
                })?;
                patterns.push(regex);
            } else {
                literals.insert(entry.to_string());
            }
        }

        Ok(Self {
            only,
            literals,
            patterns,
        })
    }

    /// The normalized allow-list; empty when every table is a candidate.
    pub fn only(&self) -> &[String] {
        &self.only
    }

    pub fn allows(&self, name: &str) -> bool {
        if !self.only.is_empty() {
            return self.only.iter().any(|allowed| allowed == name);
        }
        !(self.literals.contains(name) || self.patterns.iter().any(|re| re.is_match(name)))
    }
}

fn is_pattern(entry: &str) -> bool {
    entry.len() >= 2 && entry.starts_with('^') && entry.ends_with('$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("log_2023", false)]
    #[case("log_x", false)]
    #[case("logbook", true)]
    #[case("users", true)]
    fn deny_pattern(#[case] name: &str, #[case] allowed: bool) {
        let filter = TableFilter::new(&[], &strings(&["^log_.*$"])).unwrap();
        assert_eq!(filter.allows(name), allowed);
    }

    #[test]
    fn literal_requires_exact_match() {
        let filter = TableFilter::new(&[], &strings(&["log_2023"])).unwrap();
        assert!(!filter.allows("log_2023"));
        assert!(filter.allows("log_2024"));
        assert!(filter.allows("log_2023_old"));
    }

    #[test]
    fn literals_and_patterns_both_apply() {
        let filter =
            TableFilter::new(&[], &strings(&["system_table", "^tmp_.*$"])).unwrap();
        assert!(!filter.allows("system_table"));
        assert!(!filter.allows("tmp_import"));
        assert!(filter.allows("orders"));
    }

    #[test]
    fn allow_list_skips_deny_rules() {
        let filter =
            TableFilter::new(&strings(&["users"]), &strings(&["^.*users$", "users"])).unwrap();
        assert!(filter.allows("users"));
        assert!(!filter.allows("disabled_users"));
        assert!(!filter.allows("orders"));
    }

    #[test]
    fn allow_list_is_trimmed_and_deduplicated() {
        let filter = TableFilter::new(&strings(&[" users", "orders", "users ", ""]), &[]).unwrap();
        assert_eq!(filter.only(), ["users", "orders"]);
    }

    #[test]
    fn unanchored_entries_are_literals() {
        let filter = TableFilter::new(&[], &strings(&["log_.*"])).unwrap();
        assert!(filter.allows("log_2023"));
        assert!(!filter.allows("log_.*"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = TableFilter::new(&[], &strings(&["^log_(.*$"])).unwrap_err();
        match err {
            SchemaError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "^log_(.*$"),
            other => panic!("unexpected error: {other}"),
        }
    }
}

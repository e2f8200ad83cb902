//! Fuzzy label search of the connector picker.

use regex::Regex;

/// Compiles `query` into an in-order subsequence matcher, the equivalent of the
/// glob `*c1*c2*...*cn*` over upper-cased text. `None` for an empty query.
pub fn glob_pattern(query: &str) -> Option<Regex> {
    let query = query.to_uppercase();
    if query.is_empty() {
        return None;
    }
    let body: String = query
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("(?s)^.*{}.*$", body)).ok()
}

/// Ranked and highlighted indices into the searched labels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchResult {
    /// Prefix matches, then substring matches, then remaining fuzzy matches.
    pub ranked: Vec<usize>,
    /// Buttons to outline: every match, or only the exact one when it exists.
    pub highlighted: Vec<usize>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

pub fn search(labels: &[&str], query: &str) -> SearchResult {
    let Some(pattern) = glob_pattern(query) else {
        return SearchResult::default();
    };
    let query = query.to_uppercase();

    let matches: Vec<(usize, String)> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| (i, label.to_uppercase()))
        .filter(|(_, label)| pattern.is_match(label))
        .collect();

    let prefix = matches.iter().filter(|(_, l)| l.starts_with(&query));
    let substring = matches
        .iter()
        .filter(|(_, l)| !l.starts_with(&query) && l.contains(&query));
    let fuzzy = matches.iter().filter(|(_, l)| !l.contains(&query));
    let ranked = prefix.chain(substring).chain(fuzzy).map(|(i, _)| *i).collect();

    let highlighted = match matches.iter().find(|(_, l)| *l == query) {
        Some((exact, _)) => vec![*exact],
        None => matches.iter().map(|(i, _)| *i).collect(),
    };

    SearchResult { ranked, highlighted }
}

use crate::record::{Record, RecordId};
use crate::tokenizer::tokenize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// How queries are matched against the corpus.
///
/// The two strategies are not result-equivalent: the inverted index matches
/// whole whitespace-delimited terms, the linear scan matches substrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    #[default]
    InvertedIndex,
    LinearScan,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::InvertedIndex => f.write_str("inverted-index"),
            MatchStrategy::LinearScan => f.write_str("linear-scan"),
        }
    }
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inverted-index" | "index" => Ok(MatchStrategy::InvertedIndex),
            "linear-scan" | "scan" => Ok(MatchStrategy::LinearScan),
            other => Err(format!("unknown match strategy: {other}")),
        }
    }
}

/// Term to posting list. One id is appended per term occurrence; duplicates
/// are removed when a query is resolved, not here.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<RecordId>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: &Record) {
        for term in tokenize(&record.message) {
            self.postings.entry(term).or_default().push(record.id.clone());
        }
    }

    /// Posting list for an already normalized term; empty when unseen.
    pub fn postings(&self, term: &str) -> &[RecordId] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Union of the posting lists of every query term, deduplicated.
    pub fn lookup<'a>(&'a self, terms: &[String]) -> HashSet<&'a RecordId> {
        terms.iter().flat_map(|t| self.postings(t)).collect()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.postings.values().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_per_occurrence() {
        let mut idx = InvertedIndex::new();
        idx.add(&Record::new(1u64, "go go gadget"));
        idx.add(&Record::new(2u64, "Go home"));
        assert_eq!(idx.postings("go"), &[RecordId::Number(1), RecordId::Number(1), RecordId::Number(2)]);
        assert_eq!(idx.postings("gadget"), &[RecordId::Number(1)]);
        assert!(idx.postings("missing").is_empty());
        assert_eq!(idx.num_terms(), 3);
    }

    #[test]
    fn lookup_is_union() {
        let mut idx = InvertedIndex::new();
        idx.add(&Record::new(1u64, "a"));
        idx.add(&Record::new(2u64, "b"));
        idx.add(&Record::new(3u64, "a b"));
        idx.add(&Record::new(4u64, "c"));
        let hits = idx.lookup(&["a".into(), "b".into()]);
        assert_eq!(hits.len(), 3);
        assert!(!hits.contains(&RecordId::Number(4)));
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("inverted-index".parse::<MatchStrategy>().unwrap(), MatchStrategy::InvertedIndex);
        assert_eq!("Linear-Scan".parse::<MatchStrategy>().unwrap(), MatchStrategy::LinearScan);
        assert!("fuzzy".parse::<MatchStrategy>().is_err());
    }
}

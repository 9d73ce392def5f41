use crate::index::{InvertedIndex, MatchStrategy};
use crate::query::{SearchPage, SearchRequest};
use crate::record::Record;
use crate::store::CorpusStore;
use crate::tokenizer::{normalize, tokenize};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub records: usize,
    pub unique_terms: usize,
}

/// Corpus store plus whatever query structure the strategy needs.
///
/// Records and their postings are added in the same call, so a reader holding
/// `&Corpus` never sees a posting without its record.
#[derive(Debug)]
pub struct Corpus {
    strategy: MatchStrategy,
    store: CorpusStore,
    index: Option<InvertedIndex>,
}

impl Corpus {
    pub fn new(strategy: MatchStrategy) -> Self {
        let index = match strategy {
            MatchStrategy::InvertedIndex => Some(InvertedIndex::new()),
            MatchStrategy::LinearScan => None,
        };
        Self { strategy, store: CorpusStore::new(), index }
    }

    pub fn build(strategy: MatchStrategy, records: impl IntoIterator<Item = Record>) -> Self {
        let mut corpus = Self::new(strategy);
        corpus.ingest(records);
        corpus
    }

    /// Add a batch of records. Returns how many were new.
    pub fn ingest(&mut self, records: impl IntoIterator<Item = Record>) -> usize {
        let mut added = 0;
        for record in records {
            if let Some(index) = self.index.as_mut() {
                if !self.store.contains(&record.id) {
                    index.add(&record);
                }
            }
            if self.store.insert(record) {
                added += 1;
            }
        }
        added
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn store(&self) -> &CorpusStore {
        &self.store
    }

    pub fn index(&self) -> Option<&InvertedIndex> {
        self.index.as_ref()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            records: self.store.len(),
            unique_terms: self.index.as_ref().map_or(0, InvertedIndex::num_terms),
        }
    }

    /// Every match for the query, deduplicated and ordered by id.
    pub fn matches(&self, query: &str) -> Vec<Arc<Record>> {
        let mut hits: Vec<Arc<Record>> = match &self.index {
            Some(index) => {
                let terms = tokenize(query);
                let ids: HashSet<_> = index.lookup(&terms);
                ids.into_iter().filter_map(|id| self.store.get(id)).cloned().collect()
            }
            None => {
                let needle = normalize(query);
                self.store
                    .iter()
                    .filter(|r| normalize(&r.message).contains(&needle))
                    .cloned()
                    .collect()
            }
        };
        hits.sort_by(|a, b| a.id.cmp(&b.id));
        hits
    }

    pub fn search(&self, request: &SearchRequest) -> SearchPage {
        SearchPage::paginate(request, self.matches(request.query()))
    }
}

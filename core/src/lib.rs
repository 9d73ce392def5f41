//! In-memory mirror of a paginated message store: records, the corpus store,
//! the optional inverted index and query resolution.

pub mod corpus;
pub mod index;
pub mod query;
pub mod record;
pub mod store;
pub mod tokenizer;

pub use corpus::{Corpus, CorpusStats};
pub use index::{InvertedIndex, MatchStrategy};
pub use query::{QueryError, SearchPage, SearchRequest, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
pub use record::{FloatId, Record, RecordId};
pub use store::CorpusStore;

pub mod memory;

use async_trait::async_trait;
use crate::core::Candidate;
use crate::error::Result;

pub use memory::InMemoryCorpus;

/// Which slice of the catalogue a pass matches against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CorpusScope {
    /// Canonical nomenclature entries
    AllNomenclature,
    /// Supplier product names linked to one nomenclature entry
    SuppliersOf(String),
}

/// Trait for candidate corpora (database, cache, fixture file, etc.)
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Load the candidates for a scope
    async fn candidates(&self, scope: &CorpusScope) -> Result<Vec<Candidate>>;

    /// Get source name
    fn name(&self) -> &str;
}

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::core::Candidate;
use crate::error::{MatcherError, Result};
use crate::providers::{CandidateSource, CorpusScope};

/// JSON layout accepted by [`InMemoryCorpus::from_json`]
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    /// Plain list of nomenclature entries
    Flat(Vec<Candidate>),
    /// Nomenclature plus supplier names keyed by nomenclature id
    Full {
        nomenclature: Vec<Candidate>,
        #[serde(default)]
        suppliers: HashMap<String, Vec<Candidate>>,
    },
}

/// Corpus held in memory (fixtures, CLI, tests)
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    nomenclature: Vec<Candidate>,
    suppliers: HashMap<String, Vec<Candidate>>,
}

impl InMemoryCorpus {
    pub fn from_candidates(nomenclature: Vec<Candidate>) -> Self {
        Self {
            nomenclature,
            suppliers: HashMap::new(),
        }
    }

    /// Attach supplier names to a nomenclature id
    pub fn with_suppliers(mut self, nomenclature_id: impl Into<String>, names: Vec<Candidate>) -> Self {
        self.suppliers
            .entry(nomenclature_id.into())
            .or_default()
            .extend(names);
        self
    }

    /// Parse either `[candidate, ...]` or `{"nomenclature": [...], "suppliers": {id: [...]}}`
    pub fn from_json(json: &str) -> Result<Self> {
        let corpus = match serde_json::from_str::<CorpusFile>(json)? {
            CorpusFile::Flat(nomenclature) => Self::from_candidates(nomenclature),
            CorpusFile::Full {
                nomenclature,
                suppliers,
            } => Self {
                nomenclature,
                suppliers,
            },
        };
        tracing::debug!(
            "Loaded corpus: {} nomenclature, {} supplier groups",
            corpus.nomenclature.len(),
            corpus.suppliers.len()
        );
        Ok(corpus)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn nomenclature(&self) -> &[Candidate] {
        &self.nomenclature
    }

    /// Candidates for a scope; unknown nomenclature ids give an empty slice
    pub fn scoped(&self, scope: &CorpusScope) -> &[Candidate] {
        match scope {
            CorpusScope::AllNomenclature => &self.nomenclature,
            CorpusScope::SuppliersOf(id) => self
                .suppliers
                .get(id)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }
}

#[async_trait]
impl CandidateSource for InMemoryCorpus {
    async fn candidates(&self, scope: &CorpusScope) -> Result<Vec<Candidate>> {
        if let CorpusScope::SuppliersOf(id) = scope {
            if !self.nomenclature.iter().any(|c| &c.id == id) && !self.suppliers.contains_key(id) {
                return Err(MatcherError::Source(format!("unknown nomenclature id '{}'", id)));
            }
        }
        Ok(self.scoped(scope).to_vec())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: &str = r#"{
        "nomenclature": [
            {"id": 1, "name": "Кран шаровой DN32"},
            {"id": "2", "name": "Пеноплэкс Комфорт 50мм"}
        ],
        "suppliers": {
            "1": [{"id": 10, "name": "Кран шаровой BVR-R DN32 065B8310R", "supplier": "Ридан"}]
        }
    }"#;

    #[test]
    fn test_from_json_full() {
        let corpus = InMemoryCorpus::from_json(CORPUS).unwrap();
        assert_eq!(corpus.nomenclature().len(), 2);
        assert_eq!(corpus.nomenclature()[0].id, "1");

        let suppliers = corpus.scoped(&CorpusScope::SuppliersOf("1".into()));
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].supplier.as_deref(), Some("Ридан"));
    }

    #[test]
    fn test_from_json_flat() {
        let corpus = InMemoryCorpus::from_json(r#"[{"id": 5, "name": "Бетон М300"}]"#).unwrap();
        assert_eq!(corpus.nomenclature()[0].name, "Бетон М300");
        assert!(corpus.scoped(&CorpusScope::SuppliersOf("5".into())).is_empty());
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            InMemoryCorpus::from_json("{\"nomenclature\": 3}"),
            Err(MatcherError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_candidate_source() {
        let corpus = InMemoryCorpus::from_candidates(vec![Candidate::new("1", "Бетон")])
            .with_suppliers("1", vec![Candidate::new("s1", "Бетон товарный В22.5")]);

        let all = corpus.candidates(&CorpusScope::AllNomenclature).await.unwrap();
        assert_eq!(all.len(), 1);

        let suppliers = corpus
            .candidates(&CorpusScope::SuppliersOf("1".into()))
            .await
            .unwrap();
        assert_eq!(suppliers[0].id, "s1");

        let missing = corpus.candidates(&CorpusScope::SuppliersOf("42".into())).await;
        assert!(matches!(missing, Err(MatcherError::Source(_))));
        assert_eq!(corpus.name(), "memory");
    }
}

use super::DescriptionTable;
use crate::algo::nmf::{factorize, NmfConfig};
use crate::{Entity, EntityId, Result};
use ndarray::Array2;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// Word runs of two or more characters.
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is valid"));

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "don", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should", "so",
    "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "you", "your", "yours", "yourself", "yourselves",
];

/// Lowercased word tokens of at least two characters, English stopwords removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_REGEX
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionOptions {
    /// Keep only the most frequent terms.
    pub vocabulary_size: Option<usize>,
    /// Weight counts by smoothed inverse document frequency and L2-normalize rows.
    pub tfidf: bool,
}

impl Default for DescriptionOptions {
    fn default() -> Self {
        Self {
            vocabulary_size: None,
            tfidf: true,
        }
    }
}

impl DescriptionOptions {
    pub fn with_vocabulary_size(mut self, size: usize) -> Self {
        self.vocabulary_size = Some(size);
        self
    }

    pub fn with_tfidf(mut self, tfidf: bool) -> Self {
        self.tfidf = tfidf;
        self
    }
}

/// Bag-of-words vectors over repository descriptions.
///
/// The vocabulary is sorted alphabetically after the optional frequency cap,
/// so the column layout only depends on the table contents.
#[derive(Debug, Clone)]
pub struct DescriptionVector {
    vocabulary: Vec<String>,
    samples: HashMap<EntityId, usize>,
    features: Array2<f64>,
}

impl DescriptionVector {
    pub fn new(table: &DescriptionTable, options: &DescriptionOptions) -> Self {
        let mut ids: Vec<&EntityId> = table.keys().collect();
        ids.sort();
        let documents: Vec<Vec<String>> = ids.iter().map(|id| tokenize(&table[*id])).collect();

        let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in &documents {
            for token in doc {
                *totals.entry(token.as_str()).or_default() += 1;
            }
        }
        let mut terms: Vec<(&str, usize)> = totals.into_iter().collect();
        if let Some(cap) = options.vocabulary_size {
            terms.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
            terms.truncate(cap);
            terms.sort_by(|a, b| a.0.cmp(b.0));
        }
        let vocabulary: Vec<String> = terms.iter().map(|(t, _)| t.to_string()).collect();
        let columns: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let mut features = Array2::zeros((documents.len(), vocabulary.len()));
        for (row, doc) in documents.iter().enumerate() {
            for token in doc {
                if let Some(&col) = columns.get(token.as_str()) {
                    features[[row, col]] += 1.0;
                }
            }
        }

        if options.tfidf {
            apply_tfidf(&mut features);
        }

        let samples = ids
            .into_iter()
            .enumerate()
            .map(|(row, id)| (id.clone(), row))
            .collect();
        Self {
            vocabulary,
            samples,
            features,
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn feature_count(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn sample_index(&self, id: &EntityId) -> Option<usize> {
        self.samples.get(id).copied()
    }

    pub fn features_for(&self, entities: &[Entity]) -> Array2<f64> {
        rows_for(&self.features, &self.samples, entities)
    }
}

fn apply_tfidf(counts: &mut Array2<f64>) {
    let n = counts.nrows() as f64;
    let idf: Vec<f64> = counts
        .columns()
        .into_iter()
        .map(|col| {
            let df = col.iter().filter(|&&v| v > 0.0).count() as f64;
            ((1.0 + n) / (1.0 + df)).ln() + 1.0
        })
        .collect();
    for mut row in counts.rows_mut() {
        for (v, w) in row.iter_mut().zip(&idf) {
            *v *= w;
        }
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
}

fn rows_for(
    features: &Array2<f64>,
    samples: &HashMap<EntityId, usize>,
    entities: &[Entity],
) -> Array2<f64> {
    let mut out = Array2::zeros((entities.len(), features.ncols()));
    for (i, entity) in entities.iter().enumerate() {
        if let Some(&row) = samples.get(&entity.id) {
            out.row_mut(i).assign(&features.row(row));
        }
    }
    out
}

/// Latent topics of description vectors, from a nonnegative factorization
/// `X ≈ W·H` of the tf-idf matrix. Rows of `W` are the per-repository topic
/// weights; rows of `H` describe each topic over the vocabulary.
#[derive(Debug, Clone)]
pub struct DescriptionTopics {
    vocabulary: Vec<String>,
    samples: HashMap<EntityId, usize>,
    topics: Array2<f64>,
    components: Array2<f64>,
}

impl DescriptionTopics {
    pub fn new(vectors: &DescriptionVector, config: &NmfConfig) -> Result<Self> {
        let factors = factorize(vectors.features(), config)?;
        Ok(Self {
            vocabulary: vectors.vocabulary.clone(),
            samples: vectors.samples.clone(),
            topics: factors.w,
            components: factors.h,
        })
    }

    pub fn topic_count(&self) -> usize {
        self.components.nrows()
    }

    pub fn topics(&self) -> &Array2<f64> {
        &self.topics
    }

    /// Highest-weighted vocabulary terms of one topic.
    pub fn top_terms(&self, topic: usize, n: usize) -> Vec<&str> {
        let mut order: Vec<usize> = (0..self.vocabulary.len()).collect();
        let weights = self.components.row(topic);
        order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]));
        order
            .into_iter()
            .take(n)
            .map(|i| self.vocabulary[i].as_str())
            .collect()
    }

    pub fn features_for(&self, entities: &[Entity]) -> Array2<f64> {
        rows_for(&self.topics, &self.samples, entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DescriptionTable {
        let mut t = DescriptionTable::new();
        t.insert(EntityId::Number(1), "A fast JSON parser for Rust".to_string());
        t.insert(EntityId::Number(2), "Rust web framework".to_string());
        t.insert(EntityId::Number(3), "JSON schema validator, in Go".to_string());
        t
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_short_tokens() {
        assert_eq!(
            tokenize("The parser is a JSON_lib for C and Go!"),
            vec!["parser", "json_lib", "go"]
        );
    }

    #[test]
    fn test_tokenize_unicode_words() {
        assert_eq!(
            tokenize("Schnelle Übersetzung: x-ray über 3D (beta) 42"),
            vec!["schnelle", "übersetzung", "ray", "über", "3d", "beta", "42"]
        );
        assert!(tokenize("a b c !").is_empty());
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let v = DescriptionVector::new(&table(), &DescriptionOptions::default());
        let mut sorted = v.vocabulary().to_vec();
        sorted.sort();
        assert_eq!(v.vocabulary(), sorted.as_slice());
        assert!(v.vocabulary().contains(&"rust".to_string()));
    }

    #[test]
    fn test_vocabulary_cap_keeps_frequent_terms() {
        let opts = DescriptionOptions::default().with_vocabulary_size(2);
        let v = DescriptionVector::new(&table(), &opts);
        assert_eq!(v.vocabulary(), &["json", "rust"]);
    }

    #[test]
    fn test_tfidf_rows_are_unit_length() {
        let v = DescriptionVector::new(&table(), &DescriptionOptions::default());
        for row in v.features().rows() {
            assert!((row.dot(&row).sqrt() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_raw_counts_and_missing_rows() {
        let opts = DescriptionOptions::default().with_tfidf(false);
        let v = DescriptionVector::new(&table(), &opts);
        let m = v.features_for(&[Entity::repository(2), Entity::repository(7)]);
        assert_eq!(m.row(0).sum(), 3.0);
        assert_eq!(m.row(1).sum(), 0.0);
    }

    #[test]
    fn test_topics_shape() {
        let v = DescriptionVector::new(&table(), &DescriptionOptions::default());
        let config = NmfConfig::default().with_n_components(2);
        let topics = DescriptionTopics::new(&v, &config).unwrap();
        assert_eq!(topics.topic_count(), 2);
        let m = topics.features_for(&[Entity::repository(1), Entity::repository(9)]);
        assert_eq!(m.dim(), (2, 2));
        assert!(m.iter().all(|&x| x >= 0.0));
        assert_eq!(topics.top_terms(0, 3).len(), 3);
    }
}

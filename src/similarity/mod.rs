//! Pairwise similarity over feature rows.
//!
//! | Type | Input | Kernel |
//! |------|-------|--------|
//! | [`JaccardSimilarity`] | sparse incidence | \|A ∩ B\| / \|A ∪ B\| over nonzero columns |
//! | [`CosineSimilarity`] | dense rows | normalized dot product |
//! | [`LinearSimilarity`] | dense rows | raw dot product |
//! | [`BigraphSimilarity`] | one side of a [`Bigraph`](crate::Bigraph) | cosine across both sides |
//!
//! Every flat similarity answers `nearest(i, k)`: the top-k other rows by
//! descending score, ties broken by ascending index.

mod bigraph;
mod cosine;
mod jaccard;
mod linear;

pub use bigraph::{BigraphSimilarity, Side};
pub use cosine::CosineSimilarity;
pub use jaccard::JaccardSimilarity;
pub use linear::LinearSimilarity;

use crate::sparse::CsrMatrix;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A square similarity structure over `size()` rows.
pub trait Similarity: Send + Sync {
    /// Number of rows compared.
    fn size(&self) -> usize;

    /// Similarity between rows `a` and `b`.
    fn score(&self, a: usize, b: usize) -> f64;

    /// `(other, score)` for every stored candidate of `index`, ascending by
    /// `other`. Sparse kernels only list rows with a nonzero overlap.
    fn scores(&self, index: usize) -> Vec<(usize, f64)>;

    /// Top-`k` rows most similar to `index`, excluding `index` itself.
    fn nearest(&self, index: usize, k: usize) -> Vec<(usize, f64)> {
        let mut neighbors: Vec<(usize, f64)> = self
            .scores(index)
            .into_iter()
            .filter(|&(other, _)| other != index)
            .collect();
        // stable: equal scores keep ascending index order
        neighbors.sort_by(|a, b| b.1.total_cmp(&a.1));
        neighbors.truncate(k);
        neighbors
    }
}

/// Which kernel a collaborative-filtering recommender uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityKind {
    #[default]
    Jaccard,
    Cosine,
    Linear,
}

impl SimilarityKind {
    /// Build the similarity over the rows of `features`.
    pub fn build(self, features: &CsrMatrix) -> Box<dyn Similarity> {
        match self {
            SimilarityKind::Jaccard => Box::new(JaccardSimilarity::new(features)),
            SimilarityKind::Cosine => Box::new(CosineSimilarity::new(&features.to_dense())),
            SimilarityKind::Linear => Box::new(LinearSimilarity::new(&features.to_dense())),
        }
    }
}

impl FromStr for SimilarityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jaccard" => Ok(SimilarityKind::Jaccard),
            "cosine" => Ok(SimilarityKind::Cosine),
            "linear" => Ok(SimilarityKind::Linear),
            other => Err(Error::UnknownSimilarity(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("Cosine".parse::<SimilarityKind>().unwrap(), SimilarityKind::Cosine);
        assert!(matches!(
            "euclid".parse::<SimilarityKind>(),
            Err(Error::UnknownSimilarity(_))
        ));
    }

    #[test]
    fn test_kinds_agree_on_identical_rows() {
        let m = CsrMatrix::from_triplets(3, 2, [(0, 0, 1.0), (1, 0, 1.0), (2, 1, 1.0)]);
        for kind in [SimilarityKind::Jaccard, SimilarityKind::Cosine, SimilarityKind::Linear] {
            let sim = kind.build(&m);
            assert_eq!(sim.size(), 3);
            assert!((sim.score(0, 1) - 1.0).abs() < 1e-12, "{:?}", kind);
            assert_eq!(sim.nearest(0, 1)[0].0, 1);
        }
    }
}

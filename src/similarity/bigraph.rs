use super::cosine::l2_normalize_rows;
use crate::{Bigraph, Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Which partition of a [`Bigraph`] a feature matrix describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

/// Cosine similarity across both partitions of a bigraph, from features known
/// on only one side.
///
/// Features are propagated to the other side through the incidence matrix
/// (`target = Mᵀ · source`, or `source = M · target`), every row is
/// L2-normalized, and the four blocks source–source, source–target,
/// target–source and target–target are computed with a linear kernel.
#[derive(Debug, Clone)]
pub struct BigraphSimilarity {
    source_source: Array2<f64>,
    source_target: Array2<f64>,
    target_source: Array2<f64>,
    target_target: Array2<f64>,
}

impl BigraphSimilarity {
    pub fn new(bigraph: &Bigraph, features: &Array2<f64>, side: Side) -> Result<Self> {
        let (source_count, target_count) = bigraph.shape();
        let expected = match side {
            Side::Source => source_count,
            Side::Target => target_count,
        };
        if features.nrows() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                got: features.nrows(),
            });
        }

        let (source_features, target_features) = match side {
            Side::Source => (features.clone(), bigraph.transposed().mul_dense(features)),
            Side::Target => (bigraph.matrix().mul_dense(features), features.clone()),
        };
        let s = l2_normalize_rows(&source_features);
        let t = l2_normalize_rows(&target_features);

        let source_target = s.dot(&t.t());
        Ok(Self {
            source_source: s.dot(&s.t()),
            target_source: source_target.t().to_owned(),
            source_target,
            target_target: t.dot(&t.t()),
        })
    }

    /// Pairwise block from partition `from` (rows) to partition `to` (columns).
    pub fn block(&self, from: Side, to: Side) -> &Array2<f64> {
        match (from, to) {
            (Side::Source, Side::Source) => &self.source_source,
            (Side::Source, Side::Target) => &self.source_target,
            (Side::Target, Side::Source) => &self.target_source,
            (Side::Target, Side::Target) => &self.target_target,
        }
    }

    pub fn score(&self, from: (Side, usize), to: (Side, usize)) -> f64 {
        self.block(from.0, to.0)[[from.1, to.1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entity, EntityKind, SocialGraph};
    use ndarray::array;

    fn bigraph() -> Bigraph {
        let mut g = SocialGraph::new_undirected();
        g.add_edge(Entity::user(1), Entity::repository(10), Default::default());
        g.add_edge(Entity::user(1), Entity::repository(11), Default::default());
        g.add_edge(Entity::user(2), Entity::repository(11), Default::default());
        Bigraph::new(&g, EntityKind::User, EntityKind::Repository, None).unwrap()
    }

    #[test]
    fn test_target_features_propagate_to_sources() {
        let bg = bigraph();
        // repo 10 is Rust, repo 11 is Go
        let langs = array![[1.0, 0.0], [0.0, 1.0]];
        let sim = BigraphSimilarity::new(&bg, &langs, Side::Target).unwrap();

        let st = sim.block(Side::Source, Side::Target);
        assert_eq!(st.dim(), (2, 2));
        // user 2 only touches the Go repo
        assert!((st[[1, 1]] - 1.0).abs() < 1e-12);
        assert!(st[[1, 0]].abs() < 1e-12);
        // user 1 is half/half
        assert!((st[[0, 0]] - 1.0 / 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(sim.score((Side::Target, 0), (Side::Source, 0)), st[[0, 0]]);
    }

    #[test]
    fn test_incidence_as_own_feature() {
        let bg = bigraph();
        let sim = BigraphSimilarity::new(&bg, &bg.matrix().to_dense(), Side::Source).unwrap();
        let ss = sim.block(Side::Source, Side::Source);
        assert!((ss[[0, 0]] - 1.0).abs() < 1e-12);
        assert!(ss[[0, 1]] > 0.0);
    }

    #[test]
    fn test_shape_checked() {
        let bg = bigraph();
        let wrong = Array2::<f64>::zeros((3, 2));
        assert!(matches!(
            BigraphSimilarity::new(&bg, &wrong, Side::Source),
            Err(Error::DimensionMismatch { expected: 2, got: 3 })
        ));
    }
}

use super::Similarity;
use ndarray::{Array2, Axis};

/// Cosine similarity between dense feature rows. Rows with zero norm score 0
/// against everything, themselves included.
#[derive(Debug, Clone)]
pub struct CosineSimilarity {
    matrix: Array2<f64>,
}

impl CosineSimilarity {
    pub fn new(features: &Array2<f64>) -> Self {
        let normalized = l2_normalize_rows(features);
        Self {
            matrix: normalized.dot(&normalized.t()),
        }
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }
}

/// Scale every row to unit L2 norm; zero rows stay zero.
pub(crate) fn l2_normalize_rows(features: &Array2<f64>) -> Array2<f64> {
    let mut out = features.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|x| x / norm);
        }
    }
    out
}

impl Similarity for CosineSimilarity {
    fn size(&self) -> usize {
        self.matrix.nrows()
    }

    fn score(&self, a: usize, b: usize) -> f64 {
        self.matrix[[a, b]]
    }

    fn scores(&self, index: usize) -> Vec<(usize, f64)> {
        self.matrix.row(index).iter().copied().enumerate().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cosine_values() {
        let sim = CosineSimilarity::new(&array![[1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
        assert!((sim.score(0, 1) - 1.0 / 2f64.sqrt()).abs() < 1e-12);
        assert!((sim.score(1, 1) - 1.0).abs() < 1e-12);
        assert_eq!(sim.score(2, 0), 0.0);
        assert_eq!(sim.score(2, 2), 0.0);
    }

    #[test]
    fn test_scale_invariant() {
        let sim = CosineSimilarity::new(&array![[1.0, 2.0], [10.0, 20.0]]);
        assert!((sim.score(0, 1) - 1.0).abs() < 1e-12);
    }
}

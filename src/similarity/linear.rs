use super::Similarity;
use ndarray::Array2;

/// Unnormalized dot-product kernel, for features whose magnitude carries
/// meaning (tf-idf text vectors).
#[derive(Debug, Clone)]
pub struct LinearSimilarity {
    matrix: Array2<f64>,
}

impl LinearSimilarity {
    pub fn new(features: &Array2<f64>) -> Self {
        Self {
            matrix: features.dot(&features.t()),
        }
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }
}

impl Similarity for LinearSimilarity {
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

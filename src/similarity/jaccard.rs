use super::Similarity;
use crate::sparse::{CsrMatrix, TripletBuilder};

/// Jaccard similarity between the nonzero column sets of sparse rows.
///
/// Intersections are counted in one pass over the columns: every pair of rows
/// sharing a column gets one vote per shared column. Only pairs with at least
/// one shared column are ever materialized, so the result is as sparse as the
/// co-occurrence structure. Each count is then divided by the union size
/// `|A| + |B| - |A ∩ B|`.
#[derive(Debug, Clone)]
pub struct JaccardSimilarity {
    matrix: CsrMatrix,
}

impl JaccardSimilarity {
    pub fn new(features: &CsrMatrix) -> Self {
        let n = features.rows();
        let row_sizes: Vec<usize> = (0..n)
            .map(|r| features.row(r).filter(|&(_, v)| v != 0.0).count())
            .collect();

        let by_column = features.transpose();
        let pair_count: usize = (0..by_column.rows())
            .map(|c| by_column.row_nnz(c).pow(2))
            .sum();

        let mut builder = TripletBuilder::with_capacity(n, n, pair_count);
        for c in 0..by_column.rows() {
            let members: Vec<usize> = by_column
                .row(c)
                .filter(|&(_, v)| v != 0.0)
                .map(|(r, _)| r)
                .collect();
            for &a in &members {
                for &b in &members {
                    builder.push(a, b, 1.0);
                }
            }
        }

        let counts = builder.build();
        let data: Vec<f64> = counts
            .entries()
            .zip(counts.data())
            .map(|((a, b), &shared)| {
                let union = (row_sizes[a] + row_sizes[b]) as f64 - shared;
                shared / union
            })
            .collect();

        Self {
            matrix: counts.with_data(data),
        }
    }

    /// Sparse pairwise matrix (diagonal included).
    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }
}

impl Similarity for JaccardSimilarity {
    fn size(&self) -> usize {
        self.matrix.rows()
    }

    fn score(&self, a: usize, b: usize) -> f64 {
        self.matrix.get(a, b)
    }

    fn scores(&self, index: usize) -> Vec<(usize, f64)> {
        self.matrix.row(index).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(sets: &[&[usize]], cols: usize) -> CsrMatrix {
        let triplets = sets
            .iter()
            .enumerate()
            .flat_map(|(r, set)| set.iter().map(move |&c| (r, c, 1.0)));
        CsrMatrix::from_triplets(sets.len(), cols, triplets)
    }

    #[test]
    fn test_reference_values() {
        // A = {0,1}, B = {1,2}, C = {0,1,2}
        let sim = JaccardSimilarity::new(&rows(&[&[0, 1], &[1, 2], &[0, 1, 2]], 3));
        assert!((sim.score(0, 1) - 1.0 / 3.0).abs() < 1e-12);
        assert!((sim.score(0, 2) - 2.0 / 3.0).abs() < 1e-12);
        assert!((sim.score(1, 2) - 2.0 / 3.0).abs() < 1e-12);
        assert!((sim.score(0, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_excludes_self_and_breaks_ties_by_index() {
        let sim = JaccardSimilarity::new(&rows(&[&[0, 1], &[1, 2], &[0, 1, 2]], 3));
        let nearest = sim.nearest(2, 5);
        assert_eq!(nearest.len(), 2);
        assert_eq!(nearest[0].0, 0);
        assert_eq!(nearest[1].0, 1);

        let top = sim.nearest(0, 1);
        assert_eq!(top, vec![(2, 2.0 / 3.0)]);
    }

    #[test]
    fn test_disjoint_rows_are_not_stored() {
        let sim = JaccardSimilarity::new(&rows(&[&[0], &[1], &[]], 2));
        assert_eq!(sim.score(0, 1), 0.0);
        assert!(sim.nearest(0, 10).is_empty());
        assert!(sim.scores(2).is_empty());
    }

    #[test]
    fn test_symmetric() {
        let sim = JaccardSimilarity::new(&rows(&[&[0, 3], &[1, 3], &[0, 1, 2], &[2]], 4));
        for a in 0..4 {
            for b in 0..4 {
                assert_eq!(sim.score(a, b), sim.score(b, a));
            }
        }
    }
}

//! Compressed sparse row matrices.
//!
//! Matrices are assembled once from `(row, col, value)` triplets through a
//! [`TripletBuilder`] and are immutable afterwards. Matrices that share a
//! sparsity pattern (edge strengths, their derivatives, transition
//! probabilities) are derived with [`CsrMatrix::with_data`], which only swaps
//! the value array.

use ndarray::Array2;

/// Accumulates `(row, col, value)` triplets; duplicates are summed on build.
#[derive(Debug, Clone)]
pub struct TripletBuilder {
    rows: usize,
    cols: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl TripletBuilder {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(rows: usize, cols: usize, capacity: usize) -> Self {
        Self {
            rows,
            cols,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.rows && col < self.cols, "triplet out of bounds");
        self.entries.push((row, col, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sort by `(row, col)`, sum duplicates and compress. Explicit zeros stay
    /// in the pattern.
    pub fn build(mut self) -> CsrMatrix {
        self.entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut indptr = vec![0usize; self.rows + 1];
        let mut indices = Vec::with_capacity(self.entries.len());
        let mut data: Vec<f64> = Vec::with_capacity(self.entries.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in self.entries {
            if last == Some((r, c)) {
                if let Some(d) = data.last_mut() {
                    *d += v;
                }
                continue;
            }
            indptr[r + 1] += 1;
            indices.push(c);
            data.push(v);
            last = Some((r, c));
        }
        for i in 0..self.rows {
            indptr[i + 1] += indptr[i];
        }

        CsrMatrix {
            rows: self.rows,
            cols: self.cols,
            indptr,
            indices,
            data,
        }
    }
}

/// A sparse matrix in CSR layout with sorted column indices per row.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl CsrMatrix {
    /// An all-zero matrix with an empty pattern.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            indptr: vec![0; rows + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn from_triplets(
        rows: usize,
        cols: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        let mut builder = TripletBuilder::new(rows, cols);
        for (r, c, v) in triplets {
            builder.push(r, c, v);
        }
        builder.build()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Column indices stored in row `i`.
    pub fn row_indices(&self, i: usize) -> &[usize] {
        &self.indices[self.indptr[i]..self.indptr[i + 1]]
    }

    /// `(col, value)` pairs of row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.indptr[i]..self.indptr[i + 1];
        self.indices[range.clone()]
            .iter()
            .copied()
            .zip(self.data[range].iter().copied())
    }

    pub fn row_nnz(&self, i: usize) -> usize {
        self.indptr[i + 1] - self.indptr[i]
    }

    /// Value at `(i, j)`, zero if not stored.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let start = self.indptr[i];
        match self.row_indices(i).binary_search(&j) {
            Ok(pos) => self.data[start + pos],
            Err(_) => 0.0,
        }
    }

    /// `(row, col)` of every stored entry in storage order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.rows).flat_map(move |r| self.row_indices(r).iter().map(move |&c| (r, c)))
    }

    /// Same pattern, new values.
    pub fn with_data(&self, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), self.nnz(), "data must match the pattern");
        Self {
            rows: self.rows,
            cols: self.cols,
            indptr: self.indptr.clone(),
            indices: self.indices.clone(),
            data,
        }
    }

    pub fn transpose(&self) -> Self {
        let mut indptr = vec![0usize; self.cols + 1];
        for &c in &self.indices {
            indptr[c + 1] += 1;
        }
        for j in 0..self.cols {
            indptr[j + 1] += indptr[j];
        }

        let mut next = indptr.clone();
        let mut indices = vec![0usize; self.nnz()];
        let mut data = vec![0.0; self.nnz()];
        for r in 0..self.rows {
            for k in self.indptr[r]..self.indptr[r + 1] {
                let c = self.indices[k];
                let dst = next[c];
                indices[dst] = r;
                data[dst] = self.data[k];
                next[c] += 1;
            }
        }

        Self {
            rows: self.cols,
            cols: self.rows,
            indptr,
            indices,
            data,
        }
    }

    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.rows)
            .map(|r| self.data[self.indptr[r]..self.indptr[r + 1]].iter().sum())
            .collect()
    }

    /// Multiply row `i` by `factors[i]`.
    pub fn scale_rows(&self, factors: &[f64]) -> Self {
        debug_assert_eq!(factors.len(), self.rows);
        let mut data = self.data.clone();
        for r in 0..self.rows {
            for v in &mut data[self.indptr[r]..self.indptr[r + 1]] {
                *v *= factors[r];
            }
        }
        self.with_data(data)
    }

    /// Divide each row by its sum; all-zero rows stay zero.
    pub fn normalize_rows_l1(&self) -> Self {
        let factors: Vec<f64> = self
            .row_sums()
            .into_iter()
            .map(|s| if s != 0.0 { 1.0 / s } else { 0.0 })
            .collect();
        self.scale_rows(&factors)
    }

    /// Row vector times matrix: `v^T · M`.
    pub fn vec_mul(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(v.len(), self.rows);
        let mut out = vec![0.0; self.cols];
        for (r, &x) in v.iter().enumerate() {
            if x == 0.0 {
                continue;
            }
            for (c, value) in self.row(r) {
                out[c] += x * value;
            }
        }
        out
    }

    /// Matrix times column vector: `M · v`.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(v.len(), self.cols);
        (0..self.rows)
            .map(|r| self.row(r).map(|(c, value)| value * v[c]).sum())
            .collect()
    }

    /// Sparse times dense: `M · X`.
    pub fn mul_dense(&self, x: &Array2<f64>) -> Array2<f64> {
        debug_assert_eq!(x.nrows(), self.cols);
        let mut out = Array2::zeros((self.rows, x.ncols()));
        for r in 0..self.rows {
            let mut target = out.row_mut(r);
            for (c, value) in self.row(r) {
                target.scaled_add(value, &x.row(c));
            }
        }
        out
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut out = Array2::zeros((self.rows, self.cols));
        for r in 0..self.rows {
            for (c, value) in self.row(r) {
                out[[r, c]] += value;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> CsrMatrix {
        // [[1, 0, 2],
        //  [0, 0, 0],
        //  [3, 4, 0]]
        CsrMatrix::from_triplets(3, 3, [(2, 1, 4.0), (0, 2, 2.0), (0, 0, 1.0), (2, 0, 3.0)])
    }

    #[test]
    fn test_build_sorts_and_sums_duplicates() {
        let m = CsrMatrix::from_triplets(2, 2, [(1, 1, 1.0), (0, 1, 1.0), (1, 1, 2.0)]);
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.get(1, 1), 3.0);
        assert_eq!(m.indptr(), &[0, 1, 2]);
    }

    #[test]
    fn test_transpose() {
        let m = sample();
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 3));
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(m.get(i, j), t.get(j, i));
            }
        }
        assert_eq!(t.row_indices(0), &[0, 2]);
    }

    #[test]
    fn test_products() {
        let m = sample();
        assert_eq!(m.vec_mul(&[1.0, 1.0, 1.0]), vec![4.0, 4.0, 2.0]);
        assert_eq!(m.mul_vec(&[1.0, 1.0, 1.0]), vec![3.0, 0.0, 7.0]);

        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let y = m.mul_dense(&x);
        assert_eq!(y, array![[3.0, 2.0], [0.0, 0.0], [3.0, 4.0]]);
        assert_eq!(m.to_dense().dot(&x), y);
    }

    #[test]
    fn test_normalize_rows() {
        let q = sample().normalize_rows_l1();
        let sums = q.row_sums();
        assert!((sums[0] - 1.0).abs() < 1e-12);
        assert_eq!(sums[1], 0.0);
        assert!((sums[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_with_data_shares_pattern() {
        let m = sample();
        let ones = m.with_data(vec![1.0; m.nnz()]);
        assert_eq!(ones.indices(), m.indices());
        assert_eq!(ones.row_sums(), vec![2.0, 0.0, 2.0]);
    }

    #[test]
    fn test_empty_shapes() {
        let m = CsrMatrix::zeros(2, 0);
        assert_eq!(m.shape(), (2, 0));
        assert_eq!(m.transpose().shape(), (0, 2));
        assert_eq!(m.row_sums(), vec![0.0, 0.0]);
    }
}

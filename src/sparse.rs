//! Sparse matrix utilities.
//!
//! Helper functions for working with nalgebra-sparse matrices.

use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Create a CSC matrix from triplets (row, col, value).
///
/// Duplicates are summed together.
pub fn csc_from_triplets(
    nrows: usize,
    ncols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
) -> CscMatrix<f64> {
    if rows.is_empty() {
        return CscMatrix::zeros(nrows, ncols);
    }

    // Build COO matrix first
    let mut coo = CooMatrix::new(nrows, ncols);
    for ((row, col), val) in rows.into_iter().zip(cols).zip(vals) {
        if row < nrows && col < ncols {
            coo.push(row, col, val);
        }
    }

    // Convert to CSC
    CscMatrix::from(&coo)
}

/// Sparse matrix-vector product `A x`.
pub fn csc_mul_vec(a: &CscMatrix<f64>, x: &[f64]) -> Vec<f64> {
    let mut y = vec![0.0; a.nrows()];
    for (row, col, val) in a.triplet_iter() {
        y[row] += val * x[col];
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csc_from_triplets() {
        let m = csc_from_triplets(3, 3, vec![0, 1, 2], vec![0, 1, 2], vec![1.0, 2.0, 3.0]);
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 3);
        assert_eq!(m.nnz(), 3);
    }

    #[test]
    fn test_duplicates_summed() {
        let m = csc_from_triplets(1, 1, vec![0, 0], vec![0, 0], vec![1.5, 2.0]);
        assert_eq!(csc_mul_vec(&m, &[2.0]), vec![7.0]);
    }

    #[test]
    fn test_csc_mul_vec() {
        let m = csc_from_triplets(2, 3, vec![0, 0, 1], vec![0, 2, 1], vec![1.0, 2.0, -1.0]);
        assert_eq!(csc_mul_vec(&m, &[1.0, 4.0, 3.0]), vec![7.0, -4.0]);
    }

    #[test]
    fn test_empty_triplets() {
        let m = csc_from_triplets(2, 2, vec![], vec![], vec![]);
        assert_eq!(m.nnz(), 0);
        assert_eq!(csc_mul_vec(&m, &[1.0, 1.0]), vec![0.0, 0.0]);
    }
}

use log::{debug, warn};
use serde::Serialize;

use crate::error::{Result, SpkError};
use crate::matrix::Matrix;
use crate::spectral::jacobi::EigenDecomposition;

/// Row-normalized spectral embedding `T` (n x k).
#[derive(Debug, Clone, Serialize)]
pub struct Embedding {
    pub matrix: Matrix,
    pub k: usize,
    /// Rows whose projection had zero norm; they are left as zero vectors.
    pub zero_rows: Vec<usize>,
}

pub struct SpectralEmbedder;

impl SpectralEmbedder {
    /// Projects every point onto the `k` eigenvectors with the smallest
    /// eigenvalues and scales each row to unit length.
    pub fn embed(eigen: &EigenDecomposition, k: usize) -> Result<Embedding> {
        let n = eigen.len();
        if k == 0 || k > n {
            return Err(SpkError::InvalidK { k, n });
        }
        if eigen.eigenvectors.shape() != (n, n) {
            return Err(SpkError::shape(
                "spectral embedding",
                (n, n),
                eigen.eigenvectors.shape(),
            ));
        }

        let order = eigen.sorted_order();
        let mut matrix = Matrix::zeros(n, k)?;
        for (column, &source) in order.iter().take(k).enumerate() {
            for row in 0..n {
                matrix[(row, column)] = eigen.eigenvectors[(row, source)];
            }
        }

        let mut zero_rows = Vec::new();
        for row in 0..n {
            let norm = matrix.row_norm(row);
            if norm == 0.0 {
                zero_rows.push(row);
            } else {
                matrix.scale_row(row, 1.0 / norm);
            }
        }
        if !zero_rows.is_empty() {
            warn!(
                "{} embedded rows have zero norm and stay at the origin: {:?}",
                zero_rows.len(),
                zero_rows
            );
        }
        debug!("spectral embedding built: {} points x {} dimensions", n, k);

        Ok(Embedding {
            matrix,
            k,
            zero_rows,
        })
    }
}

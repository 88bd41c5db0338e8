use log::debug;
use rayon::prelude::*;

use crate::error::{Result, SpkError};
use crate::matrix::Matrix;
use crate::points::PointSet;

/// Fully connected similarity graph over a point set.
///
/// Edge weights follow `w_ij = exp(-||x_i - x_j|| / 2)` with an empty
/// diagonal, so the adjacency matrix is symmetric by construction.
#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    adjacency: Matrix,
    degrees: Vec<f64>,
}

impl SimilarityGraph {
    pub fn build(points: &PointSet) -> Result<Self> {
        let n = points.len();
        let mut adjacency = Matrix::zeros(n, n)?;

        // Column j holds w_ij for every i; symmetry lets us fill columns in place.
        adjacency
            .column_major_mut()
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(j, column)| {
                for (i, cell) in column.iter_mut().enumerate() {
                    if i != j {
                        *cell = (-points.distance(i, j) / 2.0).exp();
                    }
                }
            });

        let degrees: Vec<f64> = (0..n)
            .map(|i| adjacency.row(i).iter().sum::<f64>())
            .collect();
        debug!(
            "similarity graph over {} points, degree range [{:.6}, {:.6}]",
            n,
            degrees.iter().copied().fold(f64::INFINITY, f64::min),
            degrees.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        );

        Ok(Self { adjacency, degrees })
    }

    pub fn node_count(&self) -> usize {
        self.degrees.len()
    }

    pub fn adjacency(&self) -> &Matrix {
        &self.adjacency
    }

    pub fn into_adjacency(self) -> Matrix {
        self.adjacency
    }

    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    pub fn degree_matrix(&self) -> Result<Matrix> {
        Matrix::from_diagonal(&self.degrees)
    }

    /// Diagonal of `D^-1/2`.
    ///
    /// Fails on the first point whose degree is at or below `min_degree`.
    pub fn inverse_sqrt_degrees(&self, min_degree: f64) -> Result<Vec<f64>> {
        self.degrees
            .iter()
            .enumerate()
            .map(|(index, &degree)| {
                if degree <= min_degree || degree <= 0.0 {
                    Err(SpkError::SingularDegree { index, degree })
                } else {
                    Ok(1.0 / degree.sqrt())
                }
            })
            .collect()
    }
}

use log::debug;

use crate::config::GraphConfig;
use crate::error::Result;
use crate::graph::similarity::SimilarityGraph;
use crate::matrix::Matrix;

/// Builds the normalized graph Laplacian \( L = I - D^{-1/2} W D^{-1/2} \).
pub struct NormalizedLaplacianBuilder;

impl NormalizedLaplacianBuilder {
    pub fn build(graph: &SimilarityGraph, config: &GraphConfig) -> Result<Matrix> {
        let n = graph.node_count();
        let inv_sqrt = graph.inverse_sqrt_degrees(config.min_degree)?;
        let adjacency = graph.adjacency();

        let mut laplacian = Matrix::identity(n)?;
        for i in 0..n {
            for j in (i + 1)..n {
                let value = -(inv_sqrt[i] * adjacency[(i, j)]) * inv_sqrt[j];
                laplacian[(i, j)] = value;
                laplacian[(j, i)] = value;
            }
        }

        debug!("normalized laplacian built for {} points", n);
        Ok(laplacian)
    }
}

use std::time::Instant;

use log::{debug, info};

use crate::config::SpkConfig;
use crate::error::{Result, SpkError};
use crate::graph::{NormalizedLaplacianBuilder, SimilarityGraph};
use crate::kmeans::{InitialCentroids, KMeansRefiner};
use crate::matrix::Matrix;
use crate::pipeline::goal::{ClusterSummary, Goal, GoalOutput, PipelineRequest};
use crate::points::PointSet;
use crate::spectral::{
    EigenDecomposition, EigengapSelector, Embedding, JacobiSolver, SpectralEmbedder,
};

/// Normalized spectral clustering over a point set.
///
/// Every call builds its matrices from scratch; a pipeline holds only its
/// configuration and can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct SpectralPipeline {
    config: SpkConfig,
}

struct SpectralStage {
    embedding: Embedding,
    eigengap_selected: bool,
    rotations: usize,
    converged: bool,
}

impl SpectralPipeline {
    pub fn new(config: SpkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SpkConfig {
        &self.config
    }

    pub fn execute(&self, points: &PointSet, request: &PipelineRequest) -> Result<GoalOutput> {
        let start = Instant::now();
        let output = match request.goal {
            Goal::Wam => GoalOutput::Wam(self.adjacency(points)?),
            Goal::Ddg => GoalOutput::Ddg(self.degree(points)?),
            Goal::Lnorm => GoalOutput::Lnorm(self.laplacian(points)?),
            Goal::Jacobi => GoalOutput::Jacobi(self.decompose_input(points)?),
            Goal::Spk => GoalOutput::Spk(self.embed(points, request.k)?),
            Goal::Cluster => GoalOutput::Cluster(self.cluster(
                points,
                request.k,
                request.initial_centroids.clone(),
            )?),
        };
        info!(
            "goal {} finished for {} points in {:?}",
            request.goal,
            points.len(),
            start.elapsed()
        );
        Ok(output)
    }

    pub fn adjacency(&self, points: &PointSet) -> Result<Matrix> {
        Ok(SimilarityGraph::build(points)?.into_adjacency())
    }

    pub fn degree(&self, points: &PointSet) -> Result<Matrix> {
        SimilarityGraph::build(points)?.degree_matrix()
    }

    pub fn laplacian(&self, points: &PointSet) -> Result<Matrix> {
        let graph = SimilarityGraph::build(points)?;
        NormalizedLaplacianBuilder::build(&graph, &self.config.graph)
    }

    pub fn decompose(&self, matrix: &Matrix) -> Result<EigenDecomposition> {
        JacobiSolver::new(self.config.jacobi.clone()).solve(matrix)
    }

    /// Reads the point coordinates as an `n x n` symmetric matrix and decomposes it.
    pub fn decompose_input(&self, points: &PointSet) -> Result<EigenDecomposition> {
        self.decompose(&points.to_matrix()?)
    }

    pub fn embed(&self, points: &PointSet, k: Option<usize>) -> Result<Embedding> {
        Ok(self.spectral_stage(points, k)?.embedding)
    }

    pub fn cluster(
        &self,
        points: &PointSet,
        k: Option<usize>,
        initial_centroids: Option<Vec<usize>>,
    ) -> Result<ClusterSummary> {
        let stage = self.spectral_stage(points, k)?;
        let init = match initial_centroids {
            Some(indices) => InitialCentroids::Indices(indices),
            None => InitialCentroids::PlusPlus,
        };
        let kmeans = KMeansRefiner::new(self.config.kmeans.clone()).refine(
            &stage.embedding.matrix,
            stage.embedding.k,
            init,
        )?;

        Ok(ClusterSummary {
            assignment: kmeans.assignment.clone(),
            k: stage.embedding.k,
            eigengap_selected: stage.eigengap_selected,
            jacobi_rotations: stage.rotations,
            jacobi_converged: stage.converged,
            kmeans,
        })
    }

    fn spectral_stage(&self, points: &PointSet, k: Option<usize>) -> Result<SpectralStage> {
        let n = points.len();
        if let Some(k) = k {
            if k == 0 || k > n {
                return Err(SpkError::InvalidK { k, n });
            }
        }

        let laplacian = self.laplacian(points)?;
        let eigen = self.decompose(&laplacian)?;
        let chosen = EigengapSelector::resolve(k, &eigen.eigenvalues)?;
        debug!(
            "spectral stage: k = {} ({}), {} jacobi rotations",
            chosen,
            if k.is_some() { "requested" } else { "eigengap" },
            eigen.rotations
        );
        let embedding = SpectralEmbedder::embed(&eigen, chosen)?;

        Ok(SpectralStage {
            embedding,
            eigengap_selected: k.is_none(),
            rotations: eigen.rotations,
            converged: eigen.converged,
        })
    }
}

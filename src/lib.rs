pub mod config;
pub mod error;
pub mod graph;
pub mod kmeans;
pub mod matrix;
pub mod pipeline;
pub mod points;
pub mod spectral;

pub use config::{GraphConfig, JacobiConfig, KMeansConfig, SpkConfig};
pub use error::{Result, SpkError};
pub use graph::{NormalizedLaplacianBuilder, SimilarityGraph};
pub use kmeans::{InitialCentroids, KMeansOutcome, KMeansRefiner};
pub use matrix::Matrix;
pub use pipeline::{ClusterSummary, Goal, GoalOutput, PipelineRequest, SpectralPipeline};
pub use points::PointSet;
pub use spectral::{
    EigenDecomposition, EigengapSelector, Embedding, JacobiSolver, SpectralEmbedder,
    SpectralProfile,
};

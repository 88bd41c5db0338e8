pub mod laplacian;
pub mod similarity;

pub use laplacian::NormalizedLaplacianBuilder;
pub use similarity::SimilarityGraph;

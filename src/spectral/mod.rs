pub mod eigengap;
pub mod embedding;
pub mod jacobi;

pub use eigengap::{EigengapSelector, SpectralProfile};
pub use embedding::{Embedding, SpectralEmbedder};
pub use jacobi::{EigenDecomposition, JacobiSolver};

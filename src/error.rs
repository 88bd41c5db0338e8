use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpkError>;

/// Failures surfaced by the clustering pipeline.
///
/// Every variant is raised at a stage boundary; no stage hands a partial
/// result to the next one once an invariant is violated.
#[derive(Debug, Error)]
pub enum SpkError {
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },

    #[error("point {index} has degree {degree}; D^-1/2 is undefined for isolated points")]
    SingularDegree { index: usize, degree: f64 },

    #[error("matrix is not symmetric at ({row}, {col}): |a_ij - a_ji| = {delta}")]
    NonSymmetricInput { row: usize, col: usize, delta: f64 },

    #[error("invalid cluster count k = {k} for {n} points (expected 1 <= k <= n)")]
    InvalidK { k: usize, n: usize },

    #[error("failed to allocate a {rows}x{cols} matrix")]
    AllocationFailure { rows: usize, cols: usize },

    #[error("invalid point set: {reason}")]
    InvalidPoints { reason: String },

    #[error("invalid initial centroids: {reason}")]
    InvalidCentroids { reason: String },

    #[error("unknown goal '{0}' (expected wam, ddg, lnorm, jacobi, spk or cluster)")]
    InvalidGoal(String),

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("failed to parse configuration")]
    ConfigParse(#[from] serde_json::Error),
}

impl SpkError {
    pub(crate) fn shape(
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        SpkError::DimensionMismatch {
            context,
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }
}

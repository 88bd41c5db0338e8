use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpkError;
use crate::kmeans::KMeansOutcome;
use crate::matrix::Matrix;
use crate::spectral::{EigenDecomposition, Embedding};

/// Which stage's output a pipeline run should return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    /// Weighted adjacency matrix.
    Wam,
    /// Diagonal degree matrix.
    Ddg,
    /// Normalized graph Laplacian.
    Lnorm,
    /// Eigen-decomposition of the input, read as a symmetric matrix.
    Jacobi,
    /// Row-normalized spectral embedding.
    Spk,
    #[default]
    Cluster,
}

impl Goal {
    pub const ALL: [Goal; 6] = [
        Goal::Wam,
        Goal::Ddg,
        Goal::Lnorm,
        Goal::Jacobi,
        Goal::Spk,
        Goal::Cluster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::Wam => "wam",
            Goal::Ddg => "ddg",
            Goal::Lnorm => "lnorm",
            Goal::Jacobi => "jacobi",
            Goal::Spk => "spk",
            Goal::Cluster => "cluster",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Goal {
    type Err = SpkError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Goal::ALL
            .into_iter()
            .find(|goal| goal.as_str() == normalized)
            .ok_or_else(|| SpkError::InvalidGoal(value.to_string()))
    }
}

/// A single pipeline invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineRequest {
    pub goal: Goal,
    /// Cluster count; the eigengap heuristic decides when absent.
    pub k: Option<usize>,
    /// Embedded rows used as the starting centroids instead of k-means++.
    pub initial_centroids: Option<Vec<usize>>,
}

impl PipelineRequest {
    pub fn new(goal: Goal) -> Self {
        Self {
            goal,
            ..Self::default()
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }

    pub fn with_initial_centroids(mut self, indices: Vec<usize>) -> Self {
        self.initial_centroids = Some(indices);
        self
    }
}

/// Final clustering of a point set.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    /// Cluster id in `0..k` for every input point.
    pub assignment: Vec<usize>,
    pub k: usize,
    pub eigengap_selected: bool,
    pub jacobi_rotations: usize,
    pub jacobi_converged: bool,
    pub kmeans: KMeansOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "goal", content = "result", rename_all = "lowercase")]
pub enum GoalOutput {
    Wam(Matrix),
    Ddg(Matrix),
    Lnorm(Matrix),
    Jacobi(EigenDecomposition),
    Spk(Embedding),
    Cluster(ClusterSummary),
}

impl GoalOutput {
    pub fn goal(&self) -> Goal {
        match self {
            GoalOutput::Wam(_) => Goal::Wam,
            GoalOutput::Ddg(_) => Goal::Ddg,
            GoalOutput::Lnorm(_) => Goal::Lnorm,
            GoalOutput::Jacobi(_) => Goal::Jacobi,
            GoalOutput::Spk(_) => Goal::Spk,
            GoalOutput::Cluster(_) => Goal::Cluster,
        }
    }

    /// Matrix-shaped view of the output as a list of rows.
    ///
    /// The jacobi goal yields the eigenvalues as the first row followed by
    /// the eigenvector matrix; the cluster goal yields one `[cluster id]`
    /// row per point.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        match self {
            GoalOutput::Wam(matrix) | GoalOutput::Ddg(matrix) | GoalOutput::Lnorm(matrix) => {
                matrix.to_rows()
            }
            GoalOutput::Jacobi(eigen) => {
                let mut rows = vec![eigen.eigenvalues.clone()];
                rows.extend(eigen.eigenvectors.to_rows());
                rows
            }
            GoalOutput::Spk(embedding) => embedding.matrix.to_rows(),
            GoalOutput::Cluster(summary) => summary
                .assignment
                .iter()
                .map(|&cluster| vec![cluster as f64])
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_goal_names() {
        assert_eq!("wam".parse::<Goal>().expect("goal"), Goal::Wam);
        assert_eq!(" LNorm ".parse::<Goal>().expect("goal"), Goal::Lnorm);
        for goal in Goal::ALL {
            assert_eq!(goal.to_string().parse::<Goal>().expect("goal"), goal);
        }
    }

    #[test]
    fn unknown_goal_is_rejected() {
        let err = "laplacian".parse::<Goal>().unwrap_err();
        assert!(matches!(err, SpkError::InvalidGoal(name) if name == "laplacian"));
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let request: PipelineRequest = serde_json::from_str(r#"{"goal": "spk"}"#).expect("request");
        assert_eq!(request, PipelineRequest::new(Goal::Spk));

        let request: PipelineRequest =
            serde_json::from_str(r#"{"k": 3, "initial_centroids": [0, 4, 7]}"#).expect("request");
        assert_eq!(
            request,
            PipelineRequest::new(Goal::Cluster)
                .with_k(3)
                .with_initial_centroids(vec![0, 4, 7])
        );
    }

    #[test]
    fn jacobi_rows_start_with_eigenvalues() {
        let output = GoalOutput::Jacobi(EigenDecomposition {
            eigenvalues: vec![1.0, 2.0],
            eigenvectors: Matrix::identity(2).expect("identity"),
            rotations: 0,
            converged: true,
            off_diagonal: 0.0,
        });
        assert_eq!(output.goal(), Goal::Jacobi);
        assert_eq!(
            output.to_rows(),
            vec![vec![1.0, 2.0], vec![1.0, 0.0], vec![0.0, 1.0]]
        );
    }

    #[test]
    fn matrix_output_serializes_with_goal_tag() {
        let output = GoalOutput::Ddg(Matrix::from_diagonal(&[1.0, 2.0]).expect("diag"));
        let json = serde_json::to_value(&output).expect("serialize");
        assert_eq!(json["goal"], "ddg");
        assert_eq!(json["result"][1][1], 2.0);
    }
}

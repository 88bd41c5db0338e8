use serde::{Deserialize, Serialize};

use crate::error::{Result, SpkError};

/// Numerical knobs for every stage of the pipeline.
///
/// All sections fall back to their defaults when omitted, so a partial JSON
/// document such as `{"jacobi": {"max_rotations": 500}}` is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpkConfig {
    pub graph: GraphConfig,
    pub jacobi: JacobiConfig,
    pub kmeans: KMeansConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// A point whose degree is at or below this value is treated as isolated.
    pub min_degree: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { min_degree: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JacobiConfig {
    /// Stop once the off-diagonal sum of squares drops below this value.
    pub epsilon: f64,
    pub max_rotations: usize,
    pub symmetry_tolerance: f64,
}

impl Default for JacobiConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-5,
            max_rotations: 100,
            symmetry_tolerance: 1e-9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    pub max_iter: usize,
    /// Largest centroid displacement still considered "not moving".
    pub epsilon: f64,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iter: 300,
            epsilon: 1e-9,
            seed: 0,
        }
    }
}

impl SpkConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SpkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if is_negative_or_nan(self.graph.min_degree) {
            return Err(invalid(format!(
                "graph.min_degree must be a non-negative number, got {}",
                self.graph.min_degree
            )));
        }
        if self.jacobi.epsilon.is_nan() || self.jacobi.epsilon <= 0.0 {
            return Err(invalid(format!(
                "jacobi.epsilon must be positive, got {}",
                self.jacobi.epsilon
            )));
        }
        if self.jacobi.max_rotations == 0 {
            return Err(invalid("jacobi.max_rotations must be at least 1".into()));
        }
        if is_negative_or_nan(self.jacobi.symmetry_tolerance) {
            return Err(invalid(format!(
                "jacobi.symmetry_tolerance must be a non-negative number, got {}",
                self.jacobi.symmetry_tolerance
            )));
        }
        if self.kmeans.max_iter == 0 {
            return Err(invalid("kmeans.max_iter must be at least 1".into()));
        }
        if is_negative_or_nan(self.kmeans.epsilon) {
            return Err(invalid(format!(
                "kmeans.epsilon must be a non-negative number, got {}",
                self.kmeans.epsilon
            )));
        }
        Ok(())
    }
}

fn is_negative_or_nan(value: f64) -> bool {
    value.is_nan() || value < 0.0
}

fn invalid(reason: String) -> SpkError {
    SpkError::InvalidConfig { reason }
}

use log::debug;
use ndarray::Array1;

use crate::error::{Result, SpkError};

/// Ascending eigenvalue spectrum.
#[derive(Debug, Clone)]
pub struct SpectralProfile {
    pub eigenvalues: Array1<f64>,
}

impl SpectralProfile {
    pub fn new(eigenvalues: &[f64]) -> Self {
        let mut sorted = eigenvalues.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self {
            eigenvalues: Array1::from(sorted),
        }
    }

    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Consecutive gaps `lambda_{i+1} - lambda_i` over the lower half of the spectrum.
    pub fn lower_half_gaps(&self) -> Array1<f64> {
        let half = self.len() / 2;
        Array1::from_iter((0..half).map(|i| self.eigenvalues[i + 1] - self.eigenvalues[i]))
    }
}

/// Picks the cluster count from the largest eigengap.
pub struct EigengapSelector;

impl EigengapSelector {
    /// `k = argmax_i (lambda_{i+1} - lambda_i) + 1` for `i < floor(n / 2)`.
    ///
    /// The first maximal gap wins ties.
    pub fn select(eigenvalues: &[f64]) -> Result<usize> {
        let n = eigenvalues.len();
        if n < 2 {
            return Err(SpkError::DimensionMismatch {
                context: "eigengap heuristic",
                expected: "at least 2 eigenvalues".to_string(),
                actual: n.to_string(),
            });
        }

        let profile = SpectralProfile::new(eigenvalues);
        let gaps = profile.lower_half_gaps();
        let mut best = 0;
        for (i, gap) in gaps.iter().enumerate() {
            if *gap > gaps[best] {
                best = i;
            }
        }
        let k = best + 1;
        debug!("eigengap heuristic chose k = {} (gap {:.6})", k, gaps[best]);
        Ok(k)
    }

    /// Uses `requested` when present, otherwise falls back to the heuristic.
    pub fn resolve(requested: Option<usize>, eigenvalues: &[f64]) -> Result<usize> {
        let n = eigenvalues.len();
        match requested {
            Some(k) if (1..=n).contains(&k) => Ok(k),
            Some(k) => Err(SpkError::InvalidK { k, n }),
            None => Self::select(eigenvalues),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_gap_after_third_eigenvalue_selects_three() {
        let spectrum = [0.95, 0.0, 1.2, 0.02, 0.9, 1.0, 0.01, 1.1];
        assert_eq!(EigengapSelector::select(&spectrum).expect("k"), 3);
    }

    #[test]
    fn only_lower_half_is_inspected() {
        // The largest gap (1.0 -> 10.0) sits in the upper half and is ignored.
        let spectrum = [0.0, 0.1, 0.5, 0.6, 1.0, 10.0];
        assert_eq!(EigengapSelector::select(&spectrum).expect("k"), 2);
    }

    #[test]
    fn ties_pick_the_first_gap() {
        let spectrum = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(EigengapSelector::select(&spectrum).expect("k"), 1);
    }

    #[test]
    fn explicit_k_takes_precedence() {
        let spectrum = [0.0, 0.01, 0.5, 0.9];
        assert_eq!(EigengapSelector::resolve(Some(4), &spectrum).expect("k"), 4);
        assert_eq!(EigengapSelector::resolve(None, &spectrum).expect("k"), 2);
    }

    #[test]
    fn out_of_range_k_is_rejected() {
        let spectrum = [0.0, 0.5];
        assert!(matches!(
            EigengapSelector::resolve(Some(0), &spectrum),
            Err(SpkError::InvalidK { k: 0, n: 2 })
        ));
        assert!(matches!(
            EigengapSelector::resolve(Some(3), &spectrum),
            Err(SpkError::InvalidK { k: 3, n: 2 })
        ));
    }

    #[test]
    fn profile_is_sorted() {
        let profile = SpectralProfile::new(&[2.0, 0.0, 1.0]);
        assert_eq!(profile.eigenvalues.to_vec(), vec![0.0, 1.0, 2.0]);
        assert_eq!(profile.lower_half_gaps().to_vec(), vec![1.0]);
    }

    #[test]
    fn single_eigenvalue_is_a_dimension_error() {
        let err = EigengapSelector::select(&[0.0]).unwrap_err();
        assert!(matches!(
            err,
            SpkError::DimensionMismatch {
                context: "eigengap heuristic",
                ..
            }
        ));
    }
}

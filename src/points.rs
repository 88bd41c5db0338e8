use ndarray::{Array2, ArrayView1};

use crate::error::{Result, SpkError};
use crate::matrix::Matrix;

/// Validated `n x d` set of input points.
///
/// Construction enforces the input contract of the pipeline: at least two
/// points, at least one coordinate each, every coordinate finite.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    data: Array2<f64>,
}

impl PointSet {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let d = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != d) {
            return Err(SpkError::InvalidPoints {
                reason: format!(
                    "point {index} has {} coordinates, expected {d}",
                    row.len()
                ),
            });
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Self::from_flat(n, d, flat)
    }

    /// Builds a point set from `n * d` row-major coordinates.
    pub fn from_flat(n: usize, d: usize, coordinates: Vec<f64>) -> Result<Self> {
        if n < 2 {
            return Err(SpkError::InvalidPoints {
                reason: format!("need at least 2 points, got {n}"),
            });
        }
        if d < 1 {
            return Err(SpkError::InvalidPoints {
                reason: "points must have at least one coordinate".to_string(),
            });
        }
        if let Some(position) = coordinates.iter().position(|v| !v.is_finite()) {
            return Err(SpkError::InvalidPoints {
                reason: format!(
                    "coordinate {} of point {} is not finite",
                    position % d,
                    position / d
                ),
            });
        }
        let data = Array2::from_shape_vec((n, d), coordinates).map_err(|err| {
            SpkError::InvalidPoints {
                reason: format!("cannot shape coordinates as {n}x{d}: {err}"),
            }
        })?;
        Ok(Self { data })
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn dimension(&self) -> usize {
        self.data.ncols()
    }

    pub fn point(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.row(index)
    }

    pub fn distance(&self, a: usize, b: usize) -> f64 {
        self.point(a)
            .iter()
            .zip(self.point(b).iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }

    /// Copies the coordinates into an `n x d` [`Matrix`].
    pub fn to_matrix(&self) -> Result<Matrix> {
        let coordinates: Vec<f64> = self.data.iter().copied().collect();
        Matrix::from_row_slice(self.len(), self.dimension(), &coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_and_flat_agree() {
        let rows = PointSet::from_rows(vec![vec![0.0, 0.0], vec![3.0, 4.0]]).expect("points");
        let flat = PointSet::from_flat(2, 2, vec![0.0, 0.0, 3.0, 4.0]).expect("points");
        assert_eq!(rows, flat);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.dimension(), 2);
        assert_eq!(rows.distance(0, 1), 5.0);
        assert_eq!(rows.to_matrix().expect("matrix").row(1), vec![3.0, 4.0]);
    }

    #[test]
    fn rejects_single_point() {
        let err = PointSet::from_rows(vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, SpkError::InvalidPoints { .. }));
    }

    #[test]
    fn rejects_zero_dimensional_points() {
        let err = PointSet::from_rows(vec![vec![], vec![]]).unwrap_err();
        assert!(matches!(err, SpkError::InvalidPoints { .. }));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = PointSet::from_rows(vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, SpkError::InvalidPoints { .. }));
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let err = PointSet::from_flat(2, 2, vec![0.0, 1.0, f64::NAN, 2.0]).unwrap_err();
        match err {
            SpkError::InvalidPoints { reason } => {
                assert!(reason.contains("coordinate 0 of point 1"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_coordinate_count() {
        assert!(PointSet::from_flat(2, 2, vec![0.0, 1.0, 2.0]).is_err());
    }
}

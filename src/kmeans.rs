use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::KMeansConfig;
use crate::error::{Result, SpkError};
use crate::matrix::Matrix;

/// How the first set of centroids is chosen.
#[derive(Debug, Clone, Default)]
pub enum InitialCentroids {
    /// Seeded k-means++ (`D^2` weighting).
    #[default]
    PlusPlus,
    /// Rows of the data matrix to start from, one per cluster.
    Indices(Vec<usize>),
    /// Explicit centroid coordinates (k x dim).
    Coordinates(Matrix),
}

#[derive(Debug, Clone, Serialize)]
pub struct KMeansOutcome {
    /// Cluster id of every row, in `0..k`.
    pub assignment: Vec<usize>,
    pub centroids: Matrix,
    pub iterations: usize,
    pub converged: bool,
    /// Objective value after every assignment step, starting with the initial one.
    pub inertia_history: Vec<f64>,
}

impl KMeansOutcome {
    pub fn inertia(&self) -> f64 {
        self.inertia_history.last().copied().unwrap_or_default()
    }
}

/// Lloyd's k-means over the rows of a matrix.
#[derive(Debug, Clone, Default)]
pub struct KMeansRefiner {
    config: KMeansConfig,
}

impl KMeansRefiner {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    pub fn refine(&self, data: &Matrix, k: usize, init: InitialCentroids) -> Result<KMeansOutcome> {
        let n = data.nrows();
        if k == 0 || k > n {
            return Err(SpkError::InvalidK { k, n });
        }

        let rows = data.to_rows();
        let mut centroids = self.initial_centroids(&rows, data.ncols(), k, init)?;
        let (mut labels, inertia) = assign(&rows, &centroids);
        let mut inertia_history = vec![inertia];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iter {
            iterations += 1;
            let next = update_centroids(&rows, &labels, &centroids);
            let movement = max_shift(&centroids, &next);
            centroids = next;

            let (next_labels, inertia) = assign(&rows, &centroids);
            inertia_history.push(inertia);
            let unchanged = next_labels == labels;
            labels = next_labels;

            if unchanged || movement < self.config.epsilon {
                converged = true;
                break;
            }
        }

        if converged {
            debug!(
                "k-means converged after {} iterations (inertia {:.6})",
                iterations,
                inertia_history.last().copied().unwrap_or_default()
            );
        } else {
            warn!(
                "k-means reached the iteration cap of {} without converging",
                self.config.max_iter
            );
        }

        Ok(KMeansOutcome {
            assignment: labels,
            centroids: Matrix::from_rows(&centroids)?,
            iterations,
            converged,
            inertia_history,
        })
    }

    /// Runs Lloyd's iterations from explicit centroids and returns the final ones.
    pub fn fit_centroids(&self, data: &Matrix, initial: Matrix) -> Result<Matrix> {
        let k = initial.nrows();
        Ok(self
            .refine(data, k, InitialCentroids::Coordinates(initial))?
            .centroids)
    }

    fn initial_centroids(
        &self,
        rows: &[Vec<f64>],
        dim: usize,
        k: usize,
        init: InitialCentroids,
    ) -> Result<Vec<Vec<f64>>> {
        match init {
            InitialCentroids::PlusPlus => Ok(self
                .plus_plus_indices(rows, k)
                .into_iter()
                .map(|index| rows[index].clone())
                .collect()),
            InitialCentroids::Indices(indices) => {
                validate_indices(&indices, rows.len(), k)?;
                Ok(indices.into_iter().map(|index| rows[index].clone()).collect())
            }
            InitialCentroids::Coordinates(matrix) => {
                if matrix.shape() != (k, dim) {
                    return Err(SpkError::shape("initial centroids", (k, dim), matrix.shape()));
                }
                Ok(matrix.to_rows())
            }
        }
    }

    /// k-means++ seeding: each new centroid is drawn with probability
    /// proportional to its squared distance from the nearest chosen one.
    fn plus_plus_indices(&self, rows: &[Vec<f64>], k: usize) -> Vec<usize> {
        let n = rows.len();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);
        let first = rng.gen_range(0..n);
        let mut chosen = vec![first];
        let mut nearest: Vec<f64> = rows
            .iter()
            .map(|row| squared_distance(row, &rows[first]))
            .collect();

        while chosen.len() < k {
            let total: f64 = nearest.iter().sum();
            let sampled = if total > 0.0 {
                sample_weighted(&nearest, rng.gen::<f64>() * total)
            } else {
                None
            };
            // All remaining mass is zero: every point sits on a chosen centroid.
            let next = match sampled {
                Some(index) => index,
                None => match (0..n).find(|index| !chosen.contains(index)) {
                    Some(index) => index,
                    None => break,
                },
            };
            chosen.push(next);
            for (row, distance) in rows.iter().zip(nearest.iter_mut()) {
                *distance = distance.min(squared_distance(row, &rows[next]));
            }
        }

        debug!("k-means++ seeded centroids at rows {:?}", chosen);
        chosen
    }
}

fn validate_indices(indices: &[usize], n: usize, k: usize) -> Result<()> {
    if indices.len() != k {
        return Err(SpkError::InvalidCentroids {
            reason: format!("expected {k} indices, got {}", indices.len()),
        });
    }
    for (position, &index) in indices.iter().enumerate() {
        if index >= n {
            return Err(SpkError::InvalidCentroids {
                reason: format!("index {index} is out of range for {n} points"),
            });
        }
        if indices[..position].contains(&index) {
            return Err(SpkError::InvalidCentroids {
                reason: format!("index {index} is listed more than once"),
            });
        }
    }
    Ok(())
}

fn sample_weighted(weights: &[f64], target: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    for (index, &weight) in weights.iter().enumerate() {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        if cumulative > target {
            return Some(index);
        }
    }
    weights.iter().rposition(|&weight| weight > 0.0)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Nearest centroid for every row; the lowest cluster id wins ties.
fn assign(rows: &[Vec<f64>], centroids: &[Vec<f64>]) -> (Vec<usize>, f64) {
    let nearest: Vec<(usize, f64)> = rows
        .par_iter()
        .map(|row| {
            let mut best = (0, f64::INFINITY);
            for (cluster, centroid) in centroids.iter().enumerate() {
                let distance = squared_distance(row, centroid);
                if distance < best.1 {
                    best = (cluster, distance);
                }
            }
            best
        })
        .collect();
    let inertia = nearest.iter().map(|(_, distance)| distance).sum();
    let labels = nearest.into_iter().map(|(cluster, _)| cluster).collect();
    (labels, inertia)
}

/// Mean of each cluster's rows; an empty cluster keeps its previous centroid.
fn update_centroids(
    rows: &[Vec<f64>],
    labels: &[usize],
    previous: &[Vec<f64>],
) -> Vec<Vec<f64>> {
    let dim = previous.first().map(Vec::len).unwrap_or(0);
    let mut sums = vec![vec![0.0; dim]; previous.len()];
    let mut counts = vec![0usize; previous.len()];
    for (row, &label) in rows.iter().zip(labels) {
        counts[label] += 1;
        for (sum, value) in sums[label].iter_mut().zip(row) {
            *sum += value;
        }
    }
    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), old)| {
            if count == 0 {
                old.clone()
            } else {
                sum.into_iter().map(|value| value / count as f64).collect()
            }
        })
        .collect()
}

fn max_shift(old: &[Vec<f64>], new: &[Vec<f64>]) -> f64 {
    old.iter()
        .zip(new)
        .map(|(a, b)| squared_distance(a, b).sqrt())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Matrix {
        Matrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![5.0, 5.1],
        ])
        .expect("data")
    }

    fn same_partition(labels: &[usize], expected: &[usize]) -> bool {
        labels.iter().zip(expected).all(|(a, b)| {
            labels
                .iter()
                .zip(expected)
                .all(|(c, d)| (a == c) == (b == d))
        })
    }

    #[test]
    fn separates_two_blobs_with_plus_plus() {
        let outcome = KMeansRefiner::default()
            .refine(&two_blobs(), 2, InitialCentroids::PlusPlus)
            .expect("kmeans");
        assert!(outcome.converged);
        assert!(same_partition(&outcome.assignment, &[0, 0, 0, 1, 1, 1]));
    }

    #[test]
    fn explicit_indices_fix_cluster_ids() {
        let outcome = KMeansRefiner::default()
            .refine(&two_blobs(), 2, InitialCentroids::Indices(vec![3, 0]))
            .expect("kmeans");
        assert_eq!(outcome.assignment, vec![1, 1, 1, 0, 0, 0]);
        let centroid = outcome.centroids.row(0);
        assert!((centroid[0] - 15.1 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn inertia_never_increases() {
        let data = Matrix::from_rows(&[
            vec![0.0],
            vec![1.0],
            vec![2.0],
            vec![4.0],
            vec![7.0],
            vec![8.0],
            vec![11.0],
        ])
        .expect("data");
        let outcome = KMeansRefiner::default()
            .refine(&data, 3, InitialCentroids::Indices(vec![0, 1, 2]))
            .expect("kmeans");
        assert!(outcome.inertia_history.len() > 2);
        for pair in outcome.inertia_history.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-12, "{:?}", outcome.inertia_history);
        }
    }

    #[test]
    fn empty_cluster_keeps_previous_centroid() {
        let data = Matrix::from_rows(&[vec![0.0], vec![1.0]]).expect("data");
        let initial = Matrix::from_rows(&[vec![0.5], vec![100.0]]).expect("initial");
        let outcome = KMeansRefiner::default()
            .refine(&data, 2, InitialCentroids::Coordinates(initial))
            .expect("kmeans");
        assert_eq!(outcome.assignment, vec![0, 0]);
        assert_eq!(outcome.centroids.row(1), vec![100.0]);
        assert!(outcome.centroids.row(0)[0].is_finite());
    }

    #[test]
    fn equidistant_rows_go_to_lowest_cluster() {
        let (labels, _) = assign(&[vec![0.5]], &[vec![0.0], vec![1.0]]);
        assert_eq!(labels, vec![0]);
    }

    #[test]
    fn fit_centroids_returns_cluster_means() {
        let initial = Matrix::from_rows(&[vec![0.0, 0.0], vec![5.0, 5.0]]).expect("initial");
        let centroids = KMeansRefiner::default()
            .fit_centroids(&two_blobs(), initial)
            .expect("fit");
        assert!((centroids[(0, 0)] - 0.1 / 3.0).abs() < 1e-12);
        assert!((centroids[(1, 1)] - 15.1 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn plus_plus_is_reproducible_for_a_seed() {
        let refiner = KMeansRefiner::new(KMeansConfig {
            seed: 7,
            ..KMeansConfig::default()
        });
        let rows = two_blobs().to_rows();
        let first = refiner.plus_plus_indices(&rows, 3);
        let second = refiner.plus_plus_indices(&rows, 3);
        assert_eq!(first, second);
        let mut unique = first.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn plus_plus_handles_duplicate_points() {
        let rows = vec![vec![1.0], vec![1.0], vec![1.0]];
        let chosen = KMeansRefiner::default().plus_plus_indices(&rows, 3);
        let mut sorted = chosen.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
    }

    #[test]
    fn rejects_invalid_k_and_indices() {
        let refiner = KMeansRefiner::default();
        assert!(matches!(
            refiner.refine(&two_blobs(), 0, InitialCentroids::PlusPlus),
            Err(SpkError::InvalidK { k: 0, n: 6 })
        ));
        assert!(matches!(
            refiner.refine(&two_blobs(), 7, InitialCentroids::PlusPlus),
            Err(SpkError::InvalidK { k: 7, n: 6 })
        ));
        assert!(matches!(
            refiner.refine(&two_blobs(), 2, InitialCentroids::Indices(vec![1, 1])),
            Err(SpkError::InvalidCentroids { .. })
        ));
        assert!(matches!(
            refiner.refine(&two_blobs(), 2, InitialCentroids::Indices(vec![0, 9])),
            Err(SpkError::InvalidCentroids { .. })
        ));
    }

    #[test]
    fn coordinate_shape_is_checked() {
        let initial = Matrix::from_rows(&[vec![0.0], vec![5.0]]).expect("initial");
        let err = KMeansRefiner::default()
            .fit_centroids(&two_blobs(), initial)
            .unwrap_err();
        assert!(matches!(err, SpkError::DimensionMismatch { .. }));
    }
}

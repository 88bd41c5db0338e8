use log::{debug, warn};
use serde::Serialize;

use crate::config::JacobiConfig;
use crate::error::{Result, SpkError};
use crate::matrix::Matrix;

/// Eigen-decomposition of a symmetric matrix.
///
/// `eigenvalues[i]` pairs with column `i` of `eigenvectors`. Values are kept
/// in the order the solver left them on the diagonal; callers that need the
/// spectrum sorted go through [`EigenDecomposition::sorted_order`].
#[derive(Debug, Clone, Serialize)]
pub struct EigenDecomposition {
    pub eigenvalues: Vec<f64>,
    pub eigenvectors: Matrix,
    pub rotations: usize,
    pub converged: bool,
    /// Off-diagonal sum of squares of the final working matrix.
    pub off_diagonal: f64,
}

impl EigenDecomposition {
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Indices of the eigenpairs sorted by ascending eigenvalue, ties broken by index.
    pub fn sorted_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.eigenvalues.len()).collect();
        order.sort_by(|&a, &b| {
            self.eigenvalues[a]
                .total_cmp(&self.eigenvalues[b])
                .then(a.cmp(&b))
        });
        order
    }

    pub fn eigenvector(&self, index: usize) -> Vec<f64> {
        self.eigenvectors.column(index)
    }
}

/// Cyclic Jacobi eigenvalue solver with global max-pivot selection.
#[derive(Debug, Clone, Default)]
pub struct JacobiSolver {
    config: JacobiConfig,
}

#[derive(Clone, Copy)]
struct Rotation {
    p: usize,
    q: usize,
    c: f64,
    s: f64,
}

impl JacobiSolver {
    pub fn new(config: JacobiConfig) -> Self {
        Self { config }
    }

    pub fn solve(&self, input: &Matrix) -> Result<EigenDecomposition> {
        if !input.is_square() {
            let (rows, cols) = input.shape();
            return Err(SpkError::shape("jacobi input", (rows, rows), (rows, cols)));
        }
        if let Some((row, col, delta)) = input.symmetry_violation(self.config.symmetry_tolerance)
        {
            return Err(SpkError::NonSymmetricInput { row, col, delta });
        }

        let n = input.nrows();
        let mut a = input.clone();
        let mut v = Matrix::identity(n)?;
        let mut off = a.off_diagonal_energy();
        let mut rotations = 0;

        while off >= self.config.epsilon && rotations < self.config.max_rotations {
            let Some((p, q)) = pivot(&a) else {
                break;
            };
            let rotation = Rotation::zeroing(&a, p, q);
            rotation.apply(&mut a);
            rotation.accumulate(&mut v);
            rotations += 1;
            off = a.off_diagonal_energy();
        }

        let converged = off < self.config.epsilon;
        if converged {
            debug!(
                "jacobi converged after {} rotations (off-diagonal {:e})",
                rotations, off
            );
        } else {
            warn!(
                "jacobi stopped at rotation cap {} with off-diagonal {:e}",
                self.config.max_rotations, off
            );
        }

        let eigenvalues = a
            .diagonal()
            .into_iter()
            .map(|value| if value == 0.0 { 0.0 } else { value })
            .collect();

        Ok(EigenDecomposition {
            eigenvalues,
            eigenvectors: v,
            rotations,
            converged,
            off_diagonal: off,
        })
    }
}

/// Largest off-diagonal element in the upper triangle; the first in row-major
/// order wins ties. `None` when the matrix is already diagonal.
fn pivot(a: &Matrix) -> Option<(usize, usize)> {
    let n = a.nrows();
    let mut best: Option<(usize, usize)> = None;
    let mut largest = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let value = a[(i, j)].abs();
            if value > largest {
                largest = value;
                best = Some((i, j));
            }
        }
    }
    best
}

impl Rotation {
    /// Givens rotation annihilating `a[p][q]`.
    fn zeroing(a: &Matrix, p: usize, q: usize) -> Self {
        let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * a[(p, q)]);
        let sign = if theta >= 0.0 { 1.0 } else { -1.0 };
        let t = sign / (theta.abs() + (theta * theta + 1.0).sqrt());
        let c = 1.0 / (t * t + 1.0).sqrt();
        let s = t * c;
        Self { p, q, c, s }
    }

    /// `A <- P^T A P`, touching only rows and columns `p` and `q`.
    fn apply(&self, a: &mut Matrix) {
        let Rotation { p, q, c, s } = *self;
        let n = a.nrows();
        let a_pp = a[(p, p)];
        let a_qq = a[(q, q)];
        let a_pq = a[(p, q)];

        for r in 0..n {
            if r == p || r == q {
                continue;
            }
            let a_rp = a[(r, p)];
            let a_rq = a[(r, q)];
            let new_rp = c * a_rp - s * a_rq;
            let new_rq = c * a_rq + s * a_rp;
            a[(r, p)] = new_rp;
            a[(p, r)] = new_rp;
            a[(r, q)] = new_rq;
            a[(q, r)] = new_rq;
        }

        a[(p, p)] = c * c * a_pp + s * s * a_qq - 2.0 * s * c * a_pq;
        a[(q, q)] = s * s * a_pp + c * c * a_qq + 2.0 * s * c * a_pq;
        a[(p, q)] = 0.0;
        a[(q, p)] = 0.0;
    }

    /// `V <- V P`.
    fn accumulate(&self, v: &mut Matrix) {
        let Rotation { p, q, c, s } = *self;
        for r in 0..v.nrows() {
            let v_rp = v[(r, p)];
            let v_rq = v[(r, q)];
            v[(r, p)] = c * v_rp - s * v_rq;
            v[(r, q)] = s * v_rp + c * v_rq;
        }
    }
}

use std::ops::{Index, IndexMut};

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpkError};

/// Dense, fixed-shape matrix of `f64`.
///
/// Dimensions are set at construction and never change. Row, column and
/// `(row, col)` accessors are bounds-checked and panic when an index is out
/// of range. Operations combining two shapes return
/// [`SpkError::DimensionMismatch`] on incompatible inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Matrix {
    inner: DMatrix<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let data = allocate(rows, cols)?;
        Ok(Self {
            inner: DMatrix::from_vec(rows, cols, data),
        })
    }

    pub fn identity(n: usize) -> Result<Self> {
        let mut matrix = Self::zeros(n, n)?;
        for i in 0..n {
            matrix[(i, i)] = 1.0;
        }
        Ok(matrix)
    }

    pub fn from_diagonal(values: &[f64]) -> Result<Self> {
        let mut matrix = Self::zeros(values.len(), values.len())?;
        for (i, value) in values.iter().enumerate() {
            matrix[(i, i)] = *value;
        }
        Ok(matrix)
    }

    /// Builds a matrix from row-major data.
    pub fn from_row_slice(rows: usize, cols: usize, data: &[f64]) -> Result<Self> {
        let expected = rows
            .checked_mul(cols)
            .ok_or(SpkError::AllocationFailure { rows, cols })?;
        if data.len() != expected {
            return Err(SpkError::DimensionMismatch {
                context: "from_row_slice",
                expected: format!("{expected} elements"),
                actual: format!("{} elements", data.len()),
            });
        }
        let mut matrix = Self::zeros(rows, cols)?;
        for i in 0..rows {
            for j in 0..cols {
                matrix[(i, j)] = data[i * cols + j];
            }
        }
        Ok(matrix)
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != cols) {
            return Err(SpkError::DimensionMismatch {
                context: "from_rows",
                expected: format!("{cols} columns"),
                actual: format!("{} columns in row {index}", row.len()),
            });
        }
        let mut matrix = Self::zeros(rows.len(), cols)?;
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                matrix[(i, j)] = *value;
            }
        }
        Ok(matrix)
    }

    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.inner.shape()
    }

    pub fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }

    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.ncols() != other.nrows() {
            return Err(SpkError::shape(
                "multiply",
                (self.ncols(), other.ncols()),
                other.shape(),
            ));
        }
        Ok(Self {
            inner: &self.inner * &other.inner,
        })
    }

    pub fn mul_vec(&self, vector: &[f64]) -> Result<Vec<f64>> {
        if vector.len() != self.ncols() {
            return Err(SpkError::shape(
                "mul_vec",
                (self.ncols(), 1),
                (vector.len(), 1),
            ));
        }
        Ok((0..self.nrows())
            .map(|i| {
                self.inner
                    .row(i)
                    .iter()
                    .zip(vector)
                    .map(|(a, b)| a * b)
                    .sum()
            })
            .collect())
    }

    pub fn transpose(&self) -> Matrix {
        Self {
            inner: self.inner.transpose(),
        }
    }

    /// Elementwise `self - other`.
    pub fn subtract(&self, other: &Matrix) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(SpkError::shape("subtract", self.shape(), other.shape()));
        }
        Ok(Self {
            inner: &self.inner - &other.inner,
        })
    }

    pub fn frobenius_norm(&self) -> f64 {
        self.inner.norm()
    }

    pub fn row(&self, i: usize) -> Vec<f64> {
        self.inner.row(i).iter().copied().collect()
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        self.inner.column(j).iter().copied().collect()
    }

    pub fn row_norm(&self, i: usize) -> f64 {
        self.inner.row(i).norm()
    }

    pub fn scale_row(&mut self, i: usize, factor: f64) {
        self.inner.row_mut(i).scale_mut(factor);
    }

    pub fn set_row(&mut self, i: usize, values: &[f64]) -> Result<()> {
        if values.len() != self.ncols() {
            return Err(SpkError::shape(
                "set_row",
                (1, self.ncols()),
                (1, values.len()),
            ));
        }
        for (j, value) in values.iter().enumerate() {
            self.inner[(i, j)] = *value;
        }
        Ok(())
    }

    pub fn diagonal(&self) -> Vec<f64> {
        self.inner.diagonal().iter().copied().collect()
    }

    /// Sum of squares of every off-diagonal element.
    pub fn off_diagonal_energy(&self) -> f64 {
        let mut energy = 0.0;
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                if i != j {
                    let value = self.inner[(i, j)];
                    energy += value * value;
                }
            }
        }
        energy
    }

    /// First `(row, col, |a_ij - a_ji|)` in row-major order exceeding `tolerance`.
    pub fn symmetry_violation(&self, tolerance: f64) -> Option<(usize, usize, f64)> {
        let n = self.nrows();
        for i in 0..n {
            for j in (i + 1)..n {
                let delta = (self.inner[(i, j)] - self.inner[(j, i)]).abs();
                if delta > tolerance || delta.is_nan() {
                    return Some((i, j, delta));
                }
            }
        }
        None
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.nrows()).map(|i| self.row(i)).collect()
    }

    pub fn as_dmatrix(&self) -> &DMatrix<f64> {
        &self.inner
    }

    /// Column-major storage, column `j` occupying `data[j * nrows..(j + 1) * nrows]`.
    pub(crate) fn column_major_mut(&mut self) -> &mut [f64] {
        self.inner.as_mut_slice()
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.inner[index]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.inner[index]
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(matrix: Matrix) -> Self {
        matrix.to_rows()
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = SpkError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Matrix::from_rows(&rows)
    }
}

fn allocate(rows: usize, cols: usize) -> Result<Vec<f64>> {
    let len = rows
        .checked_mul(cols)
        .ok_or(SpkError::AllocationFailure { rows, cols })?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| SpkError::AllocationFailure { rows, cols })?;
    data.resize(len, 0.0);
    Ok(data)
}

//! Owned numeric buffers: a single trait vector and a row-major matrix of them.
//!
//! Widths always equal the trait schema dimension. A width mismatch means a corpus-build or
//! mapping-validation defect upstream, so it panics instead of returning an error.

use serde::Serialize;

/// One trait profile, positionally aligned to the schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TraitVector(Vec<f64>);

impl TraitVector {
    pub fn zeros(dim: usize) -> Self {
        Self(vec![0.0; dim])
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }

    /// Add `amount` to component `index`.
    pub fn add(&mut self, index: usize, amount: f64) {
        self.0[index] += amount;
    }

    /// Euclidean (L2) norm.
    pub fn norm(&self) -> f64 {
        l2_norm(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// Scale to unit length. A zero vector stays zero.
    pub fn normalize_in_place(&mut self) {
        normalize_slice(&mut self.0);
    }

    pub fn normalized(mut self) -> Self {
        self.normalize_in_place();
        self
    }

    pub fn dot(&self, other: &[f64]) -> f64 {
        dot(&self.0, other)
    }
}

/// Row-major `N x D` matrix in one contiguous buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMatrix {
    dim: usize,
    data: Vec<f64>,
}

impl RowMatrix {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    pub fn with_capacity(dim: usize, rows: usize) -> Self {
        Self {
            dim,
            data: Vec::with_capacity(dim * rows),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn push_row(&mut self, row: &[f64]) {
        assert_eq!(row.len(), self.dim, "row width does not match trait schema");
        self.data.extend_from_slice(row);
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.dim.max(1))
    }

    /// L2-normalize every row independently; zero rows are left untouched.
    pub fn normalize_rows(&mut self) {
        if self.dim == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(self.dim) {
            normalize_slice(row);
        }
    }

    /// Elementwise arithmetic mean of the given rows. Not renormalized.
    pub fn mean_of_rows(&self, indices: &[usize]) -> Vec<f64> {
        let mut mean = vec![0.0; self.dim];
        if indices.is_empty() {
            return mean;
        }
        for &i in indices {
            for (acc, v) in mean.iter_mut().zip(self.row(i)) {
                *acc += v;
            }
        }
        let n = indices.len() as f64;
        for v in &mut mean {
            *v /= n;
        }
        mean
    }
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "vector width mismatch");
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm, scaled by the largest magnitude so huge components cannot overflow.
pub fn l2_norm(v: &[f64]) -> f64 {
    let scale = max_abs(v);
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    scale * v.iter().map(|x| (x / scale).powi(2)).sum::<f64>().sqrt()
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}

fn normalize_slice(v: &mut [f64]) {
    let scale = max_abs(v);
    if scale == 0.0 || !scale.is_finite() {
        return;
    }
    for x in v.iter_mut() {
        *x /= scale;
    }
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    for x in v.iter_mut() {
        *x /= norm;
    }
}

use nalgebra::DMatrix;
use std::ops::{Index, IndexMut};

/// Dense symmetric matrix stored as its packed lower triangle.
///
/// Element `(i, j)` and `(j, i)` share one slot, so symmetry holds exactly by construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymmetricMatrix {
    dimension: usize,
    data: Vec<f64>,
}

#[inline]
fn packed_index(i: usize, j: usize) -> usize {
    let (row, column) = if i >= j { (i, j) } else { (j, i) };
    row * (row + 1) / 2 + column
}

impl SymmetricMatrix {
    /// Number of packed elements for a matrix of `dimension`, `None` on overflow.
    pub fn packed_len(dimension: usize) -> Option<usize> {
        dimension
            .checked_add(1)
            .and_then(|n| n.checked_mul(dimension))
            .map(|n| n / 2)
    }

    /// Wraps an already packed lower triangle. Returns `None` if the length does not match.
    pub fn from_packed(dimension: usize, data: Vec<f64>) -> Option<Self> {
        (Self::packed_len(dimension) == Some(data.len())).then_some(Self { dimension, data })
    }

    pub fn zeros(dimension: usize) -> Self {
        let len = Self::packed_len(dimension).unwrap_or(0);
        Self {
            dimension,
            data: vec![0.0; len],
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn as_packed(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        (i < self.dimension && j < self.dimension).then(|| self.data[packed_index(i, j)])
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    pub fn scale(&mut self, factor: f64) {
        for value in &mut self.data {
            *value *= factor;
        }
    }

    /// Overwrites the matrix with the symmetric part of `raw`, `(W_ij + W_ji) / 2`.
    ///
    /// `raw` must be square with the same dimension.
    pub fn copy_symmetrized(&mut self, raw: &DMatrix<f64>) {
        debug_assert_eq!(raw.shape(), (self.dimension, self.dimension));
        for i in 0..self.dimension {
            for j in 0..=i {
                self.data[packed_index(i, j)] = 0.5 * (raw[(i, j)] + raw[(j, i)]);
            }
        }
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.dimension, self.dimension, |i, j| {
            self.data[packed_index(i, j)]
        })
    }
}

impl Index<(usize, usize)> for SymmetricMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        assert!(
            i < self.dimension && j < self.dimension,
            "index ({}, {}) out of bounds for dimension {}",
            i,
            j,
            self.dimension
        );
        &self.data[packed_index(i, j)]
    }
}

impl IndexMut<(usize, usize)> for SymmetricMatrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        assert!(
            i < self.dimension && j < self.dimension,
            "index ({}, {}) out of bounds for dimension {}",
            i,
            j,
            self.dimension
        );
        &mut self.data[packed_index(i, j)]
    }
}

//! Time-averaged moments of the electric field magnitude.

use crate::arrays::{AxialDirection, CellCoordinate};
use crate::fields::{Dimension, SplitField};
use crate::geometry::Grid;
use crate::matrices::{HostArray, OutputMatrices};
use crate::{Error, Result};
use rayon::prelude::*;

/// Accumulates `|E|ⁿ / Nt` on the tensor product of three index vectors,
/// for every moment `n` requested.
#[derive(Debug, Clone, Default)]
pub struct FieldSample {
    i: Vec<usize>,
    j: Vec<usize>,
    k: Vec<usize>,
    moments: Vec<f64>,
    dimension: Dimension,
    // [point][moment], points ordered i fastest
    tensor: Vec<f64>,
}

impl FieldSample {
    /// Sample at every `(i[a], j[b], k[c])` for each of `moments`.
    pub fn new(i: Vec<usize>, j: Vec<usize>, k: Vec<usize>, moments: Vec<f64>) -> Self {
        let len = i.len() * j.len() * k.len() * moments.len();
        Self {
            i,
            j,
            k,
            moments,
            dimension: Dimension::Three,
            tensor: vec![0.0; len],
        }
    }

    /// Load the index vectors and moments from host arrays.
    pub fn from_host(
        i: &HostArray<'_>,
        j: &HostArray<'_>,
        k: &HostArray<'_>,
        moments: &HostArray<'_>,
    ) -> Result<Self> {
        Ok(Self::new(
            i.as_indices("fieldsample_i")?,
            j.as_indices("fieldsample_j")?,
            k.as_indices("fieldsample_k")?,
            moments.data().to_vec(),
        ))
    }

    /// Restrict the magnitude to the electric components present in
    /// `dimension`.
    pub fn set_dimension(&mut self, dimension: Dimension) -> &mut Self {
        self.dimension = dimension;
        self
    }

    /// Fail if any index lies outside `grid`.
    pub fn check_within(&self, grid: &Grid) -> Result<()> {
        for (axis, indices) in [
            (AxialDirection::X, &self.i),
            (AxialDirection::Y, &self.j),
            (AxialDirection::Z, &self.k),
        ] {
            let cells = grid.cells_along(axis);
            if let Some(bad) = indices.iter().find(|&&c| c >= cells) {
                return Err(Error::Config(format!(
                    "field sample index {bad} along {axis:?} exceeds {cells} cells"
                )));
            }
        }
        Ok(())
    }

    /// Whether every index vector and the moment list are non-empty.
    pub fn all_vectors_are_non_empty(&self) -> bool {
        !(self.i.is_empty() || self.j.is_empty() || self.k.is_empty() || self.moments.is_empty())
    }

    /// Output shape `[ni, nj, nk, nmoments]`.
    pub fn shape(&self) -> [usize; 4] {
        [self.i.len(), self.j.len(), self.k.len(), self.moments.len()]
    }

    fn point(&self, p: usize) -> CellCoordinate {
        let (ni, nj) = (self.i.len(), self.j.len());
        CellCoordinate::new(self.i[p % ni], self.j[(p / ni) % nj], self.k[p / (ni * nj)])
    }

    /// Add the contribution of the current E field, one of `nt` steps.
    pub fn accumulate(&mut self, e: &SplitField, nt: u64) {
        let nm = self.moments.len();
        if !self.all_vectors_are_non_empty() {
            return;
        }
        let scale = 1.0 / nt as f64;
        let mut tensor = std::mem::take(&mut self.tensor);
        tensor.par_chunks_mut(nm).enumerate().for_each(|(p, acc)| {
            let cell = self.point(p);
            let squared: f64 = AxialDirection::ALL
                .iter()
                .filter(|&&axis| self.dimension.includes(e.kind(), axis))
                .map(|&axis| e.interpolate_to_centre_of(axis, cell).powi(2))
                .sum();
            for (value, &n) in acc.iter_mut().zip(&self.moments) {
                *value += squared.powf(n / 2.0) * scale;
            }
        });
        self.tensor = tensor;
    }

    /// Reset every moment to zero.
    pub fn zero(&mut self) {
        self.tensor.fill(0.0);
    }

    /// Accumulated moment `m` at `(i[a], j[b], k[c])`.
    pub fn value(&self, a: usize, b: usize, c: usize, m: usize) -> f64 {
        let [ni, nj, _, nm] = self.shape();
        self.tensor[(a + ni * (b + nj * c)) * nm + m]
    }

    /// Write `fieldsample` (`[i, j, k, moment]`, column-major).
    pub fn save_outputs(&self, outputs: &mut OutputMatrices<'_>) -> Result<()> {
        let [ni, nj, nk, nm] = self.shape();
        let points = ni * nj * nk;
        let mut host = vec![0.0; points * nm];
        for p in 0..points {
            for m in 0..nm {
                host[p + points * m] = self.tensor[p * nm + m];
            }
        }
        outputs.write_real("fieldsample", &host)?;
        Ok(())
    }
}

//! Phasors on the surface of a cuboid.

use super::{sample_component, PhasorClock, PhasorNorms};
use crate::arrays::{AxialDirection, CellCoordinate, FieldComponent};
use crate::fields::{Dimension, FieldState, SplitField};
use crate::geometry::Grid;
use crate::matrices::{HostArray, OutputMatrices};
use crate::{Error, Result};
use log::{debug, info};
use num_complex::Complex64;
use rayon::prelude::*;

const COMPONENTS: usize = 6;

fn axis_positions(lo: usize, hi: usize, step: usize) -> Vec<usize> {
    let mut positions: Vec<usize> = (lo..=hi).step_by(step.max(1)).collect();
    if positions.last() != Some(&hi) {
        positions.push(hi);
    }
    positions
}

/// Vertices on the surface of the cuboid `[I0, I1, J0, J1, K0, K1]`,
/// sampled every `increments` cells (the far faces are always included).
///
/// Without `k_faces` the two faces normal to z are left out, which is
/// what a two-dimensional run uses. Vertices are listed `i` fastest and
/// appear once each.
pub fn cuboid_surface_vertices(
    cuboid: [usize; 6],
    increments: [usize; 3],
    k_faces: bool,
) -> Vec<CellCoordinate> {
    let [i0, i1, j0, j1, k0, k1] = cuboid;
    let is = axis_positions(i0, i1, increments[0]);
    let js = axis_positions(j0, j1, increments[1]);
    let ks = axis_positions(k0, k1, increments[2]);

    let mut vertices = Vec::new();
    for &k in &ks {
        for &j in &js {
            for &i in &is {
                let on_surface = i == i0
                    || i == i1
                    || j == j0
                    || j == j1
                    || (k_faces && (k == k0 || k == k1));
                if on_surface {
                    vertices.push(CellCoordinate::new(i, j, k));
                }
            }
        }
    }
    vertices
}

/// Six-component phasors at every vertex of a cuboid surface, for each
/// extraction frequency.
#[derive(Debug, Clone)]
pub struct SurfacePhasors {
    vertices: Vec<CellCoordinate>,
    dimension: Dimension,
    omegas: Vec<f64>,
    // [vertex][frequency][component]
    amplitudes: Vec<Complex64>,
    state: FieldState,
}

impl Default for SurfacePhasors {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfacePhasors {
    /// No vertices, no accumulators.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            dimension: Dimension::Three,
            omegas: Vec::new(),
            amplitudes: Vec::new(),
            state: FieldState::Uninitialized,
        }
    }

    /// Build the vertex set from a host `[I0, I1, J0, J1, K0, K1]` cuboid
    /// of zero-based cell indices.
    pub fn set_from_matlab_array(
        &mut self,
        cuboid: &HostArray<'_>,
        increments: [usize; 3],
        grid: &Grid,
        dimension: Dimension,
    ) -> Result<()> {
        let bounds = cuboid.as_indices("phasorsurface")?;
        let bounds: [usize; 6] = bounds.try_into().map_err(|v: Vec<usize>| Error::DimensionMismatch {
            what: "phasorsurface".into(),
            expected: 6,
            actual: v.len(),
        })?;
        for (n, axis) in AxialDirection::ALL.iter().enumerate() {
            let (lo, hi) = (bounds[2 * n], bounds[2 * n + 1]);
            if lo > hi || hi >= grid.cells_along(*axis) {
                return Err(Error::Config(format!(
                    "phasor surface spans {lo}..={hi} along {axis:?}, grid has {} cells",
                    grid.cells_along(*axis)
                )));
            }
        }
        if increments.contains(&0) {
            return Err(Error::Config("phasor surface increments must be positive".into()));
        }

        self.vertices =
            cuboid_surface_vertices(bounds, increments, dimension == Dimension::Three);
        self.dimension = dimension;
        self.amplitudes.clear();
        self.state = FieldState::Uninitialized;
        info!("Phasor surface has {} vertices", self.vertices.len());
        Ok(())
    }

    /// Allocate zeroed accumulators for angular frequencies `omegas`.
    pub fn setup_complex_amplitude_arrays(&mut self, omegas: &[f64]) {
        self.omegas = omegas.to_vec();
        self.amplitudes = vec![Complex64::new(0.0, 0.0); self.vertices.len() * omegas.len() * COMPONENTS];
        self.state = FieldState::Allocated;
    }

    /// Number of surface vertices.
    pub fn n_surface_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Surface vertices, `i` fastest.
    pub fn vertices(&self) -> &[CellCoordinate] {
        &self.vertices
    }

    /// Lifecycle state of the accumulators.
    pub fn state(&self) -> FieldState {
        self.state
    }

    /// Accumulate the fields of update `n` at every vertex.
    ///
    /// With `interpolate` false the raw samples at the vertex indices are
    /// used instead of values interpolated to the cell centre.
    pub fn extract_phasors_surface(
        &mut self,
        e: &SplitField,
        h: &SplitField,
        n: u64,
        dt: f64,
        samples: usize,
        interpolate: bool,
    ) {
        assert!(
            matches!(self.state, FieldState::Allocated | FieldState::Accumulating),
            "surface accumulators are {:?}; call setup_complex_amplitude_arrays first",
            self.state
        );
        let clocks: Vec<PhasorClock> = self
            .omegas
            .iter()
            .map(|&omega| PhasorClock::new(n, omega, dt, samples))
            .collect();
        let dimension = self.dimension;
        let stride = self.omegas.len() * COMPONENTS;
        if stride == 0 {
            return;
        }

        self.amplitudes
            .par_chunks_mut(stride)
            .zip(self.vertices.par_iter())
            .for_each(|(acc, &cell)| {
                for (c, component) in FieldComponent::ALL.iter().enumerate() {
                    let value = sample_component(e, h, *component, cell, dimension, interpolate);
                    if value == 0.0 {
                        continue;
                    }
                    for (f, clock) in clocks.iter().enumerate() {
                        acc[f * COMPONENTS + c] += clock.for_component(*component) * value;
                    }
                }
            });
        self.state = FieldState::Accumulating;
    }

    /// Reset the accumulators at the start of a new DFT window.
    pub fn zero(&mut self) {
        assert!(
            self.state != FieldState::Finalized,
            "surface accumulators are finalised"
        );
        self.amplitudes.fill(Complex64::new(0.0, 0.0));
        debug!("Zeroed the surface components");
    }

    /// Divide by the excitation norms and freeze the accumulators.
    pub fn normalise(&mut self, norms: &PhasorNorms) -> Result<()> {
        assert!(
            matches!(self.state, FieldState::Allocated | FieldState::Accumulating),
            "surface accumulators are {:?}",
            self.state
        );
        if norms.omegas().len() != self.omegas.len() {
            return Err(Error::DimensionMismatch {
                what: "surface phasor norms".into(),
                expected: self.omegas.len(),
                actual: norms.omegas().len(),
            });
        }
        let factors = (0..self.omegas.len())
            .map(|f| norms.checked(f))
            .collect::<Result<Vec<_>>>()?;
        let stride = self.omegas.len() * COMPONENTS;
        if stride > 0 {
            self.amplitudes.par_chunks_mut(stride).for_each(|acc| {
                for (f, (en, hn)) in factors.iter().enumerate() {
                    for c in 0..COMPONENTS {
                        acc[f * COMPONENTS + c] /= if c < 3 { *en } else { *hn };
                    }
                }
            });
        }
        self.state = FieldState::Finalized;
        Ok(())
    }

    /// Finalised phasor of `component` at vertex `vertex`, frequency `f`.
    pub fn amplitude(&self, vertex: usize, component: FieldComponent, f: usize) -> Complex64 {
        self.assert_finalised();
        let c = component.id() as usize - 1;
        self.amplitudes[(vertex * self.omegas.len() + f) * COMPONENTS + c]
    }

    /// Vertex coordinates at cell centres, as an `n × 3` column-major list.
    pub fn vertex_list(&self, grid: &Grid) -> Vec<f64> {
        let labels = grid.cell_centre_labels();
        let n = self.vertices.len();
        let mut out = vec![0.0; 3 * n];
        for (v, cell) in self.vertices.iter().enumerate() {
            for (col, axis) in AxialDirection::ALL.iter().enumerate() {
                out[v + n * col] = labels.get(*axis)[cell.along(*axis)];
            }
        }
        out
    }

    /// Write `vertices` and `camplitudes` (`n × 6 × frequencies`).
    ///
    /// Panics unless the accumulators are finalised.
    pub fn save_outputs(&self, outputs: &mut OutputMatrices<'_>, grid: &Grid) -> Result<()> {
        self.assert_finalised();
        let (nv, nf) = (self.vertices.len(), self.omegas.len());
        let mut host = vec![Complex64::new(0.0, 0.0); nv * COMPONENTS * nf];
        for v in 0..nv {
            for f in 0..nf {
                for c in 0..COMPONENTS {
                    host[v + nv * (c + COMPONENTS * f)] = self.amplitudes[(v * nf + f) * COMPONENTS + c];
                }
            }
        }
        outputs.write_real("vertices", &self.vertex_list(grid))?;
        outputs.write_complex("camplitudes", &host)?;
        Ok(())
    }

    fn assert_finalised(&self) {
        assert!(
            self.state == FieldState::Finalized,
            "surface phasors read before they were finalised (state {:?})",
            self.state
        );
    }
}

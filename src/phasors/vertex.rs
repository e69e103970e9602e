//! Phasors at an arbitrary list of vertices.

use super::{sample_component, PhasorClock, PhasorNorms};
use crate::arrays::{CellCoordinate, FieldComponent, FieldComponentsVector};
use crate::fields::{Dimension, FieldState, SplitField};
use crate::geometry::Grid;
use crate::matrices::{HostArray, OutputMatrices};
use crate::{Error, Result};
use log::debug;
use num_complex::Complex64;
use rayon::prelude::*;

/// Where to sample complex amplitudes: a vertex list and the field
/// components wanted at each vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexAmplitudeSample {
    vertices: Vec<CellCoordinate>,
    components: FieldComponentsVector,
}

impl ComplexAmplitudeSample {
    /// Sample `components` at `vertices`.
    pub fn new(vertices: Vec<CellCoordinate>, components: FieldComponentsVector) -> Self {
        Self {
            vertices,
            components,
        }
    }

    /// Load from an `n × 3` column-major array of zero-based vertex
    /// indices and a list of component ids (1..=6 for Ex..Hz).
    pub fn from_host(vertices: &HostArray<'_>, components: &HostArray<'_>) -> Result<Self> {
        let shape = vertices.shape();
        if shape.len() != 2 || shape[1] != 3 {
            return Err(Error::Config(format!(
                "vertex list must be an n x 3 array, got shape {shape:?}"
            )));
        }
        let n = shape[0];
        let indices = vertices.as_indices("campssample vertices")?;
        let vertices = (0..n)
            .map(|v| CellCoordinate::new(indices[v], indices[v + n], indices[v + 2 * n]))
            .collect();
        let ids = components
            .as_indices("campssample components")?
            .into_iter()
            .map(|id| {
                i32::try_from(id).map_err(|_| {
                    Error::Config(format!("campssample component id {id} is not in 1..=6"))
                })
            })
            .collect::<Result<Vec<i32>>>()?;
        Ok(Self::new(vertices, FieldComponentsVector::from_ids(&ids)?))
    }

    /// Number of vertices.
    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Sampled vertices.
    pub fn vertices(&self) -> &[CellCoordinate] {
        &self.vertices
    }

    /// Requested components.
    pub fn components(&self) -> &FieldComponentsVector {
        &self.components
    }

    /// Whether there is anything to extract.
    pub fn all_vectors_are_non_empty(&self) -> bool {
        !self.vertices.is_empty() && !self.components.is_empty()
    }
}

/// Running phasors of the requested components at each sample vertex.
#[derive(Debug, Clone)]
pub struct VertexPhasors {
    sample: ComplexAmplitudeSample,
    dimension: Dimension,
    omegas: Vec<f64>,
    // [vertex][frequency][component slot]
    amplitudes: Vec<Complex64>,
    state: FieldState,
}

impl VertexPhasors {
    /// Accumulators for `sample`, checked against `grid`.
    pub fn new(sample: ComplexAmplitudeSample, grid: &Grid, dimension: Dimension) -> Result<Self> {
        let cells = grid.dimensions();
        if let Some(bad) = sample
            .vertices
            .iter()
            .find(|c| c.i >= cells.nx || c.j >= cells.ny || c.k >= cells.nz)
        {
            return Err(Error::Config(format!(
                "sample vertex {bad:?} lies outside the {cells} grid"
            )));
        }
        Ok(Self {
            sample,
            dimension,
            omegas: Vec::new(),
            amplitudes: Vec::new(),
            state: FieldState::Uninitialized,
        })
    }

    /// Allocate zeroed accumulators for angular frequencies `omegas`.
    pub fn setup_complex_amplitude_arrays(&mut self, omegas: &[f64]) {
        self.omegas = omegas.to_vec();
        self.amplitudes = vec![
            Complex64::new(0.0, 0.0);
            self.sample.n_vertices() * omegas.len() * self.sample.components.len()
        ];
        self.state = FieldState::Allocated;
    }

    /// Whether any vertex and component were requested.
    pub fn there_are_elements_to_extract(&self) -> bool {
        self.sample.all_vectors_are_non_empty()
    }

    /// The sample definition.
    pub fn sample(&self) -> &ComplexAmplitudeSample {
        &self.sample
    }

    /// Lifecycle state of the accumulators.
    pub fn state(&self) -> FieldState {
        self.state
    }

    /// Accumulate the interpolated fields of update `n` at every vertex.
    pub fn extract_phasors_vertices(
        &mut self,
        e: &SplitField,
        h: &SplitField,
        n: u64,
        dt: f64,
        samples: usize,
    ) {
        assert!(
            matches!(self.state, FieldState::Allocated | FieldState::Accumulating),
            "vertex accumulators are {:?}; call setup_complex_amplitude_arrays first",
            self.state
        );
        let stride = self.omegas.len() * self.sample.components.len();
        if stride == 0 {
            return;
        }
        let clocks: Vec<PhasorClock> = self
            .omegas
            .iter()
            .map(|&omega| PhasorClock::new(n, omega, dt, samples))
            .collect();
        let components: Vec<FieldComponent> = self.sample.components.iter().collect();
        let nc = components.len();
        let dimension = self.dimension;

        self.amplitudes
            .par_chunks_mut(stride)
            .zip(self.sample.vertices.par_iter())
            .for_each(|(acc, &cell)| {
                for (slot, &component) in components.iter().enumerate() {
                    let value = sample_component(e, h, component, cell, dimension, true);
                    for (f, clock) in clocks.iter().enumerate() {
                        acc[f * nc + slot] += clock.for_component(component) * value;
                    }
                }
            });
        self.state = FieldState::Accumulating;
    }

    /// Reset the accumulators at the start of a new DFT window.
    pub fn zero(&mut self) {
        assert!(
            self.state != FieldState::Finalized,
            "vertex accumulators are finalised"
        );
        self.amplitudes.fill(Complex64::new(0.0, 0.0));
        debug!("Zeroed the vertex phasors");
    }

    /// Divide by the excitation norms and freeze the accumulators.
    pub fn normalise(&mut self, norms: &PhasorNorms) -> Result<()> {
        assert!(
            matches!(self.state, FieldState::Allocated | FieldState::Accumulating),
            "vertex accumulators are {:?}",
            self.state
        );
        if norms.omegas().len() != self.omegas.len() {
            return Err(Error::DimensionMismatch {
                what: "vertex phasor norms".into(),
                expected: self.omegas.len(),
                actual: norms.omegas().len(),
            });
        }
        let factors = (0..self.omegas.len())
            .map(|f| norms.checked(f))
            .collect::<Result<Vec<_>>>()?;
        let components: Vec<FieldComponent> = self.sample.components.iter().collect();
        let nc = components.len();
        let stride = self.omegas.len() * nc;
        if stride > 0 {
            self.amplitudes.par_chunks_mut(stride).for_each(|acc| {
                for (f, (en, hn)) in factors.iter().enumerate() {
                    for (slot, component) in components.iter().enumerate() {
                        acc[f * nc + slot] /= if component.is_electric() { *en } else { *hn };
                    }
                }
            });
        }
        self.state = FieldState::Finalized;
        Ok(())
    }

    /// Finalised phasor of `component` at vertex `vertex`, frequency `f`,
    /// or `None` if the component was not requested.
    pub fn amplitude(&self, vertex: usize, component: FieldComponent, f: usize) -> Option<Complex64> {
        assert!(
            self.state == FieldState::Finalized,
            "vertex phasors read before they were finalised (state {:?})",
            self.state
        );
        let slot = self.sample.components.index(component)?;
        let nc = self.sample.components.len();
        Some(self.amplitudes[(vertex * self.omegas.len() + f) * nc + slot])
    }

    /// Write `campssample` (`vertices × components × frequencies`).
    pub fn save_outputs(&self, outputs: &mut OutputMatrices<'_>) -> Result<()> {
        assert!(
            self.state == FieldState::Finalized,
            "vertex phasors saved before they were finalised (state {:?})",
            self.state
        );
        let (nv, nf, nc) = (
            self.sample.n_vertices(),
            self.omegas.len(),
            self.sample.components.len(),
        );
        let mut host = vec![Complex64::new(0.0, 0.0); nv * nc * nf];
        for v in 0..nv {
            for f in 0..nf {
                for c in 0..nc {
                    host[v + nv * (c + nc * f)] = self.amplitudes[(v * nf + f) * nc + c];
                }
            }
        }
        outputs.write_complex("campssample", &host)?;
        Ok(())
    }
}

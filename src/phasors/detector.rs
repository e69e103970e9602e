//! Running DFT of the 2-D spatial spectrum of the in-plane E field.

use super::{PhasorClock, PhasorNorms};
use crate::arrays::AxialDirection;
use crate::fields::{FieldState, SplitField};
use crate::geometry::Grid;
use crate::matrices::OutputMatrices;
use crate::{Error, Result};
use num_complex::Complex64;

const PLANE_AXES: [AxialDirection; 2] = [AxialDirection::X, AxialDirection::Y];

/// Spatial spectra of Ex and Ey on one x-y layer, accumulated per
/// extraction frequency.
///
/// The layer is transformed with each component's plane plan, so the
/// electric split field must have had
/// [`SplitField::initialise_fftw_plan`] called on it.
#[derive(Debug, Clone)]
pub struct DetectorPlanePhasors {
    layer: usize,
    plane: (usize, usize),
    omegas: Vec<f64>,
    // [frequency][axis][plane sample]
    spectra: Vec<Complex64>,
    buffer: Vec<Complex64>,
    state: FieldState,
}

impl DetectorPlanePhasors {
    /// Detector on sample layer `layer` of `grid`.
    pub fn new(grid: &Grid, layer: usize, omegas: &[f64]) -> Result<Self> {
        let samples = grid.sample_dimensions();
        if layer >= samples.nz {
            return Err(Error::Config(format!(
                "detector layer {layer} outside the {} sample layers",
                samples.nz
            )));
        }
        let plane = (samples.nx, samples.ny);
        Ok(Self {
            layer,
            plane,
            omegas: omegas.to_vec(),
            spectra: vec![Complex64::new(0.0, 0.0); omegas.len() * 2 * plane.0 * plane.1],
            buffer: Vec::with_capacity(plane.0 * plane.1),
            state: FieldState::Allocated,
        })
    }

    /// The transformed layer.
    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Angular extraction frequencies.
    pub fn omegas(&self) -> &[f64] {
        &self.omegas
    }

    /// Lifecycle state of the spectra.
    pub fn state(&self) -> FieldState {
        self.state
    }

    fn plane_len(&self) -> usize {
        self.plane.0 * self.plane.1
    }

    /// Transform the layer of update `n` and add it to every frequency.
    pub fn accumulate(&mut self, e: &mut SplitField, n: u64, dt: f64, samples: usize) {
        assert!(
            self.state != FieldState::Finalized,
            "detector spectra are finalised"
        );
        let len = self.plane_len();
        let clocks: Vec<Complex64> = self
            .omegas
            .iter()
            .map(|&omega| PhasorClock::new(n, omega, dt, samples).electric())
            .collect();
        for (slot, axis) in PLANE_AXES.into_iter().enumerate() {
            e.component_mut(axis)
                .transform_plane(self.layer, &mut self.buffer);
            for (f, weight) in clocks.iter().enumerate() {
                let start = (f * 2 + slot) * len;
                for (acc, &s) in self.spectra[start..start + len].iter_mut().zip(&self.buffer) {
                    *acc += s * weight;
                }
            }
        }
        self.state = FieldState::Accumulating;
    }

    /// Reset the spectra at the start of a new DFT window.
    pub fn zero(&mut self) {
        assert!(
            self.state != FieldState::Finalized,
            "detector spectra are finalised"
        );
        self.spectra.fill(Complex64::new(0.0, 0.0));
    }

    /// Divide by the electric excitation norm and freeze the spectra.
    pub fn normalise(&mut self, norms: &PhasorNorms) -> Result<()> {
        assert!(
            matches!(self.state, FieldState::Allocated | FieldState::Accumulating),
            "detector spectra are {:?}",
            self.state
        );
        if norms.omegas().len() != self.omegas.len() {
            return Err(Error::DimensionMismatch {
                what: "detector phasor norms".into(),
                expected: self.omegas.len(),
                actual: norms.omegas().len(),
            });
        }
        let len = 2 * self.plane_len();
        for f in 0..self.omegas.len() {
            let (norm, _) = norms.checked(f)?;
            for s in &mut self.spectra[f * len..(f + 1) * len] {
                *s /= norm;
            }
        }
        self.state = FieldState::Finalized;
        Ok(())
    }

    /// Spectrum of component `axis` (X or Y) at frequency index `f`,
    /// `nx × ny` with kx fastest.
    pub fn spectrum(&self, axis: AxialDirection, f: usize) -> &[Complex64] {
        let slot = PLANE_AXES
            .iter()
            .position(|&a| a == axis)
            .unwrap_or_else(|| panic!("detector planes hold Ex and Ey only, not {axis:?}"));
        let len = self.plane_len();
        let start = (f * 2 + slot) * len;
        &self.spectra[start..start + len]
    }

    /// Write `Id` (`nx × ny × 2 × frequencies`, Ex then Ey).
    pub fn save_outputs(&self, outputs: &mut OutputMatrices<'_>) -> Result<()> {
        assert!(
            self.state == FieldState::Finalized,
            "detector spectra saved before they were finalised (state {:?})",
            self.state
        );
        // the internal layout already matches the column-major host layout
        outputs.write_complex("Id", &self.spectra)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TWO_PI;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_uniform_oscillating_plane() {
        let grid = Grid::uniform(3, 2, 4, 1.0).unwrap();
        let mut e = SplitField::electric();
        e.allocate(&grid);
        e.initialise_fftw_plan();

        let omega = TWO_PI;
        let samples = 20;
        let dt = 1.0 / samples as f64;
        let mut detector = DetectorPlanePhasors::new(&grid, 2, &[omega]).unwrap();
        let mut norms = PhasorNorms::new(&[omega]);
        for n in 0..samples as u64 {
            let s = (omega * (n as f64 + 1.0) * dt).cos();
            e.component_mut(AxialDirection::X).split_mut(0).fill(2.0 * s);
            detector.accumulate(&mut e, n, dt, samples);
            norms.accumulate(n, dt, samples, s, s);
        }
        detector.normalise(&norms).unwrap();

        let ex = detector.spectrum(AxialDirection::X, 0);
        assert_eq!(ex.len(), 12);
        // DC bin holds the plane sum; every other bin is empty
        assert_abs_diff_eq!(ex[0].re, 24.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ex[0].im, 0.0, epsilon = 1e-9);
        for bin in &ex[1..] {
            assert_abs_diff_eq!(bin.norm(), 0.0, epsilon = 1e-9);
        }
        for bin in detector.spectrum(AxialDirection::Y, 0) {
            assert_abs_diff_eq!(bin.norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "detector spectra are Finalized")]
    fn test_normalise_twice_panics() {
        let grid = Grid::uniform(3, 3, 3, 1.0).unwrap();
        let mut detector = DetectorPlanePhasors::new(&grid, 1, &[TWO_PI]).unwrap();
        let mut norms = PhasorNorms::new(&[TWO_PI]);
        norms.accumulate(0, 0.1, 1, 1.0, 1.0);
        detector.normalise(&norms).unwrap();
        let _ = detector.normalise(&norms);
    }

    #[test]
    fn test_layer_outside_grid_rejected() {
        let grid = Grid::uniform(3, 3, 3, 1.0).unwrap();
        assert!(DetectorPlanePhasors::new(&grid, 4, &[1.0]).is_err());
        assert!(DetectorPlanePhasors::new(&grid, 3, &[1.0]).is_ok());
    }

    #[test]
    #[should_panic(expected = "initialise_fftw_plan")]
    fn test_accumulate_without_plans_panics() {
        let grid = Grid::uniform(3, 3, 3, 1.0).unwrap();
        let mut e = SplitField::electric();
        e.allocate(&grid);
        let mut detector = DetectorPlanePhasors::new(&grid, 0, &[1.0]).unwrap();
        detector.accumulate(&mut e, 0, 0.1, 1);
    }
}

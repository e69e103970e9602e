//! Running-DFT phasor extraction.
//!
//! A field `f(t) = Re(A e^{iωt})` sampled `N` times over whole periods
//! gives `Σ f(tₙ) e^{-iωtₙ} / N → A / 2`. The excitation is accumulated
//! the same way ([`PhasorNorms`]), and finalisation divides one by the
//! other, so the result is the field phasor relative to the source phasor
//! and the `1/N` and `1/2` factors cancel.
//!
//! Electric samples after update `n` are taken at `(n + 1) dt`, magnetic
//! samples at `(n + 1/2) dt`.

mod detector;
mod field_sample;
mod surface;
mod vertex;

pub use detector::DetectorPlanePhasors;
pub use field_sample::FieldSample;
pub use surface::{cuboid_surface_vertices, SurfacePhasors};
pub use vertex::{ComplexAmplitudeSample, VertexPhasors};

use crate::arrays::{CellCoordinate, FieldComponent};
use crate::constants::TWO_PI;
use crate::fields::{Dimension, FieldKind, SplitField};
use crate::{Error, Result};
use num_complex::Complex64;

/// DFT weights `e^{-iωt} / N` for the E and H samples of one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasorClock {
    electric: Complex64,
    magnetic: Complex64,
}

impl PhasorClock {
    /// Weights for update `n` at angular frequency `omega` in a window of
    /// `samples` samples.
    pub fn new(n: u64, omega: f64, dt: f64, samples: usize) -> Self {
        let weight = |kind: FieldKind| {
            let t = (n as f64 + kind.time_offset()) * dt;
            Complex64::from_polar(1.0, -(omega * t).rem_euclid(TWO_PI)) / samples as f64
        };
        Self {
            electric: weight(FieldKind::Electric),
            magnetic: weight(FieldKind::Magnetic),
        }
    }

    /// Weight for electric and current-density samples.
    pub fn electric(&self) -> Complex64 {
        self.electric
    }

    /// Weight for magnetic samples.
    pub fn magnetic(&self) -> Complex64 {
        self.magnetic
    }

    /// Weight for samples of `kind`.
    pub fn for_kind(&self, kind: FieldKind) -> Complex64 {
        match kind {
            FieldKind::Magnetic => self.magnetic,
            FieldKind::Electric | FieldKind::CurrentDensity => self.electric,
        }
    }

    /// Weight for samples of `component`.
    pub fn for_component(&self, component: FieldComponent) -> Complex64 {
        if component.is_electric() {
            self.electric
        } else {
            self.magnetic
        }
    }
}

/// Running DFT of the excitation at each extraction frequency, on the
/// electric and magnetic time bases.
#[derive(Debug, Clone, PartialEq)]
pub struct PhasorNorms {
    omegas: Vec<f64>,
    electric: Vec<Complex64>,
    magnetic: Vec<Complex64>,
}

impl PhasorNorms {
    /// Zeroed norms for angular frequencies `omegas`.
    pub fn new(omegas: &[f64]) -> Self {
        Self {
            omegas: omegas.to_vec(),
            electric: vec![Complex64::new(0.0, 0.0); omegas.len()],
            magnetic: vec![Complex64::new(0.0, 0.0); omegas.len()],
        }
    }

    /// Angular frequencies.
    pub fn omegas(&self) -> &[f64] {
        &self.omegas
    }

    /// Add the excitation of update `n`: `source_e` at the electric sample
    /// time, `source_h` at the magnetic one.
    pub fn accumulate(&mut self, n: u64, dt: f64, samples: usize, source_e: f64, source_h: f64) {
        for (f, &omega) in self.omegas.iter().enumerate() {
            let clock = PhasorClock::new(n, omega, dt, samples);
            self.electric[f] += clock.electric() * source_e;
            self.magnetic[f] += clock.magnetic() * source_h;
        }
    }

    /// Reset every norm to zero.
    pub fn zero(&mut self) {
        self.electric.fill(Complex64::new(0.0, 0.0));
        self.magnetic.fill(Complex64::new(0.0, 0.0));
    }

    /// Electric norm at frequency index `f`.
    pub fn electric(&self, f: usize) -> Complex64 {
        self.electric[f]
    }

    /// Magnetic norm at frequency index `f`.
    pub fn magnetic(&self, f: usize) -> Complex64 {
        self.magnetic[f]
    }

    /// Both norms at frequency index `f`, failing if either cannot divide.
    pub fn checked(&self, f: usize) -> Result<(Complex64, Complex64)> {
        let (e, h) = (self.electric[f], self.magnetic[f]);
        for (name, norm) in [("electric", e), ("magnetic", h)] {
            if !(norm.norm() > 0.0 && norm.is_finite()) {
                return Err(Error::Normalisation(format!(
                    "{name} norm at ω = {} is {norm}",
                    self.omegas[f]
                )));
            }
        }
        Ok((e, h))
    }
}

/// Value of `component` at `cell`, interpolated to the cell centre or
/// read from the raw sample. Components absent in `dimension` are zero.
pub(crate) fn sample_component(
    e: &SplitField,
    h: &SplitField,
    component: FieldComponent,
    cell: CellCoordinate,
    dimension: Dimension,
    interpolate: bool,
) -> f64 {
    let split = if component.is_electric() { e } else { h };
    let axis = component.axis();
    if !dimension.includes(split.kind(), axis) {
        0.0
    } else if interpolate {
        split.interpolate_to_centre_of(axis, cell)
    } else {
        split.value(axis, cell)
    }
}

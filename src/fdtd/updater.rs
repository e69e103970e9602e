//! The time-stepping seam.
//!
//! A [`FieldUpdater`] advances the split fields by one leapfrog step and
//! reports the excitation waveform. The simulation driver calls it once
//! per update, in this order:
//! 1. `update_h` - H from time `(n - 1/2) dt` to `(n + 1/2) dt`
//! 2. `update_e` - E from time `n dt` to `(n + 1) dt`, sources included
//! 3. phasor accumulation on the new fields

use crate::fields::SplitField;
use crate::geometry::Grid;
use crate::Result;

/// Advances E and H by one update and describes the source.
pub trait FieldUpdater: Send {
    /// Updater name for logging.
    fn name(&self) -> &str;

    /// Called once after the fields are allocated and `dt` is final.
    fn prepare(&mut self, _grid: &Grid, _dt: f64) -> Result<()> {
        Ok(())
    }

    /// Advance the magnetic field of update `step`.
    fn update_h(&mut self, h: &mut SplitField, e: &SplitField, step: u64, dt: f64) -> Result<()>;

    /// Advance the electric field of update `step`, applying sources.
    fn update_e(&mut self, e: &mut SplitField, h: &SplitField, step: u64, dt: f64) -> Result<()>;

    /// Source waveform at time `t`; phasors are normalised by its DFT.
    fn excitation(&self, t: f64) -> f64;
}

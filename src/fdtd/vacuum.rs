//! Split-field Yee update in a homogeneous medium.
//!
//! Component `a` with transverse axes `(b, c)` (cyclic order) keeps the
//! curl terms of its two transverse derivatives in separate splits:
//! - `E_a[0] += dt/ε · ∂_b H_c`, `E_a[1] -= dt/ε · ∂_c H_b` (forward differences)
//! - `H_a[0] -= dt/μ · ∂_b E_c`, `H_a[1] += dt/μ · ∂_c E_b` (backward differences)
//!
//! Samples whose difference would leave the grid are never updated and stay
//! zero, which closes the domain with conducting walls.

use super::FieldUpdater;
use crate::arrays::{AxialDirection, CellCoordinate};
use crate::constants::{EPS0, MU0};
use crate::fields::SplitField;
use crate::geometry::Grid;
use crate::{Error, Result};
use log::debug;

/// Homogeneous-medium updater driven by a soft sinusoidal current source.
#[derive(Debug, Clone)]
pub struct VacuumUpdater {
    source: CellCoordinate,
    source_axis: AxialDirection,
    omega: f64,
    ramp_time: f64,
    permittivity: f64,
    permeability: f64,
}

impl VacuumUpdater {
    /// Source on component `axis` at sample `source`, oscillating at
    /// angular frequency `omega`, in vacuum (SI units).
    pub fn new(source: CellCoordinate, axis: AxialDirection, omega: f64) -> Self {
        Self {
            source,
            source_axis: axis,
            omega,
            ramp_time: 0.0,
            permittivity: EPS0,
            permeability: MU0,
        }
    }

    /// Use ε = μ = 1, so the wave speed is one cell spacing per unit time.
    pub fn set_normalised_units(&mut self) -> &mut Self {
        self.permittivity = 1.0;
        self.permeability = 1.0;
        self
    }

    /// Switch the source on smoothly over roughly `ramp_time`.
    pub fn set_ramp_time(&mut self, ramp_time: f64) -> &mut Self {
        self.ramp_time = ramp_time;
        self
    }

    /// Largest stable time step on `grid`.
    pub fn courant_limit(&self, grid: &Grid) -> f64 {
        let speed = 1.0 / (self.permittivity * self.permeability).sqrt();
        let inv: f64 = AxialDirection::ALL
            .iter()
            .map(|&axis| grid.spacing(axis).powi(-2))
            .sum();
        1.0 / (speed * inv.sqrt())
    }
}

impl FieldUpdater for VacuumUpdater {
    fn name(&self) -> &str {
        "vacuum"
    }

    fn prepare(&mut self, grid: &Grid, dt: f64) -> Result<()> {
        let limit = self.courant_limit(grid);
        if dt > limit {
            return Err(Error::Config(format!(
                "dt = {dt:.6e} exceeds the Courant limit {limit:.6e}"
            )));
        }
        if !grid.sample_dimensions().contains(self.source) {
            return Err(Error::Config(format!(
                "source {:?} lies outside the {} sample grid",
                self.source,
                grid.sample_dimensions()
            )));
        }
        debug!("Vacuum updater ready, dt / Courant limit = {:.3}", dt / limit);
        Ok(())
    }

    fn update_h(&mut self, h: &mut SplitField, e: &SplitField, _step: u64, dt: f64) -> Result<()> {
        let grid = e.grid().clone();
        let dims = grid.sample_dimensions();
        for axis in AxialDirection::ALL {
            let (b, c) = axis.transverse();
            let kb = dt / (self.permeability * grid.spacing(b));
            let kc = dt / (self.permeability * grid.spacing(c));
            let ec = e.component(c);
            let eb = e.component(b);
            let ha = h.component_mut(axis);
            for k in 0..dims.nz {
                for j in 0..dims.ny {
                    for i in 0..dims.nx {
                        let cell = CellCoordinate::new(i, j, k);
                        let (ib, ic) = (cell.along(b), cell.along(c));
                        if ib == 0 || ic == 0 {
                            continue;
                        }
                        let d_b = ec.value_at(cell) - ec.value_at(cell.with(b, ib - 1));
                        let d_c = eb.value_at(cell) - eb.value_at(cell.with(c, ic - 1));
                        ha.split_mut(0).add(i, j, k, -kb * d_b);
                        ha.split_mut(1).add(i, j, k, kc * d_c);
                    }
                }
            }
        }
        Ok(())
    }

    fn update_e(&mut self, e: &mut SplitField, h: &SplitField, step: u64, dt: f64) -> Result<()> {
        let grid = h.grid().clone();
        let dims = grid.sample_dimensions();
        for axis in AxialDirection::ALL {
            let (b, c) = axis.transverse();
            let kb = dt / (self.permittivity * grid.spacing(b));
            let kc = dt / (self.permittivity * grid.spacing(c));
            let hc = h.component(c);
            let hb = h.component(b);
            let ea = e.component_mut(axis);
            for k in 0..dims.nz {
                for j in 0..dims.ny {
                    for i in 0..dims.nx {
                        let cell = CellCoordinate::new(i, j, k);
                        let (ib, ic) = (cell.along(b), cell.along(c));
                        if ib + 1 >= dims.along(b) || ic + 1 >= dims.along(c) {
                            continue;
                        }
                        let d_b = hc.value_at(cell.with(b, ib + 1)) - hc.value_at(cell);
                        let d_c = hb.value_at(cell.with(c, ic + 1)) - hb.value_at(cell);
                        ea.split_mut(0).add(i, j, k, kb * d_b);
                        ea.split_mut(1).add(i, j, k, -kc * d_c);
                    }
                }
            }
        }

        let s = self.source;
        let drive = dt / self.permittivity * self.excitation((step as f64 + 0.5) * dt);
        e.component_mut(self.source_axis)
            .split_mut(0)
            .add(s.i, s.j, s.k, drive);
        Ok(())
    }

    fn excitation(&self, t: f64) -> f64 {
        let ramp = if self.ramp_time > 0.0 {
            1.0 - (-(t / self.ramp_time).powi(2)).exp()
        } else {
            1.0
        };
        ramp * (self.omega * t).sin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn fields(grid: &Grid) -> (SplitField, SplitField) {
        let mut e = SplitField::electric();
        e.allocate(grid);
        let mut h = SplitField::magnetic();
        h.allocate(grid);
        (e, h)
    }

    #[test]
    fn test_courant_limit() {
        let grid = Grid::uniform(4, 4, 4, 1.0).unwrap();
        let mut updater = VacuumUpdater::new(CellCoordinate::new(2, 2, 2), AxialDirection::Z, 1.0);
        updater.set_normalised_units();
        assert_abs_diff_eq!(updater.courant_limit(&grid), 1.0 / 3f64.sqrt(), epsilon = 1e-12);
        assert!(updater.prepare(&grid, 0.5).is_ok());
        assert!(updater.prepare(&grid, 0.6).is_err());
    }

    #[test]
    fn test_source_outside_grid_rejected() {
        let grid = Grid::uniform(4, 4, 4, 1.0).unwrap();
        let mut updater = VacuumUpdater::new(CellCoordinate::new(5, 2, 2), AxialDirection::Z, 1.0);
        updater.set_normalised_units();
        assert!(updater.prepare(&grid, 0.1).is_err());
    }

    #[test]
    fn test_first_update_only_drives_source() {
        let grid = Grid::uniform(4, 4, 4, 1.0).unwrap();
        let (mut e, mut h) = fields(&grid);
        let mut updater = VacuumUpdater::new(CellCoordinate::new(2, 2, 2), AxialDirection::Z, 1.0);
        updater.set_normalised_units();
        let dt = 0.5;
        updater.update_h(&mut h, &e, 0, dt).unwrap();
        assert_eq!(h.largest_field_value(), 0.0);
        updater.update_e(&mut e, &h, 0, dt).unwrap();

        let expected = dt * (0.5 * dt).sin();
        assert_abs_diff_eq!(
            e.value(AxialDirection::Z, CellCoordinate::new(2, 2, 2)),
            expected,
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(e.largest_field_value(), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_curl_feeds_neighbouring_magnetic_samples() {
        let grid = Grid::uniform(4, 4, 4, 1.0).unwrap();
        let (mut e, mut h) = fields(&grid);
        e.component_mut(AxialDirection::Z).set_splits(2, 2, 2, 1.0, 0.0);
        let mut updater = VacuumUpdater::new(CellCoordinate::new(0, 0, 0), AxialDirection::Z, 1.0);
        updater.set_normalised_units();
        updater.update_h(&mut h, &e, 0, 0.5).unwrap();

        // Hx[0] -= dt ∂y Ez, Hy[1] += dt ∂x Ez
        let hx = h.component(AxialDirection::X);
        assert_abs_diff_eq!(hx.split(0).get(2, 2, 2), -0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(hx.split(0).get(2, 3, 2), 0.5, epsilon = 1e-15);
        let hy = h.component(AxialDirection::Y);
        assert_abs_diff_eq!(hy.split(1).get(2, 2, 2), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(hy.split(1).get(3, 2, 2), -0.5, epsilon = 1e-15);
        assert_eq!(h.component(AxialDirection::Z).largest_value(), 0.0);
    }

    #[test]
    fn test_long_run_stays_bounded() {
        let grid = Grid::uniform(6, 6, 6, 1.0).unwrap();
        let (mut e, mut h) = fields(&grid);
        let mut updater = VacuumUpdater::new(CellCoordinate::new(3, 3, 3), AxialDirection::Z, 0.3);
        updater.set_normalised_units().set_ramp_time(10.0);
        let dt = 0.5;
        updater.prepare(&grid, dt).unwrap();
        for n in 0..400 {
            updater.update_h(&mut h, &e, n, dt).unwrap();
            updater.update_e(&mut e, &h, n, dt).unwrap();
        }
        let largest = e.largest_field_value();
        assert!(largest.is_finite());
        assert!(largest > 0.0);
    }
}

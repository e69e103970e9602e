//! Accuracy of cell-centre interpolation on whole grids.

use approx::assert_abs_diff_eq;
use std::f64::consts::PI;
use yee_phasors::arrays::{AxialDirection, CellCoordinate};
use yee_phasors::fields::SplitField;
use yee_phasors::geometry::{Grid, InterpolationMethod, PreferredInterpolationMethods};

const WAVELENGTH: f64 = 20.0;

fn wave(s: f64) -> f64 {
    (2.0 * PI * s / WAVELENGTH).sin()
}

fn electric_z_wave(grid: &Grid) -> SplitField {
    let mut e = SplitField::electric();
    e.allocate(grid);
    let dims = grid.sample_dimensions();
    let ez = e.component_mut(AxialDirection::Z);
    for k in 0..dims.nz {
        for j in 0..dims.ny {
            for i in 0..dims.nx {
                let v = wave(k as f64);
                ez.set_splits(i, j, k, 0.5 * v, 0.5 * v);
            }
        }
    }
    e
}

fn z_errors(grid: &Grid) -> Vec<f64> {
    let e = electric_z_wave(grid);
    (0..grid.cells_along(AxialDirection::Z))
        .map(|k| {
            let v = e.interpolate_to_centre_of(AxialDirection::Z, CellCoordinate::new(1, 1, k));
            (v - wave(k as f64 + 0.5)).abs()
        })
        .collect()
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

#[test]
fn test_band_limited_interior_beats_cubic() {
    let mut grid = Grid::uniform(3, 3, 40, 1.0).unwrap();
    let band_limited = z_errors(&grid);
    grid.set_preferred_interpolation_methods(PreferredInterpolationMethods::all(
        InterpolationMethod::Cubic,
    ));
    let cubic = z_errors(&grid);

    // cells 3..=36 use the centred band-limited stencil
    let bl_interior = max(&band_limited[3..37]);
    let cubic_interior = max(&cubic[3..37]);
    assert!(bl_interior < 1.5e-4, "band-limited interior error {bl_interior}");
    assert!(bl_interior < cubic_interior);
    assert!(cubic_interior < 5e-4, "cubic interior error {cubic_interior}");

    // boundary fallbacks stay usable
    assert!(max(&band_limited) < 1e-3, "band-limited error {}", max(&band_limited));
    assert!(max(&cubic) < 1e-3, "cubic error {}", max(&cubic));
}

#[test]
fn test_magnetic_interpolation_across_two_long_axes() {
    let grid = Grid::uniform(2, 40, 40, 1.0).unwrap();
    let mut h = SplitField::magnetic();
    h.allocate(&grid);
    let dims = grid.sample_dimensions();
    let f = |j: f64, k: f64| wave(j) * (2.0 * PI * k / WAVELENGTH).cos();
    let hx = h.component_mut(AxialDirection::X);
    for k in 0..dims.nz {
        for j in 0..dims.ny {
            for i in 0..dims.nx {
                hx.set_splits(i, j, k, f(j as f64, k as f64), 0.0);
            }
        }
    }

    let mut worst = 0.0f64;
    for k in 0..40 {
        for j in 0..40 {
            let v = h.interpolate_to_centre_of(AxialDirection::X, CellCoordinate::new(1, j, k));
            worst = worst.max((v - f(j as f64 + 0.5, k as f64 + 0.5)).abs());
        }
    }
    assert!(worst < 2e-3, "worst error {worst}");
}

#[test]
fn test_tiny_axes_fall_back_to_exact_linear() {
    for cells in 1..=2 {
        let grid = Grid::uniform(2, 2, cells, 0.5).unwrap();
        let mut e = SplitField::electric();
        e.allocate(&grid);
        let dims = grid.sample_dimensions();
        let ez = e.component_mut(AxialDirection::Z);
        for k in 0..dims.nz {
            for j in 0..dims.ny {
                for i in 0..dims.nx {
                    ez.set_splits(i, j, k, 3.0 - 2.0 * k as f64, 0.25);
                }
            }
        }
        for k in 0..cells {
            let v = e.interpolate_to_centre_of(AxialDirection::Z, CellCoordinate::new(0, 1, k));
            assert_abs_diff_eq!(v, 3.25 - 2.0 * (k as f64 + 0.5), epsilon = 1e-12);
        }
    }
}

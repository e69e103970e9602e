//! Field containers on the Yee grid.
//!
//! - [`SplitField`] holds the time-domain split samples advanced by the
//!   leapfrog update. Each Cartesian component is a [`SplitFieldComponent`]
//!   with two split arrays and an optional spectral plan.
//! - [`Field`] holds complex phasor volumes accumulated from a split field.
//!
//! Both dispatch on [`FieldKind`] to decide where a component sits inside
//! the cell: electric and current-density components are staggered along
//! their own axis, magnetic components along the two transverse axes.

mod field;
mod plan;
mod split_field;

pub use field::{Field, InterpolatedRange};
pub use plan::PlanePlan;
pub use split_field::{SplitField, SplitFieldComponent};

use crate::arrays::{AxialDirection, CellCoordinate, FieldScalar};
use crate::geometry::Grid;
use crate::interpolation::{best_scheme, MAX_STENCIL_WIDTH};
use num_complex::Complex64;

/// Physical quantity carried by a field container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Electric field E
    Electric,
    /// Magnetic field H
    Magnetic,
    /// Current density J
    CurrentDensity,
}

impl FieldKind {
    /// Axes along which component `axis` is offset from the cell centre.
    pub fn staggered_axes(self, axis: AxialDirection) -> Stagger {
        match self {
            Self::Electric | Self::CurrentDensity => Stagger::Along(axis),
            Self::Magnetic => {
                let (a, b) = axis.transverse();
                Stagger::Across(a, b)
            }
        }
    }

    /// Time of the samples after update `n`, as `(n + offset) dt`.
    ///
    /// Electric-type samples belong to `(n + 1) dt`, magnetic samples to
    /// `(n + 1/2) dt`.
    pub fn time_offset(self) -> f64 {
        match self {
            Self::Electric | Self::CurrentDensity => 1.0,
            Self::Magnetic => 0.5,
        }
    }
}

/// Where a component sits relative to the cell centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stagger {
    /// Half a cell off along one axis.
    Along(AxialDirection),
    /// Half a cell off along two axes.
    Across(AxialDirection, AxialDirection),
}

/// Lifecycle of a field container.
///
/// Transitions only move forward; reallocation is the single way back to
/// [`FieldState::Allocated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldState {
    /// No arrays yet
    Uninitialized,
    /// Arrays sized, no spectral plan
    Allocated,
    /// Spectral plan prepared
    PlanReady,
    /// Receiving per-timestep updates
    Accumulating,
    /// Read-only
    Finalized,
}

/// Spatial dimensionality of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimension {
    /// All six components
    #[default]
    Three,
    /// Ex, Ey and Hz only
    TransverseElectric,
    /// Ez, Hx and Hy only
    TransverseMagnetic,
}

impl Dimension {
    /// Whether component `axis` of a field of `kind` takes part in runs of
    /// this dimensionality.
    pub fn includes(self, kind: FieldKind, axis: AxialDirection) -> bool {
        let in_plane = axis != AxialDirection::Z;
        match (self, kind) {
            (Self::Three, _) => true,
            (Self::TransverseElectric, FieldKind::Magnetic) => !in_plane,
            (Self::TransverseElectric, _) => in_plane,
            (Self::TransverseMagnetic, FieldKind::Magnetic) => in_plane,
            (Self::TransverseMagnetic, _) => !in_plane,
        }
    }
}

/// Complex vector at one point, e.g. an interpolated phasor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComplexVector {
    /// x component
    pub x: Complex64,
    /// y component
    pub y: Complex64,
    /// z component
    pub z: Complex64,
}

impl ComplexVector {
    /// Component along `axis`.
    pub fn along(&self, axis: AxialDirection) -> Complex64 {
        match axis {
            AxialDirection::X => self.x,
            AxialDirection::Y => self.y,
            AxialDirection::Z => self.z,
        }
    }

    /// Mutable component along `axis`.
    pub fn along_mut(&mut self, axis: AxialDirection) -> &mut Complex64 {
        match axis {
            AxialDirection::X => &mut self.x,
            AxialDirection::Y => &mut self.y,
            AxialDirection::Z => &mut self.z,
        }
    }
}

/// Interpolate a staggered component to the centre of `cell`.
///
/// `sample` reads the component at a sample index. Only the staggered
/// axes are interpolated; the other indices are taken from `cell`.
pub(crate) fn interpolate_staggered<T, F>(
    grid: &Grid,
    stagger: Stagger,
    cell: CellCoordinate,
    sample: F,
) -> T
where
    T: FieldScalar,
    F: Fn(CellCoordinate) -> T,
{
    match stagger {
        Stagger::Along(axis) => interpolate_line(grid, axis, cell, &sample),
        Stagger::Across(a, b) => {
            let cells = grid.cells_along(b);
            let c = cell.along(b);
            let scheme = best_scheme(cells, c, grid.preferred_method(b));
            let first = scheme
                .first_sample(c)
                .unwrap_or_else(|| unreachable!("selected scheme always fits"));
            let mut window = [T::default(); MAX_STENCIL_WIDTH];
            for (m, w) in window.iter_mut().take(scheme.width()).enumerate() {
                *w = interpolate_line(grid, a, cell.with(b, first + m), &sample);
            }
            scheme.interpolate(&window[..scheme.width()], 0)
        }
    }
}

fn interpolate_line<T, F>(grid: &Grid, axis: AxialDirection, cell: CellCoordinate, sample: &F) -> T
where
    T: FieldScalar,
    F: Fn(CellCoordinate) -> T,
{
    let cells = grid.cells_along(axis);
    let c = cell.along(axis);
    let scheme = best_scheme(cells, c, grid.preferred_method(axis));
    let first = scheme
        .first_sample(c)
        .unwrap_or_else(|| unreachable!("selected scheme always fits"));
    let mut window = [T::default(); MAX_STENCIL_WIDTH];
    for (m, w) in window.iter_mut().take(scheme.width()).enumerate() {
        *w = sample(cell.with(axis, first + m));
    }
    scheme.interpolate(&window[..scheme.width()], 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::{Dimensions, Field3D};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_stagger_by_kind() {
        assert_eq!(
            FieldKind::Electric.staggered_axes(AxialDirection::Y),
            Stagger::Along(AxialDirection::Y)
        );
        assert_eq!(
            FieldKind::CurrentDensity.staggered_axes(AxialDirection::Z),
            Stagger::Along(AxialDirection::Z)
        );
        assert_eq!(
            FieldKind::Magnetic.staggered_axes(AxialDirection::X),
            Stagger::Across(AxialDirection::Y, AxialDirection::Z)
        );
    }

    #[test]
    fn test_dimension_components() {
        use AxialDirection::*;
        let te = Dimension::TransverseElectric;
        assert!(te.includes(FieldKind::Electric, X));
        assert!(te.includes(FieldKind::Electric, Y));
        assert!(!te.includes(FieldKind::Electric, Z));
        assert!(te.includes(FieldKind::Magnetic, Z));
        assert!(!te.includes(FieldKind::Magnetic, X));

        let tm = Dimension::TransverseMagnetic;
        assert!(tm.includes(FieldKind::Electric, Z));
        assert!(!tm.includes(FieldKind::Electric, X));
        assert!(tm.includes(FieldKind::Magnetic, X));
        assert!(tm.includes(FieldKind::Magnetic, Y));
        assert!(!tm.includes(FieldKind::Magnetic, Z));

        for axis in AxialDirection::ALL {
            assert!(Dimension::Three.includes(FieldKind::Magnetic, axis));
        }
    }

    #[test]
    fn test_bilinear_field_reproduced_across_two_axes() {
        let grid = Grid::uniform(5, 6, 3, 1.0).unwrap();
        let dims: Dimensions = grid.sample_dimensions();
        let f = |x: f64, y: f64, z: f64| 1.0 + 0.5 * x - 0.25 * y + 2.0 * z + 0.1 * x * y;
        let mut data: Field3D = Field3D::new(dims);
        for k in 0..dims.nz {
            for j in 0..dims.ny {
                for i in 0..dims.nx {
                    data.set(i, j, k, f(i as f64, j as f64, k as f64));
                }
            }
        }
        let stagger = FieldKind::Magnetic.staggered_axes(AxialDirection::Z);
        for j in 0..6 {
            for i in 0..5 {
                let cell = CellCoordinate::new(i, j, 1);
                let v = interpolate_staggered(&grid, stagger, cell, |s| data.at(s));
                assert_abs_diff_eq!(
                    v,
                    f(i as f64 + 0.5, j as f64 + 0.5, 1.0),
                    epsilon = 1e-12
                );
            }
        }
    }
}

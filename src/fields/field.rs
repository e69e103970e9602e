//! Complex phasor volumes.

use super::{interpolate_staggered, ComplexVector, Dimension, FieldKind, FieldState, SplitField};
use crate::arrays::{AxialDirection, CellCoordinate, CellRange, Dimensions, VectorField3D};
use crate::geometry::Grid;
use crate::phasors::PhasorClock;
use crate::{Error, Result};
use log::debug;
use num_complex::Complex64;
use rayon::prelude::*;

/// Complex values of E, H or J over the whole grid.
///
/// During a run the volume accumulates a running DFT of a [`SplitField`]
/// via [`set_phasors`](Field::set_phasors), together with the matching DFT
/// of the excitation (the angular norm). [`normalise_volume`](Field::normalise_volume)
/// divides one by the other and freezes the volume.
#[derive(Debug, Clone)]
pub struct Field {
    kind: FieldKind,
    state: FieldState,
    grid: Option<Grid>,
    values: VectorField3D<Complex64>,
    angular_norm: Complex64,
}

impl Field {
    /// Unallocated volume of `kind`.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            state: FieldState::Uninitialized,
            grid: None,
            values: VectorField3D::new(Dimensions::new(0, 0, 0)),
            angular_norm: Complex64::new(0.0, 0.0),
        }
    }

    /// Unallocated electric volume.
    pub fn electric() -> Self {
        Self::new(FieldKind::Electric)
    }

    /// Unallocated magnetic volume.
    pub fn magnetic() -> Self {
        Self::new(FieldKind::Magnetic)
    }

    /// Size the volume for `grid` and zero it.
    pub fn allocate(&mut self, grid: &Grid) -> &mut Self {
        self.values = VectorField3D::new(grid.sample_dimensions());
        self.grid = Some(grid.clone());
        self.angular_norm = Complex64::new(0.0, 0.0);
        self.state = FieldState::Allocated;
        self
    }

    /// Physical quantity carried.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Lifecycle state.
    pub fn state(&self) -> FieldState {
        self.state
    }

    /// Grid the volume was sized for.
    pub fn grid(&self) -> &Grid {
        match &self.grid {
            Some(grid) => grid,
            None => panic!("{:?} field has not been allocated", self.kind),
        }
    }

    /// Extents of each component array.
    pub fn dimensions(&self) -> Dimensions {
        self.values.dimensions()
    }

    /// Running DFT of the excitation accumulated alongside the volume.
    pub fn angular_norm(&self) -> Complex64 {
        self.angular_norm
    }

    /// Accumulate one time sample of `split` into the volume.
    ///
    /// `n` is the update index, `samples` the number of samples in the DFT
    /// window and `excitation` the source waveform at the sample time.
    pub fn set_phasors(
        &mut self,
        split: &SplitField,
        n: u64,
        omega: f64,
        dt: f64,
        samples: usize,
        excitation: f64,
    ) {
        assert_eq!(
            split.kind(),
            self.kind,
            "cannot accumulate a {:?} split field into a {:?} volume",
            split.kind(),
            self.kind
        );
        self.assert_writable();
        assert_eq!(
            split.grid().sample_dimensions(),
            self.dimensions(),
            "split field and phasor volume sizes differ"
        );

        let phase = PhasorClock::new(n, omega, dt, samples).for_kind(self.kind);

        for axis in AxialDirection::ALL {
            let component = split.component(axis);
            let first = component.split(0).as_slice();
            let second = component.split(1).as_slice();
            self.values
                .component_mut(axis)
                .as_mut_slice()
                .par_iter_mut()
                .zip(first.par_iter().zip(second.par_iter()))
                .for_each(|(v, (a, b))| *v += phase * (a + b));
        }
        self.angular_norm += phase * excitation;
        self.state = FieldState::Accumulating;
    }

    /// Divide the volume by its angular norm and freeze it.
    pub fn normalise_volume(&mut self) -> Result<()> {
        self.assert_writable();
        let norm = self.angular_norm;
        if !(norm.norm() > 0.0 && norm.is_finite()) {
            return Err(Error::Normalisation(format!(
                "{:?} angular norm is {norm}",
                self.kind
            )));
        }
        for axis in AxialDirection::ALL {
            self.values
                .component_mut(axis)
                .as_mut_slice()
                .par_iter_mut()
                .for_each(|v| *v /= norm);
        }
        self.state = FieldState::Finalized;
        Ok(())
    }

    /// Zero the volume and its angular norm.
    pub fn zero(&mut self) {
        self.assert_writable();
        self.values.clear();
        self.angular_norm = Complex64::new(0.0, 0.0);
        debug!("Zeroed the {:?} phasors", self.kind);
    }

    /// Overwrite this volume with a copy of `other`.
    ///
    /// The state never moves backwards: the copy takes the later of the
    /// two states.
    pub fn set_values_from(&mut self, other: &Field) {
        self.assert_writable();
        assert_eq!(self.kind, other.kind, "cannot copy between field kinds");
        if self.dimensions() != other.dimensions() {
            self.values = other.values.clone();
        } else {
            self.values.copy_from(&other.values);
        }
        self.grid = other.grid.clone();
        self.angular_norm = other.angular_norm;
        self.state = self.state.max(other.state);
    }

    /// Overwrite this volume with the instantaneous values of `split`.
    ///
    /// The result is read-only, as after normalisation.
    pub fn set_values_from_split(&mut self, split: &SplitField) {
        assert_eq!(self.kind, split.kind(), "cannot copy between field kinds");
        let grid = split.grid();
        if self.dimensions() != grid.sample_dimensions() {
            self.values = VectorField3D::new(grid.sample_dimensions());
        }
        for axis in AxialDirection::ALL {
            let component = split.component(axis);
            let first = component.split(0).as_slice();
            let second = component.split(1).as_slice();
            self.values
                .component_mut(axis)
                .as_mut_slice()
                .par_iter_mut()
                .zip(first.par_iter().zip(second.par_iter()))
                .for_each(|(v, (a, b))| *v = Complex64::new(a + b, 0.0));
        }
        self.grid = Some(grid.clone());
        self.angular_norm = Complex64::new(1.0, 0.0);
        self.state = FieldState::Finalized;
    }

    /// Largest pointwise difference to `other`, relative to the largest
    /// magnitude in this volume.
    pub fn max_pointwise_difference_over_max_element(&self, other: &Field) -> f64 {
        assert_eq!(
            self.dimensions(),
            other.dimensions(),
            "cannot compare volumes of different size"
        );
        let mut max_diff = 0.0f64;
        let mut max_elem = 0.0f64;
        for axis in AxialDirection::ALL {
            let a = self.values.component(axis).as_slice();
            let b = other.values.component(axis).as_slice();
            let (diff, elem) = a
                .par_iter()
                .zip(b.par_iter())
                .map(|(x, y)| ((x - y).norm(), x.norm()))
                .reduce(|| (0.0, 0.0), |p, q| (p.0.max(q.0), p.1.max(q.1)));
            max_diff = max_diff.max(diff);
            max_elem = max_elem.max(elem);
        }
        if max_diff == 0.0 {
            0.0
        } else if max_elem == 0.0 {
            f64::INFINITY
        } else {
            max_diff / max_elem
        }
    }

    /// Finalised component arrays.
    pub fn values(&self) -> &VectorField3D<Complex64> {
        self.assert_readable();
        &self.values
    }

    /// Finalised value of component `axis` at sample `cell`.
    pub fn value(&self, axis: AxialDirection, cell: CellCoordinate) -> Complex64 {
        self.assert_readable();
        self.values.component(axis).at(cell)
    }

    /// Interpolate component `axis` to the centre of `cell`.
    pub fn interpolate_to_centre_of(&self, axis: AxialDirection, cell: CellCoordinate) -> Complex64 {
        self.assert_readable();
        let data = self.values.component(axis);
        interpolate_staggered(self.grid(), self.kind.staggered_axes(axis), cell, |s| data.at(s))
    }

    /// Interpolate the components present in `dimension` to the centre of
    /// `cell`; the others are zero.
    pub fn interpolate_vector_at(&self, cell: CellCoordinate, dimension: Dimension) -> ComplexVector {
        let mut out = ComplexVector::default();
        for axis in AxialDirection::ALL {
            if dimension.includes(self.kind, axis) {
                *out.along_mut(axis) = self.interpolate_to_centre_of(axis, cell);
            }
        }
        out
    }

    /// Components of a transverse-electric run at the centre of `cell`:
    /// (Ex, Ey, 0) for E, (0, 0, Hz) for H.
    pub fn interpolate_transverse_electric_components(&self, cell: CellCoordinate) -> ComplexVector {
        self.interpolate_vector_at(cell, Dimension::TransverseElectric)
    }

    /// Components of a transverse-magnetic run at the centre of `cell`:
    /// (0, 0, Ez) for E, (Hx, Hy, 0) for H.
    pub fn interpolate_transverse_magnetic_components(&self, cell: CellCoordinate) -> ComplexVector {
        self.interpolate_vector_at(cell, Dimension::TransverseMagnetic)
    }

    /// The two components perpendicular to `axis`, in cyclic order,
    /// interpolated to the centre of `cell`.
    pub fn interpolate_transverse_components(
        &self,
        axis: AxialDirection,
        cell: CellCoordinate,
    ) -> (Complex64, Complex64) {
        let (a, b) = axis.transverse();
        (
            self.interpolate_to_centre_of(a, cell),
            self.interpolate_to_centre_of(b, cell),
        )
    }

    /// Lazily interpolate every cell of `range`, `i` fastest.
    pub fn interpolate_over_range(&self, range: CellRange, dimension: Dimension) -> InterpolatedRange<'_> {
        self.assert_readable();
        let cells = self.grid().dimensions();
        assert!(
            range.upper.i < cells.nx && range.upper.j < cells.ny && range.upper.k < cells.nz,
            "cell range {:?}..={:?} exceeds the {} grid",
            range.lower,
            range.upper,
            cells
        );
        InterpolatedRange {
            field: self,
            dimension,
            range,
            next: 0,
        }
    }

    fn assert_writable(&self) {
        assert!(
            self.state != FieldState::Uninitialized,
            "{:?} field has not been allocated",
            self.kind
        );
        assert!(
            self.state != FieldState::Finalized,
            "{:?} field is finalised",
            self.kind
        );
    }

    fn assert_readable(&self) {
        assert!(
            self.state == FieldState::Finalized,
            "{:?} field read before it was finalised (state {:?})",
            self.kind,
            self.state
        );
    }
}

/// One-pass iterator over interpolated values of a cell range.
#[derive(Debug)]
pub struct InterpolatedRange<'a> {
    field: &'a Field,
    dimension: Dimension,
    range: CellRange,
    next: usize,
}

impl Iterator for InterpolatedRange<'_> {
    type Item = (CellCoordinate, ComplexVector);

    fn next(&mut self) -> Option<Self::Item> {
        let dims = self.range.dimensions();
        if self.next >= dims.total() {
            return None;
        }
        let n = self.next;
        self.next += 1;
        let lower = self.range.lower;
        let cell = CellCoordinate::new(
            lower.i + n % dims.nx,
            lower.j + (n / dims.nx) % dims.ny,
            lower.k + n / (dims.nx * dims.ny),
        );
        Some((cell, self.field.interpolate_vector_at(cell, self.dimension)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.range.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for InterpolatedRange<'_> {}

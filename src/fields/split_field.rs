//! Time-domain split fields.

use super::{interpolate_staggered, FieldKind, FieldState, PlanePlan};
use crate::arrays::{AxialDirection, CellCoordinate, Dimensions, Field3D};
use crate::geometry::Grid;
use log::debug;
use num_complex::Complex64;

/// One Cartesian component of a split field: two split arrays whose sum
/// is the physical component, plus an optional plane transform plan.
#[derive(Debug)]
pub struct SplitFieldComponent {
    axis: AxialDirection,
    splits: [Field3D; 2],
    plan: Option<PlanePlan>,
}

impl SplitFieldComponent {
    /// Zero-filled component with arrays of extent `dims`.
    pub fn new(axis: AxialDirection, dims: Dimensions) -> Self {
        Self {
            axis,
            splits: [Field3D::new(dims), Field3D::new(dims)],
            plan: None,
        }
    }

    /// Axis of this component.
    pub fn axis(&self) -> AxialDirection {
        self.axis
    }

    /// Extent of each split array.
    pub fn dimensions(&self) -> Dimensions {
        self.splits[0].dimensions()
    }

    /// Split array `n` (0 or 1).
    pub fn split(&self, n: usize) -> &Field3D {
        &self.splits[n]
    }

    /// Mutable split array `n` (0 or 1).
    pub fn split_mut(&mut self, n: usize) -> &mut Field3D {
        &mut self.splits[n]
    }

    /// Write both splits at one sample.
    pub fn set_splits(&mut self, i: usize, j: usize, k: usize, first: f64, second: f64) {
        self.splits[0].set(i, j, k, first);
        self.splits[1].set(i, j, k, second);
    }

    /// Physical value (sum of the splits) at `(i, j, k)`.
    #[inline]
    pub fn value(&self, i: usize, j: usize, k: usize) -> f64 {
        self.splits[0].get(i, j, k) + self.splits[1].get(i, j, k)
    }

    /// Physical value at `cell`.
    #[inline]
    pub fn value_at(&self, cell: CellCoordinate) -> f64 {
        self.value(cell.i, cell.j, cell.k)
    }

    /// Largest magnitude of the physical value.
    pub fn largest_value(&self) -> f64 {
        self.splits[0]
            .as_slice()
            .iter()
            .zip(self.splits[1].as_slice())
            .fold(0.0f64, |acc, (a, b)| acc.max((a + b).abs()))
    }

    /// Zero both splits.
    pub fn clear(&mut self) {
        self.splits[0].clear();
        self.splits[1].clear();
    }

    /// Prepare the x-y plane transform plan for the current arrays.
    pub fn initialise_fftw_plan(&mut self) {
        let dims = self.dimensions();
        self.plan = Some(PlanePlan::new(dims.nx, dims.ny));
    }

    /// Whether a plan matching the current arrays exists.
    pub fn has_plan(&self) -> bool {
        let dims = self.dimensions();
        self.plan
            .as_ref()
            .map_or(false, |p| p.shape() == (dims.nx, dims.ny))
    }

    /// Fill `out` with the physical values of plane `k` and transform it.
    ///
    /// Panics if no plan was prepared for the current arrays.
    pub fn transform_plane(&mut self, k: usize, out: &mut Vec<Complex64>) {
        let dims = self.dimensions();
        assert!(
            self.has_plan(),
            "no transform plan for the {:?} component; call initialise_fftw_plan after allocation",
            self.axis
        );
        assert!(k < dims.nz, "plane {k} outside {dims} arrays");

        let this = &*self;
        out.clear();
        out.extend((0..dims.ny).flat_map(|j| {
            (0..dims.nx).map(move |i| Complex64::new(this.value(i, j, k), 0.0))
        }));
        if let Some(plan) = self.plan.as_mut() {
            plan.execute(out);
        }
    }
}

/// Split field over the whole grid: one [`SplitFieldComponent`] per axis.
#[derive(Debug)]
pub struct SplitField {
    kind: FieldKind,
    state: FieldState,
    grid: Option<Grid>,
    components: Vec<SplitFieldComponent>,
}

impl SplitField {
    /// Unallocated split field of `kind`.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            state: FieldState::Uninitialized,
            grid: None,
            components: Vec::new(),
        }
    }

    /// Unallocated electric split field.
    pub fn electric() -> Self {
        Self::new(FieldKind::Electric)
    }

    /// Unallocated magnetic split field.
    pub fn magnetic() -> Self {
        Self::new(FieldKind::Magnetic)
    }

    /// Unallocated current-density split field.
    pub fn current_density() -> Self {
        Self::new(FieldKind::CurrentDensity)
    }

    /// Size the arrays for `grid` and zero them.
    ///
    /// Any existing plans are dropped; call
    /// [`initialise_fftw_plan`](Self::initialise_fftw_plan) again before
    /// transforming.
    pub fn allocate(&mut self, grid: &Grid) -> &mut Self {
        let dims = grid.sample_dimensions();
        debug!("Allocating {:?} split field with {} arrays", self.kind, dims);
        self.components = AxialDirection::ALL
            .iter()
            .map(|&axis| SplitFieldComponent::new(axis, dims))
            .collect();
        self.grid = Some(grid.clone());
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

    /// Grid the arrays were sized for.
    ///
    /// Panics if the field has not been allocated.
    pub fn grid(&self) -> &Grid {
        match &self.grid {
            Some(grid) => grid,
            None => panic!("{:?} split field has not been allocated", self.kind),
        }
    }

    /// Component along `axis`.
    pub fn component(&self, axis: AxialDirection) -> &SplitFieldComponent {
        self.assert_allocated();
        &self.components[axis.index()]
    }

    /// Mutable component along `axis`.
    ///
    /// Panics once the field is finalised.
    pub fn component_mut(&mut self, axis: AxialDirection) -> &mut SplitFieldComponent {
        self.assert_allocated();
        assert!(
            self.state != FieldState::Finalized,
            "{:?} split field is finalised",
            self.kind
        );
        &mut self.components[axis.index()]
    }

    /// Physical value of component `axis` at `cell`.
    #[inline]
    pub fn value(&self, axis: AxialDirection, cell: CellCoordinate) -> f64 {
        self.components[axis.index()].value_at(cell)
    }

    /// Prepare plane transform plans for all three components.
    pub fn initialise_fftw_plan(&mut self) {
        self.assert_allocated();
        for component in &mut self.components {
            component.initialise_fftw_plan();
        }
        if self.state == FieldState::Allocated {
            self.state = FieldState::PlanReady;
        }
    }

    /// Mark the start of time stepping.
    pub fn begin_accumulation(&mut self) {
        self.assert_allocated();
        assert!(
            self.state < FieldState::Accumulating,
            "{:?} split field is already {:?}",
            self.kind,
            self.state
        );
        self.state = FieldState::Accumulating;
    }

    /// Freeze the field; later writes panic.
    pub fn finalise(&mut self) {
        self.assert_allocated();
        self.state = FieldState::Finalized;
    }

    /// Interpolate component `axis` to the centre of `cell`.
    pub fn interpolate_to_centre_of(&self, axis: AxialDirection, cell: CellCoordinate) -> f64 {
        let grid = self.grid();
        let component = &self.components[axis.index()];
        interpolate_staggered(grid, self.kind.staggered_axes(axis), cell, |s| {
            component.value_at(s)
        })
    }

    /// Largest magnitude over all three components.
    pub fn largest_field_value(&self) -> f64 {
        self.components
            .iter()
            .fold(0.0f64, |acc, c| acc.max(c.largest_value()))
    }

    /// Zero every split of every component.
    pub fn zero(&mut self) {
        for component in &mut self.components {
            component.clear();
        }
    }

    fn assert_allocated(&self) {
        assert!(
            self.state != FieldState::Uninitialized,
            "{:?} split field has not been allocated",
            self.kind
        );
    }
}

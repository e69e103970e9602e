//! Array containers for Yee-grid field samples.
//!
//! All 3-D arrays are stored flat with `i` varying fastest, so a line of
//! samples along x is contiguous and lines along y/z are strided.

use crate::{Error, Result};
use num_complex::Complex64;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};

/// Scalar types that can be stored in a field array and interpolated.
pub trait FieldScalar:
    Copy
    + Default
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
    + Sum
    + 'static
{
}

impl FieldScalar for f64 {}

impl FieldScalar for Complex64 {}

/// Extents of a 3-D sample array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Samples along x
    pub nx: usize,
    /// Samples along y
    pub ny: usize,
    /// Samples along z
    pub nz: usize,
}

impl Dimensions {
    /// Create new dimensions.
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of samples.
    #[inline]
    pub fn total(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Extent along one axis.
    #[inline]
    pub fn along(&self, axis: AxialDirection) -> usize {
        match axis {
            AxialDirection::X => self.nx,
            AxialDirection::Y => self.ny,
            AxialDirection::Z => self.nz,
        }
    }

    /// Flat index of sample `(i, j, k)`.
    #[inline]
    pub fn to_linear(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny && k < self.nz);
        i + self.nx * (j + self.ny * k)
    }

    /// Whether `cell` addresses a sample inside these extents.
    #[inline]
    pub fn contains(&self, cell: CellCoordinate) -> bool {
        cell.i < self.nx && cell.j < self.ny && cell.k < self.nz
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}

/// Cartesian axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxialDirection {
    /// x axis
    X,
    /// y axis
    Y,
    /// z axis
    Z,
}

impl AxialDirection {
    /// All axes in x, y, z order.
    pub const ALL: [AxialDirection; 3] = [Self::X, Self::Y, Self::Z];

    /// Axis index (0, 1, 2 for x, y, z).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// The two axes perpendicular to this one, in cyclic order.
    #[inline]
    pub fn transverse(self) -> (AxialDirection, AxialDirection) {
        match self {
            Self::X => (Self::Y, Self::Z),
            Self::Y => (Self::Z, Self::X),
            Self::Z => (Self::X, Self::Y),
        }
    }
}

/// Index of a Yee cell (or sample) in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellCoordinate {
    /// Index along x
    pub i: usize,
    /// Index along y
    pub j: usize,
    /// Index along z
    pub k: usize,
}

impl CellCoordinate {
    /// Create a new coordinate.
    pub const fn new(i: usize, j: usize, k: usize) -> Self {
        Self { i, j, k }
    }

    /// Index along `axis`.
    #[inline]
    pub fn along(&self, axis: AxialDirection) -> usize {
        match axis {
            AxialDirection::X => self.i,
            AxialDirection::Y => self.j,
            AxialDirection::Z => self.k,
        }
    }

    /// Copy of this coordinate with the index along `axis` replaced.
    #[inline]
    pub fn with(mut self, axis: AxialDirection, value: usize) -> Self {
        match axis {
            AxialDirection::X => self.i = value,
            AxialDirection::Y => self.j = value,
            AxialDirection::Z => self.k = value,
        }
        self
    }
}

impl From<(usize, usize, usize)> for CellCoordinate {
    fn from((i, j, k): (usize, usize, usize)) -> Self {
        Self::new(i, j, k)
    }
}

/// Inclusive box of cells `lower..=upper` along every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    /// Smallest corner (inclusive)
    pub lower: CellCoordinate,
    /// Largest corner (inclusive)
    pub upper: CellCoordinate,
}

impl CellRange {
    /// Create a range, rejecting inverted bounds.
    pub fn new(lower: CellCoordinate, upper: CellCoordinate) -> Result<Self> {
        for axis in AxialDirection::ALL {
            if lower.along(axis) > upper.along(axis) {
                return Err(Error::Config(format!(
                    "inverted cell range along {:?}: {} > {}",
                    axis,
                    lower.along(axis),
                    upper.along(axis)
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Number of cells along `axis`.
    #[inline]
    pub fn extent(&self, axis: AxialDirection) -> usize {
        self.upper.along(axis) - self.lower.along(axis) + 1
    }

    /// Extents of the range as array dimensions.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(
            self.extent(AxialDirection::X),
            self.extent(AxialDirection::Y),
            self.extent(AxialDirection::Z),
        )
    }

    /// Total number of cells in the range.
    pub fn len(&self) -> usize {
        self.dimensions().total()
    }

    /// Always false; a valid range holds at least one cell.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Visit every cell, `i` fastest, matching the flat array layout.
    pub fn cells(&self) -> impl Iterator<Item = CellCoordinate> + '_ {
        let (lo, hi) = (self.lower, self.upper);
        (lo.k..=hi.k).flat_map(move |k| {
            (lo.j..=hi.j).flat_map(move |j| (lo.i..=hi.i).map(move |i| CellCoordinate::new(i, j, k)))
        })
    }
}

/// Dense 3-D array of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Field3D<T = f64> {
    dims: Dimensions,
    data: Vec<T>,
}

impl<T: FieldScalar> Field3D<T> {
    /// Create a zero-filled array.
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            data: vec![T::default(); dims.total()],
        }
    }

    /// Array extents.
    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Read sample `(i, j, k)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> T {
        self.data[self.dims.to_linear(i, j, k)]
    }

    /// Read the sample at `cell`.
    #[inline]
    pub fn at(&self, cell: CellCoordinate) -> T {
        self.get(cell.i, cell.j, cell.k)
    }

    /// Write sample `(i, j, k)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: T) {
        let idx = self.dims.to_linear(i, j, k);
        self.data[idx] = value;
    }

    /// Add to sample `(i, j, k)`.
    #[inline]
    pub fn add(&mut self, i: usize, j: usize, k: usize, value: T) {
        let idx = self.dims.to_linear(i, j, k);
        self.data[idx] = self.data[idx] + value;
    }

    /// Set every sample to zero.
    pub fn clear(&mut self) {
        self.data.fill(T::default());
    }

    /// Set every sample to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Copy all samples from an array of identical extents.
    pub fn copy_from(&mut self, other: &Field3D<T>) {
        assert_eq!(
            self.dims, other.dims,
            "cannot copy a {} array into a {} array",
            other.dims, self.dims
        );
        self.data.copy_from_slice(&other.data);
    }

    /// Flat view of the samples.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable flat view of the samples.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

/// Three co-dimensioned arrays, one per Cartesian component.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField3D<T = f64> {
    /// x component
    pub x: Field3D<T>,
    /// y component
    pub y: Field3D<T>,
    /// z component
    pub z: Field3D<T>,
}

impl<T: FieldScalar> VectorField3D<T> {
    /// Create a zero-filled vector field.
    pub fn new(dims: Dimensions) -> Self {
        Self {
            x: Field3D::new(dims),
            y: Field3D::new(dims),
            z: Field3D::new(dims),
        }
    }

    /// Extents shared by all three components.
    pub fn dimensions(&self) -> Dimensions {
        self.x.dimensions()
    }

    /// Component along `axis`.
    #[inline]
    pub fn component(&self, axis: AxialDirection) -> &Field3D<T> {
        match axis {
            AxialDirection::X => &self.x,
            AxialDirection::Y => &self.y,
            AxialDirection::Z => &self.z,
        }
    }

    /// Mutable component along `axis`.
    #[inline]
    pub fn component_mut(&mut self, axis: AxialDirection) -> &mut Field3D<T> {
        match axis {
            AxialDirection::X => &mut self.x,
            AxialDirection::Y => &mut self.y,
            AxialDirection::Z => &mut self.z,
        }
    }

    /// Zero all three components.
    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.z.clear();
    }

    /// Copy all components from a field of identical extents.
    pub fn copy_from(&mut self, other: &VectorField3D<T>) {
        self.x.copy_from(&other.x);
        self.y.copy_from(&other.y);
        self.z.copy_from(&other.z);
    }
}

/// One 1-D array per axis (grid labels, per-axis coefficients).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XYZVectors {
    /// Values along x
    pub x: Vec<f64>,
    /// Values along y
    pub y: Vec<f64>,
    /// Values along z
    pub z: Vec<f64>,
}

impl XYZVectors {
    /// The vector belonging to `axis`.
    pub fn get(&self, axis: AxialDirection) -> &[f64] {
        match axis {
            AxialDirection::X => &self.x,
            AxialDirection::Y => &self.y,
            AxialDirection::Z => &self.z,
        }
    }

    /// Replace the vector belonging to `axis`.
    pub fn set(&mut self, axis: AxialDirection, values: Vec<f64>) {
        match axis {
            AxialDirection::X => self.x = values,
            AxialDirection::Y => self.y = values,
            AxialDirection::Z => self.z = values,
        }
    }
}

/// One of the six electromagnetic field components.
///
/// The discriminants are the 1-based identifiers used by host arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldComponent {
    /// Electric x
    Ex = 1,
    /// Electric y
    Ey = 2,
    /// Electric z
    Ez = 3,
    /// Magnetic x
    Hx = 4,
    /// Magnetic y
    Hy = 5,
    /// Magnetic z
    Hz = 6,
}

impl FieldComponent {
    /// All components in identifier order.
    pub const ALL: [FieldComponent; 6] = [Self::Ex, Self::Ey, Self::Ez, Self::Hx, Self::Hy, Self::Hz];

    /// Look up a component by its host identifier (1..=6).
    pub fn from_id(id: i32) -> Result<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|slot| Self::ALL.get(slot))
            .copied()
            .ok_or_else(|| Error::Config(format!("field component id {id} is not in 1..=6")))
    }

    /// Host identifier of this component.
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Cartesian axis of this component.
    pub fn axis(self) -> AxialDirection {
        match self {
            Self::Ex | Self::Hx => AxialDirection::X,
            Self::Ey | Self::Hy => AxialDirection::Y,
            Self::Ez | Self::Hz => AxialDirection::Z,
        }
    }

    /// Whether this is an electric component.
    pub fn is_electric(self) -> bool {
        matches!(self, Self::Ex | Self::Ey | Self::Ez)
    }
}

/// Ordered list of requested field components.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldComponentsVector {
    components: Vec<FieldComponent>,
}

impl FieldComponentsVector {
    /// Build from host identifiers, rejecting unknown ids and duplicates.
    pub fn from_ids(ids: &[i32]) -> Result<Self> {
        let mut components = Vec::with_capacity(ids.len());
        for &id in ids {
            let component = FieldComponent::from_id(id)?;
            if components.contains(&component) {
                return Err(Error::Config(format!(
                    "field component {component:?} requested twice"
                )));
            }
            components.push(component);
        }
        Ok(Self { components })
    }

    /// Slot of `component` in this list, if it was requested.
    pub fn index(&self, component: FieldComponent) -> Option<usize> {
        self.components.iter().position(|&c| c == component)
    }

    /// Number of requested components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no components were requested.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Requested components in order.
    pub fn iter(&self) -> impl Iterator<Item = FieldComponent> + '_ {
        self.components.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_indexing_is_x_fastest() {
        let dims = Dimensions::new(4, 3, 2);
        assert_eq!(dims.to_linear(0, 0, 0), 0);
        assert_eq!(dims.to_linear(1, 0, 0), 1);
        assert_eq!(dims.to_linear(0, 1, 0), 4);
        assert_eq!(dims.to_linear(0, 0, 1), 12);
        assert_eq!(dims.to_linear(3, 2, 1), 23);
        assert_eq!(dims.total(), 24);
    }

    #[test]
    fn test_transverse_axes() {
        assert_eq!(
            AxialDirection::X.transverse(),
            (AxialDirection::Y, AxialDirection::Z)
        );
        assert_eq!(
            AxialDirection::Y.transverse(),
            (AxialDirection::Z, AxialDirection::X)
        );
        assert_eq!(
            AxialDirection::Z.transverse(),
            (AxialDirection::X, AxialDirection::Y)
        );
    }

    #[test]
    fn test_field3d_set_get_add() {
        let mut f: Field3D = Field3D::new(Dimensions::new(3, 3, 3));
        f.set(1, 2, 0, 2.5);
        f.add(1, 2, 0, 0.5);
        assert_eq!(f.get(1, 2, 0), 3.0);
        assert_eq!(f.at(CellCoordinate::new(1, 2, 0)), 3.0);
        f.set(0, 0, 2, -4.0);
        assert_eq!(f.as_slice()[f.dimensions().to_linear(0, 0, 2)], -4.0);
        f.clear();
        assert!(f.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_cell_range_iteration_order() {
        let range = CellRange::new(CellCoordinate::new(1, 0, 0), CellCoordinate::new(2, 1, 0)).unwrap();
        let cells: Vec<_> = range.cells().collect();
        assert_eq!(
            cells,
            vec![
                CellCoordinate::new(1, 0, 0),
                CellCoordinate::new(2, 0, 0),
                CellCoordinate::new(1, 1, 0),
                CellCoordinate::new(2, 1, 0),
            ]
        );
        assert_eq!(range.len(), 4);
        assert!(CellRange::new(CellCoordinate::new(2, 0, 0), CellCoordinate::new(1, 0, 0)).is_err());
    }

    #[test]
    fn test_field_components_vector_index() {
        let comps = FieldComponentsVector::from_ids(&[4, 1, 6]).unwrap();
        assert_eq!(comps.len(), 3);
        assert_eq!(comps.index(FieldComponent::Hx), Some(0));
        assert_eq!(comps.index(FieldComponent::Ex), Some(1));
        assert_eq!(comps.index(FieldComponent::Hz), Some(2));
        assert_eq!(comps.index(FieldComponent::Ey), None);

        assert!(FieldComponentsVector::from_ids(&[0]).is_err());
        assert!(FieldComponentsVector::from_ids(&[7]).is_err());
        assert!(FieldComponentsVector::from_ids(&[2, 2]).is_err());
    }

    #[test]
    fn test_component_ids_at_extremes_rejected() {
        assert!(FieldComponent::from_id(-1).is_err());
        assert!(FieldComponent::from_id(i32::MIN).is_err());
        assert!(FieldComponent::from_id(i32::MAX).is_err());
        assert_eq!(FieldComponent::from_id(6).unwrap(), FieldComponent::Hz);
    }

    #[test]
    fn test_xyz_vectors_per_axis() {
        let mut v = XYZVectors::default();
        v.set(AxialDirection::Y, vec![0.0, 0.5]);
        assert_eq!(v.get(AxialDirection::Y), &[0.0, 0.5]);
        assert!(v.get(AxialDirection::X).is_empty());
    }
}

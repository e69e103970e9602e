//! Grid definition.
//!
//! A [`Grid`] fixes the number of Yee cells along each axis, the cell
//! spacing and the interpolation family preferred along each axis. Field
//! arrays hold one more sample than there are cells on every axis.

use crate::arrays::{AxialDirection, Dimensions, XYZVectors};
use crate::matrices::InputMatrices;
use crate::{Error, Result};

/// Interpolation family to use when several schemes fit a stencil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterpolationMethod {
    /// 8-point band-limited schemes, falling back to cubic then linear.
    #[default]
    BandLimited,
    /// 4-point cubic schemes, falling back to linear.
    Cubic,
}

impl InterpolationMethod {
    /// Decode the host `intmethod` flag: 0 band-limited, 1 cubic.
    pub fn from_code(code: f64) -> Result<Self> {
        match code {
            c if c == 0.0 => Ok(Self::BandLimited),
            c if c == 1.0 => Ok(Self::Cubic),
            other => Err(Error::Config(format!("unknown interpolation method {other}"))),
        }
    }
}

/// Preferred interpolation method for each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreferredInterpolationMethods {
    /// Method along x
    pub x: InterpolationMethod,
    /// Method along y
    pub y: InterpolationMethod,
    /// Method along z
    pub z: InterpolationMethod,
}

impl PreferredInterpolationMethods {
    /// Same method on every axis.
    pub fn all(method: InterpolationMethod) -> Self {
        Self {
            x: method,
            y: method,
            z: method,
        }
    }

    /// Method along `axis`.
    pub fn along(&self, axis: AxialDirection) -> InterpolationMethod {
        match axis {
            AxialDirection::X => self.x,
            AxialDirection::Y => self.y,
            AxialDirection::Z => self.z,
        }
    }
}

/// Rectilinear Yee grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cells: Dimensions,
    spacing: [f64; 3],
    preferred: PreferredInterpolationMethods,
}

impl Grid {
    /// Create a grid of `cells` Yee cells with the given spacing per axis.
    pub fn new(cells: Dimensions, spacing: [f64; 3]) -> Result<Self> {
        if cells.nx == 0 || cells.ny == 0 || cells.nz == 0 {
            return Err(Error::Config(format!(
                "grid must have at least one cell along every axis, got {cells}"
            )));
        }
        if let Some(bad) = spacing.iter().find(|d| !(d.is_finite() && **d > 0.0)) {
            return Err(Error::Config(format!(
                "grid spacing must be positive and finite, got {bad}"
            )));
        }
        Ok(Self {
            cells,
            spacing,
            preferred: PreferredInterpolationMethods::default(),
        })
    }

    /// Create a grid with the same spacing on every axis.
    pub fn uniform(nx: usize, ny: usize, nz: usize, delta: f64) -> Result<Self> {
        Self::new(Dimensions::new(nx, ny, nz), [delta; 3])
    }

    /// Build the grid from the host matrices: `fdtdgrid` holds the cell
    /// counts `[I, J, K]`, `delta` one spacing or one per axis, and the
    /// optional `intmethod` the interpolation family for every axis.
    pub fn from_input_matrices(inputs: &InputMatrices<'_>) -> Result<Self> {
        let cells = inputs.require("fdtdgrid")?.as_indices("fdtdgrid")?;
        let [nx, ny, nz]: [usize; 3] = cells.try_into().map_err(|v: Vec<usize>| {
            Error::DimensionMismatch {
                what: "fdtdgrid cell counts".into(),
                expected: 3,
                actual: v.len(),
            }
        })?;
        let spacing = match inputs.require("delta")?.data() {
            [d] => [*d; 3],
            [dx, dy, dz] => [*dx, *dy, *dz],
            other => {
                return Err(Error::DimensionMismatch {
                    what: "delta".into(),
                    expected: 3,
                    actual: other.len(),
                })
            }
        };
        let mut grid = Self::new(Dimensions::new(nx, ny, nz), spacing)?;
        if let Some(code) = inputs.get("intmethod") {
            let method = InterpolationMethod::from_code(code.scalar("intmethod")?)?;
            grid.set_preferred_interpolation_methods(PreferredInterpolationMethods::all(method));
        }
        Ok(grid)
    }

    /// Record which interpolation family each axis should prefer.
    pub fn set_preferred_interpolation_methods(
        &mut self,
        methods: PreferredInterpolationMethods,
    ) -> &mut Self {
        self.preferred = methods;
        self
    }

    /// Preferred interpolation methods.
    pub fn preferred_interpolation_methods(&self) -> PreferredInterpolationMethods {
        self.preferred
    }

    /// Preferred interpolation method along `axis`.
    pub fn preferred_method(&self, axis: AxialDirection) -> InterpolationMethod {
        self.preferred.along(axis)
    }

    /// Cell counts (I, J, K).
    pub fn dimensions(&self) -> Dimensions {
        self.cells
    }

    /// Cell count along `axis`.
    pub fn cells_along(&self, axis: AxialDirection) -> usize {
        self.cells.along(axis)
    }

    /// Extents of every field array: one sample more than cells per axis.
    pub fn sample_dimensions(&self) -> Dimensions {
        Dimensions::new(self.cells.nx + 1, self.cells.ny + 1, self.cells.nz + 1)
    }

    /// Cell spacing along `axis`.
    pub fn spacing(&self, axis: AxialDirection) -> f64 {
        self.spacing[axis.index()]
    }

    /// Volume of one cell.
    pub fn cell_volume(&self) -> f64 {
        self.spacing.iter().product()
    }

    /// Coordinates of the cell centres along each axis, origin at sample 0.
    pub fn cell_centre_labels(&self) -> XYZVectors {
        let mut labels = XYZVectors::default();
        for axis in AxialDirection::ALL {
            let delta = self.spacing(axis);
            labels.set(
                axis,
                (0..self.cells_along(axis))
                    .map(|c| (c as f64 + 0.5) * delta)
                    .collect(),
            );
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_rejects_empty_axes() {
        assert!(Grid::uniform(0, 4, 4, 1.0).is_err());
        assert!(Grid::uniform(4, 4, 0, 1.0).is_err());
        assert!(Grid::new(Dimensions::new(2, 2, 2), [1.0, -1.0, 1.0]).is_err());
        assert!(Grid::new(Dimensions::new(2, 2, 2), [1.0, f64::NAN, 1.0]).is_err());
    }

    #[test]
    fn test_sample_dimensions() {
        let grid = Grid::uniform(4, 5, 6, 0.1).unwrap();
        assert_eq!(grid.dimensions(), Dimensions::new(4, 5, 6));
        assert_eq!(grid.sample_dimensions(), Dimensions::new(5, 6, 7));
        assert_eq!(grid.cells_along(AxialDirection::Y), 5);
        assert!((grid.cell_volume() - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn test_preferred_methods() {
        let mut grid = Grid::uniform(8, 8, 8, 1.0).unwrap();
        assert_eq!(
            grid.preferred_method(AxialDirection::Z),
            InterpolationMethod::BandLimited
        );
        grid.set_preferred_interpolation_methods(PreferredInterpolationMethods {
            z: InterpolationMethod::Cubic,
            ..Default::default()
        });
        assert_eq!(
            grid.preferred_method(AxialDirection::Z),
            InterpolationMethod::Cubic
        );
        assert_eq!(
            grid.preferred_method(AxialDirection::X),
            InterpolationMethod::BandLimited
        );
    }

    #[test]
    fn test_cell_centre_labels() {
        let grid = Grid::new(Dimensions::new(2, 1, 3), [1.0, 2.0, 0.5]).unwrap();
        let labels = grid.cell_centre_labels();
        assert_eq!(labels.x, vec![0.5, 1.5]);
        assert_eq!(labels.y, vec![1.0]);
        assert_eq!(labels.z, vec![0.25, 0.75, 1.25]);
    }

    #[test]
    fn test_grid_from_input_matrices() {
        use crate::matrices::MatrixStore;

        let mut store = MatrixStore::new();
        store.insert("fdtdgrid", vec![4.0, 5.0, 6.0], &[1, 3]).unwrap();
        store.insert("delta", vec![0.1, 0.2, 0.3], &[1, 3]).unwrap();
        store.insert_scalar("intmethod", 1.0);
        let mut inputs = InputMatrices::new();
        inputs.set_from_input_file(&store).unwrap();

        let grid = Grid::from_input_matrices(&inputs).unwrap();
        assert_eq!(grid.dimensions(), Dimensions::new(4, 5, 6));
        assert_eq!(grid.spacing(AxialDirection::Z), 0.3);
        assert_eq!(
            grid.preferred_interpolation_methods(),
            PreferredInterpolationMethods::all(InterpolationMethod::Cubic)
        );
        assert!(InterpolationMethod::from_code(2.0).is_err());
    }
}

//! Adapters to host-owned numerical arrays.
//!
//! The host (a numerical-array environment or file loader) owns every
//! input and output buffer. [`InputMatrices`] and [`OutputMatrices`] only
//! hold borrowed handles, addressed by index into a fixed name list or by
//! name. Arrays are column-major: the first index varies fastest, which
//! matches the x-fastest layout of the field arrays.

use crate::{Error, Result};
use num_complex::Complex64;
use std::collections::HashMap;

/// Names of the matrices an input file may supply, in index order.
pub const INPUT_MATRIX_NAMES: [&str; 21] = [
    "fdtdgrid",
    "delta",
    "omega_an",
    "Nt",
    "dt",
    "sourcemode",
    "exphasorsvolume",
    "exphasorssurface",
    "intphasorssurface",
    "phasorsurface",
    "phasorinc",
    "dimension",
    "f_ex_vec",
    "intmethod",
    "Np",
    "fieldsample_i",
    "fieldsample_j",
    "fieldsample_k",
    "fieldsample_n",
    "campssample_vertices",
    "campssample_components",
];

/// Matrices that come from the grid file when one is given.
pub const GRID_FILE_MATRIX_NAMES: [&str; 1] = ["fdtdgrid"];

/// Names of the matrices a run can write, in index order.
pub const OUTPUT_MATRIX_NAMES: [&str; 24] = [
    "Ex_out",
    "Ey_out",
    "Ez_out",
    "Hx_out",
    "Hy_out",
    "Hz_out",
    "x_out",
    "y_out",
    "z_out",
    "Ex_i",
    "Ey_i",
    "Ez_i",
    "Hx_i",
    "Hy_i",
    "Hz_i",
    "x_i",
    "y_i",
    "z_i",
    "vertices",
    "camplitudes",
    "maxresfield",
    "Id",
    "fieldsample",
    "campssample",
];

fn check_shape(what: &str, len: usize, shape: &[usize]) -> Result<()> {
    let expected: usize = shape.iter().product();
    if expected != len {
        return Err(Error::DimensionMismatch {
            what: what.to_string(),
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// Read-only view of a host array.
#[derive(Debug, Clone)]
pub struct HostArray<'a> {
    re: &'a [f64],
    im: Option<&'a [f64]>,
    shape: Vec<usize>,
}

impl<'a> HostArray<'a> {
    /// Borrow real data of the given shape.
    pub fn new(re: &'a [f64], shape: &[usize]) -> Result<Self> {
        check_shape("host array", re.len(), shape)?;
        Ok(Self {
            re,
            im: None,
            shape: shape.to_vec(),
        })
    }

    /// Borrow complex data stored as separate real and imaginary parts.
    pub fn complex(re: &'a [f64], im: &'a [f64], shape: &[usize]) -> Result<Self> {
        check_shape("host array", re.len(), shape)?;
        check_shape("host array imaginary part", im.len(), shape)?;
        Ok(Self {
            re,
            im: Some(im),
            shape: shape.to_vec(),
        })
    }

    /// Array extents.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.re.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.re.is_empty()
    }

    /// Real parts, column-major.
    pub fn data(&self) -> &'a [f64] {
        self.re
    }

    /// Imaginary parts, if the array is complex.
    pub fn imag(&self) -> Option<&'a [f64]> {
        self.im
    }

    /// Element at a column-major multi-index.
    pub fn get(&self, index: &[usize]) -> f64 {
        assert_eq!(index.len(), self.shape.len(), "index rank mismatch");
        let mut flat = 0;
        for (&i, &n) in index.iter().zip(&self.shape).rev() {
            assert!(i < n, "index {i} out of range for extent {n}");
            flat = flat * n + i;
        }
        self.re[flat]
    }

    /// The single element of a 1-element array.
    pub fn scalar(&self, name: &str) -> Result<f64> {
        match self.re {
            [v] => Ok(*v),
            _ => Err(Error::DimensionMismatch {
                what: format!("scalar '{name}'"),
                expected: 1,
                actual: self.re.len(),
            }),
        }
    }

    /// Elements as non-negative integer indices.
    pub fn as_indices(&self, name: &str) -> Result<Vec<usize>> {
        self.re
            .iter()
            .map(|&v| {
                if v >= 0.0 && v.fract() == 0.0 {
                    Ok(v as usize)
                } else {
                    Err(Error::Config(format!("'{name}' holds {v}, expected an index")))
                }
            })
            .collect()
    }
}

/// Writable view of a host array.
#[derive(Debug)]
pub struct HostArrayMut<'a> {
    re: &'a mut [f64],
    im: Option<&'a mut [f64]>,
    shape: Vec<usize>,
}

impl<'a> HostArrayMut<'a> {
    /// Borrow a real output buffer.
    pub fn new(re: &'a mut [f64], shape: &[usize]) -> Result<Self> {
        check_shape("output array", re.len(), shape)?;
        Ok(Self {
            re,
            im: None,
            shape: shape.to_vec(),
        })
    }

    /// Borrow a complex output buffer with separate real and imaginary parts.
    pub fn complex(re: &'a mut [f64], im: &'a mut [f64], shape: &[usize]) -> Result<Self> {
        check_shape("output array", re.len(), shape)?;
        check_shape("output array imaginary part", im.len(), shape)?;
        Ok(Self {
            re,
            im: Some(im),
            shape: shape.to_vec(),
        })
    }

    /// Array extents.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Copy real values into the buffer.
    pub fn write_real(&mut self, name: &str, values: &[f64]) -> Result<()> {
        check_shape(name, values.len(), &self.shape)?;
        self.re.copy_from_slice(values);
        Ok(())
    }

    /// Copy complex values into the buffer.
    ///
    /// Fails if the buffer has no imaginary part.
    pub fn write_complex(&mut self, name: &str, values: &[Complex64]) -> Result<()> {
        check_shape(name, values.len(), &self.shape)?;
        let im = self
            .im
            .as_deref_mut()
            .ok_or_else(|| Error::Config(format!("output '{name}' is not complex")))?;
        for ((r, i), v) in self.re.iter_mut().zip(im.iter_mut()).zip(values) {
            *r = v.re;
            *i = v.im;
        }
        Ok(())
    }
}

/// Anything that can hand out named host arrays, e.g. a loaded input file.
pub trait MatrixSource {
    /// The array called `name`, if present.
    fn matrix(&self, name: &str) -> Option<HostArray<'_>>;
}

/// Anything holding finalised results that can be written to output buffers.
pub trait OutputSource {
    /// Write into whichever buffers of `outputs` are set.
    fn write_outputs(&self, outputs: &mut OutputMatrices<'_>) -> Result<()>;
}

/// Owned named arrays, as read from an input file.
#[derive(Debug, Clone, Default)]
pub struct MatrixStore {
    arrays: HashMap<String, (Vec<f64>, Vec<usize>)>,
}

impl MatrixStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an array.
    pub fn insert(&mut self, name: &str, data: Vec<f64>, shape: &[usize]) -> Result<&mut Self> {
        check_shape(name, data.len(), shape)?;
        self.arrays.insert(name.to_string(), (data, shape.to_vec()));
        Ok(self)
    }

    /// Add or replace a 1×1 array.
    pub fn insert_scalar(&mut self, name: &str, value: f64) -> &mut Self {
        self.arrays.insert(name.to_string(), (vec![value], vec![1, 1]));
        self
    }
}

impl MatrixSource for MatrixStore {
    fn matrix(&self, name: &str) -> Option<HostArray<'_>> {
        self.arrays.get(name).map(|(data, shape)| HostArray {
            re: data,
            im: None,
            shape: shape.clone(),
        })
    }
}

fn index_of(names: &[&str], name: &str) -> Result<usize> {
    names
        .iter()
        .position(|&n| n == name)
        .ok_or_else(|| Error::UnknownMatrix(name.to_string()))
}

/// Borrowed input arrays, one slot per entry of [`INPUT_MATRIX_NAMES`].
#[derive(Debug)]
pub struct InputMatrices<'a> {
    slots: Vec<Option<HostArray<'a>>>,
}

impl<'a> InputMatrices<'a> {
    /// All slots empty.
    pub fn new() -> Self {
        Self {
            slots: vec![None; INPUT_MATRIX_NAMES.len()],
        }
    }

    /// Set slot `index`.
    pub fn set_matrix_pointer(&mut self, index: usize, array: HostArray<'a>) -> Result<()> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| Error::UnknownMatrix(format!("input #{index}")))?;
        *slot = Some(array);
        Ok(())
    }

    /// Set the slot called `name`.
    pub fn set_matrix_pointer_by_name(&mut self, name: &str, array: HostArray<'a>) -> Result<()> {
        let index = index_of(&INPUT_MATRIX_NAMES, name)?;
        self.set_matrix_pointer(index, array)
    }

    /// Fill every slot present in `input`.
    pub fn set_from_input_file<S: MatrixSource>(&mut self, input: &'a S) -> Result<()> {
        for (index, name) in INPUT_MATRIX_NAMES.iter().enumerate() {
            if let Some(array) = input.matrix(name) {
                self.set_matrix_pointer(index, array)?;
            }
        }
        Ok(())
    }

    /// Fill the grid slots from `grid` and every other slot from `input`.
    ///
    /// The grid file must provide every grid matrix.
    pub fn set_from_input_file_with_grid<S: MatrixSource, G: MatrixSource>(
        &mut self,
        input: &'a S,
        grid: &'a G,
    ) -> Result<()> {
        for (index, name) in INPUT_MATRIX_NAMES.iter().enumerate() {
            let array = if GRID_FILE_MATRIX_NAMES.contains(name) {
                Some(
                    grid.matrix(name)
                        .ok_or_else(|| Error::MissingMatrix(name.to_string()))?,
                )
            } else {
                input.matrix(name)
            };
            if let Some(array) = array {
                self.set_matrix_pointer(index, array)?;
            }
        }
        Ok(())
    }

    /// The array called `name`, if supplied.
    pub fn get(&self, name: &str) -> Option<&HostArray<'a>> {
        let index = index_of(&INPUT_MATRIX_NAMES, name).ok()?;
        self.slots[index].as_ref()
    }

    /// The array called `name`, or a [`Error::MissingMatrix`].
    pub fn require(&self, name: &str) -> Result<&HostArray<'a>> {
        self.get(name)
            .ok_or_else(|| Error::MissingMatrix(name.to_string()))
    }
}

impl Default for InputMatrices<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed output buffers, one slot per entry of [`OUTPUT_MATRIX_NAMES`].
#[derive(Debug)]
pub struct OutputMatrices<'a> {
    slots: Vec<Option<HostArrayMut<'a>>>,
}

impl<'a> OutputMatrices<'a> {
    /// All slots empty.
    pub fn new() -> Self {
        Self {
            slots: (0..OUTPUT_MATRIX_NAMES.len()).map(|_| None).collect(),
        }
    }

    /// Set slot `index`.
    pub fn set_matrix_pointer(&mut self, index: usize, array: HostArrayMut<'a>) -> Result<()> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| Error::UnknownMatrix(format!("output #{index}")))?;
        *slot = Some(array);
        Ok(())
    }

    /// Set the slot called `name`.
    pub fn set_matrix_pointer_by_name(&mut self, name: &str, array: HostArrayMut<'a>) -> Result<()> {
        let index = index_of(&OUTPUT_MATRIX_NAMES, name)?;
        self.set_matrix_pointer(index, array)
    }

    /// Whether a buffer was supplied for `name`.
    pub fn is_set(&self, name: &str) -> bool {
        self.slot(name).map_or(false, |s| s.is_some())
    }

    /// Write real values to `name` if a buffer was supplied for it.
    ///
    /// Returns whether anything was written.
    pub fn write_real(&mut self, name: &str, values: &[f64]) -> Result<bool> {
        match self.slot_mut(name)? {
            Some(array) => array.write_real(name, values).map(|_| true),
            None => Ok(false),
        }
    }

    /// Write complex values to `name` if a buffer was supplied for it.
    pub fn write_complex(&mut self, name: &str, values: &[Complex64]) -> Result<bool> {
        match self.slot_mut(name)? {
            Some(array) => array.write_complex(name, values).map(|_| true),
            None => Ok(false),
        }
    }

    /// Hand the finalised results of `source` to the host buffers.
    pub fn save_outputs<S: OutputSource + ?Sized>(&mut self, source: &S) -> Result<()> {
        source.write_outputs(self)
    }

    fn slot(&self, name: &str) -> Result<&Option<HostArrayMut<'a>>> {
        let index = index_of(&OUTPUT_MATRIX_NAMES, name)?;
        Ok(&self.slots[index])
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut Option<HostArrayMut<'a>>> {
        let index = index_of(&OUTPUT_MATRIX_NAMES, name)?;
        Ok(&mut self.slots[index])
    }
}

impl Default for OutputMatrices<'_> {
    fn default() -> Self {
        Self::new()
    }
}

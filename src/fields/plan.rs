//! Spectral transform plans for one x-y plane of a field component.

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Forward 2-D FFT plan over an `nx × ny` plane stored x-fastest.
///
/// The plan owns its column scratch buffer, so executing it needs
/// exclusive access.
pub struct PlanePlan {
    nx: usize,
    ny: usize,
    fft_x: Arc<dyn Fft<f64>>,
    fft_y: Arc<dyn Fft<f64>>,
    col_buf: Vec<Complex64>,
}

impl PlanePlan {
    /// Plan transforms for an `nx × ny` plane.
    pub fn new(nx: usize, ny: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft_x = planner.plan_fft_forward(nx);
        let fft_y = planner.plan_fft_forward(ny);
        Self {
            nx,
            ny,
            fft_x,
            fft_y,
            col_buf: vec![Complex64::new(0.0, 0.0); ny],
        }
    }

    /// Plane extents `(nx, ny)` the plan was made for.
    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Transform `data` in place.
    ///
    /// Panics if `data` does not hold exactly one plane.
    pub fn execute(&mut self, data: &mut [Complex64]) {
        assert_eq!(
            data.len(),
            self.nx * self.ny,
            "plane of {} samples does not match a {}x{} plan",
            data.len(),
            self.nx,
            self.ny
        );

        for row in data.chunks_exact_mut(self.nx) {
            self.fft_x.process(row);
        }

        for x in 0..self.nx {
            for y in 0..self.ny {
                self.col_buf[y] = data[y * self.nx + x];
            }
            self.fft_y.process(&mut self.col_buf);
            for y in 0..self.ny {
                data[y * self.nx + x] = self.col_buf[y];
            }
        }
    }
}

impl fmt::Debug for PlanePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanePlan")
            .field("nx", &self.nx)
            .field("ny", &self.ny)
            .finish()
    }
}

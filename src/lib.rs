//! Split-field FDTD phasor extraction on a Yee grid.
//!
//! The crate holds the field containers of a finite-difference
//! time-domain solver and everything that turns a time-domain run into
//! steady-state complex amplitudes:
//!
//! - [`fields`]: split and consolidated field containers, interpolation to
//!   cell centres and the per-component spectral plans
//! - [`interpolation`]: the ranked stencil schemes and their boundary
//!   fallback
//! - [`phasors`]: running-DFT accumulation on volumes, surfaces, vertex
//!   lists and detector planes
//! - [`matrices`]: borrowed views of host-owned input and output arrays
//! - [`fdtd`]: run parameters and the simulation driver
//!
//! The leapfrog update itself is supplied through [`fdtd::FieldUpdater`].
//!
//! ```no_run
//! use yee_phasors::arrays::{AxialDirection, CellCoordinate};
//! use yee_phasors::fdtd::{Simulation, SimulationParameters, VacuumUpdater};
//! use yee_phasors::geometry::Grid;
//!
//! # fn main() -> yee_phasors::Result<()> {
//! let grid = Grid::uniform(20, 20, 20, 1.0)?;
//! let mut source = VacuumUpdater::new(CellCoordinate::new(10, 10, 10), AxialDirection::Z, 0.5);
//! source.set_normalised_units().set_ramp_time(20.0);
//!
//! let params = SimulationParameters::new(0.5, 0.5, 4000);
//! let mut sim = Simulation::new(grid, params, source);
//! let stats = sim.run()?;
//! println!("{} updates, {} windows", stats.timesteps, stats.windows);
//! # Ok(())
//! # }
//! ```

pub mod arrays;
pub mod constants;
pub mod error;
pub mod fdtd;
pub mod fields;
pub mod geometry;
pub mod interpolation;
pub mod matrices;
pub mod phasors;

pub use error::{Error, Result};

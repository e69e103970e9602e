//! Time stepping and the simulation driver.

mod params;
mod simulation;
mod updater;
mod vacuum;

pub use params::{SimulationParameters, SourceMode, PERIODS_PER_WINDOW};
pub use simulation::{Simulation, SimulationState, SimulationStats};
pub use updater::FieldUpdater;
pub use vacuum::VacuumUpdater;

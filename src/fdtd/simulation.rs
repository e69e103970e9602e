//! High-level simulation control.
//!
//! The [`Simulation`] owns the split fields, the phasor volumes and every
//! extractor, and drives a [`FieldUpdater`] through the run. Each update
//! strictly completes H, then E, then phasor accumulation before the next
//! begins.

use super::{FieldUpdater, SimulationParameters, SourceMode};
use crate::arrays::{AxialDirection, CellCoordinate, CellRange, FieldComponent};
use crate::fields::{Field, FieldKind, SplitField};
use crate::geometry::Grid;
use crate::matrices::{InputMatrices, OutputMatrices, OutputSource};
use crate::phasors::{
    ComplexAmplitudeSample, DetectorPlanePhasors, FieldSample, PhasorNorms, SurfacePhasors,
    VertexPhasors,
};
use crate::{Error, Result};

use indicatif::{ProgressBar, ProgressStyle};
use instant::Instant;
use log::{debug, info};
use num_complex::Complex64;

/// Simulation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// Initial state, not yet set up
    Created,
    /// Set up and ready to run
    Ready,
    /// Currently running
    Running,
    /// Ran every configured update
    Finished,
    /// Stopped early because the steady-state phasors converged
    Stopped,
}

/// Statistics from a simulation run
#[derive(Debug, Clone)]
pub struct SimulationStats {
    /// Updates executed
    pub timesteps: u64,
    /// Simulated time
    pub sim_time: f64,
    /// Wall clock time (seconds)
    pub wall_time: f64,
    /// Completed steady-state DFT windows
    pub windows: usize,
    /// Relative change of the E phasors over the last compared window
    pub last_window_change: Option<f64>,
    /// Average speed (million cell updates per second)
    pub speed_mcells_per_sec: f64,
}

/// Main simulation controller.
pub struct Simulation<U: FieldUpdater> {
    grid: Grid,
    params: SimulationParameters,
    updater: U,
    e_split: SplitField,
    h_split: SplitField,
    e: Field,
    h: Field,
    /// E phasors of the previous steady-state window
    e_copy: Field,
    norms: PhasorNorms,
    surface: Option<SurfacePhasors>,
    vertices: Option<VertexPhasors>,
    field_sample: Option<FieldSample>,
    detector: Option<DetectorPlanePhasors>,
    /// Samples per DFT window
    window: usize,
    /// Updates between samples
    interval: u64,
    max_resulting_field: f64,
    state: SimulationState,
    verbose: u8,
    show_progress: bool,
}

impl<U: FieldUpdater> Simulation<U> {
    /// Create a new simulation on `grid`.
    pub fn new(grid: Grid, params: SimulationParameters, updater: U) -> Self {
        Self {
            grid,
            params,
            updater,
            e_split: SplitField::electric(),
            h_split: SplitField::magnetic(),
            e: Field::electric(),
            h: Field::magnetic(),
            e_copy: Field::electric(),
            norms: PhasorNorms::new(&[]),
            surface: None,
            vertices: None,
            field_sample: None,
            detector: None,
            window: 0,
            interval: 1,
            max_resulting_field: 0.0,
            state: SimulationState::Created,
            verbose: 1,
            show_progress: true,
        }
    }

    /// Build grid, parameters and extractors from the host matrices.
    pub fn from_input_matrices(inputs: &InputMatrices<'_>, updater: U) -> Result<Self> {
        let grid = Grid::from_input_matrices(inputs)?;
        let params = SimulationParameters::from_input_matrices(inputs)?;
        let dimension = params.dimension;
        let extract_surface = params.extract_surface;
        let mut sim = Self::new(grid, params, updater);

        if extract_surface {
            let increments: [usize; 3] = match inputs.get("phasorinc") {
                Some(inc) => {
                    let inc = inc.as_indices("phasorinc")?;
                    inc.try_into().map_err(|v: Vec<usize>| Error::DimensionMismatch {
                        what: "phasorinc".into(),
                        expected: 3,
                        actual: v.len(),
                    })?
                }
                None => [1, 1, 1],
            };
            let mut surface = SurfacePhasors::new();
            surface.set_from_matlab_array(
                inputs.require("phasorsurface")?,
                increments,
                &sim.grid,
                dimension,
            )?;
            sim.set_surface_phasors(surface);
        }

        if let (Some(vertices), Some(components)) = (
            inputs.get("campssample_vertices"),
            inputs.get("campssample_components"),
        ) {
            let sample = ComplexAmplitudeSample::from_host(vertices, components)?;
            if sample.all_vectors_are_non_empty() {
                let phasors = VertexPhasors::new(sample, &sim.grid, dimension)?;
                sim.set_vertex_phasors(phasors);
            }
        }

        if let (Some(i), Some(j), Some(k), Some(n)) = (
            inputs.get("fieldsample_i"),
            inputs.get("fieldsample_j"),
            inputs.get("fieldsample_k"),
            inputs.get("fieldsample_n"),
        ) {
            let sample = FieldSample::from_host(i, j, k, n)?;
            if sample.all_vectors_are_non_empty() {
                sim.set_field_sample(sample);
            }
        }

        Ok(sim)
    }

    /// Accumulate phasors on a surface; enables surface extraction.
    pub fn set_surface_phasors(&mut self, surface: SurfacePhasors) -> &mut Self {
        self.params.extract_surface = true;
        self.surface = Some(surface);
        self
    }

    /// Accumulate phasors at a list of vertices.
    pub fn set_vertex_phasors(&mut self, vertices: VertexPhasors) -> &mut Self {
        self.vertices = Some(vertices);
        self
    }

    /// Accumulate moments of |E| on a set of points.
    pub fn set_field_sample(&mut self, sample: FieldSample) -> &mut Self {
        self.field_sample = Some(sample);
        self
    }

    /// Accumulate the spatial spectrum of a detector layer.
    pub fn set_detector(&mut self, detector: DetectorPlanePhasors) -> &mut Self {
        self.detector = Some(detector);
        self
    }

    /// Set verbosity level (0=quiet, 1=normal, 2=verbose).
    pub fn set_verbose(&mut self, level: u8) -> &mut Self {
        self.verbose = level;
        self
    }

    /// Enable/disable progress bar.
    pub fn set_show_progress(&mut self, show: bool) -> &mut Self {
        self.show_progress = show;
        self
    }

    /// Allocate fields and accumulators and fix the sampling schedule.
    pub fn setup(&mut self) -> Result<()> {
        if self.state != SimulationState::Created {
            return Err(Error::Config("Simulation already set up".into()));
        }
        self.params.validate()?;

        match self.params.source_mode {
            SourceMode::SteadyState => {
                self.window = self.params.adjust_for_steady_state()?;
                self.interval = 1;
            }
            SourceMode::Pulsed => {
                let np = self.params.pulsed_interval();
                self.window = self.params.pulsed_samples(np);
                self.interval = np as u64;
            }
        }

        if self.params.extract_surface && self.surface.is_none() {
            return Err(Error::Config(
                "surface extraction requested without a phasor surface".into(),
            ));
        }

        let omegas = self.params.omegas();
        if let Some(detector) = &self.detector {
            if detector.omegas().len() != omegas.len() {
                return Err(Error::DimensionMismatch {
                    what: "detector frequencies".into(),
                    expected: omegas.len(),
                    actual: detector.omegas().len(),
                });
            }
        }

        if self.verbose >= 1 {
            let dims = self.grid.dimensions();
            info!(
                "FDTD simulation size: {}x{}x{} -> {} cells",
                dims.nx,
                dims.ny,
                dims.nz,
                dims.total()
            );
            info!(
                "Timestep: {:.6e}, Nt = {}, {} samples per DFT window, sampling every {} updates",
                self.params.dt, self.params.nt, self.window, self.interval
            );
        }

        self.e_split.allocate(&self.grid);
        self.h_split.allocate(&self.grid);
        if self.detector.is_some() {
            self.e_split.initialise_fftw_plan();
        }
        if self.params.extract_volume {
            self.e.allocate(&self.grid);
            self.h.allocate(&self.grid);
            self.e_copy.allocate(&self.grid);
        }
        self.norms = PhasorNorms::new(&omegas);
        if let Some(surface) = self.surface.as_mut() {
            surface.setup_complex_amplitude_arrays(&omegas);
        }
        if let Some(vertices) = self.vertices.as_mut() {
            vertices.setup_complex_amplitude_arrays(&omegas);
        }
        if let Some(sample) = self.field_sample.as_mut() {
            sample.check_within(&self.grid)?;
            sample.set_dimension(self.params.dimension);
        }

        self.updater.prepare(&self.grid, self.params.dt)?;
        self.e_split.begin_accumulation();
        self.h_split.begin_accumulation();
        self.state = SimulationState::Ready;
        Ok(())
    }

    /// Run every update, or until the steady-state phasors converge.
    pub fn run(&mut self) -> Result<SimulationStats> {
        if self.state == SimulationState::Created {
            self.setup()?;
        }
        if self.state != SimulationState::Ready {
            return Err(Error::Config("Simulation not ready to run".into()));
        }

        self.state = SimulationState::Running;
        let dt = self.params.dt;
        let nt = self.params.nt;
        let steady = self.params.source_mode == SourceMode::SteadyState;

        let progress = if self.show_progress {
            let pb = ProgressBar::new(nt);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec})")
                    .map_err(|e| Error::Config(format!("progress bar template: {e}")))?
                    .progress_chars("##-"),
            );
            Some(pb)
        } else {
            None
        };

        let start_time = Instant::now();
        let mut timesteps_run = 0u64;
        let mut windows = 0usize;
        let mut last_window_change = None;
        let mut converged = false;

        for n in 0..nt {
            self.updater
                .update_h(&mut self.h_split, &self.e_split, n, dt)?;
            self.updater
                .update_e(&mut self.e_split, &self.h_split, n, dt)?;
            timesteps_run = n + 1;

            if n % self.interval == 0 {
                self.accumulate(n);
            }
            if let Some(sample) = self.field_sample.as_mut() {
                sample.accumulate(&self.e_split, nt);
            }

            if steady && (n + 1) % self.window as u64 == 0 {
                windows += 1;
                if let Some(change) = self.window_change(windows) {
                    debug!("Window {windows}: phasors changed by {change:.3e}");
                    last_window_change = Some(change);
                    if change < self.params.convergence_tol {
                        converged = true;
                        break;
                    }
                }
                if n + 1 < nt {
                    self.restart_window();
                }
            }

            if let Some(ref pb) = progress {
                pb.set_position(timesteps_run);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Simulation complete");
        }

        self.finalise()?;
        self.state = if converged {
            SimulationState::Stopped
        } else {
            SimulationState::Finished
        };

        let wall_time = start_time.elapsed().as_secs_f64();
        let num_cells = self.grid.dimensions().total();
        let stats = SimulationStats {
            timesteps: timesteps_run,
            sim_time: timesteps_run as f64 * dt,
            wall_time,
            windows,
            last_window_change,
            speed_mcells_per_sec: (timesteps_run as f64 * num_cells as f64)
                / wall_time.max(f64::MIN_POSITIVE)
                / 1e6,
        };

        if self.verbose >= 1 {
            if converged {
                info!(
                    "Phasors converged after {} windows ({} timesteps)",
                    stats.windows, stats.timesteps
                );
            }
            info!(
                "Completed {} timesteps in {:.2}s ({:.2} MC/s)",
                stats.timesteps, stats.wall_time, stats.speed_mcells_per_sec
            );
        }

        Ok(stats)
    }

    fn accumulate(&mut self, n: u64) {
        let dt = self.params.dt;
        let samples = self.window;
        let source_e = self.updater.excitation((n as f64 + 1.0) * dt);
        let source_h = self.updater.excitation((n as f64 + 0.5) * dt);

        if self.params.extract_volume {
            let omega = self.params.omega_an;
            self.e
                .set_phasors(&self.e_split, n, omega, dt, samples, source_e);
            self.h
                .set_phasors(&self.h_split, n, omega, dt, samples, source_h);
        }
        self.norms.accumulate(n, dt, samples, source_e, source_h);
        if let Some(surface) = self.surface.as_mut() {
            surface.extract_phasors_surface(
                &self.e_split,
                &self.h_split,
                n,
                dt,
                samples,
                self.params.interpolate_surface,
            );
        }
        if let Some(vertices) = self.vertices.as_mut() {
            vertices.extract_phasors_vertices(&self.e_split, &self.h_split, n, dt, samples);
        }
        if let Some(detector) = self.detector.as_mut() {
            detector.accumulate(&mut self.e_split, n, dt, samples);
        }
    }

    /// Relative change of the E phasors against the previous window, once
    /// there is a previous window to compare with.
    fn window_change(&self, windows: usize) -> Option<f64> {
        if !self.params.extract_volume || windows < 2 {
            return None;
        }
        Some(self.e.max_pointwise_difference_over_max_element(&self.e_copy))
    }

    fn restart_window(&mut self) {
        if self.params.extract_volume {
            self.e_copy.set_values_from(&self.e);
            self.e.zero();
            self.h.zero();
        }
        self.norms.zero();
        if let Some(surface) = self.surface.as_mut() {
            surface.zero();
        }
        if let Some(vertices) = self.vertices.as_mut() {
            vertices.zero();
        }
        if let Some(detector) = self.detector.as_mut() {
            detector.zero();
        }
    }

    fn finalise(&mut self) -> Result<()> {
        self.max_resulting_field = self
            .e_split
            .largest_field_value()
            .max(self.h_split.largest_field_value());
        if self.params.extract_volume {
            self.e.normalise_volume()?;
            self.h.normalise_volume()?;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.normalise(&self.norms)?;
        }
        if let Some(vertices) = self.vertices.as_mut() {
            vertices.normalise(&self.norms)?;
        }
        if let Some(detector) = self.detector.as_mut() {
            detector.normalise(&self.norms)?;
        }
        self.e_split.finalise();
        self.h_split.finalise();
        Ok(())
    }

    /// Write every finalised result into whichever output buffers are set.
    ///
    /// Panics if the run has not finished.
    pub fn save_outputs(&self, outputs: &mut OutputMatrices<'_>) -> Result<()> {
        assert!(
            matches!(
                self.state,
                SimulationState::Finished | SimulationState::Stopped
            ),
            "save_outputs called on a {:?} simulation",
            self.state
        );

        if self.params.extract_volume {
            for (field, names) in [
                (&self.e, ["Ex_out", "Ey_out", "Ez_out"]),
                (&self.h, ["Hx_out", "Hy_out", "Hz_out"]),
            ] {
                for (axis, name) in AxialDirection::ALL.into_iter().zip(names) {
                    outputs.write_complex(name, field.values().component(axis).as_slice())?;
                }
            }
            for (field, names) in [
                (&self.e, ["Ex_i", "Ey_i", "Ez_i"]),
                (&self.h, ["Hx_i", "Hy_i", "Hz_i"]),
            ] {
                if names.iter().any(|n| outputs.is_set(n)) {
                    let [x, y, z] = self.interpolated_volume(field)?;
                    outputs.write_complex(names[0], &x)?;
                    outputs.write_complex(names[1], &y)?;
                    outputs.write_complex(names[2], &z)?;
                }
            }
        }

        let centres = self.grid.cell_centre_labels();
        for (axis, (sample_name, centre_name)) in AxialDirection::ALL
            .into_iter()
            .zip([("x_out", "x_i"), ("y_out", "y_i"), ("z_out", "z_i")])
        {
            let delta = self.grid.spacing(axis);
            let samples: Vec<f64> = (0..=self.grid.cells_along(axis))
                .map(|s| s as f64 * delta)
                .collect();
            outputs.write_real(sample_name, &samples)?;
            outputs.write_real(centre_name, centres.get(axis))?;
        }

        if let Some(surface) = &self.surface {
            surface.save_outputs(outputs, &self.grid)?;
        }
        if let Some(vertices) = &self.vertices {
            vertices.save_outputs(outputs)?;
        }
        if let Some(sample) = &self.field_sample {
            sample.save_outputs(outputs)?;
        }
        if let Some(detector) = &self.detector {
            detector.save_outputs(outputs)?;
        }
        outputs.write_real("maxresfield", &[self.max_resulting_field])?;
        Ok(())
    }

    fn interpolated_volume(&self, field: &Field) -> Result<[Vec<Complex64>; 3]> {
        let dims = self.grid.dimensions();
        let range = CellRange::new(
            CellCoordinate::new(0, 0, 0),
            CellCoordinate::new(dims.nx - 1, dims.ny - 1, dims.nz - 1),
        )?;
        let mut out = [
            Vec::with_capacity(range.len()),
            Vec::with_capacity(range.len()),
            Vec::with_capacity(range.len()),
        ];
        for (_, vector) in field.interpolate_over_range(range, self.params.dimension) {
            for axis in AxialDirection::ALL {
                out[axis.index()].push(vector.along(axis));
            }
        }
        Ok(out)
    }

    /// Finalised phasor of `component` at sample `cell`.
    pub fn phasor(&self, component: FieldComponent, cell: CellCoordinate) -> Complex64 {
        let field = if component.is_electric() { &self.e } else { &self.h };
        field.value(component.axis(), cell)
    }

    /// Grid of the run.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Parameters, including any steady-state adjustment.
    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Time-domain split field of `kind` (E or H).
    pub fn split_field(&self, kind: FieldKind) -> &SplitField {
        match kind {
            FieldKind::Magnetic => &self.h_split,
            _ => &self.e_split,
        }
    }

    /// Electric phasor volume.
    pub fn electric_phasors(&self) -> &Field {
        &self.e
    }

    /// Magnetic phasor volume.
    pub fn magnetic_phasors(&self) -> &Field {
        &self.h
    }

    /// Excitation norms of the last window.
    pub fn norms(&self) -> &PhasorNorms {
        &self.norms
    }

    /// Surface phasors, if extracted.
    pub fn surface_phasors(&self) -> Option<&SurfacePhasors> {
        self.surface.as_ref()
    }

    /// Vertex phasors, if extracted.
    pub fn vertex_phasors(&self) -> Option<&VertexPhasors> {
        self.vertices.as_ref()
    }

    /// Field moments, if sampled.
    pub fn field_sample(&self) -> Option<&FieldSample> {
        self.field_sample.as_ref()
    }

    /// Detector spectra, if accumulated.
    pub fn detector(&self) -> Option<&DetectorPlanePhasors> {
        self.detector.as_ref()
    }

    /// Largest split E or H value at the end of the run.
    pub fn max_resulting_field(&self) -> f64 {
        self.max_resulting_field
    }

    /// The updater driving the run.
    pub fn updater(&self) -> &U {
        &self.updater
    }

    /// Get the current state.
    pub fn state(&self) -> SimulationState {
        self.state
    }
}

impl<U: FieldUpdater> OutputSource for Simulation<U> {
    fn write_outputs(&self, outputs: &mut OutputMatrices<'_>) -> Result<()> {
        self.save_outputs(outputs)
    }
}

//! Run parameters.

use crate::constants::TWO_PI;
use crate::fields::Dimension;
use crate::matrices::InputMatrices;
use crate::{Error, Result};
use log::{info, warn};

/// How the source is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    /// Time-harmonic source; phasors are extracted over repeated windows
    /// of whole periods until they stop changing.
    #[default]
    SteadyState,
    /// Transient source; phasors are extracted once over the whole run.
    Pulsed,
}

impl SourceMode {
    /// Decode the host `sourcemode` flag: 0 steady state, 1 pulsed.
    pub fn from_code(code: f64) -> Result<Self> {
        match code {
            c if c == 0.0 => Ok(Self::SteadyState),
            c if c == 1.0 => Ok(Self::Pulsed),
            other => Err(Error::Config(format!("unknown source mode {other}"))),
        }
    }
}

impl Dimension {
    /// Decode the host `dimension` flag: 0 full 3-D, 1 TE, 2 TM.
    pub fn from_code(code: f64) -> Result<Self> {
        match code {
            c if c == 0.0 => Ok(Self::Three),
            c if c == 1.0 => Ok(Self::TransverseElectric),
            c if c == 2.0 => Ok(Self::TransverseMagnetic),
            other => Err(Error::Config(format!("unknown dimension mode {other}"))),
        }
    }
}

/// Periods of the source that make up one steady-state DFT window.
pub const PERIODS_PER_WINDOW: f64 = 3.0;

/// Parameters of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    /// Angular frequency of the source
    pub omega_an: f64,
    /// Time step
    pub dt: f64,
    /// Number of updates
    pub nt: u64,
    /// Source mode
    pub source_mode: SourceMode,
    /// Which field components take part
    pub dimension: Dimension,
    /// Extraction frequencies for surface, vertex and detector phasors
    pub frequencies: Vec<f64>,
    /// Accumulate the E and H phasor volumes
    pub extract_volume: bool,
    /// Accumulate phasors on the surface
    pub extract_surface: bool,
    /// Interpolate surface samples to cell centres
    pub interpolate_surface: bool,
    /// Sample every `Np` updates in pulsed mode; derived when `None`
    pub pulsed_sample_interval: Option<usize>,
    /// Relative change between windows below which a steady-state run stops
    pub convergence_tol: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            omega_an: TWO_PI,
            dt: 0.01,
            nt: 1000,
            source_mode: SourceMode::SteadyState,
            dimension: Dimension::Three,
            frequencies: Vec::new(),
            extract_volume: true,
            extract_surface: false,
            interpolate_surface: true,
            pulsed_sample_interval: None,
            convergence_tol: 1e-6,
        }
    }
}

impl SimulationParameters {
    /// Default parameters for a source at angular frequency `omega_an`.
    pub fn new(omega_an: f64, dt: f64, nt: u64) -> Self {
        Self {
            omega_an,
            dt,
            nt,
            ..Default::default()
        }
    }

    /// Set the source mode.
    pub fn with_source_mode(mut self, mode: SourceMode) -> Self {
        self.source_mode = mode;
        self
    }

    /// Set the dimension mode.
    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the extraction frequencies.
    pub fn with_frequencies(mut self, frequencies: Vec<f64>) -> Self {
        self.frequencies = frequencies;
        self
    }

    /// Enable or disable the phasor volumes.
    pub fn with_volume_extraction(mut self, enabled: bool) -> Self {
        self.extract_volume = enabled;
        self
    }

    /// Enable or disable surface extraction, and choose whether surface
    /// samples are interpolated.
    pub fn with_surface_extraction(mut self, enabled: bool, interpolate: bool) -> Self {
        self.extract_surface = enabled;
        self.interpolate_surface = interpolate;
        self
    }

    /// Fix the pulsed-mode sampling interval.
    pub fn with_pulsed_sample_interval(mut self, np: usize) -> Self {
        self.pulsed_sample_interval = Some(np);
        self
    }

    /// Set the steady-state convergence tolerance.
    pub fn with_convergence_tol(mut self, tol: f64) -> Self {
        self.convergence_tol = tol;
        self
    }

    /// Read the parameters from the host matrices.
    ///
    /// `omega_an`, `Nt` and `dt` are required; every flag defaults when
    /// absent.
    pub fn from_input_matrices(inputs: &InputMatrices<'_>) -> Result<Self> {
        let flag = |name: &str| -> Result<Option<f64>> {
            inputs.get(name).map(|a| a.scalar(name)).transpose()
        };
        let nt = inputs.require("Nt")?.as_indices("Nt")?;
        let nt = match nt.as_slice() {
            [n] => *n as u64,
            _ => {
                return Err(Error::DimensionMismatch {
                    what: "scalar 'Nt'".into(),
                    expected: 1,
                    actual: nt.len(),
                })
            }
        };
        let mut params = Self::new(
            inputs.require("omega_an")?.scalar("omega_an")?,
            inputs.require("dt")?.scalar("dt")?,
            nt,
        );
        if let Some(code) = flag("sourcemode")? {
            params.source_mode = SourceMode::from_code(code)?;
        }
        if let Some(code) = flag("dimension")? {
            params.dimension = Dimension::from_code(code)?;
        }
        if let Some(v) = flag("exphasorsvolume")? {
            params.extract_volume = v != 0.0;
        }
        if let Some(v) = flag("exphasorssurface")? {
            params.extract_surface = v != 0.0;
        }
        if let Some(v) = flag("intphasorssurface")? {
            params.interpolate_surface = v != 0.0;
        }
        if let Some(f) = inputs.get("f_ex_vec") {
            params.frequencies = f.data().to_vec();
        }
        if let Some(np) = inputs.get("Np") {
            match np.as_indices("Np")?.as_slice() {
                [n] => params.pulsed_sample_interval = Some(*n),
                other => {
                    return Err(Error::DimensionMismatch {
                        what: "scalar 'Np'".into(),
                        expected: 1,
                        actual: other.len(),
                    })
                }
            }
        }
        params.validate()?;
        Ok(params)
    }

    /// Check the parameters can drive a run.
    pub fn validate(&self) -> Result<()> {
        if !(self.omega_an.is_finite() && self.omega_an > 0.0) {
            return Err(Error::Config(format!(
                "source angular frequency must be positive, got {}",
                self.omega_an
            )));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(Error::Config(format!("time step must be positive, got {}", self.dt)));
        }
        if self.nt == 0 {
            return Err(Error::Config("a run needs at least one update".into()));
        }
        if let Some(f) = self.frequencies.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
            return Err(Error::Config(format!("extraction frequency {f} is not positive")));
        }
        if self.pulsed_sample_interval == Some(0) {
            return Err(Error::Config("pulsed sampling interval must be at least 1".into()));
        }
        if self.convergence_tol.is_nan() || self.convergence_tol < 0.0 {
            return Err(Error::Config(format!(
                "convergence tolerance must be non-negative, got {}",
                self.convergence_tol
            )));
        }
        Ok(())
    }

    /// Angular extraction frequencies; the source frequency alone when no
    /// frequencies were given.
    pub fn omegas(&self) -> Vec<f64> {
        if self.frequencies.is_empty() {
            vec![self.omega_an]
        } else {
            self.frequencies.iter().map(|f| TWO_PI * f).collect()
        }
    }

    /// Updates per steady-state window: enough to hold
    /// [`PERIODS_PER_WINDOW`] source periods at the current `dt`.
    pub fn steps_per_window(&self) -> usize {
        (PERIODS_PER_WINDOW * TWO_PI / (self.omega_an * self.dt)).ceil() as usize
    }

    /// Fit the time step to whole windows for a steady-state run.
    ///
    /// `dt` is shrunk so a window of `Nsteps` updates spans exactly
    /// [`PERIODS_PER_WINDOW`] periods and `nt` is rounded down to whole
    /// windows. Returns `Nsteps`.
    pub fn adjust_for_steady_state(&mut self) -> Result<usize> {
        let n_steps = self.steps_per_window();
        let dt = PERIODS_PER_WINDOW * TWO_PI / (self.omega_an * n_steps as f64);
        if dt != self.dt {
            warn!("Changing dt from {:.6e} to {:.6e} to fit whole periods", self.dt, dt);
            self.dt = dt;
        }
        let nt = self.nt - self.nt % n_steps as u64;
        if nt == 0 {
            return Err(Error::Config(format!(
                "Nt = {} is shorter than one steady-state window of {n_steps} steps",
                self.nt
            )));
        }
        if nt != self.nt {
            warn!("Changing Nt from {} to {} to fit whole windows", self.nt, nt);
            self.nt = nt;
        }
        info!("Steady-state window: Nsteps = {n_steps}, Nt = {}", self.nt);
        Ok(n_steps)
    }

    /// Updates between pulsed-mode samples.
    ///
    /// Unless fixed explicitly this is the largest interval that still
    /// samples the highest extraction frequency 2.5 times per period.
    pub fn pulsed_interval(&self) -> usize {
        self.pulsed_sample_interval.unwrap_or_else(|| {
            let f_max = self
                .omegas()
                .into_iter()
                .fold(self.omega_an, f64::max)
                / TWO_PI;
            ((1.0 / (2.5 * self.dt * f_max)).floor() as usize).max(1)
        })
    }

    /// Number of samples taken by a pulsed run sampling every `np` updates.
    pub fn pulsed_samples(&self, np: usize) -> usize {
        (self.nt as usize).div_ceil(np)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrices::MatrixStore;
    use approx::assert_relative_eq;

    #[test]
    fn test_steady_state_window_fits_three_periods() {
        let mut params = SimulationParameters::new(TWO_PI, 0.007, 10_000);
        let n_steps = params.adjust_for_steady_state().unwrap();
        assert_eq!(n_steps, 429);
        assert_relative_eq!(params.dt * n_steps as f64, 3.0, max_relative = 1e-12);
        assert!(params.dt <= 0.007);
        assert_eq!(params.nt % n_steps as u64, 0);
        assert_eq!(params.nt, 9867);
    }

    #[test]
    fn test_short_run_rejected_in_steady_state() {
        let mut params = SimulationParameters::new(TWO_PI, 0.01, 100);
        assert!(params.adjust_for_steady_state().is_err());
    }

    #[test]
    fn test_pulsed_interval() {
        let params = SimulationParameters::new(TWO_PI, 0.01, 1000)
            .with_source_mode(SourceMode::Pulsed)
            .with_frequencies(vec![0.5, 2.0]);
        // f_max = 2 → 1 / (2.5 · 0.01 · 2) = 20
        assert_eq!(params.pulsed_interval(), 20);
        assert_eq!(params.pulsed_samples(20), 50);
        assert_eq!(params.pulsed_samples(30), 34);
        assert_eq!(params.with_pulsed_sample_interval(7).pulsed_interval(), 7);

        let coarse = SimulationParameters::new(TWO_PI, 1.0, 10);
        assert_eq!(coarse.pulsed_interval(), 1);
    }

    #[test]
    fn test_default_extraction_frequency_is_source() {
        let params = SimulationParameters::new(3.0, 0.01, 10);
        assert_eq!(params.omegas(), vec![3.0]);
        let params = params.with_frequencies(vec![1.0]);
        assert_relative_eq!(params.omegas()[0], TWO_PI);
    }

    #[test]
    fn test_from_input_matrices() {
        let mut store = MatrixStore::new();
        store
            .insert_scalar("omega_an", 2.0)
            .insert_scalar("Nt", 500.0)
            .insert_scalar("dt", 0.05)
            .insert_scalar("sourcemode", 1.0)
            .insert_scalar("dimension", 2.0)
            .insert_scalar("exphasorssurface", 1.0)
            .insert_scalar("intphasorssurface", 0.0)
            .insert_scalar("Np", 4.0);
        store.insert("f_ex_vec", vec![0.1, 0.2], &[1, 2]).unwrap();
        let mut inputs = InputMatrices::new();
        inputs.set_from_input_file(&store).unwrap();

        let params = SimulationParameters::from_input_matrices(&inputs).unwrap();
        assert_eq!(params.nt, 500);
        assert_eq!(params.source_mode, SourceMode::Pulsed);
        assert_eq!(params.dimension, Dimension::TransverseMagnetic);
        assert!(params.extract_volume);
        assert!(params.extract_surface);
        assert!(!params.interpolate_surface);
        assert_eq!(params.frequencies, vec![0.1, 0.2]);
        assert_eq!(params.pulsed_interval(), 4);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(SimulationParameters::new(0.0, 0.01, 10).validate().is_err());
        assert!(SimulationParameters::new(1.0, -0.01, 10).validate().is_err());
        assert!(SimulationParameters::new(1.0, 0.01, 0).validate().is_err());
        assert!(SimulationParameters::new(1.0, 0.01, 10)
            .with_frequencies(vec![-1.0])
            .validate()
            .is_err());
        assert!(SourceMode::from_code(3.0).is_err());
        assert!(Dimension::from_code(0.5).is_err());
    }
}

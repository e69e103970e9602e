//! End-to-end phasor extraction against fields with known phasors.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use num_complex::Complex64;
use yee_phasors::arrays::{CellCoordinate, FieldComponent, FieldComponentsVector};
use yee_phasors::constants::TWO_PI;
use yee_phasors::fdtd::{FieldUpdater, Simulation, SimulationParameters, SimulationState, SourceMode};
use yee_phasors::fields::{Dimension, SplitField};
use yee_phasors::geometry::Grid;
use yee_phasors::phasors::{ComplexAmplitudeSample, SurfacePhasors, VertexPhasors};
use yee_phasors::Result;

/// Writes `Re(A(cell) e^{iωt})` into every sample, with `A` linear in the
/// sample indices, and reports a unit cosine as the source.
struct HarmonicUpdater {
    omega: f64,
}

fn amplitude(component: FieldComponent, cell: CellCoordinate) -> Complex64 {
    let (i, j, k) = (cell.i as f64, cell.j as f64, cell.k as f64);
    match component {
        FieldComponent::Ex => Complex64::new(0.5, -0.1) * (1.0 + 0.05 * i),
        FieldComponent::Ey => Complex64::new(0.0, 0.7),
        FieldComponent::Ez => Complex64::new(0.3, 0.4) * (1.0 + 0.1 * k),
        FieldComponent::Hx => Complex64::new(-0.2, 0.1) * (1.0 + 0.05 * j + 0.02 * k),
        FieldComponent::Hy => Complex64::new(0.1, 0.0) * (1.0 + 0.1 * i),
        FieldComponent::Hz => Complex64::new(0.05, -0.05),
    }
}

fn write_harmonic(field: &mut SplitField, components: [FieldComponent; 3], omega: f64, t: f64) {
    let (c, s) = ((omega * t).cos(), (omega * t).sin());
    let dims = field.grid().sample_dimensions();
    for component in components {
        let target = field.component_mut(component.axis());
        for k in 0..dims.nz {
            for j in 0..dims.ny {
                for i in 0..dims.nx {
                    let a = amplitude(component, CellCoordinate::new(i, j, k));
                    let v = a.re * c - a.im * s;
                    target.set_splits(i, j, k, 0.25 * v, 0.75 * v);
                }
            }
        }
    }
}

impl FieldUpdater for HarmonicUpdater {
    fn name(&self) -> &str {
        "harmonic"
    }

    fn update_h(&mut self, h: &mut SplitField, _e: &SplitField, step: u64, dt: f64) -> Result<()> {
        let t = (step as f64 + 0.5) * dt;
        write_harmonic(h, [FieldComponent::Hx, FieldComponent::Hy, FieldComponent::Hz], self.omega, t);
        Ok(())
    }

    fn update_e(&mut self, e: &mut SplitField, _h: &SplitField, step: u64, dt: f64) -> Result<()> {
        let t = (step as f64 + 1.0) * dt;
        write_harmonic(e, [FieldComponent::Ex, FieldComponent::Ey, FieldComponent::Ez], self.omega, t);
        Ok(())
    }

    fn excitation(&self, t: f64) -> f64 {
        (self.omega * t).cos()
    }
}

fn centre_vertex(grid: &Grid, dimension: Dimension) -> VertexPhasors {
    let sample = ComplexAmplitudeSample::new(
        vec![CellCoordinate::new(2, 2, 2)],
        FieldComponentsVector::from_ids(&[1, 3, 4, 5]).unwrap(),
    );
    VertexPhasors::new(sample, grid, dimension).unwrap()
}

fn assert_phasor_close(actual: Complex64, expected: Complex64, tol: f64) {
    assert!(
        (actual - expected).norm() <= tol * expected.norm(),
        "phasor {actual} differs from {expected} by more than {tol} relative"
    );
}

#[test]
fn test_steady_state_vertex_phasors_at_grid_centre() {
    let grid = Grid::uniform(4, 4, 4, 1.0).unwrap();
    let params = SimulationParameters::new(TWO_PI, 0.01, 10_000).with_frequencies(vec![1.0]);
    let vertices = centre_vertex(&grid, Dimension::Three);
    let mut sim = Simulation::new(grid, params, HarmonicUpdater { omega: TWO_PI });
    sim.set_vertex_phasors(vertices)
        .set_verbose(0)
        .set_show_progress(false);

    let stats = sim.run().unwrap();
    // two identical 300-step windows are enough to converge
    assert_eq!(sim.state(), SimulationState::Stopped);
    assert_eq!(stats.windows, 2);
    assert_eq!(stats.timesteps, 600);
    assert!(stats.last_window_change.unwrap() < 1e-6);

    let vertices = sim.vertex_phasors().unwrap();
    // centre of cell (2, 2, 2) is half a sample past index 2 along each
    // staggered axis
    let ez = vertices.amplitude(0, FieldComponent::Ez, 0).unwrap();
    assert_phasor_close(ez, Complex64::new(0.3, 0.4) * 1.25, 0.01);
    let ex = vertices.amplitude(0, FieldComponent::Ex, 0).unwrap();
    assert_phasor_close(ex, Complex64::new(0.5, -0.1) * 1.125, 0.01);
    let hx = vertices.amplitude(0, FieldComponent::Hx, 0).unwrap();
    assert_phasor_close(hx, Complex64::new(-0.2, 0.1) * (1.0 + 0.125 + 0.05), 0.01);
    let hy = vertices.amplitude(0, FieldComponent::Hy, 0).unwrap();
    assert_phasor_close(hy, Complex64::new(0.1, 0.0) * 1.25, 0.01);
    assert_eq!(vertices.amplitude(0, FieldComponent::Hz, 0), None);

    let raw = sim.phasor(FieldComponent::Ez, CellCoordinate::new(1, 3, 1));
    assert_phasor_close(raw, Complex64::new(0.3, 0.4) * 1.1, 1e-9);
}

#[test]
fn test_round_trip_over_a_thousand_periods() {
    let grid = Grid::uniform(4, 4, 4, 1.0).unwrap();
    let params = SimulationParameters::new(TWO_PI, 0.05, 20_000)
        .with_source_mode(SourceMode::Pulsed)
        .with_pulsed_sample_interval(1)
        .with_frequencies(vec![1.0]);
    let vertices = centre_vertex(&grid, Dimension::Three);
    let mut sim = Simulation::new(grid, params, HarmonicUpdater { omega: TWO_PI });
    sim.set_vertex_phasors(vertices)
        .set_verbose(0)
        .set_show_progress(false);

    let stats = sim.run().unwrap();
    assert_eq!(stats.timesteps, 20_000);
    assert_eq!(sim.state(), SimulationState::Finished);
    assert_relative_eq!(stats.sim_time, 1000.0, max_relative = 1e-12);

    let vertices = sim.vertex_phasors().unwrap();
    let ez = vertices.amplitude(0, FieldComponent::Ez, 0).unwrap();
    assert_phasor_close(ez, Complex64::new(0.3, 0.4) * 1.25, 1e-6);
    let hx = vertices.amplitude(0, FieldComponent::Hx, 0).unwrap();
    assert_phasor_close(hx, Complex64::new(-0.2, 0.1) * 1.175, 1e-6);

    for k in 0..=4 {
        let cell = CellCoordinate::new(0, 4, k);
        let expected = amplitude(FieldComponent::Ez, cell);
        assert_phasor_close(sim.phasor(FieldComponent::Ez, cell), expected, 1e-6);
    }
}

#[test]
fn test_transverse_magnetic_surface_uses_raw_samples() {
    let grid = Grid::uniform(4, 4, 4, 1.0).unwrap();
    let params = SimulationParameters::new(TWO_PI, 0.02, 3000)
        .with_dimension(Dimension::TransverseMagnetic)
        .with_surface_extraction(true, false)
        .with_frequencies(vec![1.0]);
    let mut surface = SurfacePhasors::new();
    let cuboid = [1.0, 3.0, 1.0, 3.0, 1.0, 3.0];
    surface
        .set_from_matlab_array(
            &yee_phasors::matrices::HostArray::new(&cuboid, &[1, 6]).unwrap(),
            [1, 1, 1],
            &grid,
            Dimension::TransverseMagnetic,
        )
        .unwrap();
    let mut sim = Simulation::new(grid.clone(), params, HarmonicUpdater { omega: TWO_PI });
    sim.set_surface_phasors(surface)
        .set_verbose(0)
        .set_show_progress(false);
    sim.run().unwrap();

    let surface = sim.surface_phasors().unwrap();
    // k faces are dropped, so the column through i = j = 2 is never visited
    assert_eq!(surface.n_surface_vertices(), 24);
    assert!(surface.vertices().iter().all(|v| v.i != 2 || v.j != 2));
    for (v, &cell) in surface.vertices().iter().enumerate() {
        assert_phasor_close(
            surface.amplitude(v, FieldComponent::Ez, 0),
            amplitude(FieldComponent::Ez, cell),
            1e-9,
        );
        assert_phasor_close(
            surface.amplitude(v, FieldComponent::Hy, 0),
            amplitude(FieldComponent::Hy, cell),
            1e-9,
        );
        assert_eq!(surface.amplitude(v, FieldComponent::Ex, 0), Complex64::new(0.0, 0.0));
        assert_eq!(surface.amplitude(v, FieldComponent::Hz, 0), Complex64::new(0.0, 0.0));
    }
}

#[test]
fn test_pulsed_and_steady_state_agree() {
    let run = |params: SimulationParameters| {
        let grid = Grid::uniform(4, 4, 4, 1.0).unwrap();
        let mut sim = Simulation::new(grid, params, HarmonicUpdater { omega: TWO_PI });
        sim.set_verbose(0).set_show_progress(false);
        sim.run().unwrap();
        sim
    };
    let steady = run(SimulationParameters::new(TWO_PI, 0.01, 3000));
    // 75 samples, 0.4 periods apart
    let pulsed = run(SimulationParameters::new(TWO_PI, 0.01, 3000).with_source_mode(SourceMode::Pulsed));
    assert_eq!(pulsed.state(), SimulationState::Finished);

    let difference = steady
        .electric_phasors()
        .max_pointwise_difference_over_max_element(pulsed.electric_phasors());
    assert_abs_diff_eq!(difference, 0.0, epsilon = 1e-9);
    let cell = CellCoordinate::new(3, 0, 2);
    assert_phasor_close(
        pulsed.phasor(FieldComponent::Hx, cell),
        amplitude(FieldComponent::Hx, cell),
        1e-9,
    );
    assert_phasor_close(
        steady.phasor(FieldComponent::Ey, cell),
        Complex64::new(0.0, 0.7),
        1e-9,
    );
}

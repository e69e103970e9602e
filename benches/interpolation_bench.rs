//! Benchmarks for cell-centre interpolation.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use yee_phasors::arrays::{AxialDirection, CellCoordinate, CellRange};
use yee_phasors::fields::{Dimension, Field, SplitField};
use yee_phasors::geometry::{Grid, InterpolationMethod, PreferredInterpolationMethods};

fn filled_split(grid: &Grid) -> SplitField {
    let mut e = SplitField::electric();
    e.allocate(grid);
    let dims = grid.sample_dimensions();
    for axis in AxialDirection::ALL {
        let component = e.component_mut(axis);
        for k in 0..dims.nz {
            for j in 0..dims.ny {
                for i in 0..dims.nx {
                    let v = ((i + 2 * j + 3 * k) as f64 * 0.1).sin();
                    component.set_splits(i, j, k, v, 0.5 * v);
                }
            }
        }
    }
    e
}

fn bench_centre_interpolation(c: &mut Criterion) {
    for n in [16, 32, 64] {
        let mut group = c.benchmark_group(format!("interpolate_{n}^3"));
        group.throughput(Throughput::Elements((n * n * n) as u64));

        for method in [InterpolationMethod::BandLimited, InterpolationMethod::Cubic] {
            let mut grid = Grid::uniform(n, n, n, 1.0).unwrap();
            grid.set_preferred_interpolation_methods(PreferredInterpolationMethods::all(method));
            let e = filled_split(&grid);

            group.bench_function(format!("{method:?}"), |b| {
                b.iter(|| {
                    let mut sum = 0.0;
                    for k in 0..n {
                        for j in 0..n {
                            for i in 0..n {
                                sum += e.interpolate_to_centre_of(
                                    AxialDirection::Z,
                                    CellCoordinate::new(i, j, k),
                                );
                            }
                        }
                    }
                    black_box(sum)
                });
            });
        }
        group.finish();
    }
}

fn bench_interpolate_over_range(c: &mut Criterion) {
    let n = 32;
    let grid = Grid::uniform(n, n, n, 1.0).unwrap();
    let e = filled_split(&grid);
    let mut field = Field::electric();
    field.allocate(&grid);
    field.set_values_from_split(&e);
    let range = CellRange::new(
        CellCoordinate::new(0, 0, 0),
        CellCoordinate::new(n - 1, n - 1, n - 1),
    )
    .unwrap();

    let mut group = c.benchmark_group("interpolate_over_range");
    group.throughput(Throughput::Elements(range.len() as u64));
    group.sample_size(20);
    group.bench_function("three_dimensional", |b| {
        b.iter(|| {
            let count = field
                .interpolate_over_range(range, Dimension::Three)
                .map(black_box)
                .count();
            black_box(count)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_centre_interpolation, bench_interpolate_over_range);
criterion_main!(benches);

//! Performance benchmarks for the remodeling core
//!
//! Three hot paths dominate a batch run:
//!
//! 1. **Homogenization** — one stiffness evaluation per element per interval,
//!    plus one per strain-energy evaluation inside the transient integrator.
//! 2. **Steady-state solve** — once per element at initialization; damped
//!    least squares with finite-difference Jacobians.
//! 3. **Interval advance** — the stiff transient integration of a whole
//!    cross-section across one mechanics interval.
//!
//! ```bash
//! cargo bench --bench remodeling_performance
//! cargo bench --bench remodeling_performance steady_state
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use osteo_rs::cell::CellPopulationModel;
use osteo_rs::load::LoadCase;
use osteo_rs::mechanics::Homogenizer;
use osteo_rs::section::{CrossSectionModel, SectionGeometry, SectionParameters};

fn bench_homogenization(c: &mut Criterion) {
    let homogenizer = Homogenizer::new();
    let mut group = c.benchmark_group("homogenization");

    group.bench_function("construction", |b| {
        b.iter(|| black_box(Homogenizer::new()));
    });

    for bvf in [0.05, 0.5, 0.95] {
        group.bench_with_input(BenchmarkId::new("stiffness", bvf), &bvf, |b, &bvf| {
            b.iter(|| black_box(homogenizer.stiffness(black_box(bvf)).unwrap()));
        });
    }
    group.finish();
}

fn bench_steady_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("steady_state");
    for porosity in [0.05, 0.3] {
        group.bench_with_input(
            BenchmarkId::new("solve", porosity),
            &porosity,
            |b, &porosity| {
                b.iter(|| {
                    let mut model =
                        CellPopulationModel::new(LoadCase::habitual(), porosity).unwrap();
                    black_box(model.solve_steady_state(porosity).unwrap().ob_p)
                });
            },
        );
    }
    group.finish();
}

fn bench_interval_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_section");
    group.sample_size(10);

    group.bench_function("3x3_one_interval", |b| {
        b.iter(|| {
            let geometry = SectionGeometry::uniform_grid(3, 3, 0.8, 0.9).unwrap();
            let parameters = SectionParameters {
                bending_moment_y: 0.0,
                duration_years: 30.0 / 365.0,
                mechanics_update_interval: 30.0,
                ..SectionParameters::default()
            };
            let mut section = CrossSectionModel::new(
                geometry,
                LoadCase::spaceflight(),
                parameters,
            )
            .unwrap();
            let ledger = section.run().unwrap();
            black_box(ledger.len())
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_homogenization,
    bench_steady_state,
    bench_interval_advance
);
criterion_main!(benches);

//! Criterion benches for the packing loop and its hot paths.
//!
//! - Hull projection on random cut sets (dominance mode).
//! - Odd-set separation on a generated instance.
//! - Full packing run on a small odd-set instance.
//!
//! Results live under `target/criterion`.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use nalgebra::DVector;
use packing::generate::{generate_odd_set_graph, OddSetCfg};
use packing::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn instance() -> Graph {
    let cfg = OddSetCfg {
        num_nodes: 12,
        num_odd_sets: 4,
        odd_set_size: 5,
        weighted: true,
        radix: 3,
    };
    generate_odd_set_graph(&cfg, 42).unwrap()
}

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");
    let mut rng = StdRng::seed_from_u64(7);
    for m in [8usize, 32] {
        let d = 20;
        let cands: Vec<DVector<f64>> = (0..m)
            .map(|_| DVector::from_fn(d, |_, _| f64::from(rng.gen_bool(0.3))))
            .collect();
        let target = DVector::from_element(d, 0.8);
        group.bench_function(BenchmarkId::new("dominance", m), |b| {
            b.iter(|| {
                closest_point_in_hull(&target, &cands, HullMode::Dominance, &ProjectionCfg::default())
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_separation(c: &mut Criterion) {
    let g = instance();
    let mut oracle = MatchingOracle::new(&g, Weighting::Instance, Backend::default()).unwrap();
    let point = DVector::from_element(g.num_edges(), 0.4);
    c.bench_function("odd_set_separation", |b| {
        b.iter(|| oracle.separate(&point, 1e-4).unwrap())
    });
}

fn bench_packing(c: &mut Criterion) {
    let g = instance();
    let cfg = PackingCfg {
        max_iter: 200,
        ..PackingCfg::default()
    };
    c.bench_function("packing_odd_set_12", |b| {
        b.iter_batched(
            || {
                let oracle =
                    MatchingOracle::new(&g, Weighting::Instance, Backend::default()).unwrap();
                let verif = LpRelaxation::matching(
                    &g,
                    oracle.objective(),
                    InitConss::Standard,
                    Backend::default(),
                )
                .unwrap();
                (oracle, verif)
            },
            |(mut oracle, mut verif)| {
                let init = oracle.standard_cuts().to_vec();
                let lbopt = oracle.inner_radius();
                packing_algorithm(&mut oracle, &mut verif, lbopt, &init, &cfg).unwrap()
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_projection, bench_separation, bench_packing);
criterion_main!(benches);

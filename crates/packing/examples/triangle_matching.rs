//! Fractional triangle: one odd-set cut, then gamma climbs to the matching number.
//!
//! Prints the gamma trace of a fully corrective run on the triangle with unit
//! weights, then the same instance solved by the plain cut loop.

use packing::prelude::*;

fn main() {
    let g = Graph::new(3, &[(0, 1), (0, 2), (1, 2)], None);
    let mut oracle = MatchingOracle::new(&g, Weighting::Instance, Backend::default())
        .expect("separation model builds");
    let obj = oracle.objective().clone();
    let mut verif = LpRelaxation::matching(&g, &obj, InitConss::Standard, Backend::default())
        .expect("relaxation builds");
    let init = oracle.standard_cuts().to_vec();
    let cfg = PackingCfg {
        max_iter: 50,
        corrective_freq: 1,
        ..PackingCfg::default()
    };
    let lbopt = inner_radius_simplex(g.num_edges());
    let run = packing_algorithm(&mut oracle, &mut verif, lbopt, &init, &cfg).expect("run");
    for row in run.trace() {
        println!(
            "iter={:>2} gamma={:.6} gap={:.2e}{}",
            row.iteration,
            row.gamma,
            row.gap,
            if row.separated { " cut" } else { "" }
        );
    }
    println!(
        "outcome={:?} gamma={:.6} cuts={} elapsed_ms={:.3}",
        run.outcome,
        run.gamma,
        run.cuts().len(),
        run.elapsed.as_secs_f64() * 1e3
    );

    let mut lp = LpRelaxation::matching(&g, &obj, InitConss::Standard, Backend::default())
        .expect("relaxation builds");
    let lp_run = cut_loop(&mut lp, &mut oracle, cfg.precision, 10, None).expect("cut loop");
    println!("cut loop objective values: {:?}", lp_run.obj_values);
}

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use packing::generate::{generate_odd_set_graph, OddSetCfg};
use packing::prelude::*;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

mod report;

use report::{CutLoopSummary, PackingSummary, RunMeta};

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Packing LP experiments: primal-dual loop, cut loop, instance generation")]
struct Cmd {
    /// Log every iteration
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Run the primal-dual packing algorithm on an instance
    Solve {
        #[command(flatten)]
        problem: ProblemArgs,
        #[arg(long, default_value_t = 1000)]
        max_iter: usize,
        /// Every k-th iteration is fully corrective (0 disables)
        #[arg(long, default_value_t = 10)]
        corrective_freq: usize,
        /// Per-iteration CSV trace
        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Solve the LP relaxation by the plain cutting-plane loop
    CutLoop {
        #[command(flatten)]
        problem: ProblemArgs,
        #[arg(long, default_value_t = 100)]
        max_iter: usize,
        /// Stop once the relaxation value reaches this bound
        #[arg(long)]
        lbopt: Option<f64>,
    },
    /// Write a random odd-set matching instance in DIMACS format
    Generate {
        #[arg(long, default_value_t = 30)]
        nodes: usize,
        #[arg(long, default_value_t = 10)]
        odd_sets: usize,
        #[arg(long, default_value_t = 5)]
        set_size: usize,
        /// Laminar odd-set weights instead of unit weights
        #[arg(long)]
        weighted: bool,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Args)]
struct ProblemArgs {
    /// DIMACS-like instance file (`p edge n m`, `e u v [w]`)
    instance: PathBuf,
    #[arg(long, value_enum, default_value_t = ProblemArg::Matching)]
    problem: ProblemArg,
    #[arg(long, value_enum, default_value_t = WeightsArg::Instance)]
    weights: WeightsArg,
    #[arg(long, value_enum, default_value_t = InitArg::Standard)]
    init_conss: InitArg,
    #[arg(long, value_enum, default_value_t = BackendArg::Microlp)]
    backend: BackendArg,
    #[arg(long, default_value_t = 1e-4)]
    precision: f64,
    /// JSON summary; printed to stdout when absent
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProblemArg {
    Matching,
    StableSet,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WeightsArg {
    Instance,
    Degree,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InitArg {
    None,
    Box,
    Standard,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Microlp,
}

impl From<ProblemArg> for Family {
    fn from(p: ProblemArg) -> Self {
        match p {
            ProblemArg::Matching => Family::Matching,
            ProblemArg::StableSet => Family::StableSet,
        }
    }
}

impl From<WeightsArg> for Weighting {
    fn from(w: WeightsArg) -> Self {
        match w {
            WeightsArg::Instance => Weighting::Instance,
            WeightsArg::Degree => Weighting::Degree,
        }
    }
}

impl From<InitArg> for InitConss {
    fn from(i: InitArg) -> Self {
        match i {
            InitArg::None => InitConss::None,
            InitArg::Box => InitConss::Box,
            InitArg::Standard => InitConss::Standard,
        }
    }
}

impl From<BackendArg> for Backend {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Microlp => Backend::MicroLp,
        }
    }
}

/// Instance, oracle and verification relaxation for one run.
struct Setup {
    oracle: Box<dyn SeparationOracle>,
    relaxation: LpRelaxation,
    meta: RunMeta,
}

impl ProblemArgs {
    fn setup(&self) -> Result<Setup> {
        let graph = Graph::read_dimacs(&self.instance)
            .with_context(|| format!("reading instance {}", self.instance.display()))?;
        let family = Family::from(self.problem);
        let backend = Backend::from(self.backend);
        let oracle = build_oracle(family, &graph, self.weights.into(), backend)
            .context("building separation model")?;
        let obj = oracle.objective().clone();
        let relaxation =
            LpRelaxation::for_family(family, &graph, &obj, self.init_conss.into(), backend)
                .context("building LP relaxation")?;
        let meta = RunMeta {
            instance: self.instance.display().to_string(),
            problem: label(self.problem),
            weights: label(self.weights),
            init_conss: label(self.init_conss),
            num_nodes: graph.num_nodes(),
            num_edges: graph.num_edges(),
        };
        tracing::info!(
            instance = %meta.instance,
            problem = %meta.problem,
            nodes = meta.num_nodes,
            edges = meta.num_edges,
            "instance loaded"
        );
        Ok(Setup {
            oracle,
            relaxation,
            meta,
        })
    }
}

fn label<T: ValueEnum>(v: T) -> String {
    v.to_possible_value()
        .map(|p| p.get_name().to_string())
        .unwrap_or_default()
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = if cmd.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .init();
    match cmd.action {
        Action::Solve {
            problem,
            max_iter,
            corrective_freq,
            trace,
        } => solve(&problem, max_iter, corrective_freq, trace.as_deref()),
        Action::CutLoop {
            problem,
            max_iter,
            lbopt,
        } => run_cut_loop(&problem, max_iter, lbopt),
        Action::Generate {
            nodes,
            odd_sets,
            set_size,
            weighted,
            seed,
            out,
        } => {
            let cfg = OddSetCfg {
                num_nodes: nodes,
                num_odd_sets: odd_sets,
                odd_set_size: set_size,
                weighted,
                ..OddSetCfg::default()
            };
            generate(&cfg, seed, &out)
        }
    }
}

fn solve(
    args: &ProblemArgs,
    max_iter: usize,
    corrective_freq: usize,
    trace: Option<&Path>,
) -> Result<()> {
    let Setup {
        mut oracle,
        mut relaxation,
        meta,
    } = args.setup()?;
    let cfg = PackingCfg {
        precision: args.precision,
        max_iter,
        corrective_freq,
        ..PackingCfg::default()
    };
    let init = InitConss::from(args.init_conss).rows(oracle.as_ref());
    let lbopt = oracle.inner_radius();
    let run = packing_algorithm(oracle.as_mut(), &mut relaxation, lbopt, &init, &cfg)
        .context("packing algorithm failed")?;

    if let Some(path) = trace {
        report::write_trace_csv(path, &run.trace())?;
    }
    emit(&PackingSummary::new(meta, &cfg, lbopt, &run), args.out.as_deref())
}

fn run_cut_loop(args: &ProblemArgs, max_iter: usize, lbopt: Option<f64>) -> Result<()> {
    let Setup {
        mut oracle,
        mut relaxation,
        meta,
    } = args.setup()?;
    let run = cut_loop(
        &mut relaxation,
        oracle.as_mut(),
        args.precision,
        max_iter,
        lbopt,
    )
    .context("cut loop failed")?;
    emit(
        &CutLoopSummary::new(meta, args.precision, max_iter, &run),
        args.out.as_deref(),
    )
}

fn generate(cfg: &OddSetCfg, seed: u64, out: &Path) -> Result<()> {
    let graph = generate_odd_set_graph(cfg, seed).context("generating instance")?;
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    graph
        .write_dimacs(out)
        .with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(
        nodes = graph.num_nodes(),
        edges = graph.num_edges(),
        seed,
        out = %out.display(),
        "instance written"
    );
    Ok(())
}

fn emit<T: serde::Serialize>(summary: &T, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            let path = report::write_json(path, summary)?;
            tracing::info!(path = %path.display(), "summary written");
        }
        None => println!("{}", serde_json::to_string_pretty(summary)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    const TRIANGLE: &str = "p edge 3 3\ne 1 2\ne 1 3\ne 2 3\n";

    #[test]
    fn parses_solve_flags() {
        let cmd = Cmd::try_parse_from([
            "cli",
            "solve",
            "g.col",
            "--problem",
            "stable-set",
            "--init-conss",
            "box",
            "--corrective-freq",
            "0",
        ])
        .unwrap();
        match cmd.action {
            Action::Solve {
                problem,
                corrective_freq,
                max_iter,
                trace,
            } => {
                assert!(matches!(problem.problem, ProblemArg::StableSet));
                assert!(matches!(problem.init_conss, InitArg::Box));
                assert_eq!(corrective_freq, 0);
                assert_eq!(max_iter, 1000);
                assert!(trace.is_none());
                assert_eq!(label(problem.problem), "stable-set");
            }
            _ => panic!("expected solve"),
        }
    }

    #[test]
    fn solve_writes_summary_and_trace() {
        let dir = tempdir().unwrap();
        let instance = dir.path().join("tri.col");
        std::fs::write(&instance, TRIANGLE).unwrap();
        let out = dir.path().join("out/summary.json");
        let trace = dir.path().join("out/trace.csv");
        let args = ProblemArgs {
            instance,
            problem: ProblemArg::Matching,
            weights: WeightsArg::Instance,
            init_conss: InitArg::Standard,
            backend: BackendArg::Microlp,
            precision: 1e-4,
            out: Some(out.clone()),
        };
        solve(&args, 50, 1, Some(&trace)).unwrap();

        let parsed: Value = serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(parsed["outcome"], "Converged");
        assert!((parsed["gamma"].as_f64().unwrap() - 1.0).abs() < 1e-3);
        assert_eq!(parsed["meta"]["num_edges"], 3);
        let csv = std::fs::read_to_string(&trace).unwrap();
        assert!(csv.starts_with("iteration,gamma,gap,separated"));
    }

    #[test]
    fn generate_then_cut_loop() {
        let dir = tempdir().unwrap();
        let instance = dir.path().join("gen.col");
        let cfg = OddSetCfg {
            num_nodes: 9,
            num_odd_sets: 3,
            odd_set_size: 3,
            ..OddSetCfg::default()
        };
        generate(&cfg, 5, &instance).unwrap();
        let out = dir.path().join("lp.json");
        let args = ProblemArgs {
            instance,
            problem: ProblemArg::Matching,
            weights: WeightsArg::Degree,
            init_conss: InitArg::Standard,
            backend: BackendArg::Microlp,
            precision: 1e-4,
            out: Some(out.clone()),
        };
        run_cut_loop(&args, 20, None).unwrap();
        let parsed: Value = serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert!(!parsed["obj_values"].as_array().unwrap().is_empty());
    }

    #[test]
    fn missing_instance_is_reported() {
        let args = ProblemArgs {
            instance: PathBuf::from("/nonexistent/instance.col"),
            problem: ProblemArg::Matching,
            weights: WeightsArg::Instance,
            init_conss: InitArg::Standard,
            backend: BackendArg::Microlp,
            precision: 1e-4,
            out: None,
        };
        let err = solve(&args, 10, 1, None).unwrap_err();
        assert!(format!("{err:#}").contains("reading instance"));
    }
}

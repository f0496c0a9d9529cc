use anyhow::{Context, Result};
use packing::algorithm::{CutLoopRun, PackingCfg, PackingRun, TraceRow};
use polars::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Instance and setup shared by every summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub instance: String,
    pub problem: String,
    pub weights: String,
    pub init_conss: String,
    pub num_nodes: usize,
    pub num_edges: usize,
}

#[derive(Debug, Serialize)]
pub struct PackingSummary {
    pub code_rev: String,
    pub meta: RunMeta,
    pub precision: f64,
    pub max_iter: usize,
    pub corrective_freq: usize,
    pub lbopt: f64,
    pub gamma: f64,
    pub outcome: String,
    pub iterations: usize,
    pub primal_steps: usize,
    pub dual_steps: usize,
    pub cuts: usize,
    pub elapsed_secs: f64,
}

impl PackingSummary {
    pub fn new(meta: RunMeta, cfg: &PackingCfg, lbopt: f64, run: &PackingRun) -> Self {
        Self {
            code_rev: current_git_rev(),
            meta,
            precision: cfg.precision,
            max_iter: cfg.max_iter,
            corrective_freq: cfg.corrective_freq,
            lbopt,
            gamma: run.gamma,
            outcome: format!("{:?}", run.outcome),
            iterations: run.iterations,
            primal_steps: run.primal_steps,
            dual_steps: run.dual_steps,
            cuts: run.cuts().len(),
            elapsed_secs: run.elapsed.as_secs_f64(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CutLoopSummary {
    pub code_rev: String,
    pub meta: RunMeta,
    pub precision: f64,
    pub max_iter: usize,
    pub obj_values: Vec<f64>,
    pub cuts_added: usize,
    pub elapsed_secs: f64,
}

impl CutLoopSummary {
    pub fn new(meta: RunMeta, precision: f64, max_iter: usize, run: &CutLoopRun) -> Self {
        Self {
            code_rev: current_git_rev(),
            meta,
            precision,
            max_iter,
            obj_values: run.obj_values.clone(),
            cuts_added: run.cuts_added,
            elapsed_secs: run.elapsed.as_secs_f64(),
        }
    }
}

/// Pretty JSON at `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<PathBuf> {
    ensure_parent(path)?;
    fs::write(path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path.to_path_buf())
}

/// Per-iteration trace as CSV: `iteration,gamma,gap,separated`.
pub fn write_trace_csv(path: &Path, rows: &[TraceRow]) -> Result<PathBuf> {
    ensure_parent(path)?;
    let mut df = df!(
        "iteration" => rows.iter().map(|r| r.iteration as u64).collect::<Vec<_>>(),
        "gamma" => rows.iter().map(|r| r.gamma).collect::<Vec<_>>(),
        "gap" => rows.iter().map(|r| r.gap).collect::<Vec<_>>(),
        "separated" => rows.iter().map(|r| r.separated).collect::<Vec<_>>(),
    )?;
    let mut file =
        fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(rows = df.height(), path = %path.display(), "trace written");
    Ok(path.to_path_buf())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    Ok(())
}

pub fn current_git_rev() -> String {
    if let Some(from_env) = option_env!("GIT_COMMIT") {
        if !from_env.is_empty() {
            return from_env.to_string();
        }
    }
    if let Ok(env_override) = std::env::var("GIT_COMMIT") {
        if !env_override.is_empty() {
            return env_override;
        }
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    fn meta() -> RunMeta {
        RunMeta {
            instance: "tri.col".into(),
            problem: "matching".into(),
            weights: "instance".into(),
            init_conss: "standard".into(),
            num_nodes: 3,
            num_edges: 3,
        }
    }

    #[test]
    fn trace_csv_has_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/trace.csv");
        let rows = [
            TraceRow {
                iteration: 0,
                gamma: 0.5,
                gap: 2.0,
                separated: false,
            },
            TraceRow {
                iteration: 1,
                gamma: 1.0,
                gap: 0.0,
                separated: true,
            },
        ];
        write_trace_csv(&path, &rows).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("iteration,gamma,gap,separated"));
        assert_eq!(lines.count(), 2);
        assert!(text.contains("true"));
    }

    #[test]
    fn cut_loop_summary_round_trips_through_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let run = CutLoopRun {
            obj_values: vec![1.5, 1.0],
            cuts_added: 1,
            elapsed: std::time::Duration::from_millis(3),
        };
        write_json(&path, &CutLoopSummary::new(meta(), 1e-4, 10, &run)).unwrap();
        let parsed: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed["obj_values"][1], 1.0);
        assert_eq!(parsed["meta"]["problem"], "matching");
        assert!(parsed["code_rev"].is_string());
    }
}

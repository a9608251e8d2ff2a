//! Solving many instances in parallel

use super::{PackingProblem, SearchOutcome};
use crate::config::{OutputFormat, Settings};
use crate::floorplan::{load_instances_from_directory, Instance};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Outcome of one instance in a batch
#[derive(Debug)]
pub struct BatchEntry {
    pub name: String,
    pub status: BatchStatus,
    pub elapsed: Duration,
    pub output_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Solved { board_height: usize, rotated: usize },
    Unsat,
    Failed(String),
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Solved { .. } => write!(f, "sat"),
            BatchStatus::Unsat => write!(f, "unsat"),
            BatchStatus::Failed(_) => write!(f, "error"),
        }
    }
}

/// Output file name for an instance: `ins-3` becomes `out-3`
pub fn output_file_name(instance_name: &str, format: OutputFormat) -> String {
    let stem = instance_name.strip_prefix("ins-").unwrap_or(instance_name);
    let extension = match format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
    };
    format!("out-{}.{}", stem, extension)
}

/// Solve each named instance on the rayon pool, in input order
pub fn solve_batch(settings: &Settings, instances: &[(String, Instance)]) -> Vec<(String, Result<SearchOutcome>, Duration)> {
    instances
        .par_iter()
        .map(|(name, instance)| {
            let start_time = Instant::now();
            let outcome = PackingProblem::with_instance(settings.clone(), instance.clone())
                .and_then(|mut problem| problem.solve())
                .with_context(|| format!("Failed to solve {}", name));
            (name.clone(), outcome, start_time.elapsed())
        })
        .collect()
}

/// Solve every instance file in `input_dir`, writing one output file per
/// instance to `output_dir`
pub fn solve_directory<P: AsRef<Path>, Q: AsRef<Path>>(
    settings: &Settings,
    input_dir: P,
    output_dir: Q,
) -> Result<Vec<BatchEntry>> {
    let instances = load_instances_from_directory(&input_dir)?;
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    log::info!(
        "Solving {} instances from {} on {} threads",
        instances.len(),
        input_dir.as_ref().display(),
        rayon::current_num_threads()
    );

    let format = settings.output.format;
    let entries = solve_batch(settings, &instances)
        .into_iter()
        .map(|(name, outcome, elapsed)| {
            let path = output_dir.join(output_file_name(&name, format));
            let written = outcome.and_then(|outcome| {
                outcome.save(&path, format)?;
                Ok(outcome)
            });

            let (status, output_file) = match written {
                Ok(SearchOutcome::Sat(solution)) => (
                    BatchStatus::Solved {
                        board_height: solution.board_height,
                        rotated: solution.rotated_count(),
                    },
                    Some(path),
                ),
                Ok(SearchOutcome::Unsat) => (BatchStatus::Unsat, Some(path)),
                Err(e) => {
                    log::warn!("{:#}", e);
                    (BatchStatus::Failed(format!("{:#}", e)), None)
                }
            };

            BatchEntry {
                name,
                status,
                elapsed,
                output_file,
            }
        })
        .collect();

    Ok(entries)
}

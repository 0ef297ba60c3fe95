//! Batch execution of independent scripts
//!
//! Each job gets its own simulation instance and engine. Jobs share nothing,
//! so they may run on any thread in any order; results come back in job order.

use rayon::prelude::*;
use tracing::info;

use super::engine::{EngineConfig, ReplayEngine};
use super::report::ExecutionReport;
use crate::replay::script::Timeline;
use crate::simulation::Simulation;

/// One script queued for batch execution
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Name recorded in the report (usually the script file name)
    pub name: String,
    pub timeline: Timeline,
}

/// Run every job on a fresh simulation from `factory`
///
/// `threads == 0` uses rayon's global pool. Reports are returned in the same
/// order as `jobs`.
pub fn run_batch<S, F>(
    jobs: Vec<BatchJob>,
    config: &EngineConfig,
    threads: usize,
    factory: F,
) -> Result<Vec<ExecutionReport>, rayon::ThreadPoolBuildError>
where
    S: Simulation,
    F: Fn() -> S + Sync + Send,
{
    info!(jobs = jobs.len(), threads, "running replay batch");

    let run = || {
        jobs.into_par_iter()
            .map(|job| {
                let config = EngineConfig {
                    script_name: Some(job.name),
                    ..config.clone()
                };
                ReplayEngine::new(factory(), job.timeline, config).run()
            })
            .collect::<Vec<_>>()
    };

    if threads == 0 {
        return Ok(run());
    }
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    Ok(pool.install(run))
}

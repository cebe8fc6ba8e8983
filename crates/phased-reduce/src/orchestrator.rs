//! Thread lifecycle for the two-phase reduction
//!
//! Every worker runs the same program over its own partition:
//!
//! 1. sum its block and enter the mean barrier
//! 2. with the published mean, sum squared deviations of its block
//! 3. enter the standard deviation barrier
//!
//! Each phase has its own [`PhaseBarrier`], and each barrier is itself
//! generation-tagged, so a fast worker entering phase 2 can never be counted
//! as a phase-1 arrival.

use crate::aggregate::{GlobalAggregator, Phase};
use crate::events::{EventBus, EventHandler, ReductionEvent};
use crate::reducer::LocalReducer;
use num_traits::Zero;
use phased_barrier::{Arrival, PhaseBarrier};
use phased_core::{partition, Error, Partition, ReductionConfig, Result};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, instrument};

/// Final statistics of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
    /// Sequence length
    pub len: usize,
    /// Number of workers that took part
    pub workers: usize,
    /// Worker that finalized the mean
    pub mean_finalizer: usize,
    /// Worker that finalized the standard deviation
    pub std_dev_finalizer: usize,
}

/// What one worker observed during a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerReport {
    pub worker: usize,
    pub partition: Partition,
    pub local_sum: i64,
    pub local_squared_deviations: f64,
    pub mean: Arrival<f64>,
    pub std_dev: Arrival<f64>,
}

/// A summary together with every worker's report, ordered by worker id
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub summary: Summary,
    pub workers: Vec<WorkerReport>,
}

struct Barriers {
    mean: PhaseBarrier<i64, f64>,
    std_dev: PhaseBarrier<f64, f64>,
    timeout: Option<Duration>,
}

impl Barriers {
    fn new(workers: usize, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            mean: PhaseBarrier::new(workers)?,
            std_dev: PhaseBarrier::new(workers)?,
            timeout,
        })
    }
}

fn enter<A, F>(
    barrier: &PhaseBarrier<A, f64>,
    partial: A,
    finalize: F,
    timeout: Option<Duration>,
) -> Result<Arrival<f64>>
where
    A: Zero + AddAssign + Copy,
    F: FnOnce(A) -> f64,
{
    match timeout {
        Some(timeout) => barrier.enter_timeout(partial, finalize, timeout),
        None => Ok(barrier.enter(partial, finalize)),
    }
}

/// Spawns, drives and joins the worker threads of a reduction
#[derive(Debug, Default)]
pub struct Orchestrator {
    config: ReductionConfig,
    events: EventBus,
    spawned: AtomicUsize,
}

impl Orchestrator {
    pub fn new(config: ReductionConfig) -> Self {
        Self {
            config,
            events: EventBus::new(),
            spawned: AtomicUsize::new(0),
        }
    }

    /// Register an observer for subsequent runs
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.events.subscribe(handler);
        self
    }

    pub fn config(&self) -> &ReductionConfig {
        &self.config
    }

    /// Total number of worker threads launched by this orchestrator so far
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Compute mean and standard deviation of `values` with `workers` threads
    pub fn run(&self, values: &[i32], workers: usize) -> Result<Summary> {
        self.run_detailed(values, workers).map(|report| report.summary)
    }

    /// Like [`run`](Self::run), also returning each worker's view of the run
    ///
    /// All validation happens before the first thread is spawned; a rejected
    /// request leaves [`spawned`](Self::spawned) untouched.
    #[instrument(skip(self, values), fields(len = values.len()))]
    pub fn run_detailed(&self, values: &[i32], workers: usize) -> Result<RunReport> {
        self.config.validate(values.len(), workers)?;
        let reducers = partition(values.len(), workers)?
            .into_iter()
            .map(|block| LocalReducer::new(values, block))
            .collect::<Result<Vec<_>>>()?;
        let barriers = Barriers::new(workers, self.config.wait_timeout())?;
        let aggregator = GlobalAggregator::new(values.len());

        self.events.emit(ReductionEvent::RunStarted {
            len: values.len(),
            workers,
        });

        let outcomes: Vec<Result<WorkerReport>> = thread::scope(|s| {
            let handles: Vec<_> = reducers
                .into_iter()
                .enumerate()
                .map(|(worker, reducer)| {
                    let barriers = &barriers;
                    let events = &self.events;
                    self.spawned.fetch_add(1, Ordering::SeqCst);
                    s.spawn(move || run_worker(worker, reducer, aggregator, barriers, events))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(outcome) => outcome,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        });

        let reports = outcomes.into_iter().collect::<Result<Vec<_>>>()?;
        let summary = summarize(&reports, values.len())?;
        debug!(mean = summary.mean, std_dev = summary.std_dev, "workers joined");
        self.events.emit(ReductionEvent::RunCompleted {
            mean: summary.mean,
            std_dev: summary.std_dev,
        });

        Ok(RunReport {
            summary,
            workers: reports,
        })
    }
}

fn run_worker(
    worker: usize,
    reducer: LocalReducer<'_>,
    aggregator: GlobalAggregator,
    barriers: &Barriers,
    events: &EventBus,
) -> Result<WorkerReport> {
    let local_sum = reducer.sum();
    events.emit(ReductionEvent::PartialReady {
        phase: Phase::Mean,
        worker,
        partial: local_sum as f64,
    });
    let mean = enter(
        &barriers.mean,
        local_sum,
        |sum| {
            let mean = aggregator.mean(sum);
            events.emit(ReductionEvent::PhasePublished {
                phase: Phase::Mean,
                worker,
                value: mean,
            });
            mean
        },
        barriers.timeout,
    )?;

    events.emit(ReductionEvent::SecondPassStarted {
        worker,
        mean: mean.published,
    });
    let local_squared_deviations = reducer.squared_deviations(mean.published);
    events.emit(ReductionEvent::PartialReady {
        phase: Phase::StdDev,
        worker,
        partial: local_squared_deviations,
    });
    let std_dev = enter(
        &barriers.std_dev,
        local_squared_deviations,
        |squared| {
            let std_dev = aggregator.std_dev(squared);
            events.emit(ReductionEvent::PhasePublished {
                phase: Phase::StdDev,
                worker,
                value: std_dev,
            });
            std_dev
        },
        barriers.timeout,
    )?;

    Ok(WorkerReport {
        worker,
        partition: reducer.partition(),
        local_sum,
        local_squared_deviations,
        mean,
        std_dev,
    })
}

fn summarize(reports: &[WorkerReport], len: usize) -> Result<Summary> {
    let first = reports
        .first()
        .ok_or_else(|| Error::Execution("no worker reports".to_string()))?;
    Ok(Summary {
        mean: first.mean.published,
        std_dev: first.std_dev.published,
        len,
        workers: reports.len(),
        mean_finalizer: single_finalizer(reports, Phase::Mean)?,
        std_dev_finalizer: single_finalizer(reports, Phase::StdDev)?,
    })
}

fn single_finalizer(reports: &[WorkerReport], phase: Phase) -> Result<usize> {
    let mut finalizers = reports.iter().filter(|r| match phase {
        Phase::Mean => r.mean.is_finalizer,
        Phase::StdDev => r.std_dev.is_finalizer,
    });
    match (finalizers.next(), finalizers.next()) {
        (Some(report), None) => Ok(report.worker),
        _ => Err(Error::Execution(format!(
            "{phase} phase did not have exactly one finalizer"
        ))),
    }
}

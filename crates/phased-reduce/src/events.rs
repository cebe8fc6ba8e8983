//! Observation hooks for reduction runs
//!
//! Handlers registered on an [`Orchestrator`](crate::Orchestrator) see every
//! step of the protocol as it happens, which lets callers log progress or
//! record the exact interleaving of folds and publications.

use crate::aggregate::Phase;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::Level;

/// Step of a reduction run
#[derive(Debug, Clone, PartialEq)]
pub enum ReductionEvent {
    /// Validation passed and workers are about to be spawned
    RunStarted { len: usize, workers: usize },

    /// A worker finished its local computation and is entering the barrier
    PartialReady {
        phase: Phase,
        worker: usize,
        partial: f64,
    },

    /// The last arriver published the phase result
    PhasePublished {
        phase: Phase,
        worker: usize,
        value: f64,
    },

    /// A worker left the phase-1 barrier and starts its second pass
    SecondPassStarted { worker: usize, mean: f64 },

    /// All workers joined
    RunCompleted { mean: f64, std_dev: f64 },
}

/// Receives [`ReductionEvent`]s, possibly from many worker threads at once
pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: &ReductionEvent);
}

/// Fan-out of events to registered handlers
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn emit(&self, event: ReductionEvent) {
        for handler in &self.handlers {
            handler.handle_event(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Forwards events to `tracing`
pub struct LoggingHandler {
    level: Level,
}

impl LoggingHandler {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl EventHandler for LoggingHandler {
    fn handle_event(&self, event: &ReductionEvent) {
        match event {
            ReductionEvent::RunStarted { len, workers } => {
                if self.level <= Level::INFO {
                    tracing::info!(len, workers, "reduction started");
                } else {
                    tracing::debug!(len, workers, "reduction started");
                }
            }
            ReductionEvent::PhasePublished { phase, worker, value } => {
                tracing::debug!(%phase, worker, value, "phase published");
            }
            ReductionEvent::RunCompleted { mean, std_dev } => {
                if self.level <= Level::INFO {
                    tracing::info!(mean, std_dev, "reduction completed");
                } else {
                    tracing::debug!(mean, std_dev, "reduction completed");
                }
            }
            _ => tracing::trace!(?event, "reduction event"),
        }
    }
}

/// Keeps every event in arrival order
#[derive(Debug, Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<ReductionEvent>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReductionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventHandler for RecordingHandler {
    fn handle_event(&self, event: &ReductionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

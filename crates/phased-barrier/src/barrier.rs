//! Folding rendezvous barrier
//!
//! A [`PhaseBarrier`] is entered by a fixed number of participants per
//! phase. Each participant folds a partial value into a shared accumulator;
//! the last one to arrive turns the accumulator into the phase's published
//! result and releases everybody else, who all observe that same result.
//!
//! Phases are numbered by a generation counter. A waiter remembers the
//! generation it joined and keeps waiting until exactly that generation has
//! been finalized, so spurious wakeups and participants that race ahead into
//! the next phase cannot be mistaken for the release of the current one.

use num_traits::Zero;
use phased_core::{Error, Result};
use std::ops::AddAssign;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// What a participant learns when it leaves [`PhaseBarrier::enter`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrival<R> {
    /// True for the single participant per phase that ran the finalizer
    pub is_finalizer: bool,
    /// The phase's published result, identical for every participant
    pub published: R,
    /// Zero-based number of the phase this arrival belonged to
    pub generation: u64,
}

#[derive(Debug)]
struct PhaseState<A, R> {
    accumulator: A,
    arrived: usize,
    generation: u64,
    published: Option<R>,
    broken: Option<String>,
}

/// Reusable barrier that folds `A` contributions into a published `R`
#[derive(Debug)]
pub struct PhaseBarrier<A, R> {
    participants: usize,
    state: Mutex<PhaseState<A, R>>,
    released: Condvar,
}

impl<A, R> PhaseBarrier<A, R>
where
    A: Zero + AddAssign + Copy,
    R: Clone,
{
    /// Create a barrier for `participants` threads per phase
    pub fn new(participants: usize) -> Result<Self> {
        if participants == 0 {
            return Err(Error::no_workers());
        }
        Ok(Self {
            participants,
            state: Mutex::new(PhaseState {
                accumulator: A::zero(),
                arrived: 0,
                generation: 0,
                published: None,
                broken: None,
            }),
            released: Condvar::new(),
        })
    }

    /// Number of arrivals that complete a phase
    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Number of phases finalized so far
    pub fn generation(&self) -> u64 {
        self.lock_state().generation
    }

    /// True once a timed-out waiter or a panicking finalizer abandoned the barrier
    pub fn is_broken(&self) -> bool {
        self.lock_state().broken.is_some()
    }

    /// Fold `partial` in and block until the current phase is finalized
    ///
    /// The last participant to arrive calls `finalize` with the fully folded
    /// accumulator and returns immediately; everyone else waits for it.
    ///
    /// # Panics
    ///
    /// Panics if the barrier is broken or if a waiter finds its generation
    /// overtaken by a later one. An extra participant beyond the configured
    /// count is not detected: it is counted into the next generation and
    /// blocks until that generation fills up.
    pub fn enter<F>(&self, partial: A, finalize: F) -> Arrival<R>
    where
        F: FnOnce(A) -> R,
    {
        match self.arrive(partial, finalize, None) {
            Ok(arrival) => arrival,
            Err(e) => panic!("phase barrier protocol violation: {e}"),
        }
    }

    /// Like [`enter`](Self::enter), but give up after `timeout`
    ///
    /// A waiter that times out breaks the barrier: it and every current or
    /// future participant get [`Error::BarrierBroken`], and the partially
    /// folded accumulator is never published.
    pub fn enter_timeout<F>(&self, partial: A, finalize: F, timeout: Duration) -> Result<Arrival<R>>
    where
        F: FnOnce(A) -> R,
    {
        self.arrive(partial, finalize, Some(Instant::now() + timeout))
    }

    fn arrive<F>(&self, partial: A, finalize: F, deadline: Option<Instant>) -> Result<Arrival<R>>
    where
        F: FnOnce(A) -> R,
    {
        let mut state = self.state.lock().map_err(poisoned)?;
        if let Some(reason) = &state.broken {
            return Err(Error::BarrierBroken(reason.clone()));
        }

        state.accumulator += partial;
        state.arrived += 1;
        let generation = state.generation;
        trace!(generation, arrived = state.arrived, participants = self.participants, "arrival");

        if state.arrived == self.participants {
            return self.finalize_phase(state, finalize);
        }

        while state.generation == generation && state.broken.is_none() {
            state = match deadline {
                None => self.released.wait(state).map_err(poisoned)?,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        let reason = format!(
                            "timed out in generation {generation} with {} of {} arrivals",
                            state.arrived, self.participants
                        );
                        debug!(generation, "{reason}");
                        state.broken = Some(reason.clone());
                        self.released.notify_all();
                        return Err(Error::BarrierBroken(reason));
                    }
                    self.released
                        .wait_timeout(state, deadline - now)
                        .map_err(poisoned)?
                        .0
                }
            };
        }

        // A later generation may already have broken; ours still completed
        if state.generation == generation {
            let reason = state.broken.clone().unwrap_or_default();
            return Err(Error::BarrierBroken(reason));
        }
        if state.generation != generation + 1 {
            return Err(Error::Execution(format!(
                "generation {generation} was overtaken by generation {} before its waiters left",
                state.generation
            )));
        }

        let published = state
            .published
            .clone()
            .ok_or_else(|| Error::Execution(format!("generation {generation} published nothing")))?;
        Ok(Arrival {
            is_finalizer: false,
            published,
            generation,
        })
    }

    fn finalize_phase<F>(
        &self,
        mut state: MutexGuard<'_, PhaseState<A, R>>,
        finalize: F,
    ) -> Result<Arrival<R>>
    where
        F: FnOnce(A) -> R,
    {
        let generation = state.generation;
        let accumulated = state.accumulator;

        let published = match panic::catch_unwind(AssertUnwindSafe(|| finalize(accumulated))) {
            Ok(published) => published,
            Err(payload) => {
                state.broken = Some(format!("finalizer of generation {generation} panicked"));
                self.released.notify_all();
                drop(state);
                panic::resume_unwind(payload);
            }
        };

        state.published = Some(published.clone());
        state.accumulator = A::zero();
        state.arrived = 0;
        state.generation += 1;
        debug!(generation, participants = self.participants, "phase finalized");
        self.released.notify_all();

        Ok(Arrival {
            is_finalizer: true,
            published,
            generation,
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, PhaseState<A, R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> Error {
    Error::BarrierBroken("lock poisoned by a panicking participant".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_single_participant_always_finalizes() {
        let barrier: PhaseBarrier<i64, f64> = PhaseBarrier::new(1).unwrap();
        for round in 0..3 {
            let arrival = barrier.enter(10, |sum| sum as f64 / 4.0);
            assert!(arrival.is_finalizer);
            assert_relative_eq!(arrival.published, 2.5);
            assert_eq!(arrival.generation, round);
        }
        assert_eq!(barrier.generation(), 3);
    }

    #[test]
    fn test_zero_participants_rejected() {
        assert!(PhaseBarrier::<i64, i64>::new(0).is_err());
    }

    #[test]
    fn test_everyone_sees_the_same_result() {
        let barrier: PhaseBarrier<i64, i64> = PhaseBarrier::new(4).unwrap();
        let finalizations = AtomicUsize::new(0);

        let arrivals: Vec<Arrival<i64>> = thread::scope(|s| {
            let handles: Vec<_> = (1..=4)
                .map(|i| {
                    let barrier = &barrier;
                    let finalizations = &finalizations;
                    s.spawn(move || {
                        barrier.enter(i, |sum| {
                            finalizations.fetch_add(1, Ordering::SeqCst);
                            sum * 100
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(finalizations.load(Ordering::SeqCst), 1);
        assert_eq!(arrivals.iter().filter(|a| a.is_finalizer).count(), 1);
        assert!(arrivals.iter().all(|a| a.published == 1_000 && a.generation == 0));
    }

    #[test]
    fn test_timeout_breaks_barrier() {
        let barrier: PhaseBarrier<f64, f64> = PhaseBarrier::new(2).unwrap();
        let err = barrier
            .enter_timeout(1.0, |sum| sum, Duration::from_millis(20))
            .unwrap_err();
        assert!(matches!(err, Error::BarrierBroken(_)));
        assert!(barrier.is_broken());

        // Late arrivals never see the half-folded accumulator
        let late = barrier.enter_timeout(1.0, |sum| sum, Duration::from_millis(20));
        assert!(matches!(late, Err(Error::BarrierBroken(_))));
        assert_eq!(barrier.generation(), 0);
    }

    #[test]
    #[should_panic(expected = "protocol violation")]
    fn test_enter_on_broken_barrier_panics() {
        let barrier: PhaseBarrier<i64, i64> = PhaseBarrier::new(2).unwrap();
        let _ = barrier.enter_timeout(1, |sum| sum, Duration::from_millis(1));
        barrier.enter(1, |sum| sum);
    }
}

//! Timer-driven stand-in for a live detection feed.
//!
//! While running, the driver toggles one random spot of the engine's
//! current location every interval. It reads the live mapping on each tick,
//! so a location switch takes effect from the next tick.
//!
//! # Cancellation
//!
//! Each tick re-checks a cancellation flag while holding the engine lock.
//! [`SimulationDriver::stop`] raises the flag, aborts the task and then
//! takes the engine lock once, so a tick that was already mid-toggle has
//! finished and no toggle can happen after `stop` returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::occupancy::{lock_engine, SharedEngine};

/// Default period between simulated occupancy changes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);

struct RunningSimulation {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

pub struct SimulationDriver {
    engine: SharedEngine,
    interval: Duration,
    seed: Option<u64>,
    runs: u64,
    active: Option<RunningSimulation>,
}

impl std::fmt::Debug for SimulationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationDriver")
            .field("interval", &self.interval)
            .field("seed", &self.seed)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl SimulationDriver {
    /// Create a stopped driver. A `seed` makes every run reproducible; without
    /// one each run draws from OS entropy.
    #[must_use]
    pub fn new(engine: SharedEngine, interval: Duration, seed: Option<u64>) -> Self {
        Self {
            engine,
            interval: interval.max(Duration::from_millis(1)),
            seed,
            runs: 0,
            active: None,
        }
    }

    /// Begin toggling. Returns `false` if already running; a second timer is
    /// never started.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) -> bool {
        if self.active.is_some() {
            return false;
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.runs)),
            None => StdRng::from_os_rng(),
        };
        self.runs += 1;

        let cancelled = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run_ticks(
            Arc::clone(&self.engine),
            self.interval,
            Arc::clone(&cancelled),
            rng,
        ));
        self.active = Some(RunningSimulation { cancelled, task });

        tracing::info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "simulation started"
        );
        true
    }

    /// Halt toggling. Returns `false` if it was not running.
    pub fn stop(&mut self) -> bool {
        let Some(run) = self.active.take() else {
            return false;
        };

        run.cancelled.store(true, Ordering::SeqCst);
        run.task.abort();
        // Wait out a tick that holds the lock right now.
        drop(lock_engine(&self.engine));

        tracing::info!("simulation stopped");
        true
    }

    /// Stop if running, start otherwise. Returns the new running state.
    pub fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.stop();
            false
        } else {
            self.start()
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for SimulationDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticks(
    engine: SharedEngine,
    period: Duration,
    cancelled: Arc<AtomicBool>,
    mut rng: StdRng,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !tick(&engine, &cancelled, &mut rng) {
            break;
        }
    }
}

/// Apply one simulated change. Returns `false` once the run is cancelled.
fn tick(engine: &SharedEngine, cancelled: &AtomicBool, rng: &mut StdRng) -> bool {
    let mut engine = lock_engine(engine);
    if cancelled.load(Ordering::SeqCst) {
        return false;
    }

    match engine.toggle_random_spot(rng) {
        Some((spot, status)) => {
            tracing::debug!(
                location = engine.location_id().unwrap_or_default(),
                %spot,
                %status,
                "simulated occupancy change"
            );
        }
        None => tracing::debug!("simulation tick skipped: no spots in current location"),
    }
    true
}

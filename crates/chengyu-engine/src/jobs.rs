//! Periodic maintenance jobs
//!
//! Background threads that sweep idle sessions to `Expired` and refresh
//! every leaderboard bucket on a fixed interval. Both jobs are
//! idempotent, so an overlapping or repeated run is harmless.

use crate::service::GameService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Sleep quantum between stop-flag checks
const TICK: Duration = Duration::from_millis(50);

/// Owns the background job threads and their shared stop flag.
///
/// Dropping the runner stops every job and joins its thread.
pub struct JobRunner {
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            handles: Vec::new(),
        }
    }

    /// Spawn the idle-session expiry sweep on `interval`
    pub fn spawn_expiry_sweep(&mut self, service: Arc<GameService>, interval: Duration) {
        self.spawn("expiry sweep", interval, move || {
            let expired = service.expire_stale();
            if expired > 0 {
                log::info!("expiry sweep closed {expired} idle session(s)");
            }
        });
    }

    /// Spawn the full leaderboard refresh on `interval`
    pub fn spawn_leaderboard_refresh(&mut self, service: Arc<GameService>, interval: Duration) {
        self.spawn("leaderboard refresh", interval, move || {
            let buckets = service.recompute_leaderboards();
            log::debug!("leaderboard refresh recomputed {buckets} bucket(s)");
        });
    }

    fn spawn<F>(&mut self, name: &'static str, interval: Duration, mut job: F)
    where
        F: FnMut() + Send + 'static,
    {
        let stop = self.stop.clone();
        let handle = std::thread::spawn(move || {
            log::debug!("{name} started, interval {interval:?}");
            let mut next_run = Instant::now() + interval;
            while !stop.load(Ordering::Relaxed) {
                if Instant::now() >= next_run {
                    job();
                    next_run = Instant::now() + interval;
                }
                // Short quanta so stop() is honored promptly even on long
                // intervals
                std::thread::sleep(TICK.min(interval));
            }
            log::debug!("{name} stopped");
        });
        self.handles.push(handle);
    }

    /// Signal every job to stop and join the threads
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::warn!("background job panicked");
            }
        }
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JobRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

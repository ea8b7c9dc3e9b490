//! Progress reporting for registration runs.
//!
//! A [`ProgressTracker`] fans each optimizer iteration out to the registered
//! [`ProgressCallback`]s.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Snapshot of one optimizer iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInfo {
    /// Resolution level, 0 being the coarsest.
    pub level: usize,
    /// Iteration within the level, starting at 1.
    pub iteration: usize,
    /// Iteration limit of the level.
    pub max_iterations: usize,
    /// Cost at this iteration.
    pub cost: f64,
    /// Step length used after this iteration.
    pub learning_rate: f64,
    /// Time since the run started.
    pub elapsed: Duration,
}

impl ProgressInfo {
    pub fn new(
        level: usize,
        iteration: usize,
        max_iterations: usize,
        cost: f64,
        learning_rate: f64,
        elapsed: Duration,
    ) -> Self {
        Self {
            level,
            iteration,
            max_iterations,
            cost,
            learning_rate,
            elapsed,
        }
    }

    /// Share of the level's iteration budget consumed, in percent.
    pub fn progress_percent(&self) -> f64 {
        if self.max_iterations == 0 {
            return 100.0;
        }
        (self.iteration as f64 / self.max_iterations as f64) * 100.0
    }
}

/// Receives registration progress. Implementations must be cheap; they run
/// inside the optimization loop.
pub trait ProgressCallback: Send + Sync {
    /// Called after each iteration.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called when registration starts.
    fn on_start(&self) {}

    /// Called when registration finishes with its final cost.
    fn on_complete(&self, _iterations: usize, _final_cost: f64, _elapsed: Duration) {}

    /// Called when registration fails.
    fn on_error(&self, _error: &str) {}
}

/// Logs progress through `tracing` every `log_interval` iterations.
#[derive(Debug, Clone)]
pub struct TracingProgressCallback {
    pub log_interval: usize,
}

impl Default for TracingProgressCallback {
    fn default() -> Self {
        Self { log_interval: 25 }
    }
}

impl TracingProgressCallback {
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
        }
    }
}

impl ProgressCallback for TracingProgressCallback {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.iteration % self.log_interval == 0 || info.iteration == info.max_iterations {
            tracing::info!(
                "Level {} iter {}/{} ({:.1}%) | Cost: {:.6} | Step: {:.2e} | Elapsed: {:.2}s",
                info.level,
                info.iteration,
                info.max_iterations,
                info.progress_percent(),
                info.cost,
                info.learning_rate,
                info.elapsed.as_secs_f64()
            );
        }
    }

    fn on_start(&self) {
        tracing::info!("Registration started");
    }

    fn on_complete(&self, iterations: usize, final_cost: f64, elapsed: Duration) {
        tracing::info!(
            "Registration completed in {:.2}s after {} iterations, final cost {:.6}",
            elapsed.as_secs_f64(),
            iterations,
            final_cost
        );
    }

    fn on_error(&self, error: &str) {
        tracing::error!("Registration failed: {}", error);
    }
}

/// Records every iteration for later inspection.
#[derive(Debug, Clone, Default)]
pub struct HistoryCallback {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl HistoryCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded iterations.
    pub fn history(&self) -> Vec<ProgressInfo> {
        lock(&self.history).clone()
    }

    /// Recorded costs in iteration order.
    pub fn costs(&self) -> Vec<f64> {
        lock(&self.history).iter().map(|i| i.cost).collect()
    }

    pub fn clear(&self) {
        lock(&self.history).clear();
    }
}

impl ProgressCallback for HistoryCallback {
    fn on_progress(&self, info: &ProgressInfo) {
        lock(&self.history).push(info.clone());
    }
}

/// Dispatches progress to a set of callbacks.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    callbacks: Vec<Arc<dyn ProgressCallback>>,
    start_time: Arc<Mutex<Option<Instant>>>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_callback(&mut self, callback: Arc<dyn ProgressCallback>) {
        self.callbacks.push(callback);
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Start the clock and notify callbacks.
    pub fn start(&self) {
        *lock(&self.start_time) = Some(Instant::now());
        for callback in &self.callbacks {
            callback.on_start();
        }
    }

    /// Time since [`ProgressTracker::start`].
    pub fn elapsed(&self) -> Duration {
        lock(&self.start_time).map(|t| t.elapsed()).unwrap_or(Duration::ZERO)
    }

    pub fn update(&self, level: usize, iteration: usize, max_iterations: usize, cost: f64, learning_rate: f64) {
        if self.callbacks.is_empty() {
            return;
        }
        let info = ProgressInfo::new(level, iteration, max_iterations, cost, learning_rate, self.elapsed());
        for callback in &self.callbacks {
            callback.on_progress(&info);
        }
    }

    pub fn complete(&self, iterations: usize, final_cost: f64) {
        let elapsed = self.elapsed();
        for callback in &self.callbacks {
            callback.on_complete(iterations, final_cost, elapsed);
        }
    }

    pub fn error(&self, error: &str) {
        for callback in &self.callbacks {
            callback.on_error(error);
        }
    }
}

// Poisoned locks are recovered; the guarded data is always valid.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        let info = ProgressInfo::new(0, 10, 100, 0.5, 1.0, Duration::from_secs(1));
        assert_eq!(info.progress_percent(), 10.0);
    }

    #[test]
    fn test_history_callback() {
        let callback = HistoryCallback::new();
        callback.on_progress(&ProgressInfo::new(0, 1, 10, -0.5, 1.0, Duration::ZERO));
        callback.on_progress(&ProgressInfo::new(0, 2, 10, -0.6, 1.0, Duration::ZERO));

        let history = callback.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].iteration, 2);
        assert_eq!(callback.costs(), vec![-0.5, -0.6]);

        callback.clear();
        assert!(callback.history().is_empty());
    }

    #[test]
    fn test_tracker_fans_out() {
        let history = Arc::new(HistoryCallback::new());
        let mut tracker = ProgressTracker::new();
        tracker.add_callback(history.clone());
        tracker.add_callback(Arc::new(TracingProgressCallback::new(1)));

        tracker.start();
        tracker.update(1, 1, 5, 0.4, 0.5);
        tracker.update(1, 2, 5, 0.3, 0.5);
        tracker.complete(2, 0.3);

        let recorded = history.history();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].level, 1);
        assert_eq!(recorded[1].learning_rate, 0.5);
    }
}

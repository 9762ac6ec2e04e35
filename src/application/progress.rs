use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::ProgressSample;

/// Settings for the simulated progress shown while the service converts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Milliseconds between two samples (default: 500)
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Highest value reported before the real result is known (default: 90)
    #[serde(default = "default_ceiling")]
    pub ceiling: f32,

    /// Upper bound of the random increment per tick (default: 10)
    #[serde(default = "default_max_step")]
    pub max_step: f32,
}

fn default_tick_ms() -> u64 {
    500
}

fn default_ceiling() -> f32 {
    90.0
}

fn default_max_step() -> f32 {
    10.0
}

/// Highest ceiling accepted from configuration
pub const MAX_CEILING: f32 = 90.0;

impl ProgressConfig {
    /// Ceiling kept within `0..=90` and a finite, non-negative step
    fn bounded(self) -> Self {
        let ceiling = if self.ceiling.is_finite() {
            self.ceiling.clamp(0.0, MAX_CEILING)
        } else {
            MAX_CEILING
        };
        let max_step = if self.max_step.is_finite() {
            self.max_step.max(0.0)
        } else {
            default_max_step()
        };

        Self {
            tick_ms: self.tick_ms,
            ceiling,
            max_step,
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            ceiling: default_ceiling(),
            max_step: default_max_step(),
        }
    }
}

/// Publishes an approximate completion value while a request is in flight.
///
/// The remote service reports no progress of its own, so ticks add a random
/// step and stop climbing at the ceiling. Only [`ProgressEstimator::complete`]
/// moves the value past it.
pub struct ProgressEstimator {
    config: ProgressConfig,
    sender: Arc<watch::Sender<ProgressSample>>,
}

impl ProgressEstimator {
    pub fn new(config: ProgressConfig) -> Self {
        let (sender, _) = watch::channel(ProgressSample::default());
        Self {
            config: config.bounded(),
            sender: Arc::new(sender),
        }
    }

    pub fn current(&self) -> ProgressSample {
        *self.sender.borrow()
    }

    /// Resets the value to 0 and starts ticking
    pub fn start(&self) -> ProgressHandle {
        self.sender.send_replace(ProgressSample::default());

        let token = CancellationToken::new();
        let task = tokio::spawn(tick_loop(
            self.config.clone(),
            Arc::clone(&self.sender),
            token.clone(),
        ));

        ProgressHandle {
            token,
            task: Some(task),
        }
    }

    /// Final jump to 100 once the real result is in
    pub fn complete(&self) {
        self.sender.send_replace(ProgressSample::COMPLETE);
    }
}

async fn tick_loop(
    config: ProgressConfig,
    sender: Arc<watch::Sender<ProgressSample>>,
    token: CancellationToken,
) {
    let mut rng = StdRng::from_entropy();
    let mut ticker = tokio::time::interval(Duration::from_millis(config.tick_ms.max(1)));
    // interval fires right away; the first sample comes one period later
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let step = rng.gen_range(0.0..=config.max_step);
                let mut reached_ceiling = false;
                sender.send_if_modified(|sample| {
                    if sample.0 >= config.ceiling {
                        reached_ceiling = true;
                        return false;
                    }
                    sample.0 = (sample.0 + step).min(config.ceiling);
                    reached_ceiling = sample.0 >= config.ceiling;
                    true
                });
                if reached_ceiling {
                    break;
                }
            }
        }
    }
}

/// Running estimator task; stopping it is idempotent and also happens on drop
#[derive(Debug, Default)]
pub struct ProgressHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ProgressHandle {
    pub fn stop(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

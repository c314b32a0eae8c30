//! Biometric snapshot model and the simulated live feed.
//!
//! There is no real sensor. A [`BiometricSource`] produces each next
//! snapshot from the current one; [`JitterSource`] is the random-walk
//! implementation used in production, and can be seeded for tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::logging;

pub const DEFAULT_TICK: Duration = Duration::from_secs(3);
pub const DAILY_WATER_TARGET_OZ: f64 = 80.0;

const MAX_STEP_INCREMENT: u32 = 4;
const HEART_RATE_FLOOR: u32 = 60;
const HEART_RATE_SPREAD: u32 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricSnapshot {
    pub steps: u32,
    pub sleep_hours: f64,
    /// Ounces
    pub water_intake: f64,
    /// 0-100
    pub energy_score: u8,
    pub heart_rate: u32,
}

impl Default for BiometricSnapshot {
    fn default() -> Self {
        Self {
            steps: 4230,
            sleep_hours: 6.5,
            water_intake: 24.0,
            energy_score: 72,
            heart_rate: 68,
        }
    }
}

impl BiometricSnapshot {
    /// Ounces still to drink to reach the daily target, never negative
    pub fn hydration_gap_oz(&self) -> f64 {
        (DAILY_WATER_TARGET_OZ - self.water_intake).max(0.0)
    }

    pub fn with_energy_score(mut self, score: u8) -> Self {
        self.energy_score = score.min(100);
        self
    }

    /// Pull out-of-range manual edits back inside the valid ranges
    fn clamp_to_valid(&mut self) {
        self.energy_score = self.energy_score.min(100);
        self.sleep_hours = self.sleep_hours.max(0.0);
        self.water_intake = self.water_intake.max(0.0);
        self.heart_rate = self.heart_rate.max(1);
    }
}

/// Anything that can produce the next reading from the current one.
pub trait BiometricSource: Send + 'static {
    fn next_snapshot(&mut self, current: &BiometricSnapshot) -> BiometricSnapshot;
}

/// Random jitter: steps creep up by 0..=4, heart rate is redrawn in 60..=79.
/// Every other field carries over unchanged.
pub struct JitterSource<R: Rng + Send + 'static = StdRng> {
    rng: R,
}

impl JitterSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl<R: Rng + Send + 'static> JitterSource<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send + 'static> BiometricSource for JitterSource<R> {
    fn next_snapshot(&mut self, current: &BiometricSnapshot) -> BiometricSnapshot {
        BiometricSnapshot {
            steps: current.steps.saturating_add(self.rng.random_range(0..=MAX_STEP_INCREMENT)),
            heart_rate: HEART_RATE_FLOOR + self.rng.random_range(0..=HEART_RATE_SPREAD),
            ..*current
        }
    }
}

/// A running feed. Readers subscribe to a watch channel; the ticking task is
/// aborted by [`BiometricFeed::stop`] or when the feed is dropped.
pub struct BiometricFeed {
    state: Arc<watch::Sender<BiometricSnapshot>>,
    task: Option<JoinHandle<()>>,
}

impl BiometricFeed {
    /// Begin ticking every `period`. The first tick happens one full period
    /// after start. Must be called from within a tokio runtime.
    pub fn start<S: BiometricSource>(initial: BiometricSnapshot, period: Duration, mut source: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        let state = Arc::new(tx);
        let ticker = Arc::clone(&state);

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                ticker.send_modify(|snapshot| *snapshot = source.next_snapshot(snapshot));
            }
        });

        logging::log_feed(&format!("Biometric feed started (every {:?})", period));

        Self { state, task: Some(task) }
    }

    pub fn current(&self) -> BiometricSnapshot {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<BiometricSnapshot> {
        self.state.subscribe()
    }

    /// Apply a manual change (logged water, a new sleep figure, ...).
    /// The result is clamped back into valid ranges.
    pub fn update(&self, f: impl FnOnce(&mut BiometricSnapshot)) {
        self.state.send_modify(|snapshot| {
            f(snapshot);
            snapshot.clamp_to_valid();
        });
    }

    /// Cancel the recurring perturbation. The last snapshot stays readable.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            logging::log_feed("Biometric feed stopped");
        }
    }
}

impl Drop for BiometricFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic source: adds a fixed step count, leaves the rest alone.
    struct StepCounter(u32);

    impl BiometricSource for StepCounter {
        fn next_snapshot(&mut self, current: &BiometricSnapshot) -> BiometricSnapshot {
            BiometricSnapshot { steps: current.steps + self.0, ..*current }
        }
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let mut source = JitterSource::seeded(7);
        let start = BiometricSnapshot::default();
        let mut snapshot = start;

        for n in 1..=500u32 {
            snapshot = source.next_snapshot(&snapshot);
            assert!(snapshot.steps >= 4230 && snapshot.steps <= 4230 + 4 * n);
            assert!((60..=79).contains(&snapshot.heart_rate));
            assert_eq!(snapshot.sleep_hours, start.sleep_hours);
            assert_eq!(snapshot.water_intake, start.water_intake);
            assert_eq!(snapshot.energy_score, start.energy_score);
        }
    }

    #[test]
    fn test_seeded_sources_agree() {
        let mut a = JitterSource::seeded(42);
        let mut b = JitterSource::seeded(42);
        let mut sa = BiometricSnapshot::default();
        let mut sb = sa;
        for _ in 0..20 {
            sa = a.next_snapshot(&sa);
            sb = b.next_snapshot(&sb);
        }
        assert_eq!(sa, sb);
    }

    #[test]
    fn test_hydration_gap() {
        assert_eq!(BiometricSnapshot::default().hydration_gap_oz(), 56.0);
        let full = BiometricSnapshot { water_intake: 96.0, ..Default::default() };
        assert_eq!(full.hydration_gap_oz(), 0.0);
    }

    #[test]
    fn test_energy_score_is_clamped() {
        assert_eq!(BiometricSnapshot::default().with_energy_score(250).energy_score, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_ticks_on_period() {
        let feed = BiometricFeed::start(BiometricSnapshot::default(), DEFAULT_TICK, StepCounter(1));
        let mut rx = feed.subscribe();

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(feed.current().steps, 4230);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().steps, 4231);

        rx.changed().await.unwrap();
        assert_eq!(feed.current().steps, 4232);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_freezes_snapshot() {
        let mut feed = BiometricFeed::start(BiometricSnapshot::default(), DEFAULT_TICK, JitterSource::seeded(3));
        let mut rx = feed.subscribe();
        rx.changed().await.unwrap();

        feed.stop();
        let frozen = feed.current();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(!rx.has_changed().unwrap());
        assert_eq!(feed.current(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_tears_down_ticker() {
        let feed = BiometricFeed::start(BiometricSnapshot::default(), DEFAULT_TICK, StepCounter(1));
        let mut rx = feed.subscribe();

        drop(feed);
        tokio::time::sleep(Duration::from_secs(30)).await;

        // The ticker owned the last sender; once aborted the channel closes
        // without ever publishing.
        assert!(rx.changed().await.is_err());
        assert_eq!(rx.borrow().steps, 4230);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_clamps_out_of_range_edits() {
        let feed = BiometricFeed::start(BiometricSnapshot::default(), DEFAULT_TICK, StepCounter(0));
        feed.update(|s| {
            s.energy_score = 180;
            s.water_intake -= 500.0;
            s.sleep_hours = -2.0;
        });

        let snapshot = feed.current();
        assert_eq!(snapshot.energy_score, 100);
        assert_eq!(snapshot.water_intake, 0.0);
        assert_eq!(snapshot.sleep_hours, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_update_survives_ticks() {
        let feed = BiometricFeed::start(BiometricSnapshot::default(), DEFAULT_TICK, JitterSource::seeded(11));
        feed.update(|s| {
            s.water_intake += 12.0;
            s.sleep_hours = 7.25;
        });

        let mut rx = feed.subscribe();
        rx.changed().await.unwrap();

        let snapshot = feed.current();
        assert_eq!(snapshot.water_intake, 36.0);
        assert_eq!(snapshot.sleep_hours, 7.25);
    }
}

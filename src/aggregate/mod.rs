//! Rolling window over recent readings.
//!
//! The window is pruned lazily on every access; there is no background timer.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::telemetry::{PowerState, Reading, TimedReading};

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(300);

/// Smoothed view of the window.
///
/// Both fields are `None` when the window holds nothing, which keeps "no
/// recent data" apart from a genuine all-zero reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    /// Highest power state seen and the mean of every numeric field
    pub average: Option<Reading>,
    /// Most recently recorded reading
    pub latest: Option<TimedReading>,
    /// Readings the average was taken over
    pub samples: usize,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// The charger was tracking the panel's power point at some point in the window
    pub fn is_charging(&self) -> bool {
        self.average.is_some_and(|avg| avg.power_state == PowerState::Mppt)
    }
}

pub struct Aggregator {
    window: Mutex<VecDeque<TimedReading>>,
    retention: chrono::Duration,
}

impl Aggregator {
    pub fn new(retention: Duration) -> Self {
        let retention = chrono::Duration::from_std(retention).unwrap_or_else(|_| {
            log::warn!("Retention {:?} out of range, using {:?}", retention, DEFAULT_WINDOW);
            chrono::Duration::seconds(DEFAULT_WINDOW.as_secs() as i64)
        });
        Self {
            window: Mutex::new(VecDeque::new()),
            retention,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<TimedReading>> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prune(&self, window: &mut VecDeque<TimedReading>, now: DateTime<Utc>) {
        let limit = now - self.retention;
        while window.front().is_some_and(|r| r.received_at < limit) {
            window.pop_front();
        }
    }

    /// Record a reading received just now
    pub fn record(&self, reading: Reading) {
        self.insert(TimedReading::now(reading));
    }

    /// Record a reading as if `received_at` were the current time
    pub fn record_at(&self, reading: Reading, received_at: DateTime<Utc>) {
        self.insert_at(TimedReading::new(reading, received_at), received_at);
    }

    /// Append an already stamped reading. Stamps are expected in arrival order.
    pub fn insert(&self, timed: TimedReading) {
        self.insert_at(timed, Utc::now());
    }

    fn insert_at(&self, timed: TimedReading, now: DateTime<Utc>) {
        let mut window = self.lock();
        window.push_back(timed);
        self.prune(&mut window, now);
    }

    pub fn summarize(&self) -> Summary {
        self.summarize_at(Utc::now())
    }

    pub fn summarize_at(&self, now: DateTime<Utc>) -> Summary {
        let mut window = self.lock();
        self.prune(&mut window, now);

        let Some(latest) = window.back().copied() else {
            return Summary::default();
        };

        let mut avg = Reading::default();
        for timed in window.iter() {
            let r = &timed.reading;
            avg.power_state = avg.power_state.max(r.power_state);
            avg.ps_volts += r.ps_volts;
            avg.battery_volts += r.battery_volts;
            avg.charge_amps += r.charge_amps;
            avg.solar_volts += r.solar_volts;
            avg.charge_power += r.charge_power;
            avg.temp_f += r.temp_f;
        }

        let n = window.len() as f64;
        avg.ps_volts /= n;
        avg.battery_volts /= n;
        avg.charge_amps /= n;
        avg.solar_volts /= n;
        avg.charge_power /= n;
        avg.temp_f /= n;

        Summary {
            average: Some(avg),
            latest: Some(latest),
            samples: window.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Feed every queued reading into `aggregator` until the session closes the
/// queue. Returns how many readings were recorded.
pub async fn consume(mut readings: mpsc::Receiver<TimedReading>, aggregator: &Aggregator) -> usize {
    let mut count = 0;
    while let Some(timed) = readings.recv().await {
        aggregator.insert(timed);
        count += 1;
    }
    log::info!("Reading queue closed after {} readings", count);
    count
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn battery(volts: f64) -> Reading {
        Reading { battery_volts: volts, ..Reading::default() }
    }

    #[test]
    fn test_mean_of_two() {
        let agg = Aggregator::default();
        agg.record_at(battery(12.0), at(0));
        agg.record_at(battery(14.0), at(1));
        let summary = agg.summarize_at(at(2));
        assert_eq!(summary.average.unwrap().battery_volts, 13.0);
        assert_eq!(summary.samples, 2);
    }

    #[test]
    fn test_window_prunes_old_entries() {
        let agg = Aggregator::default();
        agg.record_at(battery(10.0), at(0));
        agg.record_at(battery(12.0), at(100));
        agg.record_at(battery(14.0), at(250));

        let summary = agg.summarize_at(at(310));
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.average.unwrap().battery_volts, 13.0);
        let latest = summary.latest.unwrap();
        assert_eq!(latest.received_at, at(250));
        assert_eq!(latest.reading.battery_volts, 14.0);
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn test_empty_window_has_no_data() {
        let agg = Aggregator::default();
        let summary = agg.summarize_at(at(0));
        assert!(summary.is_empty());
        assert!(summary.average.is_none());
        assert!(summary.latest.is_none());
        assert!(!summary.is_charging());
    }

    #[test]
    fn test_stale_window_empties() {
        let agg = Aggregator::default();
        agg.record_at(battery(12.0), at(0));
        assert!(agg.summarize_at(at(301)).is_empty());
        assert!(agg.is_empty());
    }

    #[test]
    fn test_record_stamps_with_current_time() {
        let agg = Aggregator::default();
        let before = Utc::now();
        agg.record(battery(12.5));

        let summary = agg.summarize();
        assert_eq!(summary.samples, 1);
        assert_eq!(summary.average.unwrap().battery_volts, 12.5);
        let latest = summary.latest.unwrap();
        assert!(latest.received_at >= before);
        assert!(latest.received_at <= Utc::now());
    }

    #[test]
    fn test_insert_drops_readings_older_than_window() {
        let agg = Aggregator::default();
        let now = Utc::now();
        agg.insert(TimedReading::new(battery(11.0), now - chrono::Duration::seconds(700)));
        agg.insert(TimedReading::new(battery(12.0), now - chrono::Duration::seconds(400)));
        assert_eq!(agg.len(), 0);
        assert!(agg.is_empty());

        agg.insert(TimedReading::new(battery(13.0), now - chrono::Duration::seconds(10)));
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_power_state_takes_max() {
        let agg = Aggregator::default();
        for (i, state) in [PowerState::Unknown, PowerState::Mppt, PowerState::PowerSupplyOff].into_iter().enumerate() {
            agg.record_at(Reading { power_state: state, ..Reading::default() }, at(i as i64));
        }
        let summary = agg.summarize_at(at(5));
        assert_eq!(summary.average.unwrap().power_state, PowerState::Mppt);
        assert!(summary.is_charging());
        assert_eq!(summary.latest.unwrap().reading.power_state, PowerState::PowerSupplyOff);
    }
}

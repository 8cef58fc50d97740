use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

/// Fixed-rate frame clock. A late frame pushes the schedule back instead of
/// replaying missed frames in a burst.
pub fn frame_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Approximate frames per second for a period, for logging.
pub fn fps(period: Duration) -> f64 {
    if period.is_zero() {
        return 0.0;
    }
    1.0 / period.as_secs_f64()
}

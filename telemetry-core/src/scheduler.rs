/// Publish interval applied when none is configured or a bad value shows up.
pub const DEFAULT_INTERVAL_MS: u32 = 5000;

/// Publish period in milliseconds; `0` disables publishing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelemetryInterval(u32);

impl TelemetryInterval {
    pub const DISABLED: Self = Self(0);
    pub const DEFAULT: Self = Self(DEFAULT_INTERVAL_MS);

    /// Interval used at boot. Missing, zero and negative values all fall back
    /// to the default so a fresh device always reports.
    pub fn from_boot_value(raw: Option<i64>) -> Self {
        match raw {
            Some(ms) if ms > 0 => Self::saturating(ms),
            _ => Self::DEFAULT,
        }
    }

    fn saturating(ms: i64) -> Self {
        Self(u32::try_from(ms).unwrap_or(u32::MAX))
    }

    pub fn as_millis(&self) -> u32 {
        self.0
    }

    pub fn is_disabled(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TelemetryInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Non-blocking publish timer driven by device uptime in milliseconds.
#[derive(Debug)]
pub struct TelemetryScheduler {
    interval: TelemetryInterval,
    last_publish: Option<u64>,
}

impl TelemetryScheduler {
    pub fn new(initial: Option<i64>) -> Self {
        Self {
            interval: TelemetryInterval::from_boot_value(initial),
            last_publish: None,
        }
    }

    pub fn interval(&self) -> TelemetryInterval {
        self.interval
    }

    /// True when publishing is enabled and either nothing was published yet
    /// or more than one interval elapsed since the last attempt.
    pub fn is_due(&self, now: u64) -> bool {
        if self.interval.is_disabled() {
            return false;
        }

        match self.last_publish {
            None => true,
            Some(last) => now.saturating_sub(last) > u64::from(self.interval.as_millis()),
        }
    }

    /// Applies a remotely supplied interval.
    ///
    /// `0` disables publishing, negative values fall back to the default.
    pub fn set_interval(&mut self, ms: i64) {
        let next = match ms {
            0 => TelemetryInterval::DISABLED,
            ms if ms < 0 => {
                log::warn!(
                    "Rejected publish interval {} ms, using {} ms",
                    ms,
                    DEFAULT_INTERVAL_MS
                );
                TelemetryInterval::DEFAULT
            }
            ms => TelemetryInterval::saturating(ms),
        };

        if next != self.interval {
            log::info!("Publish interval updated: {} ms", next.as_millis());
        }
        self.interval = next;
    }

    /// Records a publish attempt, successful or not, so failures are paced
    /// like successes.
    pub fn mark_published(&mut self, now: u64) {
        self.last_publish = Some(now);
    }

    pub fn last_publish(&self) -> Option<u64> {
        self.last_publish
    }
}

impl Default for TelemetryScheduler {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_interval_defaults_and_publishes_immediately() {
        let scheduler = TelemetryScheduler::new(None);
        assert_eq!(scheduler.interval().as_millis(), 5000);
        assert!(scheduler.is_due(0));
    }

    #[test]
    fn boot_values_below_one_fall_back_to_default() {
        assert_eq!(TelemetryScheduler::new(Some(0)).interval(), TelemetryInterval::DEFAULT);
        assert_eq!(TelemetryScheduler::new(Some(-20)).interval(), TelemetryInterval::DEFAULT);
        assert_eq!(TelemetryScheduler::new(Some(750)).interval().as_millis(), 750);
    }

    #[test]
    fn not_due_until_interval_strictly_elapsed() {
        let mut scheduler = TelemetryScheduler::new(Some(1000));
        scheduler.mark_published(10_000);

        assert!(!scheduler.is_due(10_000));
        assert!(!scheduler.is_due(11_000));
        assert!(scheduler.is_due(11_001));
    }

    #[test]
    fn zero_interval_is_never_due() {
        let mut scheduler = TelemetryScheduler::new(None);
        scheduler.set_interval(0);

        assert!(scheduler.interval().is_disabled());
        assert!(!scheduler.is_due(0));
        assert!(!scheduler.is_due(u64::MAX));
    }

    #[test]
    fn negative_interval_normalizes_to_default() {
        let mut scheduler = TelemetryScheduler::new(None);
        scheduler.set_interval(-5);
        assert_eq!(scheduler.interval().as_millis(), 5000);
    }

    #[test]
    fn negative_interval_reenables_disabled_publishing() {
        let mut scheduler = TelemetryScheduler::new(Some(2500));
        scheduler.set_interval(0);
        scheduler.set_interval(-1);
        assert_eq!(scheduler.interval(), TelemetryInterval::DEFAULT);
        assert!(scheduler.is_due(0));
    }

    #[test]
    fn huge_interval_saturates() {
        let mut scheduler = TelemetryScheduler::new(None);
        scheduler.set_interval(i64::MAX);
        assert_eq!(scheduler.interval().as_millis(), u32::MAX);
    }

    #[test]
    fn interval_change_before_first_publish_keeps_immediate_publish() {
        let mut scheduler = TelemetryScheduler::new(None);
        scheduler.set_interval(60_000);
        assert!(scheduler.is_due(1));
    }

    #[test]
    fn shortened_interval_applies_to_next_check() {
        let mut scheduler = TelemetryScheduler::new(Some(60_000));
        scheduler.mark_published(0);
        assert!(!scheduler.is_due(2_000));

        scheduler.set_interval(1_000);
        assert!(scheduler.is_due(2_000));
    }
}

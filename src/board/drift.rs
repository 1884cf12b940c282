//! # Drift Detection
//!
//! Watches the total weight for slow sensor drift and decides when an
//! automatic re-tare is warranted.
//!
//! ## Drift band
//!
//! Weight strictly between the dead zone and `dead_zone × multiplier` is
//! ambiguous: too heavy to be an empty board, too light to be a rider. A
//! clean board drifting into that band and staying there is drift; a brief
//! transit through it (stepping on or off) is not. The monitor therefore
//! requires continuous in-band presence for a configured duration before
//! firing, and resets its timer the moment the weight leaves the band.
//!
//! Checks are gated to at most one per second of wall clock, independent of
//! the poll rate. The caller passes the current [`Instant`] explicitly, so
//! tests drive the monitor on a simulated timeline.

use std::time::{Duration, Instant};

/// Edge-debounced detector for the ambiguous drift band.
#[derive(Debug)]
pub struct DriftMonitor {
    dead_zone_kg: f32,
    upper_kg: f32,
    trigger: Duration,
    check_interval: Duration,
    last_check: Option<Instant>,
    in_band_since: Option<Instant>,
}

impl DriftMonitor {
    /// Creates a monitor for the band `(dead_zone_kg, dead_zone_kg * multiplier)`
    /// firing after `trigger_sec` of continuous in-band presence.
    #[must_use]
    pub fn new(dead_zone_kg: f32, multiplier: f32, trigger_sec: f32) -> Self {
        Self {
            dead_zone_kg,
            upper_kg: dead_zone_kg * multiplier,
            trigger: Duration::from_secs_f32(trigger_sec),
            check_interval: Duration::from_secs(1),
            last_check: None,
            in_band_since: None,
        }
    }

    /// Feed the current total weight; returns `true` when a re-tare should
    /// fire.
    ///
    /// Calls closer than one second after the previous evaluated check are
    /// ignored entirely (neither starting nor resetting the band timer).
    pub fn observe(&mut self, total_kg: f32, now: Instant) -> bool {
        if let Some(last) = self.last_check {
            if now.duration_since(last) < self.check_interval {
                return false;
            }
        }
        self.last_check = Some(now);

        if total_kg > self.dead_zone_kg && total_kg < self.upper_kg {
            match self.in_band_since {
                None => {
                    self.in_band_since = Some(now);
                    false
                }
                Some(entered) => now.duration_since(entered) >= self.trigger,
            }
        } else {
            self.in_band_since = None;
            false
        }
    }

    /// Forget any in-band presence, e.g. after a tare.
    pub fn reset(&mut self) {
        self.in_band_since = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> DriftMonitor {
        // Band (0.2, 0.4), fire after 5 s in band
        DriftMonitor::new(0.2, 2.0, 5.0)
    }

    fn at(t0: Instant, secs: u64) -> Instant {
        t0 + Duration::from_secs(secs)
    }

    #[test]
    fn test_never_fires_at_or_below_dead_zone() {
        let mut m = monitor();
        let t0 = Instant::now();
        for s in 0..20 {
            assert!(!m.observe(0.2, at(t0, s)));
            assert!(!m.observe(0.0, at(t0, s)));
        }
    }

    #[test]
    fn test_never_fires_at_or_above_upper_bound() {
        let mut m = monitor();
        let t0 = Instant::now();
        for s in 0..20 {
            assert!(!m.observe(0.4, at(t0, s)));
            assert!(!m.observe(75.0, at(t0, s)));
        }
    }

    #[test]
    fn test_fires_after_continuous_presence() {
        let mut m = monitor();
        let t0 = Instant::now();
        assert!(!m.observe(0.3, at(t0, 0))); // enters band
        assert!(!m.observe(0.3, at(t0, 1)));
        assert!(!m.observe(0.3, at(t0, 2)));
        assert!(!m.observe(0.3, at(t0, 3)));
        assert!(!m.observe(0.3, at(t0, 4)));
        assert!(m.observe(0.3, at(t0, 5))); // >= 5 s in band
    }

    #[test]
    fn test_fires_once_then_reset_rearms() {
        let mut m = monitor();
        let t0 = Instant::now();
        for s in 0..5 {
            assert!(!m.observe(0.3, at(t0, s)));
        }
        assert!(m.observe(0.3, at(t0, 5)));
        m.reset(); // a tare follows every fire

        // Timer restarts from the next in-band observation
        assert!(!m.observe(0.3, at(t0, 6)));
        assert!(!m.observe(0.3, at(t0, 10)));
        assert!(m.observe(0.3, at(t0, 11)));
    }

    #[test]
    fn test_band_exit_resets_timer() {
        let mut m = monitor();
        let t0 = Instant::now();
        assert!(!m.observe(0.3, at(t0, 0)));
        assert!(!m.observe(0.3, at(t0, 3)));
        assert!(!m.observe(80.0, at(t0, 4))); // rider steps on: leave band
        assert!(!m.observe(0.3, at(t0, 5))); // back in band, timer restarted
        assert!(!m.observe(0.3, at(t0, 9)));
        assert!(m.observe(0.3, at(t0, 10)));
    }

    #[test]
    fn test_checks_gated_to_once_per_second() {
        let mut m = monitor();
        let t0 = Instant::now();
        assert!(!m.observe(0.3, t0));

        // A dip between checks is invisible: the gated call neither resets
        // nor advances the timer
        assert!(!m.observe(0.0, t0 + Duration::from_millis(300)));

        for s in 1..5 {
            assert!(!m.observe(0.3, at(t0, s)));
        }
        assert!(m.observe(0.3, at(t0, 5)));
    }

    #[test]
    fn test_transient_dip_at_check_time_resets() {
        let mut m = monitor();
        let t0 = Instant::now();
        assert!(!m.observe(0.3, at(t0, 0)));
        assert!(!m.observe(0.3, at(t0, 4)));
        // Dip lands on a check: it must reset
        assert!(!m.observe(0.1, at(t0, 5)));
        assert!(!m.observe(0.3, at(t0, 6)));
        assert!(!m.observe(0.3, at(t0, 10)));
        assert!(m.observe(0.3, at(t0, 11)));
    }
}

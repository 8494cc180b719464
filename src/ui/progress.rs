use std::time::{Duration, Instant};

use super::Ui;

/// Default minimum time between two progress updates
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(6);

/// Rate limiter for progress output
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// True on the first call and then at most once per interval
    pub fn ready(&mut self, now: Instant) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}

/// Counter for one long-running phase
#[derive(Debug, Clone)]
pub struct Progress {
    label: String,
    total: u64,
    counter: u64,
    throttle: Throttle,
    finished: bool,
}

impl Progress {
    /// Start a phase and show its initial state
    pub fn start(
        ui: &mut impl Ui,
        label: impl Into<String>,
        total: u64,
        interval: Duration,
    ) -> Self {
        let mut progress = Self {
            label: label.into(),
            total,
            counter: 0,
            throttle: Throttle::new(interval),
            finished: false,
        };
        if progress.throttle.ready(Instant::now()) {
            ui.set_progress(0, total, &progress.label);
        }
        progress
    }

    /// Count one processed item; the last item always reports completion
    pub fn tick(&mut self, ui: &mut impl Ui) {
        self.counter += 1;
        if self.counter >= self.total {
            self.finish(ui);
        } else if self.throttle.ready(Instant::now()) {
            ui.set_progress(self.counter, self.total, &self.label);
        }
    }

    /// Emit the completion marker (once), even if not every item was ticked
    pub fn finish(&mut self, ui: &mut impl Ui) {
        if !self.finished {
            self.finished = true;
            ui.finish_progress(&self.label);
        }
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::Phase;

    #[derive(Default)]
    struct RecordingUi {
        updates: Vec<(u64, u64)>,
        finished: Vec<String>,
    }

    impl Ui for RecordingUi {
        fn set_phase(&mut self, _phase: Phase) {}
        fn set_progress(&mut self, current: u64, total: u64, _label: &str) {
            self.updates.push((current, total));
        }
        fn finish_progress(&mut self, label: &str) {
            self.finished.push(label.to_string());
        }
        fn log(&mut self, _message: impl Into<String>) {}
    }

    #[test]
    fn test_throttle_cadence() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_secs(6));
        assert!(throttle.ready(start));
        assert!(!throttle.ready(start + Duration::from_secs(1)));
        assert!(!throttle.ready(start + Duration::from_secs(5)));
        assert!(throttle.ready(start + Duration::from_secs(6)));
        assert!(!throttle.ready(start + Duration::from_secs(7)));
    }

    #[test]
    fn test_long_interval_reports_start_and_done_only() {
        let mut ui = RecordingUi::default();
        let mut progress = Progress::start(&mut ui, "Fill en", 1000, Duration::from_secs(3600));
        for _ in 0..1000 {
            progress.tick(&mut ui);
        }
        progress.finish(&mut ui);

        assert_eq!(ui.updates, vec![(0, 1000)]);
        assert_eq!(ui.finished, vec!["Fill en".to_string()]);
        assert_eq!(progress.counter(), 1000);
    }

    #[test]
    fn test_zero_interval_reports_every_item() {
        let mut ui = RecordingUi::default();
        let mut progress = Progress::start(&mut ui, "Link", 3, Duration::ZERO);
        for _ in 0..3 {
            progress.tick(&mut ui);
        }
        assert_eq!(ui.updates, vec![(0, 3), (1, 3), (2, 3)]);
        assert_eq!(ui.finished.len(), 1);
    }

    #[test]
    fn test_empty_phase_still_finishes() {
        let mut ui = RecordingUi::default();
        let mut progress = Progress::start(&mut ui, "Link", 0, DEFAULT_INTERVAL);
        progress.finish(&mut ui);
        progress.finish(&mut ui);
        assert_eq!(ui.finished.len(), 1);
    }
}

//! Progress reporting
//!
//! The importer talks to a `Ui`; what it does with the updates is up to the
//! implementation:
//! - `ConsoleUi` draws one indicatif progress bar per phase on stdout
//! - `SilentUi` drops everything (tests, library use)
//!
//! `Progress` throttles updates so a phase with millions of items only
//! reaches the `Ui` every few seconds.

mod progress;

pub use progress::{Progress, Throttle, DEFAULT_INTERVAL};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::model::Level;

/// Import phases shown as section headers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Importing(Level),
    Pruning,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Importing(level) => write!(f, "Importing {}", level.plural()),
            Phase::Pruning => write!(f, "Removing empty regions and provinces"),
            Phase::Complete => write!(f, "All done"),
        }
    }
}

/// Trait for UI implementations - allows both console and silent/test modes
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_progress(&mut self, current: u64, total: u64, label: &str);
    fn finish_progress(&mut self, label: &str);
    fn log(&mut self, message: impl Into<String>);
}

const PROGRESS_TEMPLATE: &str =
    "{prefix:<24} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Progress bars on stdout, one per labelled step
pub struct ConsoleUi {
    hidden: bool,
    style: ProgressStyle,
    bar: Option<ProgressBar>,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self::with_visibility(false)
    }

    /// Tracks the same state but never draws (`--quiet`)
    pub fn hidden() -> Self {
        Self::with_visibility(true)
    }

    fn with_visibility(hidden: bool) -> Self {
        let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        Self {
            hidden,
            style,
            bar: None,
        }
    }

    fn draw_target(&self) -> ProgressDrawTarget {
        if self.hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stdout()
        }
    }

    /// The running bar for `label`, or a fresh one replacing any other
    fn bar_for(&mut self, label: &str, total: Option<u64>) -> &ProgressBar {
        let bar = match self.bar.take() {
            Some(bar) if !bar.is_finished() && bar.prefix() == label => bar,
            previous => {
                if let Some(previous) = previous {
                    if !previous.is_finished() {
                        previous.abandon();
                    }
                }
                let bar = ProgressBar::with_draw_target(total, self.draw_target());
                bar.set_style(self.style.clone());
                bar.set_prefix(label.to_string());
                bar
            }
        };
        if let Some(total) = total {
            bar.set_length(total);
        }
        self.bar.insert(bar)
    }

    fn println(&self, line: String) {
        if self.hidden {
            return;
        }
        match &self.bar {
            Some(bar) if !bar.is_finished() => bar.println(line),
            _ => println!("{}", line),
        }
    }
}

impl Default for ConsoleUi {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConsoleUi {
    fn drop(&mut self) {
        if let Some(bar) = &self.bar {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
    }
}

impl Ui for ConsoleUi {
    fn set_phase(&mut self, phase: Phase) {
        self.println(format!("{} ...", phase));
    }

    fn set_progress(&mut self, current: u64, total: u64, label: &str) {
        self.bar_for(label, Some(total)).set_position(current);
    }

    fn finish_progress(&mut self, label: &str) {
        self.bar_for(label, None).finish_with_message("Done");
    }

    fn log(&mut self, message: impl Into<String>) {
        self.println(message.into());
    }
}

/// Silent UI implementation for testing and non-interactive use
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: &str) {}
    fn finish_progress(&mut self, _label: &str) {}
    fn log(&mut self, _message: impl Into<String>) {}
}

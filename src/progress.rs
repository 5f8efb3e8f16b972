//! Progress bar display for installations

use indicatif::{ProgressBar, ProgressStyle};

/// Progress display for a batch of skill installs
///
/// `ProgressBar` is internally reference-counted, so one display can be
/// shared with worker threads by reference.
pub struct InstallProgress {
    bar: ProgressBar,
}

impl InstallProgress {
    /// Create a new progress display with the total item count
    pub fn new(total_items: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-");

        let bar = ProgressBar::new(total_items);
        bar.set_style(style);

        Self { bar }
    }

    /// Hidden display for --quiet or non-interactive runs
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Show which skill a worker picked up
    pub fn item_started(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    /// Count one finished skill
    pub fn item_finished(&self) {
        self.bar.inc(1);
    }

    /// Finish with a closing message
    pub fn finish(&self, msg: &str) {
        self.bar.finish_with_message(msg.to_string());
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

//! Terminal progress for the two passes.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use startupscout_core::PassProgress;
use startupscout_shared::{DiscoverySummary, ValuePropSummary};

/// CLI progress reporter using an indicatif spinner.
pub(crate) struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    pub(crate) fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl PassProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item(&self, current: usize, total: usize, detail: &str) {
        self.spinner
            .set_message(format!("[{current}/{total}] {detail}"));
    }

    fn discovery_done(&self, _summary: &DiscoverySummary) {
        self.spinner.finish_and_clear();
    }

    fn value_props_done(&self, _summary: &ValuePropSummary) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        // a failed pass never reaches the *_done callbacks
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

//! Progress reporting for long-running passes.

use startupscout_shared::{DiscoverySummary, ValuePropSummary};

/// Progress callback for reporting pass status.
pub trait PassProgress: Send + Sync {
    /// Called when entering a new phase (e.g. a new accelerator).
    fn phase(&self, name: &str);
    /// Called before each unit of work.
    fn item(&self, current: usize, total: usize, detail: &str);
    /// Called when a discovery pass completes.
    fn discovery_done(&self, _summary: &DiscoverySummary) {}
    /// Called when a value-proposition pass completes.
    fn value_props_done(&self, _summary: &ValuePropSummary) {}
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl PassProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item(&self, _current: usize, _total: usize, _detail: &str) {}
}

//! Enrichment loop for StartupScout.
//!
//! This crate ties the locator, link extractor, geolocation, and text
//! generation together into the two passes run by the CLI:
//! [`discovery::run_discovery`] and [`value_prop::run_value_props`].

pub mod discovery;
pub mod progress;
pub mod value_prop;

#[cfg(test)]
mod testing;

pub use discovery::{DiscoveryContext, run_discovery};
pub use progress::{PassProgress, SilentProgress};
pub use value_prop::{ValuePropContext, run_value_props};

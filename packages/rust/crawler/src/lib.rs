//! Page fetching and heuristic HTML extraction.
//!
//! This crate provides:
//! - [`PageFetcher`] / [`HttpFetcher`]: the HTML fetch collaborator
//! - [`links`]: candidate startup links from a portfolio page
//! - [`naming`]: display names from homepage titles or domains
//! - [`snapshot`]: title, description, and body text for prompts

pub mod fetch;
pub mod links;
pub mod naming;
pub mod snapshot;

pub use fetch::{FetchResponse, HttpFetcher, PageFetcher};
pub use links::{extract_links, filter_candidate_links};
pub use naming::derive_display_name;
pub use snapshot::fetch_snapshot;

//! Third-party enrichment services.
//!
//! - [`geo`]: domain-to-country lookup ([`Geolocator`], backed by ip-api.com)
//! - [`gemini`]: prompt completion ([`TextGenerator`], backed by Gemini)

pub mod gemini;
pub mod geo;

pub use gemini::{GeminiClient, TextGenerator};
pub use geo::{GeoLookup, Geolocator, IpApiClient, country_for_url};

//! Service module that exports interfaces to external applications, APIs, etc.

pub mod geocoding;

// rexport the trait and the config-driven factory
pub use geocoding::{new_geocoding_handler, GeocodingService};

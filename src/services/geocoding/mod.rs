//! Resolve free-text street addresses into coordinates using an external source
use crate::config::ServiceConfig;
use crate::{Error, GeoPoint};

mod arcgis;
pub use arcgis::ArcGisGeocoder;
mod nominatim;
pub use nominatim::Nominatim;

/// trait that defines how a street address gets resolved to a coordinate
pub trait GeocodingService {
    /// Resolve an already-trimmed, non-empty address. Returns None on network
    /// failure, an empty candidate set or a malformed response, never an error.
    fn resolve(&self, address: &str) -> Option<GeoPoint>;
}

/// Create a boxed geocoding handler from its service configuration
pub fn new_geocoding_handler(config: &ServiceConfig) -> Result<Box<dyn GeocodingService>, Error> {
    match config.handler() {
        "arcgis" => Ok(Box::new(ArcGisGeocoder::from_config(config)?)),
        "nominatim" => Ok(Box::new(Nominatim::from_config(config)?)),
        _ => Err(Error::UnknownServiceHandler(format!(
            "no geocoding handler named: {}",
            config.handler()
        ))),
    }
}

//! Resolve addresses through the OpenStreetMap Nominatim search API
use super::GeocodingService;
use crate::config::ServiceConfig;
use crate::{set_string_param_from_config, Error, GeoPoint};
use log::warn;
use reqwest::blocking::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Place {
    // nominatim returns coordinates as strings
    lat: String,
    lon: String,
}

#[derive(Clone, Debug)]
/// Defines the connection parameters to request address candidates from a
/// nominatim instance
pub struct Nominatim {
    base_url: String,
    /// comma separated ISO country codes used to scope the search
    country_codes: String,
    /// identifies this application per the nominatim usage policy
    user_agent: String,
}

impl Nominatim {
    pub fn new(base_url: String, country_codes: String) -> Self {
        Nominatim {
            base_url,
            country_codes,
            ..Default::default()
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, Error> {
        let mut base = Self::default();
        set_string_param_from_config!(base, base_url, config);
        set_string_param_from_config!(base, country_codes, config);
        set_string_param_from_config!(base, user_agent, config);
        Ok(base)
    }

    fn request_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

impl Default for Nominatim {
    fn default() -> Self {
        Nominatim {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            country_codes: "bg".to_string(),
            user_agent: "care-delivery-tracker".to_string(),
        }
    }
}

impl GeocodingService for Nominatim {
    fn resolve(&self, address: &str) -> Option<GeoPoint> {
        let client = Client::new();
        let resp = match client
            .get(&self.request_url())
            .query(&[
                ("q", address),
                ("format", "json"),
                ("limit", "1"),
                ("countrycodes", self.country_codes.as_str()),
            ])
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .send()
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Geocode request failed for '{}': {}", address, e);
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!(
                "Geocode request for '{}' returned status: {}",
                address,
                resp.status()
            );
            return None;
        }
        let places: Vec<Place> = match resp.json() {
            Ok(places) => places,
            Err(e) => {
                warn!("Malformed geocode response for '{}': {}", address, e);
                return None;
            }
        };
        // consume the candidate defensively, bad coordinate strings degrade
        // to "no coordinate" rather than an error
        places
            .first()
            .and_then(|p| match (p.lat.parse::<f64>(), p.lon.parse::<f64>()) {
                (Ok(lat), Ok(lng)) => Some(GeoPoint::new(lat, lng)),
                _ => {
                    warn!("Unparseable coordinates in geocode response for '{}'", address);
                    None
                }
            })
    }
}

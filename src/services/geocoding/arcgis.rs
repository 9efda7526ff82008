//! Resolve addresses through the ArcGIS findAddressCandidates API
use super::GeocodingService;
use crate::config::ServiceConfig;
use crate::{set_float_param_from_config, set_string_param_from_config, Error, GeoPoint};
use log::warn;
use reqwest::blocking::Client;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct CandidateLocation {
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    location: CandidateLocation,
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Response {
    candidates: Vec<Candidate>,
}

#[derive(Clone, Debug)]
/// Defines the connection parameters for the ArcGIS world geocoding service
pub struct ArcGisGeocoder {
    base_url: String,
    /// country hint passed as sourceCountry
    source_country: String,
    /// candidates scoring below this are discarded
    min_score: f64,
    /// optional API token, the public endpoint works without one
    token: String,
}

impl ArcGisGeocoder {
    pub fn new(source_country: String) -> Self {
        ArcGisGeocoder {
            source_country,
            ..Default::default()
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, Error> {
        let mut base = Self::default();
        set_string_param_from_config!(base, base_url, config);
        set_string_param_from_config!(base, source_country, config);
        set_string_param_from_config!(base, token, config);
        set_float_param_from_config!(base, min_score, config, f64);
        Ok(base)
    }

    fn request_url(&self) -> String {
        format!("{}/findAddressCandidates", self.base_url)
    }
}

impl Default for ArcGisGeocoder {
    fn default() -> Self {
        ArcGisGeocoder {
            base_url:
                "https://geocode.arcgis.com/arcgis/rest/services/World/GeocodeServer".to_string(),
            source_country: "BGR".to_string(),
            min_score: 50.0,
            token: String::new(),
        }
    }
}

impl GeocodingService for ArcGisGeocoder {
    fn resolve(&self, address: &str) -> Option<GeoPoint> {
        let client = Client::new();
        let mut query = vec![
            ("SingleLine".to_string(), address.to_string()),
            ("f".to_string(), "json".to_string()),
            ("maxLocations".to_string(), "1".to_string()),
            ("sourceCountry".to_string(), self.source_country.clone()),
        ];
        if !self.token.is_empty() {
            query.push(("token".to_string(), self.token.clone()));
        }
        let resp = match client.get(&self.request_url()).query(&query).send() {
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
        let body: Response = match resp.json() {
            Ok(body) => body,
            Err(e) => {
                warn!("Malformed geocode response for '{}': {}", address, e);
                return None;
            }
        };
        // first candidate wins, provided it clears the score floor and
        // actually carries a coordinate pair
        body.candidates
            .into_iter()
            .find(|c| c.score >= self.min_score)
            .and_then(|c| match (c.location.y, c.location.x) {
                (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
                _ => None,
            })
    }
}

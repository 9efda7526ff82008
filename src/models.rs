//! Domain records shared between the store, the route planner and the CLI
use crate::checkin::CheckIn;
use crate::error::Error;
use crate::gps::GeoPoint;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

/// A client receiving home deliveries
#[derive(Clone, Debug)]
pub struct Client {
    pub id: String,
    /// national identity number, optional in the registry
    pub national_id: Option<String>,
    pub name: String,
    /// free-text street address, geocoded on demand
    pub address: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub driver_id: Option<String>,
    pub meal_type: Option<String>,
    pub meal_count: i64,
    pub last_check_in: CheckIn,
    /// driver signature image as a data-URL
    pub driver_signature: Option<String>,
    /// client signature image as a data-URL, reads fall back to the legacy
    /// last_signature column when this one is empty
    pub client_signature: Option<String>,
}

impl Client {
    /// A client counts as delivered for today when any check-in marker or
    /// signature image is present
    pub fn delivered_today(&self) -> bool {
        !self.last_check_in.is_none()
            || self.driver_signature.is_some()
            || self.client_signature.is_some()
    }

    /// National id for history rows, "N/A" when the registry has none
    pub fn egn(&self) -> &str {
        self.national_id.as_deref().unwrap_or("N/A")
    }
}

/// Links a client to a driver for one calendar date. Owned by the admin
/// scheduling workflow, consumed read-only here.
#[derive(Clone, Debug)]
pub struct ScheduleItem {
    pub id: i64,
    pub client_id: String,
    pub driver_id: String,
    pub date: NaiveDate,
}

/// A captured signature image, validated at construction
#[derive(Clone, Debug, PartialEq)]
pub struct Signature(String);

impl Signature {
    /// Accept a data-URL image, rejecting empty or blank canvases
    pub fn parse(data_url: &str) -> Result<Self, Error> {
        let trimmed = data_url.trim();
        if trimmed.is_empty() || !trimmed.starts_with("data:image") {
            return Err(Error::BlankSignature);
        }
        // a blank canvas exports a data-URL with no payload after the comma
        match trimmed.find(',') {
            Some(idx) if trimmed.len() > idx + 1 => Ok(Signature(trimmed.to_string())),
            _ => Err(Error::BlankSignature),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Closed enumeration of reportable incident types. The persisted marker
/// stays free text, so decoding unknown historical values never fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncidentKind {
    NotAnswering,
    Refused,
    WrongAddress,
    HealthEmergency,
    Sos,
    Other,
}

impl IncidentKind {
    /// Display label, matches what drivers see and what lands in the marker
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentKind::NotAnswering => "Не отвори",
            IncidentKind::Refused => "Отказа доставката",
            IncidentKind::WrongAddress => "Грешен адрес",
            IncidentKind::HealthEmergency => "Здравословен проблем",
            IncidentKind::Sos => "SOS",
            IncidentKind::Other => "Друго",
        }
    }

    pub fn all() -> &'static [IncidentKind] {
        &[
            IncidentKind::NotAnswering,
            IncidentKind::Refused,
            IncidentKind::WrongAddress,
            IncidentKind::HealthEmergency,
            IncidentKind::Sos,
            IncidentKind::Other,
        ]
    }
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IncidentKind {
    type Err = Error;

    /// Accepts the ascii CLI keys as well as the display labels
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-answering" | "Не отвори" => Ok(IncidentKind::NotAnswering),
            "refused" | "Отказа доставката" => Ok(IncidentKind::Refused),
            "wrong-address" | "Грешен адрес" => Ok(IncidentKind::WrongAddress),
            "health-emergency" | "Здравословен проблем" => {
                Ok(IncidentKind::HealthEmergency)
            }
            "sos" | "SOS" => Ok(IncidentKind::Sos),
            "other" | "Друго" => Ok(IncidentKind::Other),
            other => Err(Error::InvalidIncidentKind(other.to_string())),
        }
    }
}

/// Delivery outcome recorded on a history row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryStatus {
    Success,
    Issue,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Success => "success",
            DeliveryStatus::Issue => "issue",
        }
    }
}

/// One append-only audit row, written once per completed visit or incident
/// and never mutated afterwards
#[derive(Clone, Debug)]
pub struct DeliveryHistoryRecord {
    pub client_id: String,
    pub client_name: String,
    /// national id or "N/A"
    pub egn: String,
    pub driver_id: String,
    pub start_location: Option<GeoPoint>,
    pub end_location: Option<GeoPoint>,
    pub timestamp: DateTime<Utc>,
    pub meal_type: Option<String>,
    /// forced to 0 on issue rows
    pub meal_count: i64,
    pub status: DeliveryStatus,
    pub issue_type: Option<String>,
    pub issue_description: Option<String>,
    pub driver_signature: Option<String>,
    pub client_signature: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_signatures_are_rejected() {
        assert!(Signature::parse("").is_err());
        assert!(Signature::parse("data:image/png;base64,").is_err());
        assert!(Signature::parse("not-a-data-url").is_err());
        assert!(Signature::parse("data:image/png;base64,iVBORw0KGgo=").is_ok());
    }

    #[test]
    fn incident_kind_parses_cli_keys_and_labels() {
        assert_eq!(
            "not-answering".parse::<IncidentKind>().unwrap(),
            IncidentKind::NotAnswering
        );
        assert_eq!(
            "Не отвори".parse::<IncidentKind>().unwrap(),
            IncidentKind::NotAnswering
        );
        assert!("nonsense".parse::<IncidentKind>().is_err());
    }
}

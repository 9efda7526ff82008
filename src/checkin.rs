//! Decode and encode the overloaded check-in marker stored on a client record.
//!
//! The persisted field is a single free-text string that historically grew
//! three shapes: a plain delivery timestamp, an `INCIDENT:<type> <iso>` marker
//! and a legacy `SOS <detail>` marker. It is decoded once at the storage
//! boundary into a tagged variant and re-emitted byte-for-byte on write.
use chrono::{DateTime, NaiveDateTime, Utc};

const INCIDENT_PREFIX: &str = "INCIDENT:";
const SOS_PREFIX: &str = "SOS";

/// Tagged representation of the check-in marker
#[derive(Clone, Debug, PartialEq)]
pub enum CheckIn {
    /// No check-in recorded yet
    None,
    /// Delivery confirmed; `at` is present when the raw text parsed as a timestamp
    Delivered {
        at: Option<DateTime<Utc>>,
        raw: String,
    },
    /// Structured incident marker
    Incident {
        kind: String,
        at: Option<DateTime<Utc>>,
        raw: String,
    },
    /// Legacy SOS marker, the remainder is kept as-is
    Sos {
        at: Option<DateTime<Utc>>,
        raw: String,
    },
}

impl CheckIn {
    /// Decode a persisted marker string
    pub fn parse(raw: &str) -> CheckIn {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CheckIn::None;
        }

        if let Some(rest) = trimmed.strip_prefix(INCIDENT_PREFIX) {
            // the incident type is free text running up to the first substring
            // that reads as an ISO timestamp, it may contain embedded spaces
            let (kind, at) = match find_timestamp(rest) {
                Some((idx, ts)) => (rest[..idx].trim().to_string(), Some(ts)),
                None => (rest.trim().to_string(), None),
            };
            return CheckIn::Incident {
                kind,
                at,
                raw: raw.to_string(),
            };
        }

        if trimmed == SOS_PREFIX || trimmed.starts_with("SOS ") {
            let rest = &trimmed[SOS_PREFIX.len()..];
            let at = find_timestamp(rest).map(|(_, ts)| ts);
            return CheckIn::Sos {
                at,
                raw: raw.to_string(),
            };
        }

        // anything else is a delivery confirmation, parseable or opaque
        CheckIn::Delivered {
            at: parse_timestamp(trimmed),
            raw: raw.to_string(),
        }
    }

    /// Build a canonical "delivered and signed" marker
    pub fn delivered_at(at: DateTime<Utc>) -> CheckIn {
        CheckIn::Delivered {
            at: Some(at),
            raw: at.to_rfc3339(),
        }
    }

    /// Build a canonical incident marker in the `INCIDENT:<type> <iso>` format
    pub fn incident(kind: &str, at: DateTime<Utc>) -> CheckIn {
        CheckIn::Incident {
            kind: kind.to_string(),
            at: Some(at),
            raw: format!("{}{} {}", INCIDENT_PREFIX, kind, at.to_rfc3339()),
        }
    }

    /// Re-emit the exact persisted form of the marker
    pub fn encode(&self) -> &str {
        match self {
            CheckIn::None => "",
            CheckIn::Delivered { raw, .. } => raw,
            CheckIn::Incident { raw, .. } => raw,
            CheckIn::Sos { raw, .. } => raw,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, CheckIn::None)
    }

    /// Incident and SOS markers both count as issues
    pub fn is_issue(&self) -> bool {
        matches!(self, CheckIn::Incident { .. } | CheckIn::Sos { .. })
    }

    /// Completion timestamp derived from the marker, when one parsed
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            CheckIn::None => None,
            CheckIn::Delivered { at, .. } => *at,
            CheckIn::Incident { at, .. } => *at,
            CheckIn::Sos { at, .. } => *at,
        }
    }
}

/// Parse an ISO-8601/RFC-3339 timestamp, tolerating a missing UTC offset
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(DateTime::from_utc(naive, Utc));
        }
    }
    None
}

/// Locate the first substring that parses as an ISO timestamp, returning its
/// byte offset and the parsed value
fn find_timestamp(text: &str) -> Option<(usize, DateTime<Utc>)> {
    for (idx, ch) in text.char_indices() {
        if !ch.is_ascii_digit() {
            continue;
        }
        if let Some(ts) = parse_timestamp(text[idx..].trim_end()) {
            return Some((idx, ts));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_string_is_no_check_in() {
        assert_eq!(CheckIn::parse(""), CheckIn::None);
        assert_eq!(CheckIn::parse("   "), CheckIn::None);
    }

    #[test]
    fn incident_marker_round_trips_type_and_timestamp() {
        let raw = "INCIDENT:Не отвори 2026-08-23T09:00:00+00:00";
        match CheckIn::parse(raw) {
            CheckIn::Incident { kind, at, .. } => {
                assert_eq!(kind, "Не отвори");
                assert_eq!(at, Some(Utc.ymd(2026, 8, 23).and_hms(9, 0, 0)));
            }
            other => panic!("expected incident, got {:?}", other),
        }
        assert_eq!(CheckIn::parse(raw).encode(), raw);
    }

    #[test]
    fn incident_type_may_contain_embedded_spaces() {
        let raw = "INCIDENT:няма никой на адреса 2026-08-23T09:00:00Z";
        match CheckIn::parse(raw) {
            CheckIn::Incident { kind, at, .. } => {
                assert_eq!(kind, "няма никой на адреса");
                assert!(at.is_some());
            }
            other => panic!("expected incident, got {:?}", other),
        }
    }

    #[test]
    fn incident_without_timestamp_keeps_whole_remainder_as_type() {
        match CheckIn::parse("INCIDENT:Отказ") {
            CheckIn::Incident { kind, at, .. } => {
                assert_eq!(kind, "Отказ");
                assert_eq!(at, None);
            }
            other => panic!("expected incident, got {:?}", other),
        }
    }

    #[test]
    fn legacy_sos_marker_is_treated_as_issue() {
        let parsed = CheckIn::parse("SOS 2025-12-01T10:30:00Z");
        assert!(parsed.is_issue());
        assert!(parsed.timestamp().is_some());
        // bare SOS with unparseable remainder still counts as an issue
        let bare = CheckIn::parse("SOS call dispatch");
        assert!(bare.is_issue());
        assert_eq!(bare.timestamp(), None);
    }

    #[test]
    fn plain_timestamp_is_a_delivery() {
        let parsed = CheckIn::parse("2026-08-23T08:30:00+00:00");
        match parsed {
            CheckIn::Delivered { at, .. } => {
                assert_eq!(at, Some(Utc.ymd(2026, 8, 23).and_hms(8, 30, 0)))
            }
            other => panic!("expected delivered, got {:?}", other),
        }
    }

    #[test]
    fn opaque_text_is_a_delivery_without_timestamp() {
        let parsed = CheckIn::parse("доставено на обяд");
        match &parsed {
            CheckIn::Delivered { at, raw } => {
                assert_eq!(*at, None);
                assert_eq!(raw, "доставено на обяд");
            }
            other => panic!("expected delivered, got {:?}", other),
        }
        assert_eq!(parsed.encode(), "доставено на обяд");
    }

    #[test]
    fn canonical_constructors_emit_the_wire_format() {
        let at = Utc.ymd(2026, 8, 23).and_hms(9, 0, 0);
        let marker = CheckIn::incident("Не отвори", at);
        assert_eq!(marker.encode(), "INCIDENT:Не отвори 2026-08-23T09:00:00+00:00");
        assert_eq!(CheckIn::parse(marker.encode()), marker);

        let delivered = CheckIn::delivered_at(at);
        assert_eq!(CheckIn::parse(delivered.encode()).timestamp(), Some(at));
    }
}

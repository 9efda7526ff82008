//! The driver's shift state machine and end-of-shift summary.
//!
//! The machine has two states, OFF_SHIFT and ON_SHIFT. Its snapshot is
//! persisted to a JSON file on every transition so an interrupted session
//! resumes exactly where it left off. Local transitions only commit after
//! the matching shift-ledger write succeeds, a failed remote write leaves
//! the local state untouched and retryable.
use crate::db;
use crate::error::Error;
use crate::route::Visit;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

static SHIFT_STATE_FILE: &str = "care-delivery-shift.json";

/// Durable snapshot of the driver's shift, one instance per session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShiftState {
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "startTime")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "deliveredCount")]
    pub delivered_count: u32,
}

impl Default for ShiftState {
    fn default() -> Self {
        ShiftState {
            is_active: false,
            start_time: None,
            delivered_count: 0,
        }
    }
}

/// Reads and writes the shift snapshot at a fixed path under the data dir
#[derive(Clone, Debug)]
pub struct ShiftStore {
    path: PathBuf,
}

impl ShiftStore {
    pub fn new(path: PathBuf) -> Self {
        ShiftStore { path }
    }

    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(PathBuf::new)
            .join(SHIFT_STATE_FILE)
    }

    /// Read the snapshot back, a missing or corrupt file yields a fresh
    /// OFF_SHIFT state. Resuming an active shift is just another transition
    /// trigger, not a special case.
    pub fn load(&self) -> ShiftState {
        match fs::read_to_string(&self.path) {
            Ok(blob) => match serde_json::from_str(&blob) {
                Ok(state) => {
                    debug!("Loaded shift state from {:?}", self.path);
                    state
                }
                Err(e) => {
                    warn!("Discarding corrupt shift state at {:?}: {}", self.path, e);
                    ShiftState::default()
                }
            },
            Err(_) => ShiftState::default(),
        }
    }

    /// Persist the snapshot, called on every transition
    pub fn save(&self, state: &ShiftState) -> Result<(), Error> {
        let blob = serde_json::to_string(state)?;
        fs::write(&self.path, blob)?;
        Ok(())
    }

    /// Remove the snapshot once the shift summary is confirmed
    pub fn clear(&self) -> Result<(), Error> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Start a shift: append the ledger record first, then commit the local
/// transition. A failed ledger write surfaces as a retryable error with no
/// local state change.
pub fn start_shift(
    conn: &Connection,
    store: &ShiftStore,
    state: &mut ShiftState,
    driver_id: &str,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    if state.is_active {
        return Err(Error::ShiftAlreadyActive);
    }
    db::append_shift_start(conn, driver_id, now)?;
    *state = ShiftState {
        is_active: true,
        start_time: Some(now),
        delivered_count: 0,
    };
    store.save(state)
}

/// Confirm the reviewed summary: close the ledger record, then clear the
/// local snapshot and return to OFF_SHIFT
pub fn confirm_summary(
    conn: &Connection,
    store: &ShiftStore,
    state: &mut ShiftState,
    driver_id: &str,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    if !state.is_active {
        return Err(Error::OffShift);
    }
    db::close_active_shift(conn, driver_id, now)?;
    store.clear()?;
    *state = ShiftState::default();
    Ok(())
}

/// End-of-shift classification of the day's visits
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShiftSummary {
    pub delivered_count: u32,
    pub issue_count: u32,
    pub pending_count: u32,
    /// traveled distance over delivered visits only, one decimal
    pub total_distance_km: f64,
}

/// Reduce today's visits into the reviewable shift summary.
///
/// Delivered: a non-issue completion marker whose timestamp falls inside the
/// shift window, or signature images with no issue marker. Issue: an
/// incident/SOS marker inside the window. Pending: no completion marker at
/// all. A marker with an unparseable timestamp drops the visit from every
/// count, which is logged since it likely undercounts real work.
pub fn summarize_shift(
    visits: &[Visit],
    shift_start: DateTime<Utc>,
    shift_end: DateTime<Utc>,
) -> ShiftSummary {
    let mut summary = ShiftSummary::default();
    let in_window = |ts: DateTime<Utc>| ts >= shift_start && ts <= shift_end;

    for visit in visits {
        let client = &visit.client;
        let marker = &client.last_check_in;
        let has_signature = client.driver_signature.is_some() || client.client_signature.is_some();

        if marker.is_issue() {
            match marker.timestamp() {
                Some(ts) if in_window(ts) => summary.issue_count += 1,
                Some(_) => {}
                None => warn!(
                    "Visit for client '{}' has an issue marker without a parseable timestamp",
                    client.id
                ),
            }
        } else if !marker.is_none() || has_signature {
            match marker.timestamp() {
                Some(ts) if in_window(ts) => {
                    summary.delivered_count += 1;
                    summary.total_distance_km += visit.distance_from_previous_km.unwrap_or(0.0);
                }
                Some(_) => {}
                None if has_signature => {
                    // signed but the marker did not parse, still a delivery
                    summary.delivered_count += 1;
                    summary.total_distance_km += visit.distance_from_previous_km.unwrap_or(0.0);
                }
                None => warn!(
                    "Visit for client '{}' has a completion marker without a parseable timestamp",
                    client.id
                ),
            }
        } else {
            summary.pending_count += 1;
        }
    }

    summary.total_distance_km = (summary.total_distance_km * 10.0).round() / 10.0;
    summary
}

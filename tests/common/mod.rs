#![allow(dead_code)]
use care_delivery_tracker::checkin::CheckIn;
use care_delivery_tracker::services::GeocodingService;
use care_delivery_tracker::{create_database, Client, GeoPoint};
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Open an in-memory database with the full schema applied
pub fn mem_conn() -> Connection {
    let mut conn = Connection::open_in_memory().expect("open in-memory db");
    create_database(&mut conn).expect("create schema");
    conn
}

/// Create a unique shift snapshot path inside the system temp dir and remove
/// any leftover from a previous run
pub fn shift_state_path(name: &str) -> PathBuf {
    let mut path = env::temp_dir();
    path.push(format!("{}_care_delivery_shift.json", name));
    fs::remove_file(&path).ok();
    path
}

/// A fresh client record with no check-in or signatures
pub fn sample_client(id: &str, driver_id: &str, address: &str) -> Client {
    Client {
        id: id.to_string(),
        national_id: Some("1234567890".to_string()),
        name: format!("Client {}", id),
        address: address.to_string(),
        phone: Some("0888123456".to_string()),
        notes: None,
        driver_id: Some(driver_id.to_string()),
        meal_type: Some("обяд".to_string()),
        meal_count: 1,
        last_check_in: CheckIn::None,
        driver_signature: None,
        client_signature: None,
    }
}

pub const SIGNATURE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==";

/// Geocoder backed by a fixed address table, counting how many lookups were
/// actually dispatched
pub struct FakeGeocoder {
    points: HashMap<String, GeoPoint>,
    pub calls: RefCell<usize>,
}

impl FakeGeocoder {
    pub fn new(entries: &[(&str, GeoPoint)]) -> Self {
        FakeGeocoder {
            points: entries
                .iter()
                .map(|(addr, p)| (addr.to_string(), *p))
                .collect(),
            calls: RefCell::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.borrow()
    }
}

impl GeocodingService for FakeGeocoder {
    fn resolve(&self, address: &str) -> Option<GeoPoint> {
        *self.calls.borrow_mut() += 1;
        self.points.get(address).copied()
    }
}

//! Shift state machine: persistence, resume after reload and ledger writes
mod common;

use care_delivery_tracker::shift::{confirm_summary, start_shift, ShiftState, ShiftStore};
use care_delivery_tracker::Error;
use chrono::{DateTime, TimeZone, Utc};
use common::{mem_conn, shift_state_path};
use rusqlite::{params, Connection};

const DRIVER: &str = "driver-1";

fn ledger_rows(conn: &Connection) -> Vec<(String, Option<DateTime<Utc>>)> {
    let mut stmt = conn
        .prepare("select status, end_time from shift_ledger where driver_id = ?1 order by id")
        .unwrap();
    let rows = stmt
        .query_map(params![DRIVER], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap();
    rows.map(|r| r.unwrap()).collect()
}

#[test]
fn starting_a_shift_persists_the_snapshot_and_the_ledger_record() {
    let conn = mem_conn();
    let store = ShiftStore::new(shift_state_path("start_persists"));
    let mut state = store.load();
    assert!(!state.is_active, "fresh store starts off shift");

    let start = Utc.ymd(2026, 8, 23).and_hms(8, 0, 0);
    start_shift(&conn, &store, &mut state, DRIVER, start).unwrap();

    assert!(state.is_active);
    assert_eq!(state.start_time, Some(start));
    assert_eq!(state.delivered_count, 0);
    assert_eq!(ledger_rows(&conn), vec![("active".to_string(), None)]);

    // simulate an app reload: a fresh read resumes on shift with the same start
    let resumed = store.load();
    assert_eq!(resumed, state);

    store.clear().unwrap();
}

#[test]
fn starting_twice_is_rejected_without_a_second_ledger_row() {
    let conn = mem_conn();
    let store = ShiftStore::new(shift_state_path("start_twice"));
    let mut state = store.load();

    start_shift(&conn, &store, &mut state, DRIVER, Utc::now()).unwrap();
    match start_shift(&conn, &store, &mut state, DRIVER, Utc::now()) {
        Err(Error::ShiftAlreadyActive) => {}
        other => panic!("expected ShiftAlreadyActive, got {:?}", other.map(|_| ())),
    }
    assert_eq!(ledger_rows(&conn).len(), 1);

    store.clear().unwrap();
}

#[test]
fn failed_ledger_write_leaves_local_state_untouched() {
    // no shift_ledger table in this connection, so the remote write fails
    let conn = Connection::open_in_memory().unwrap();
    let store = ShiftStore::new(shift_state_path("ledger_failure"));
    let mut state = store.load();

    assert!(start_shift(&conn, &store, &mut state, DRIVER, Utc::now()).is_err());
    assert!(!state.is_active, "local transition must not commit");
    assert!(!store.load().is_active, "nothing was persisted");
}

#[test]
fn confirming_the_summary_closes_the_ledger_and_clears_the_snapshot() {
    let conn = mem_conn();
    let store = ShiftStore::new(shift_state_path("confirm"));
    let mut state = store.load();

    let start = Utc.ymd(2026, 8, 23).and_hms(8, 0, 0);
    let end = Utc.ymd(2026, 8, 23).and_hms(9, 10, 0);
    start_shift(&conn, &store, &mut state, DRIVER, start).unwrap();
    confirm_summary(&conn, &store, &mut state, DRIVER, end).unwrap();

    assert!(!state.is_active);
    assert_eq!(state.start_time, None);
    assert_eq!(
        ledger_rows(&conn),
        vec![("completed".to_string(), Some(end))]
    );
    // snapshot is gone, a reload starts off shift
    assert_eq!(store.load(), ShiftState::default());
}

#[test]
fn confirming_while_off_shift_is_rejected() {
    let conn = mem_conn();
    let store = ShiftStore::new(shift_state_path("confirm_off_shift"));
    let mut state = store.load();

    match confirm_summary(&conn, &store, &mut state, DRIVER, Utc::now()) {
        Err(Error::OffShift) => {}
        other => panic!("expected OffShift, got {:?}", other.map(|_| ())),
    }
    assert!(ledger_rows(&conn).is_empty());
}

#[test]
fn corrupt_snapshot_degrades_to_off_shift() {
    let path = shift_state_path("corrupt");
    std::fs::write(&path, "not json at all").unwrap();
    let store = ShiftStore::new(path);
    assert_eq!(store.load(), ShiftState::default());
    store.clear().unwrap();
}

//! Delivery and incident finalization against the store
mod common;

use care_delivery_tracker::db::{find_client, insert_client};
use care_delivery_tracker::delivery::{complete_delivery, report_incident, SignatureCeremony};
use care_delivery_tracker::models::IncidentKind;
use care_delivery_tracker::shift::ShiftState;
use care_delivery_tracker::{CheckIn, Error, GeoPoint, Signature};
use chrono::{TimeZone, Utc};
use common::{mem_conn, sample_client, SIGNATURE};
use rusqlite::{params, Connection};

const DRIVER: &str = "driver-1";

fn history_count(conn: &Connection) -> i64 {
    conn.query_row("select count(*) from delivery_history", params![], |row| {
        row.get(0)
    })
    .unwrap()
}

fn on_shift() -> ShiftState {
    ShiftState {
        is_active: true,
        start_time: Some(Utc.ymd(2026, 8, 23).and_hms(8, 0, 0)),
        delivered_count: 0,
    }
}

#[test]
fn client_signature_step_requires_the_driver_step_first() {
    let mut ceremony = SignatureCeremony::new();
    match ceremony.sign_client(Signature::parse(SIGNATURE).unwrap()) {
        Err(Error::MissingDriverSignature) => {}
        other => panic!("expected MissingDriverSignature, got {:?}", other),
    }
    assert!(!ceremony.is_complete());

    // once the driver signs, the client step succeeds
    ceremony.sign_driver(Signature::parse(SIGNATURE).unwrap());
    ceremony
        .sign_client(Signature::parse(SIGNATURE).unwrap())
        .unwrap();
    assert!(ceremony.is_complete());
}

#[test]
fn finalize_rejects_a_skipped_step() {
    let ceremony = SignatureCeremony::new();
    assert!(ceremony.finalize().is_err());

    let mut driver_only = SignatureCeremony::new();
    driver_only.sign_driver(Signature::parse(SIGNATURE).unwrap());
    assert!(driver_only.finalize().is_err());
}

#[test]
fn completed_delivery_updates_the_client_and_appends_history() {
    let mut conn = mem_conn();
    insert_client(&conn, &sample_client("c-1", DRIVER, "ul. Pirin 12")).unwrap();
    let client = find_client(&conn, "c-1").unwrap();
    assert!(!client.delivered_today());

    let mut ceremony = SignatureCeremony::new();
    ceremony.sign_driver(Signature::parse(SIGNATURE).unwrap());
    ceremony
        .sign_client(Signature::parse(SIGNATURE).unwrap())
        .unwrap();

    let now = Utc.ymd(2026, 8, 23).and_hms(8, 30, 0);
    let here = Some(GeoPoint::new(42.7, 23.33));
    complete_delivery(&mut conn, &client, ceremony, DRIVER, here, here, now).unwrap();

    let updated = find_client(&conn, "c-1").unwrap();
    assert!(updated.delivered_today());
    assert_eq!(updated.last_check_in.timestamp(), Some(now));
    assert!(!updated.last_check_in.is_issue());
    assert_eq!(updated.driver_signature.as_deref(), Some(SIGNATURE));
    assert_eq!(updated.client_signature.as_deref(), Some(SIGNATURE));

    let (status, meal_count, driver_sig): (String, i64, Option<String>) = conn
        .query_row(
            "select status, meal_count, driver_signature from delivery_history",
            params![],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(status, "success");
    assert_eq!(meal_count, 1);
    assert_eq!(driver_sig.as_deref(), Some(SIGNATURE));
}

#[test]
fn incident_appends_report_history_and_marker() {
    let mut conn = mem_conn();
    insert_client(&conn, &sample_client("c-1", DRIVER, "ul. Pirin 12")).unwrap();
    let client = find_client(&conn, "c-1").unwrap();

    let now = Utc.ymd(2026, 8, 23).and_hms(9, 0, 0);
    report_incident(
        &mut conn,
        &on_shift(),
        &client,
        IncidentKind::NotAnswering,
        Some("никой не отговаря на позвъняване"),
        DRIVER,
        None,
        None,
        now,
    )
    .unwrap();

    // marker round-trips through the store in the INCIDENT:<type> <iso> format
    let updated = find_client(&conn, "c-1").unwrap();
    match &updated.last_check_in {
        CheckIn::Incident { kind, at, .. } => {
            assert_eq!(kind, "Не отвори");
            assert_eq!(*at, Some(now));
        }
        other => panic!("expected incident marker, got {:?}", other),
    }

    let (status, meal_count, issue_type): (String, i64, String) = conn
        .query_row(
            "select status, meal_count, issue_type from delivery_history",
            params![],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(status, "issue");
    assert_eq!(meal_count, 0, "meal count is forced to zero on issues");
    assert_eq!(issue_type, "Не отвори");

    let (incident_status, incident_kind): (String, String) = conn
        .query_row("select status, type from incidents", params![], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(incident_status, "open");
    assert_eq!(incident_kind, "Не отвори");
}

#[test]
fn incident_while_off_shift_is_rejected_with_no_writes() {
    let mut conn = mem_conn();
    insert_client(&conn, &sample_client("c-1", DRIVER, "ul. Pirin 12")).unwrap();
    let client = find_client(&conn, "c-1").unwrap();

    let result = report_incident(
        &mut conn,
        &ShiftState::default(),
        &client,
        IncidentKind::Refused,
        None,
        DRIVER,
        None,
        None,
        Utc::now(),
    );
    match result {
        Err(Error::OffShift) => {}
        other => panic!("expected OffShift, got {:?}", other),
    }
    assert_eq!(history_count(&conn), 0);
    let incidents: i64 = conn
        .query_row("select count(*) from incidents", params![], |row| row.get(0))
        .unwrap();
    assert_eq!(incidents, 0);
    assert!(find_client(&conn, "c-1").unwrap().last_check_in.is_none());
}

#[test]
fn failed_write_rolls_back_the_whole_finalization() {
    let mut conn = mem_conn();
    insert_client(&conn, &sample_client("c-1", DRIVER, "ul. Pirin 12")).unwrap();
    // removing the history table makes the second write in the transaction fail
    conn.execute("drop table delivery_history", params![]).unwrap();
    let client = find_client(&conn, "c-1").unwrap();

    let mut ceremony = SignatureCeremony::new();
    ceremony.sign_driver(Signature::parse(SIGNATURE).unwrap());
    ceremony
        .sign_client(Signature::parse(SIGNATURE).unwrap())
        .unwrap();
    assert!(
        complete_delivery(&mut conn, &client, ceremony, DRIVER, None, None, Utc::now()).is_err()
    );

    // the client row update rolled back with it
    let untouched = find_client(&conn, "c-1").unwrap();
    assert!(untouched.last_check_in.is_none());
    assert_eq!(untouched.driver_signature, None);
}

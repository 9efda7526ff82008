//! Delivery and incident finalization.
//!
//! A visit completes through exactly one of two paths: the two-step
//! signature ceremony (driver signs, then the client) or a typed incident
//! report. Both paths commit through a single sqlite transaction so a failed
//! write leaves the client's prior marker and signatures untouched and the
//! operator free to retry.
use crate::checkin::CheckIn;
use crate::db;
use crate::error::Error;
use crate::gps::GeoPoint;
use crate::models::{Client, DeliveryHistoryRecord, DeliveryStatus, IncidentKind, Signature};
use crate::shift::ShiftState;
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::Connection;

/// The two-step signature capture. The driver signs first, the client step
/// refuses to run while the driver signature is missing, and finalization
/// requires both.
#[derive(Debug, Default)]
pub struct SignatureCeremony {
    driver: Option<Signature>,
    client: Option<Signature>,
}

impl SignatureCeremony {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step one, capture the driver signature
    pub fn sign_driver(&mut self, signature: Signature) {
        self.driver = Some(signature);
    }

    /// Step two, capture the client signature. Aborts back to step one when
    /// the driver signature is missing.
    pub fn sign_client(&mut self, signature: Signature) -> Result<(), Error> {
        if self.driver.is_none() {
            return Err(Error::MissingDriverSignature);
        }
        self.client = Some(signature);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.driver.is_some() && self.client.is_some()
    }

    /// Yield both signatures, failing when either step was skipped
    pub fn finalize(self) -> Result<(Signature, Signature), Error> {
        match (self.driver, self.client) {
            (Some(driver), Some(client)) => Ok((driver, client)),
            (None, _) => Err(Error::MissingDriverSignature),
            (_, None) => Err(Error::BlankSignature),
        }
    }
}

/// Finalize a delivered visit: store both signature images and the canonical
/// "delivered and signed" marker on the client row, and append one `success`
/// history record. All writes commit atomically.
pub fn complete_delivery(
    conn: &mut Connection,
    client: &Client,
    ceremony: SignatureCeremony,
    driver_id: &str,
    start_location: Option<GeoPoint>,
    end_location: Option<GeoPoint>,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    let (driver_signature, client_signature) = ceremony.finalize()?;
    let marker = CheckIn::delivered_at(now);

    let tx = conn.transaction()?;
    db::update_client_delivery(
        &tx,
        &client.id,
        &marker,
        driver_signature.as_str(),
        client_signature.as_str(),
    )?;
    db::insert_history(
        &tx,
        &DeliveryHistoryRecord {
            client_id: client.id.clone(),
            client_name: client.name.clone(),
            egn: client.egn().to_string(),
            driver_id: driver_id.to_string(),
            start_location,
            end_location,
            timestamp: now,
            meal_type: client.meal_type.clone(),
            meal_count: client.meal_count,
            status: DeliveryStatus::Success,
            issue_type: None,
            issue_description: None,
            driver_signature: Some(driver_signature.into_inner()),
            client_signature: Some(client_signature.into_inner()),
        },
    )?;
    tx.commit()?;

    info!("Delivery confirmed for client '{}' ({})", client.name, client.id);
    Ok(())
}

/// File an incident for a visit: append an open incident record, an `issue`
/// history record with the meal count forced to zero, and the
/// `INCIDENT:<type> <iso>` marker on the client row. Requires an active
/// shift, rejected otherwise before any write happens.
pub fn report_incident(
    conn: &mut Connection,
    shift: &ShiftState,
    client: &Client,
    kind: IncidentKind,
    description: Option<&str>,
    driver_id: &str,
    start_location: Option<GeoPoint>,
    end_location: Option<GeoPoint>,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    if !shift.is_active {
        return Err(Error::OffShift);
    }
    let marker = CheckIn::incident(kind.as_str(), now);

    let tx = conn.transaction()?;
    db::insert_incident(&tx, &client.id, driver_id, kind.as_str(), description, now)?;
    db::insert_history(
        &tx,
        &DeliveryHistoryRecord {
            client_id: client.id.clone(),
            client_name: client.name.clone(),
            egn: client.egn().to_string(),
            driver_id: driver_id.to_string(),
            start_location,
            end_location,
            timestamp: now,
            meal_type: client.meal_type.clone(),
            // nothing was handed over
            meal_count: 0,
            status: DeliveryStatus::Issue,
            issue_type: Some(kind.as_str().to_string()),
            issue_description: description.map(|d| d.to_string()),
            driver_signature: None,
            client_signature: None,
        },
    )?;
    db::update_client_checkin(&tx, &client.id, &marker)?;
    tx.commit()?;

    info!(
        "Incident '{}' filed for client '{}' ({})",
        kind.as_str(),
        client.name,
        client.id
    );
    Ok(())
}

//! Define the incident subcommand
use super::geo_position;
use crate::db::{find_client, open_db_connection};
use crate::delivery::report_incident;
use crate::models::IncidentKind;
use crate::shift::ShiftStore;
use chrono::Utc;
use log::info;
use structopt::StructOpt;

/// Report an incident for a scheduled visit, requires an active shift
#[derive(Debug, StructOpt)]
pub struct IncidentOpts {
    /// Id of the client the incident concerns
    #[structopt(name = "CLIENT_ID")]
    client_id: String,
    /// Incident type: not-answering, refused, wrong-address, health-emergency, sos or other
    #[structopt(name = "TYPE")]
    kind: IncidentKind,
    /// Optional free-text description of what happened
    #[structopt(short, long)]
    description: Option<String>,
    /// Current driver latitude, recorded on the history row
    #[structopt(long)]
    lat: Option<f64>,
    /// Current driver longitude, recorded on the history row
    #[structopt(long)]
    lng: Option<f64>,
}

pub fn incident_command(
    driver_id: &str,
    opts: IncidentOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = ShiftStore::new(ShiftStore::default_path());
    let state = store.load();

    let mut conn = open_db_connection()?;
    let client = find_client(&conn, &opts.client_id)?;
    let position = geo_position(opts.lat, opts.lng);

    report_incident(
        &mut conn,
        &state,
        &client,
        opts.kind,
        opts.description.as_deref(),
        driver_id,
        position,
        position,
        Utc::now(),
    )?;

    info!(
        "Incident '{}' recorded for client '{}'",
        opts.kind, opts.client_id
    );
    Ok(())
}

//! Define the deliver subcommand
use super::geo_position;
use crate::db::{find_client, open_db_connection};
use crate::delivery::{complete_delivery, SignatureCeremony};
use crate::models::Signature;
use crate::shift::ShiftStore;
use crate::Error;
use chrono::Utc;
use log::info;
use std::fs;
use structopt::StructOpt;

/// Confirm a delivery through the two-step signature ceremony
#[derive(Debug, StructOpt)]
pub struct DeliverOpts {
    /// Id of the client the delivery was made to
    #[structopt(name = "CLIENT_ID")]
    client_id: String,
    /// Driver signature as an inline data-URL or a path to a file holding one
    #[structopt(long)]
    driver_signature: String,
    /// Client signature as an inline data-URL or a path to a file holding one
    #[structopt(long)]
    client_signature: String,
    /// Current driver latitude, recorded as the delivery end location
    #[structopt(long)]
    lat: Option<f64>,
    /// Current driver longitude, recorded as the delivery end location
    #[structopt(long)]
    lng: Option<f64>,
}

/// Accept a signature inline or from a file on disk
fn load_signature(arg: &str) -> Result<Signature, Error> {
    if arg.starts_with("data:") {
        Signature::parse(arg)
    } else {
        let contents = fs::read_to_string(arg)?;
        Signature::parse(contents.trim())
    }
}

pub fn deliver_command(
    driver_id: &str,
    opts: DeliverOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open_db_connection()?;
    let client = find_client(&conn, &opts.client_id)?;

    // driver first, then the client, same order as the capture screens
    let mut ceremony = SignatureCeremony::new();
    ceremony.sign_driver(load_signature(&opts.driver_signature)?);
    ceremony.sign_client(load_signature(&opts.client_signature)?)?;

    let position = geo_position(opts.lat, opts.lng);
    complete_delivery(
        &mut conn,
        &client,
        ceremony,
        driver_id,
        position,
        position,
        Utc::now(),
    )?;

    // keep the on-shift delivered counter in step with the store
    let store = ShiftStore::new(ShiftStore::default_path());
    let mut state = store.load();
    if state.is_active {
        state.delivered_count += 1;
        store.save(&state)?;
    }

    info!("Delivery for client '{}' recorded", opts.client_id);
    Ok(())
}

//! Define the start-shift, end-shift and confirm-shift subcommands
use super::geo_position;
use crate::config::Config;
use crate::db::{clients_for_driver, open_db_connection, schedule_for_driver};
use crate::route::{plan_route, GeocodeCache};
use crate::shift::{confirm_summary, start_shift, summarize_shift, ShiftStore};
use crate::Error;
use chrono::{Local, Utc};
use log::{error, info};
use structopt::StructOpt;

/// Start a shift, recording it in the ledger before going on duty
#[derive(Debug, StructOpt)]
pub struct StartShiftOpts {}

pub fn start_shift_command(
    driver_id: &str,
    _opts: StartShiftOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_connection()?;
    let store = ShiftStore::new(ShiftStore::default_path());
    let mut state = store.load();

    start_shift(&conn, &store, &mut state, driver_id, Utc::now())?;
    info!(
        "Shift started at {}",
        state
            .start_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_default()
    );
    Ok(())
}

/// Compute the end-of-shift summary for review, the shift stays active until
/// it is confirmed
#[derive(Debug, StructOpt)]
pub struct EndShiftOpts {
    /// Current driver latitude, used for the first stop's distance
    #[structopt(long)]
    lat: Option<f64>,
    /// Current driver longitude, used for the first stop's distance
    #[structopt(long)]
    lng: Option<f64>,
}

pub fn end_shift_command(
    config: Config,
    driver_id: &str,
    opts: EndShiftOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = ShiftStore::new(ShiftStore::default_path());
    let state = store.load();
    let start_time = match (state.is_active, state.start_time) {
        (true, Some(start_time)) => start_time,
        _ => return Err(Box::new(Error::OffShift)),
    };

    let conn = open_db_connection()?;
    let clients = clients_for_driver(&conn, driver_id)?;
    let schedule = schedule_for_driver(&conn, driver_id)?;
    let geocoder = match config.get_geocoding_handler() {
        Ok(hdl) => Some(hdl),
        Err(e) => {
            error!("Could not initialize the geocoding service: {}", e);
            None
        }
    };

    let mut cache = GeocodeCache::new();
    let plan = plan_route(
        driver_id,
        &schedule,
        &clients,
        &mut cache,
        geocoder.as_deref(),
        geo_position(opts.lat, opts.lng),
        Local::today().naive_local(),
    );

    let now = Utc::now();
    let summary = summarize_shift(&plan.today, start_time, now);
    println!(
        "Shift summary for driver {} ({} - {})",
        driver_id,
        start_time.format("%H:%M"),
        now.format("%H:%M")
    );
    println!("  delivered: {}", summary.delivered_count);
    println!("  issues:    {}", summary.issue_count);
    println!("  pending:   {}", summary.pending_count);
    println!("  distance:  {:.1} km", summary.total_distance_km);
    println!("Run confirm-shift to finalize and go off duty.");

    Ok(())
}

/// Finalize the reviewed summary and go off shift
#[derive(Debug, StructOpt)]
pub struct ConfirmShiftOpts {}

pub fn confirm_shift_command(
    driver_id: &str,
    _opts: ConfirmShiftOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_connection()?;
    let store = ShiftStore::new(ShiftStore::default_path());
    let mut state = store.load();

    confirm_summary(&conn, &store, &mut state, driver_id, Utc::now())?;
    info!("Shift closed, you are off duty");
    Ok(())
}

//! Define the route subcommand
use super::{geo_position, parse_date};
use crate::config::Config;
use crate::db::{clients_for_driver, open_db_connection, schedule_for_driver};
use crate::route::{plan_route, GeocodeCache};
use chrono::{Local, NaiveDate};
use log::error;
use structopt::StructOpt;

/// Assemble and display today's route in assignment order
#[derive(Debug, StructOpt)]
pub struct RouteOpts {
    /// Current driver latitude, used for the first stop's distance
    #[structopt(long)]
    lat: Option<f64>,
    /// Current driver longitude, used for the first stop's distance
    #[structopt(long)]
    lng: Option<f64>,
    /// Plan for this date instead of today (YYYY-MM-DD format)
    #[structopt(long, parse(try_from_str = parse_date))]
    date: Option<NaiveDate>,
    /// Skip address geocoding, distances will not be shown
    #[structopt(long)]
    no_geocode: bool,
}

pub fn route_command(
    config: Config,
    driver_id: &str,
    opts: RouteOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_connection()?;
    let clients = clients_for_driver(&conn, driver_id)?;
    let schedule = schedule_for_driver(&conn, driver_id)?;

    // a broken geocoding setup degrades to a route without distances
    let geocoder = if opts.no_geocode {
        None
    } else {
        match config.get_geocoding_handler() {
            Ok(hdl) => Some(hdl),
            Err(e) => {
                error!("Could not initialize the geocoding service: {}", e);
                None
            }
        }
    };

    let today = opts.date.unwrap_or_else(|| Local::today().naive_local());
    let mut cache = GeocodeCache::new();
    let plan = plan_route(
        driver_id,
        &schedule,
        &clients,
        &mut cache,
        geocoder.as_deref(),
        geo_position(opts.lat, opts.lng),
        today,
    );

    println!("Route for {} (driver {})", today, driver_id);
    if plan.today.is_empty() {
        println!("  no visits scheduled");
    }
    let mut total_km = 0.0;
    for visit in &plan.today {
        let distance = match visit.distance_from_previous_km {
            Some(km) => {
                total_km += km;
                format!("{:.1} km", km)
            }
            None => "-".to_string(),
        };
        let status = if visit.client.delivered_today() {
            if visit.client.last_check_in.is_issue() {
                " [issue]"
            } else {
                " [delivered]"
            }
        } else {
            ""
        };
        println!(
            "{:3}. {} - {} ({}){}",
            visit.sequence.unwrap_or(0),
            visit.client.name,
            visit.client.address,
            distance,
            status
        );
    }
    println!(
        "Total: {:.1} km over {} stops; {} tomorrow, {} upcoming",
        total_km,
        plan.today.len(),
        plan.tomorrow.len(),
        plan.upcoming.len()
    );

    Ok(())
}

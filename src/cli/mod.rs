//! Define the application's command line interface
use crate::config::Config;
use chrono::NaiveDate;
use simplelog::LevelFilter;
use structopt::StructOpt;

mod deliver;
use deliver::{deliver_command, DeliverOpts};
mod history;
use history::{history_command, HistoryOpts};
mod incident;
use incident::{incident_command, IncidentOpts};
mod route;
use route::{route_command, RouteOpts};
mod shift;
use shift::{
    confirm_shift_command, end_shift_command, start_shift_command, ConfirmShiftOpts, EndShiftOpts,
    StartShiftOpts,
};

/// Plan the day's delivery route and execute a driver shift against the local database
#[derive(Debug, StructOpt)]
pub struct Cli {
    /// Set logging level to debug, use a second time (e.g. -vv) to set logging to trace
    #[structopt(short, long, parse(from_occurrences))]
    verbose: i32,
    /// Suppress info logging messages use a second time (e.g. -qq) to hide warnings
    #[structopt(short, long, parse(from_occurrences))]
    quiet: i32,
    /// Act as this driver instead of the one named in the config file
    #[structopt(short, long)]
    driver: Option<String>,
    /// Driver-facing commands for route planning and shift execution
    #[structopt(subcommand)]
    cmd: Command,
}

impl Cli {
    /// Return the verbose flag counts as a log level filter
    pub fn verbosity(&self, default: LevelFilter) -> LevelFilter {
        if self.quiet == 1 {
            LevelFilter::Warn
        } else if self.quiet > 1 {
            LevelFilter::Error
        } else if self.verbose == 1 {
            LevelFilter::Debug
        } else if self.verbose > 1 {
            LevelFilter::Trace
        } else {
            default
        }
    }

    /// Resolve the driver id from the flag or the config file
    pub fn driver_id(&self, config: &Config) -> Result<String, crate::Error> {
        match &self.driver {
            Some(driver) if !driver.is_empty() => Ok(driver.clone()),
            _ if !config.driver_id().is_empty() => Ok(config.driver_id().to_string()),
            _ => Err(crate::Error::NoDriverConfigured),
        }
    }

    /// Consume options struct and return the result of subcommand execution
    pub fn execute_subcommand(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        let driver_id = self.driver_id(&config)?;
        self.cmd.execute(config, &driver_id)
    }
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Show today's route with per-stop distances
    #[structopt(name = "route")]
    Route(RouteOpts),
    /// Start a shift and record it in the ledger
    #[structopt(name = "start-shift")]
    StartShift(StartShiftOpts),
    /// Compute the reviewable end-of-shift summary
    #[structopt(name = "end-shift")]
    EndShift(EndShiftOpts),
    /// Confirm the summary, close the ledger record and go off shift
    #[structopt(name = "confirm-shift")]
    ConfirmShift(ConfirmShiftOpts),
    /// Confirm a delivery with driver and client signatures
    #[structopt(name = "deliver")]
    Deliver(DeliverOpts),
    /// Report an incident for a scheduled visit
    #[structopt(name = "incident")]
    Incident(IncidentOpts),
    /// List delivery history records
    #[structopt(name = "history")]
    History(HistoryOpts),
}

impl Command {
    /// Consume enum variant and return the result of the command's execution
    fn execute(self, config: Config, driver_id: &str) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Command::Route(opts) => route_command(config, driver_id, opts),
            Command::StartShift(opts) => start_shift_command(driver_id, opts),
            Command::EndShift(opts) => end_shift_command(config, driver_id, opts),
            Command::ConfirmShift(opts) => confirm_shift_command(driver_id, opts),
            Command::Deliver(opts) => deliver_command(driver_id, opts),
            Command::Incident(opts) => incident_command(driver_id, opts),
            Command::History(opts) => history_command(driver_id, opts),
        }
    }
}

fn parse_date(src: &str) -> Result<NaiveDate, chrono::format::ParseError> {
    NaiveDate::parse_from_str(src, "%Y-%m-%d")
}

/// Combine the optional --lat/--lng flags into a point, both must be present
fn geo_position(lat: Option<f64>, lng: Option<f64>) -> Option<crate::GeoPoint> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Some(crate::GeoPoint::new(lat, lng)),
        _ => None,
    }
}

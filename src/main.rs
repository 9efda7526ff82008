use care_delivery_tracker::cli::Cli;
use care_delivery_tracker::config::Config;
use care_delivery_tracker::{create_database, open_db_connection};
use log::{debug, trace};
use simplelog::{Config as LoggerConfig, TermLogger, TerminalMode};
use std::fs::{create_dir_all, File};
use std::path::PathBuf;
use structopt::StructOpt;

static CONFIG_FILE_NAME: &str = "care-delivery-tracker.yml";

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(PathBuf::new)
        .join(CONFIG_FILE_NAME)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Cli::from_args();

    // a missing config file falls back to built-in defaults
    let config_file = config_path();
    let config = if config_file.exists() {
        let mut fp = File::open(&config_file)?;
        Config::load(&mut fp)?
    } else {
        Config::default()
    };

    let level_filter = opt.verbosity(config.log_level());
    TermLogger::init(level_filter, LoggerConfig::default(), TerminalMode::Mixed)?;
    trace!("Loaded configuration from {:?}", config_file);

    // create the data directory and database if needed
    if let Some(data_dir) = dirs::data_dir() {
        if !data_dir.exists() {
            create_dir_all(&data_dir)?;
        }
    }
    let mut conn = open_db_connection()?;
    create_database(&mut conn)?;
    debug!("Database ready");
    drop(conn);

    // execute the requested subcommand
    opt.execute_subcommand(config)
}

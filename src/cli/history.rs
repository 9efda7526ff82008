//! Define the history subcommand
use super::parse_date;
use crate::db::{history_for_driver, open_db_connection};
use chrono::{DateTime, Local, NaiveDate};
use structopt::StructOpt;

/// List delivery history records for the driver
#[derive(Debug, StructOpt)]
pub struct HistoryOpts {
    /// Date to list records for, or the start date if an end date is used (YYYY-MM-DD format)
    #[structopt(name = "DATE", parse(try_from_str = parse_date))]
    start_date: Option<NaiveDate>,
    /// End of date range to list records for (YYYY-MM-DD format)
    #[structopt(name = "END_DATE", parse(try_from_str = parse_date))]
    end_date: Option<NaiveDate>,
}

pub fn history_command(
    driver_id: &str,
    opts: HistoryOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_connection()?;
    // a single date means "that day only"
    let end_date = opts.end_date.or(opts.start_date);
    let rows = history_for_driver(&conn, driver_id, opts.start_date, end_date)?;

    println!("Date, Client, Status, Meals");
    for row in rows {
        let timestamp: DateTime<Local> = row.timestamp.with_timezone(&Local);
        let status = match row.issue_type {
            Some(issue) => format!("{} ({})", row.status, issue),
            None => row.status,
        };
        println!(
            "{} {} - {} [{} meals]",
            timestamp.format("%Y-%m-%d %H:%M"),
            row.client_name,
            status,
            row.meal_count
        );
    }

    Ok(())
}

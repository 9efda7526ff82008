//! Database utility functions and the queries used by the driver core
use crate::checkin::CheckIn;
use crate::error::Error;
use crate::models::{Client, DeliveryHistoryRecord, ScheduleItem};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::fmt;
use std::path::PathBuf;

mod schema;
pub use schema::create_database;

static DATABASE_NAME: &str = "care-delivery-tracker.db";

// very basic declarative query constructor
pub struct QueryStringBuilder<'q> {
    base_query: &'q str,
    where_clauses: Vec<&'q str>,
    order_by: Vec<&'q str>,
}

impl<'q> QueryStringBuilder<'q> {
    pub fn new(base_query: &'q str) -> Self {
        QueryStringBuilder {
            base_query,
            where_clauses: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn and_where(&mut self, clause: &'q str) -> &mut Self {
        self.where_clauses.push(clause);
        self
    }

    pub fn order_by(&mut self, clause: &'q str) -> &mut Self {
        self.order_by.push(clause);
        self
    }
}

impl<'q> fmt::Display for QueryStringBuilder<'q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let where_clause = if self.where_clauses.is_empty() {
            String::new()
        } else {
            let base = format!(" where {}", self.where_clauses[0]);
            self.where_clauses[1..]
                .iter()
                .fold(base, |b, c| format!("{} and {}", b, c))
        };
        let order_by = if self.order_by.is_empty() {
            String::new()
        } else {
            let base = format!(" order by {}", self.order_by[0]);
            self.order_by[1..]
                .iter()
                .fold(base, |b, c| format!("{}, {}", b, c))
        };
        write!(f, "{}{}{}", self.base_query, where_clause, order_by)
    }
}

pub fn open_db_connection() -> Result<Connection> {
    let db = db_path();
    debug!("Connected to local database located at: {:?}", db);
    Connection::open(&db)
}

pub fn db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(PathBuf::new)
        .join(DATABASE_NAME)
}

static CLIENT_COLUMNS: &str = "id, national_id, name, address, phone, notes, driver_id, \
     meal_type, meal_count, last_check_in, driver_signature, \
     coalesce(client_signature, last_signature) as client_signature";

fn client_from_row(row: &Row) -> Result<Client> {
    let marker: Option<String> = row.get(9)?;
    Ok(Client {
        id: row.get(0)?,
        national_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        phone: row.get(4)?,
        notes: row.get(5)?,
        driver_id: row.get(6)?,
        meal_type: row.get(7)?,
        meal_count: row.get(8)?,
        last_check_in: CheckIn::parse(marker.as_deref().unwrap_or("")),
        driver_signature: row.get(10)?,
        client_signature: row.get(11)?,
    })
}

/// Fetch every client assigned to the given driver
pub fn clients_for_driver(conn: &Connection, driver_id: &str) -> Result<Vec<Client>, Error> {
    let query = format!(
        "select {} from clients where driver_id = ?1 order by id",
        CLIENT_COLUMNS
    );
    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map(params![driver_id], client_from_row)?;
    Ok(rows.collect::<Result<Vec<Client>>>()?)
}

/// Look up a single client by id
pub fn find_client(conn: &Connection, client_id: &str) -> Result<Client, Error> {
    let query = format!("select {} from clients where id = ?1", CLIENT_COLUMNS);
    conn.query_row(&query, params![client_id], client_from_row)
        .optional()?
        .ok_or_else(|| Error::ClientDoesNotExist(client_id.to_string()))
}

/// Insert a client row, used by the admin-side registry import and by tests
pub fn insert_client(conn: &Connection, client: &Client) -> Result<(), Error> {
    let mut stmt = conn.prepare_cached(
        "insert into clients
         (id, national_id, name, address, phone, notes, driver_id, meal_type,
          meal_count, last_check_in, driver_signature, client_signature)
         values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;
    let marker = client.last_check_in.encode();
    stmt.execute(params![
        client.id,
        client.national_id,
        client.name,
        client.address,
        client.phone,
        client.notes,
        client.driver_id,
        client.meal_type,
        client.meal_count,
        if marker.is_empty() { None } else { Some(marker) },
        client.driver_signature,
        client.client_signature,
    ])?;
    Ok(())
}

/// Fetch the driver's schedule. Rows whose date string fails to parse are
/// dropped silently, favoring availability over strict correctness.
pub fn schedule_for_driver(conn: &Connection, driver_id: &str) -> Result<Vec<ScheduleItem>, Error> {
    let mut stmt = conn.prepare(
        "select id, client_id, driver_id, date from schedule
            where driver_id = ?1
            order by date, id",
    )?;
    let rows = stmt.query_map(params![driver_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut items = Vec::new();
    for row in rows {
        let (id, client_id, driver_id, date) = row?;
        match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
            Ok(date) => items.push(ScheduleItem {
                id,
                client_id,
                driver_id,
                date,
            }),
            Err(_) => debug!("Dropping schedule item {}: unparseable date '{}'", id, date),
        }
    }
    Ok(items)
}

/// Schedule a client visit for one calendar date
pub fn insert_schedule_item(
    conn: &Connection,
    client_id: &str,
    driver_id: &str,
    date: NaiveDate,
) -> Result<i64, Error> {
    conn.execute(
        "insert into schedule (client_id, driver_id, date) values (?1, ?2, ?3)",
        params![client_id, driver_id, date.format("%Y-%m-%d").to_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Write the delivery completion onto the client row: both signature images
/// plus the canonical check-in marker. The legacy last_signature alias is
/// kept in step with the client signature.
pub fn update_client_delivery(
    conn: &Connection,
    client_id: &str,
    marker: &CheckIn,
    driver_signature: &str,
    client_signature: &str,
) -> Result<(), Error> {
    let updated = conn.execute(
        "update clients
            set last_check_in = ?2,
                driver_signature = ?3,
                client_signature = ?4,
                last_signature = ?4
            where id = ?1",
        params![client_id, marker.encode(), driver_signature, client_signature],
    )?;
    if updated == 0 {
        return Err(Error::ClientDoesNotExist(client_id.to_string()));
    }
    Ok(())
}

/// Write an incident (or any other) check-in marker onto the client row
pub fn update_client_checkin(
    conn: &Connection,
    client_id: &str,
    marker: &CheckIn,
) -> Result<(), Error> {
    let updated = conn.execute(
        "update clients set last_check_in = ?2 where id = ?1",
        params![client_id, marker.encode()],
    )?;
    if updated == 0 {
        return Err(Error::ClientDoesNotExist(client_id.to_string()));
    }
    Ok(())
}

/// Append one immutable delivery-history row
pub fn insert_history(conn: &Connection, record: &DeliveryHistoryRecord) -> Result<(), Error> {
    let mut stmt = conn.prepare_cached(
        "insert into delivery_history
         (client_id, client_name, egn, driver_id, start_lat, start_lng,
          end_lat, end_lng, timestamp, meal_type, meal_count, status,
          issue_type, issue_description, driver_signature, client_signature)
         values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
    )?;
    stmt.execute(params![
        record.client_id,
        record.client_name,
        record.egn,
        record.driver_id,
        record.start_location.map(|p| p.lat()),
        record.start_location.map(|p| p.lng()),
        record.end_location.map(|p| p.lat()),
        record.end_location.map(|p| p.lng()),
        record.timestamp,
        record.meal_type,
        record.meal_count,
        record.status.as_str(),
        record.issue_type,
        record.issue_description,
        record.driver_signature,
        record.client_signature,
    ])?;
    Ok(())
}

/// Append an open incident report
pub fn insert_incident(
    conn: &Connection,
    client_id: &str,
    driver_id: &str,
    kind: &str,
    description: Option<&str>,
    date: DateTime<Utc>,
) -> Result<(), Error> {
    conn.execute(
        "insert into incidents (client_id, driver_id, type, description, date, status)
            values (?1, ?2, ?3, ?4, ?5, 'open')",
        params![client_id, driver_id, kind, description, date],
    )?;
    Ok(())
}

/// Append a shift-start record to the ledger
pub fn append_shift_start(
    conn: &Connection,
    driver_id: &str,
    start_time: DateTime<Utc>,
) -> Result<(), Error> {
    conn.execute(
        "insert into shift_ledger (driver_id, start_time, end_time, status)
            values (?1, ?2, null, 'active')",
        params![driver_id, start_time],
    )?;
    Ok(())
}

/// Close the most recent active ledger record for the driver
pub fn close_active_shift(
    conn: &Connection,
    driver_id: &str,
    end_time: DateTime<Utc>,
) -> Result<(), Error> {
    let updated = conn.execute(
        "update shift_ledger
            set end_time = ?2, status = 'completed'
            where id = (
                select id from shift_ledger
                    where driver_id = ?1 and status = 'active'
                    order by start_time desc limit 1
            )",
        params![driver_id, end_time],
    )?;
    if updated == 0 {
        return Err(Error::NoActiveShiftRecord(driver_id.to_string()));
    }
    Ok(())
}

/// Slim history row used by the listing command
#[derive(Debug)]
pub struct HistoryRow {
    pub timestamp: DateTime<Utc>,
    pub client_name: String,
    pub status: String,
    pub meal_count: i64,
    pub issue_type: Option<String>,
}

fn map_history_row(row: &Row) -> Result<HistoryRow> {
    Ok(HistoryRow {
        timestamp: row.get(0)?,
        client_name: row.get(1)?,
        status: row.get(2)?,
        meal_count: row.get(3)?,
        issue_type: row.get(4)?,
    })
}

/// List history rows for a driver, optionally bounded to a date range
pub fn history_for_driver(
    conn: &Connection,
    driver_id: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<HistoryRow>, Error> {
    let mut builder = QueryStringBuilder::new(
        "select timestamp, client_name, status, meal_count, issue_type from delivery_history",
    );
    builder.and_where("driver_id = ?1").order_by("timestamp");
    match (start, end) {
        (Some(_), Some(_)) => {
            builder.and_where("timestamp >= ?2").and_where("timestamp <= ?3");
        }
        (Some(_), None) => {
            builder.and_where("timestamp >= ?2");
        }
        (None, Some(_)) => {
            builder.and_where("timestamp <= ?2");
        }
        (None, None) => {}
    }

    // bind bounds as UTC timestamps so they compare against stored values
    let day_start = |d: NaiveDate| DateTime::<Utc>::from_utc(d.and_hms(0, 0, 0), Utc);
    let day_end = |d: NaiveDate| DateTime::<Utc>::from_utc(d.and_hms(23, 59, 59), Utc);

    let query = builder.to_string();
    let mut stmt = conn.prepare(&query)?;
    let rows = match (start, end) {
        (Some(s), Some(e)) => {
            stmt.query_map(params![driver_id, day_start(s), day_end(e)], map_history_row)?
        }
        (Some(s), None) => stmt.query_map(params![driver_id, day_start(s)], map_history_row)?,
        (None, Some(e)) => stmt.query_map(params![driver_id, day_end(e)], map_history_row)?,
        (None, None) => stmt.query_map(params![driver_id], map_history_row)?,
    };
    Ok(rows.collect::<Result<Vec<HistoryRow>>>()?)
}

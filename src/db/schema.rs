use log::debug;
use rusqlite::{params, Connection, Result};

/// Create the required tables if this is a fresh database
pub fn create_database(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "create table if not exists clients (
            id                text primary key,
            national_id       text,
            name              text not null,
            address           text not null,
            phone             text,
            notes             text,
            driver_id         text,
            meal_type         text,
            meal_count        integer not null default 1,
            last_check_in     text,
            driver_signature  text,
            client_signature  text,
            last_signature    text -- legacy alias of client_signature
        )",
        params![],
    )?;

    tx.execute(
        "create table if not exists schedule (
            client_id  text not null,
            driver_id  text not null,
            date       text not null,
            id         integer primary key
        )",
        params![],
    )?;

    tx.execute(
        "create table if not exists delivery_history (
            client_id          text not null,
            client_name        text not null,
            egn                text not null,
            driver_id          text not null,
            start_lat          float,
            start_lng          float,
            end_lat            float,
            end_lng            float,
            timestamp          datetime not null,
            meal_type          text,
            meal_count         integer not null,
            status             text not null, -- 'success' or 'issue'
            issue_type         text,
            issue_description  text,
            driver_signature   text,
            client_signature   text,
            id                 integer primary key
        )",
        params![],
    )?;

    tx.execute(
        "create table if not exists shift_ledger (
            driver_id   text not null,
            start_time  datetime not null,
            end_time    datetime,
            status      text not null, -- 'active' or 'completed'
            id          integer primary key
        )",
        params![],
    )?;

    tx.execute(
        "create table if not exists incidents (
            client_id    text not null,
            driver_id    text not null,
            type         text not null,
            description  text,
            date         datetime not null,
            status       text not null, -- 'open', 'escalated' or 'resolved'
            id           integer primary key
        )",
        params![],
    )?;

    tx.commit()?;
    debug!("Completed database initialization");
    Ok(())
}

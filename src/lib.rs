//! Route and shift execution core for home food and social-care deliveries.
//!
//! Turns a driver's date-tagged assignments into an ordered, geolocated
//! route, tracks the on-shift state machine across restarts and finalizes
//! each visit through either the dual-signature delivery path or a typed
//! incident report, writing an append-only history record per completion.

pub mod checkin;
pub mod cli;
pub mod config;
pub mod db;
pub mod delivery;
mod error;
pub mod gps;
pub mod models;
pub mod route;
pub mod services;
pub mod shift;

pub use checkin::CheckIn;
pub use db::{create_database, open_db_connection};
pub use error::Error;
pub use gps::{distance_km, GeoPoint};
pub use models::{Client, IncidentKind, ScheduleItem, Signature};
pub use route::{plan_route, GeocodeCache, RoutePlan, Visit};
pub use shift::{start_shift, summarize_shift, ShiftState, ShiftStore, ShiftSummary};

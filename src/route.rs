//! Assemble a driver's raw date-tagged assignments into an ordered,
//! geolocated route.
//!
//! The route is a pure projection of schedule + clients + geocode cache +
//! driver position. It is recomputed from scratch on every call and never
//! cached, re-running with unchanged inputs yields identical output.
use crate::gps::{distance_km, GeoPoint};
use crate::models::{Client, ScheduleItem};
use crate::services::GeocodingService;
use chrono::{Duration, NaiveDate};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Session-lifetime geocode cache keyed by the trimmed address string.
///
/// The `requested` set records addresses that have already been dispatched so
/// each address triggers at most one lookup per session, even when the lookup
/// came back empty.
#[derive(Debug, Default)]
pub struct GeocodeCache {
    points: HashMap<String, GeoPoint>,
    requested: HashSet<String>,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &str) -> Option<GeoPoint> {
        self.points.get(address.trim()).copied()
    }

    /// Seed a coordinate directly, a later resolution for the same address
    /// harmlessly overwrites it
    pub fn insert(&mut self, address: &str, point: GeoPoint) {
        let key = address.trim().to_string();
        self.requested.insert(key.clone());
        self.points.insert(key, point);
    }

    /// Dispatch a geocode lookup unless this address was already requested
    pub fn ensure(&mut self, address: &str, geocoder: &dyn GeocodingService) {
        let key = address.trim();
        if key.is_empty() || self.requested.contains(key) {
            return;
        }
        self.requested.insert(key.to_string());
        if let Some(point) = geocoder.resolve(key) {
            self.points.insert(key.to_string(), point);
        }
    }
}

/// One scheduled client stop, derived fresh on every planning pass and never
/// persisted
#[derive(Clone, Debug)]
pub struct Visit {
    pub client: Client,
    pub schedule_id: i64,
    pub date: NaiveDate,
    /// 1-based position in today's route, assignment order
    pub sequence: Option<u32>,
    /// straight-line distance from the previous stop (or the driver's live
    /// position for the first stop), None when either endpoint is unknown
    pub distance_from_previous_km: Option<f64>,
    /// geocoded coordinate of the client address, when known
    pub point: Option<GeoPoint>,
}

/// The driver's assignments partitioned by date relative to "today"
#[derive(Clone, Debug, Default)]
pub struct RoutePlan {
    pub today: Vec<Visit>,
    pub tomorrow: Vec<Visit>,
    pub upcoming: Vec<Visit>,
}

/// Project the schedule into a route plan for one driver.
///
/// Items that do not join to a client are dropped silently, that is a
/// data-integrity tolerance rather than a user-visible error. Only today's
/// stops are geocoded, sequenced and annotated with distances.
pub fn plan_route(
    driver_id: &str,
    schedule: &[ScheduleItem],
    clients: &[Client],
    cache: &mut GeocodeCache,
    geocoder: Option<&dyn GeocodingService>,
    driver_position: Option<GeoPoint>,
    today: NaiveDate,
) -> RoutePlan {
    let by_id: HashMap<&str, &Client> = clients.iter().map(|c| (c.id.as_str(), c)).collect();
    let tomorrow = today + Duration::days(1);

    let mut plan = RoutePlan::default();
    for item in schedule.iter().filter(|s| s.driver_id == driver_id) {
        let client = match by_id.get(item.client_id.as_str()) {
            Some(client) => (*client).clone(),
            None => {
                debug!(
                    "Dropping schedule item {}: client '{}' not found",
                    item.id, item.client_id
                );
                continue;
            }
        };
        let visit = Visit {
            client,
            schedule_id: item.id,
            date: item.date,
            sequence: None,
            distance_from_previous_km: None,
            point: None,
        };
        if item.date == today {
            plan.today.push(visit);
        } else if item.date == tomorrow {
            plan.tomorrow.push(visit);
        } else if item.date > tomorrow {
            plan.upcoming.push(visit);
        } else {
            // strictly past dates fall out of all buckets
            debug!(
                "Dropping schedule item {} dated {} (before today)",
                item.id, item.date
            );
        }
    }
    plan.tomorrow.sort_by_key(|v| (v.date, v.schedule_id));
    plan.upcoming.sort_by_key(|v| (v.date, v.schedule_id));

    // geocode today's stops through the cache, at most one dispatch per address
    if let Some(geocoder) = geocoder {
        for visit in &plan.today {
            cache.ensure(&visit.client.address, geocoder);
        }
    }

    // sequence numbers follow assignment order, no route optimization happens
    let mut previous = driver_position;
    for (idx, visit) in plan.today.iter_mut().enumerate() {
        visit.sequence = Some(idx as u32 + 1);
        visit.point = cache.get(&visit.client.address);
        // None whenever either endpoint is unknown
        visit.distance_from_previous_km = match (previous, visit.point) {
            (Some(a), Some(b)) => Some(distance_km(a, b)),
            _ => None,
        };
        previous = visit.point;
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverDispatched;

    impl GeocodingService for NeverDispatched {
        fn resolve(&self, address: &str) -> Option<GeoPoint> {
            panic!("unexpected geocode dispatch for '{}'", address);
        }
    }

    #[test]
    fn seeded_addresses_are_not_redispatched() {
        let mut cache = GeocodeCache::new();
        let point = GeoPoint::new(42.7, 23.33);
        cache.insert("ul. Pirin 12", point);
        cache.ensure("  ul. Pirin 12  ", &NeverDispatched);
        assert_eq!(cache.get("ul. Pirin 12"), Some(point));
    }

    #[test]
    fn empty_addresses_never_dispatch() {
        let mut cache = GeocodeCache::new();
        cache.ensure("   ", &NeverDispatched);
        assert_eq!(cache.get(""), None);
    }
}

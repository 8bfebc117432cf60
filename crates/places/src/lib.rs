use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use wayfare_core::{
    CabinClass, DestinationInfo, FlightOption, LocationSnapshot, PlaceRecord, TransportOption,
};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");
const DEFAULT_KEY: &str = "default";

/// Supplier of hotels, restaurants, sights, fares and local transport for a
/// destination.
pub trait PlaceDataSource: Send + Sync {
    async fn fetch(
        &self,
        destination: &str,
        origin: Option<&str>,
        include_flights: bool,
    ) -> Result<LocationSnapshot>;
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogEntry {
    info: DestinationInfo,
    #[serde(default)]
    base_fare: Option<f64>,
    #[serde(default)]
    attractions: Vec<PlaceRecord>,
    #[serde(default)]
    activities: Vec<PlaceRecord>,
    #[serde(default)]
    hotels: Vec<PlaceRecord>,
    #[serde(default)]
    restaurants: Vec<PlaceRecord>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    default_fare: f64,
    destinations: HashMap<String, CatalogEntry>,
    #[serde(default)]
    fares: HashMap<String, f64>,
    #[serde(default)]
    local_transport: Vec<TransportOption>,
}

/// Offline place data: a per-destination catalog with synthetic fares.
/// Unknown destinations get the `default` entry under their own name.
#[derive(Debug, Clone)]
pub struct DemoCatalog {
    fallback: CatalogEntry,
    destinations: HashMap<String, CatalogEntry>,
    fares: HashMap<String, f64>,
    default_fare: f64,
    local_transport: Vec<TransportOption>,
}

impl DemoCatalog {
    pub fn load_default() -> Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG).context("built-in catalog is malformed")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading catalog {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("invalid catalog {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        let mut destinations = file
            .destinations
            .into_iter()
            .map(|(key, entry)| (normalize_key(&key), entry))
            .collect::<HashMap<_, _>>();
        let fallback = destinations
            .remove(DEFAULT_KEY)
            .context("catalog has no default entry")?;

        Ok(Self {
            fallback,
            destinations,
            fares: file
                .fares
                .into_iter()
                .map(|(key, fare)| (normalize_key(&key), fare))
                .collect(),
            default_fare: file.default_fare,
            local_transport: file.local_transport,
        })
    }

    pub fn known_destinations(&self) -> Vec<String> {
        let mut names = self
            .destinations
            .values()
            .map(|entry| entry.info.name.clone())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    pub fn snapshot(&self, destination: &str, include_flights: bool) -> LocationSnapshot {
        let key = normalize_key(destination);
        let entry = self.destinations.get(&key);
        let source = entry.unwrap_or(&self.fallback);

        let info = match entry {
            Some(entry) => entry.info.clone(),
            None => DestinationInfo {
                name: title_case(destination),
                ..self.fallback.info.clone()
            },
        };

        LocationSnapshot {
            destination: info,
            hotels: source.hotels.clone(),
            restaurants: source.restaurants.clone(),
            activities: source.activities.clone(),
            attractions: source.attractions.clone(),
            flights: include_flights.then(|| self.flights_to(&key)),
            local_transport: self.local_transport.clone(),
        }
    }

    /// Three synthetic options a week out: base fare, a cheaper one, and a
    /// business seat.
    pub fn flights_to(&self, destination: &str) -> Vec<FlightOption> {
        let key = normalize_key(destination);
        let base = self
            .destinations
            .get(&key)
            .and_then(|entry| entry.base_fare)
            .or_else(|| self.fares.get(&key).copied())
            .unwrap_or(self.default_fare);
        let departure = Utc::now() + Duration::days(7);

        vec![
            FlightOption {
                flight_number: "AA123".to_string(),
                airline: "American Airlines".to_string(),
                departure,
                arrival: departure + Duration::hours(12),
                price: base,
                cabin_class: CabinClass::Economy,
            },
            FlightOption {
                flight_number: "DL456".to_string(),
                airline: "Delta Airlines".to_string(),
                departure: departure + Duration::hours(3),
                arrival: departure + Duration::hours(15),
                price: (base - 100.0).max(0.0),
                cabin_class: CabinClass::Economy,
            },
            FlightOption {
                flight_number: "UA789".to_string(),
                airline: "United Airlines".to_string(),
                departure: departure + Duration::hours(6),
                arrival: departure + Duration::hours(18),
                price: base + 200.0,
                cabin_class: CabinClass::Business,
            },
        ]
    }
}

impl PlaceDataSource for DemoCatalog {
    async fn fetch(
        &self,
        destination: &str,
        origin: Option<&str>,
        include_flights: bool,
    ) -> Result<LocationSnapshot> {
        let snapshot = self.snapshot(destination, include_flights);
        info!(
            destination = %snapshot.destination.name,
            origin = origin.unwrap_or("unknown"),
            hotels = snapshot.hotels.len(),
            restaurants = snapshot.restaurants.len(),
            activities = snapshot.activities.len(),
            attractions = snapshot.attractions.len(),
            flights = snapshot.flights.as_ref().map(Vec::len).unwrap_or(0),
            "place data loaded from catalog"
        );
        debug!(known = ?self.known_destinations(), "catalog destinations");
        Ok(snapshot)
    }
}

fn normalize_key(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::estimator::{self, HotelTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityPreference {
    Relaxed,
    #[default]
    Moderate,
    Active,
}

impl ActivityPreference {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "relaxed" | "low" | "chill" => Some(Self::Relaxed),
            "moderate" | "medium" | "balanced" => Some(Self::Moderate),
            "active" | "high" | "adventurous" => Some(Self::Active),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relaxed => "relaxed",
            Self::Moderate => "moderate",
            Self::Active => "active",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

/// Hotel, restaurant, activity or attraction as supplied by the place-data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub name: String,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_night: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl PlaceRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Explicit `price_per_night`, or the price-level estimate.
    pub fn nightly_rate(&self) -> f64 {
        self.price_per_night
            .map(non_negative)
            .unwrap_or_else(|| estimator::hotel_nightly_price(self.price_level))
    }

    pub fn meal_price(&self) -> f64 {
        self.avg_price
            .map(non_negative)
            .unwrap_or_else(|| estimator::meal_price(self.price_level))
    }

    /// `None` when the record carries neither `price` nor `price_level`.
    pub fn activity_price(&self) -> Option<f64> {
        match (self.price, self.price_level) {
            (Some(price), _) => Some(non_negative(price)),
            (None, Some(level)) => Some(estimator::activity_price(Some(level))),
            (None, None) => None,
        }
    }

    pub fn hotel_tier(&self) -> Option<HotelTier> {
        self.category
            .as_deref()
            .and_then(HotelTier::parse)
            .or_else(|| self.price_level.map(|level| HotelTier::from_price_level(Some(level))))
    }

    /// Restaurants without a level are treated as mid-priced.
    pub fn effective_price_level(&self) -> u8 {
        self.price_level.unwrap_or(2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOption {
    pub flight_number: String,
    pub airline: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub price: f64,
    #[serde(rename = "class")]
    pub cabin_class: CabinClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportOption {
    pub mode: String,
    pub price: f64,
    pub route: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    #[serde(rename = "destination_info")]
    pub destination: DestinationInfo,
    #[serde(default)]
    pub hotels: Vec<PlaceRecord>,
    #[serde(default)]
    pub restaurants: Vec<PlaceRecord>,
    #[serde(default)]
    pub activities: Vec<PlaceRecord>,
    #[serde(default)]
    pub attractions: Vec<PlaceRecord>,
    #[serde(default)]
    pub flights: Option<Vec<FlightOption>>,
    #[serde(default)]
    pub local_transport: Vec<TransportOption>,
}

impl LocationSnapshot {
    pub fn cheapest_fare(&self) -> Option<f64> {
        self.flights
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|flight| non_negative(flight.price))
            .min_by(f64::total_cmp)
    }

    pub fn cheapest_nightly_rate(&self) -> Option<f64> {
        self.hotels
            .iter()
            .map(PlaceRecord::nightly_rate)
            .min_by(f64::total_cmp)
    }

    /// Average nightly rate across hotels in the `budget` tier.
    pub fn budget_tier_nightly_rate(&self) -> Option<f64> {
        mean(
            self.hotels
                .iter()
                .filter(|hotel| hotel.hotel_tier() == Some(HotelTier::Budget))
                .map(PlaceRecord::nightly_rate),
        )
    }

    /// Average meal price across restaurants at level two or below, falling
    /// back to every restaurant when none qualify.
    pub fn average_meal_price(&self) -> Option<f64> {
        mean(
            self.restaurants
                .iter()
                .filter(|restaurant| restaurant.effective_price_level() <= 2)
                .map(PlaceRecord::meal_price),
        )
        .or_else(|| mean(self.restaurants.iter().map(PlaceRecord::meal_price)))
    }

    pub fn average_local_fare(&self) -> Option<f64> {
        mean(
            self.local_transport
                .iter()
                .take(2)
                .map(|option| non_negative(option.price)),
        )
    }

    pub fn average_activity_price(&self) -> Option<f64> {
        mean(
            self.activities
                .iter()
                .chain(self.attractions.iter())
                .filter_map(PlaceRecord::activity_price),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetCategory {
    Flights,
    Hotels,
    Food,
    Travel,
    Activities,
}

impl BudgetCategory {
    pub const ALL: [BudgetCategory; 5] = [
        Self::Flights,
        Self::Hotels,
        Self::Food,
        Self::Travel,
        Self::Activities,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "flights" => Some(Self::Flights),
            "hotels" => Some(Self::Hotels),
            "food" => Some(Self::Food),
            "travel" | "transport" => Some(Self::Travel),
            "activities" => Some(Self::Activities),
            _ => None,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Flights => "flights",
            Self::Hotels => "hotels",
            Self::Food => "food",
            Self::Travel => "travel",
            Self::Activities => "activities",
        }
    }
}

impl fmt::Display for BudgetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Floor cost of a trip, used only for feasibility gating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub flights: f64,
    pub hotels: f64,
    pub food: f64,
    pub transport: f64,
    pub activities: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.flights + self.hotels + self.food + self.transport + self.activities
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryAllocation {
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub categories: BTreeMap<BudgetCategory, CategoryAllocation>,
    pub total_allocated: f64,
    pub remaining_budget: f64,
    pub remaining_percentage: f64,
    pub grand_total: f64,
    pub original_budget: f64,
}

impl BudgetAllocation {
    pub fn amount(&self, category: BudgetCategory) -> f64 {
        self.categories
            .get(&category)
            .map(|allocation| allocation.amount)
            .unwrap_or_default()
    }

    pub fn category_sum(&self) -> f64 {
        self.categories.values().map(|allocation| allocation.amount).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub sufficient: bool,
    pub minimum_budget: f64,
    pub current_budget: f64,
    pub message: String,
    pub breakdown: CostBreakdown,
}

/// Trip shape shared by the calculator and the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripShape {
    pub duration: u32,
    pub travelers: u32,
    pub include_flights: bool,
    pub include_hotels: bool,
}

impl TripShape {
    /// Double occupancy.
    pub fn rooms_needed(&self) -> u32 {
        self.travelers.div_ceil(2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripParameters {
    pub destination: String,
    pub budget: f64,
    pub duration: u32,
    pub travelers: u32,
    #[serde(default)]
    pub activity_preference: ActivityPreference,
    #[serde(default)]
    pub include_flights: bool,
    #[serde(default)]
    pub include_hotels: bool,
    #[serde(default)]
    pub user_location: Option<String>,
}

impl TripParameters {
    pub fn shape(&self) -> TripShape {
        TripShape {
            duration: self.duration,
            travelers: self.travelers,
            include_flights: self.include_flights,
            include_hotels: self.include_hotels,
        }
    }

    /// "Lisbon, Portugal" -> "Lisbon".
    pub fn destination_city(&self) -> &str {
        self.destination
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
    }
}

/// Partial update to a stored itinerary; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripChanges {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub travelers: Option<u32>,
    #[serde(default)]
    pub activity_preference: Option<ActivityPreference>,
    #[serde(default)]
    pub include_flights: Option<bool>,
    #[serde(default)]
    pub include_hotels: Option<bool>,
}

impl TripChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, current: &TripParameters) -> TripParameters {
        TripParameters {
            destination: self
                .destination
                .clone()
                .unwrap_or_else(|| current.destination.clone()),
            budget: self.budget.unwrap_or(current.budget),
            duration: self.duration.unwrap_or(current.duration),
            travelers: self.travelers.unwrap_or(current.travelers),
            activity_preference: self
                .activity_preference
                .unwrap_or(current.activity_preference),
            include_flights: self.include_flights.unwrap_or(current.include_flights),
            include_hotels: self.include_hotels.unwrap_or(current.include_hotels),
            user_location: current.user_location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    pub title: String,
    pub morning: TimeSlot,
    pub afternoon: TimeSlot,
    pub evening: TimeSlot,
    pub activities_budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub itinerary_id: String,
    pub destination: DestinationInfo,
    pub parameters: TripParameters,
    pub budget_breakdown: BudgetAllocation,
    pub daily_activities: Vec<DayPlan>,
    pub hotels: Vec<PlaceRecord>,
    pub restaurants: Vec<PlaceRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0_f64, 0_usize), |(sum, count), value| {
        (sum + value, count + 1)
    });
    (count > 0).then(|| sum / count as f64)
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooms_round_up_for_odd_parties() {
        let shape = |travelers| TripShape {
            duration: 1,
            travelers,
            include_flights: false,
            include_hotels: true,
        };
        assert_eq!(shape(1).rooms_needed(), 1);
        assert_eq!(shape(2).rooms_needed(), 1);
        assert_eq!(shape(3).rooms_needed(), 2);
        assert_eq!(shape(5).rooms_needed(), 3);
    }

    #[test]
    fn restaurants_without_level_count_as_budget_tier() {
        let snapshot = LocationSnapshot {
            restaurants: vec![
                PlaceRecord {
                    avg_price: Some(12.0),
                    ..PlaceRecord::named("Corner Cafe")
                },
                PlaceRecord {
                    avg_price: Some(90.0),
                    price_level: Some(4),
                    ..PlaceRecord::named("Tasting Room")
                },
            ],
            ..LocationSnapshot::default()
        };
        assert_eq!(snapshot.average_meal_price(), Some(12.0));
    }

    #[test]
    fn attraction_without_price_signal_is_skipped() {
        let snapshot = LocationSnapshot {
            activities: vec![PlaceRecord {
                price: Some(40.0),
                ..PlaceRecord::named("Kayak Tour")
            }],
            attractions: vec![
                PlaceRecord::named("Old Town Square"),
                PlaceRecord {
                    price_level: Some(1),
                    ..PlaceRecord::named("City Museum")
                },
            ],
            ..LocationSnapshot::default()
        };
        assert_eq!(snapshot.average_activity_price(), Some(27.5));
    }

    #[test]
    fn place_records_accept_source_field_names() {
        let snapshot: LocationSnapshot = serde_json::from_value(serde_json::json!({
            "destination_info": { "name": "Bali" },
            "hotels": [{ "name": "Bali Budget Inn", "category": "budget", "rating": 4.2, "price_per_night": 35 }],
            "activities": [{ "name": "Yoga Retreat", "type": "Wellness", "price": 25 }],
            "flights": null,
            "local_transport": [{ "mode": "Public Transit", "price": 3, "route": "Center" }]
        }))
        .unwrap();

        assert_eq!(snapshot.hotels[0].hotel_tier(), Some(HotelTier::Budget));
        assert_eq!(snapshot.activities[0].category.as_deref(), Some("Wellness"));
        assert!(snapshot.flights.is_none());
        assert!(snapshot.restaurants.is_empty());
    }

    #[test]
    fn allocation_serializes_category_keys() {
        let mut categories = BTreeMap::new();
        categories.insert(
            BudgetCategory::Travel,
            CategoryAllocation {
                amount: 140.0,
                percentage: 7.0,
            },
        );
        let allocation = BudgetAllocation {
            categories,
            total_allocated: 140.0,
            remaining_budget: 0.0,
            remaining_percentage: 0.0,
            grand_total: 140.0,
            original_budget: 2000.0,
        };

        let value = serde_json::to_value(&allocation).unwrap();
        assert_eq!(value["categories"]["travel"]["amount"], 140.0);
        let back: BudgetAllocation = serde_json::from_value(value).unwrap();
        assert_eq!(back.amount(BudgetCategory::Travel), 140.0);
    }

    #[test]
    fn changes_preserve_unspecified_fields() {
        let current = TripParameters {
            destination: "Rome, Italy".to_string(),
            budget: 3000.0,
            duration: 4,
            travelers: 2,
            activity_preference: ActivityPreference::Relaxed,
            include_flights: true,
            include_hotels: true,
            user_location: Some("Boston".to_string()),
        };
        let changes = TripChanges {
            budget: Some(4200.0),
            ..TripChanges::default()
        };

        let merged = changes.apply_to(&current);
        assert_eq!(merged.budget, 4200.0);
        assert_eq!(merged.destination, "Rome, Italy");
        assert_eq!(merged.destination_city(), "Rome");
        assert_eq!(merged.activity_preference, ActivityPreference::Relaxed);
        assert_eq!(merged.user_location.as_deref(), Some("Boston"));
    }
}

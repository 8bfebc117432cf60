//! Price-level (0-4, Google Places ordinal) to currency lookups.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceCategory {
    Hotel,
    Meal,
    Activity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotelTier {
    Budget,
    MidRange,
    Luxury,
}

impl HotelTier {
    pub fn from_price_level(level: Option<u8>) -> Self {
        match level.unwrap_or(2) {
            0 | 1 => Self::Budget,
            2 => Self::MidRange,
            _ => Self::Luxury,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "budget" => Some(Self::Budget),
            "mid_range" | "mid-range" | "midrange" => Some(Self::MidRange),
            "luxury" => Some(Self::Luxury),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::MidRange => "mid_range",
            Self::Luxury => "luxury",
        }
    }
}

const HOTEL_NIGHTLY: [f64; 5] = [30.0, 60.0, 120.0, 250.0, 400.0];
const MEAL: [f64; 5] = [5.0, 10.0, 25.0, 50.0, 100.0];
const ACTIVITY: [f64; 5] = [0.0, 15.0, 35.0, 75.0, 150.0];

// Index 2 is the mid tier, used for unknown or missing levels.
fn lookup(table: &[f64; 5], level: Option<u8>) -> f64 {
    level
        .and_then(|level| table.get(usize::from(level)).copied())
        .unwrap_or(table[2])
}

pub fn estimate_cost(category: PriceCategory, level: Option<u8>) -> f64 {
    match category {
        PriceCategory::Hotel => lookup(&HOTEL_NIGHTLY, level),
        PriceCategory::Meal => lookup(&MEAL, level),
        PriceCategory::Activity => lookup(&ACTIVITY, level),
    }
}

pub fn hotel_nightly_price(level: Option<u8>) -> f64 {
    estimate_cost(PriceCategory::Hotel, level)
}

pub fn meal_price(level: Option<u8>) -> f64 {
    estimate_cost(PriceCategory::Meal, level)
}

pub fn activity_price(level: Option<u8>) -> f64 {
    estimate_cost(PriceCategory::Activity, level)
}

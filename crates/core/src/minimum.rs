//! Floor cost of a trip. Cheapest-of selections, used for feasibility only;
//! the allocator prices hotels differently on purpose.

use crate::error::{ensure_trip_shape, BudgetResult};
use crate::models::{CostBreakdown, LocationSnapshot, TripShape};

pub const DEFAULT_FLIGHT_FARE: f64 = 500.0;
pub const FALLBACK_NIGHTLY_RATE: f64 = 100.0;
pub const FALLBACK_MEAL_PRICE: f64 = 25.0;
pub const MEALS_PER_DAY: f64 = 3.0;
pub const FALLBACK_TRANSPORT_PER_DAY: f64 = 15.0;
pub const ACTIVITIES_PER_DAY: f64 = 2.0;
pub const FALLBACK_ACTIVITIES_PER_DAY: f64 = 30.0;

pub fn compute_minimum_cost(
    snapshot: &LocationSnapshot,
    shape: &TripShape,
) -> BudgetResult<CostBreakdown> {
    ensure_trip_shape(shape.duration, shape.travelers)?;

    let nights = f64::from(shape.duration);
    let travelers = f64::from(shape.travelers);
    let person_days = nights * travelers;

    let flights = if shape.include_flights {
        flight_cost(snapshot, shape)
    } else {
        0.0
    };

    let hotels = if shape.include_hotels {
        let nightly = snapshot
            .cheapest_nightly_rate()
            .unwrap_or(FALLBACK_NIGHTLY_RATE);
        nightly * nights * f64::from(shape.rooms_needed())
    } else {
        0.0
    };

    let transport = snapshot
        .average_local_fare()
        .map(|fare| fare * person_days)
        .unwrap_or(FALLBACK_TRANSPORT_PER_DAY * person_days);

    let activities = snapshot
        .average_activity_price()
        .map(|price| price * ACTIVITIES_PER_DAY * person_days)
        .unwrap_or(FALLBACK_ACTIVITIES_PER_DAY * person_days);

    Ok(CostBreakdown {
        flights,
        hotels,
        food: food_cost(snapshot, shape),
        transport,
        activities,
    })
}

/// Cheapest fare for the whole party, or the default fare when no fares are known.
pub(crate) fn flight_cost(snapshot: &LocationSnapshot, shape: &TripShape) -> f64 {
    snapshot.cheapest_fare().unwrap_or(DEFAULT_FLIGHT_FARE) * f64::from(shape.travelers)
}

pub(crate) fn food_cost(snapshot: &LocationSnapshot, shape: &TripShape) -> f64 {
    let per_meal = snapshot
        .average_meal_price()
        .unwrap_or(FALLBACK_MEAL_PRICE);
    per_meal * MEALS_PER_DAY * f64::from(shape.duration) * f64::from(shape.travelers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BudgetError;
    use crate::models::{PlaceRecord, TransportOption};
    use crate::testing::{flight, sample_snapshot};

    fn shape(include_flights: bool, include_hotels: bool) -> TripShape {
        TripShape {
            duration: 5,
            travelers: 2,
            include_flights,
            include_hotels,
        }
    }

    #[test]
    fn empty_snapshot_uses_fallbacks() {
        let breakdown =
            compute_minimum_cost(&LocationSnapshot::default(), &shape(true, true)).unwrap();

        assert_eq!(breakdown.flights, 1000.0);
        assert_eq!(breakdown.hotels, 500.0);
        assert_eq!(breakdown.food, 750.0);
        assert_eq!(breakdown.transport, 150.0);
        assert_eq!(breakdown.activities, 300.0);
        assert_eq!(breakdown.total(), 2700.0);
    }

    #[test]
    fn excluded_categories_are_zero() {
        let breakdown = compute_minimum_cost(&sample_snapshot(), &shape(false, false)).unwrap();
        assert_eq!(breakdown.flights, 0.0);
        assert_eq!(breakdown.hotels, 0.0);
        assert!(breakdown.food > 0.0);
    }

    #[test]
    fn uses_cheapest_hotel_and_fare() {
        let breakdown = compute_minimum_cost(&sample_snapshot(), &shape(true, true)).unwrap();

        assert_eq!(breakdown.flights, 1000.0);
        // cheapest nightly 60, 5 nights, one room
        assert_eq!(breakdown.hotels, 300.0);
        // budget restaurants average 10, three meals, 10 person-days
        assert_eq!(breakdown.food, 300.0);
        // first two transport modes average (3 + 25) / 2
        assert_eq!(breakdown.transport, 140.0);
        // activities 35 and 25 average 30, two per day
        assert_eq!(breakdown.activities, 600.0);
    }

    #[test]
    fn empty_fare_list_uses_default_fare() {
        let mut snapshot = sample_snapshot();
        snapshot.flights = Some(Vec::new());
        let breakdown = compute_minimum_cost(&snapshot, &shape(true, false)).unwrap();
        assert_eq!(breakdown.flights, 1000.0);

        snapshot.flights = Some(vec![flight("XX1", 320.0)]);
        let breakdown = compute_minimum_cost(&snapshot, &shape(true, false)).unwrap();
        assert_eq!(breakdown.flights, 640.0);
    }

    #[test]
    fn transport_averages_only_first_two_modes() {
        let snapshot = LocationSnapshot {
            local_transport: vec![
                TransportOption {
                    mode: "Tram".to_string(),
                    price: 2.0,
                    route: "Center".to_string(),
                },
                TransportOption {
                    mode: "Bike share".to_string(),
                    price: 4.0,
                    route: "Waterfront".to_string(),
                },
                TransportOption {
                    mode: "Private driver".to_string(),
                    price: 400.0,
                    route: "Anywhere".to_string(),
                },
            ],
            ..LocationSnapshot::default()
        };
        let breakdown = compute_minimum_cost(&snapshot, &shape(false, false)).unwrap();
        assert_eq!(breakdown.transport, 30.0);
    }

    #[test]
    fn expensive_restaurants_only_use_overall_average() {
        let snapshot = LocationSnapshot {
            restaurants: vec![
                PlaceRecord {
                    price_level: Some(3),
                    avg_price: Some(50.0),
                    ..PlaceRecord::named("Harbor Grill")
                },
                PlaceRecord {
                    price_level: Some(4),
                    avg_price: Some(100.0),
                    ..PlaceRecord::named("Chef's Table")
                },
            ],
            ..LocationSnapshot::default()
        };
        let one_night_solo = TripShape {
            duration: 1,
            travelers: 1,
            include_flights: false,
            include_hotels: false,
        };
        let breakdown = compute_minimum_cost(&snapshot, &one_night_solo).unwrap();
        assert_eq!(breakdown.food, 225.0);
    }

    #[test]
    fn rejects_zero_duration_or_travelers() {
        let zero_nights = TripShape {
            duration: 0,
            ..shape(true, true)
        };
        assert!(matches!(
            compute_minimum_cost(&sample_snapshot(), &zero_nights),
            Err(BudgetError::InvalidArgument(_))
        ));

        let nobody = TripShape {
            travelers: 0,
            ..shape(true, true)
        };
        assert!(compute_minimum_cost(&sample_snapshot(), &nobody).is_err());
    }
}

use crate::allocator::round_cents;
use crate::models::{
    ActivityPreference, BudgetAllocation, BudgetCategory, DayPlan, LocationSnapshot, PlaceRecord,
    TimeSlot,
};

/// Deterministic day-by-day outline: arrival, exploring days, departure.
/// Known attractions and restaurants are rotated into the slots.
pub fn build_day_plans(
    snapshot: &LocationSnapshot,
    duration: u32,
    preference: ActivityPreference,
    allocation: &BudgetAllocation,
) -> Vec<DayPlan> {
    let destination = snapshot.destination.name.as_str();
    let days = duration.max(1);
    let activities_budget =
        round_cents(allocation.amount(BudgetCategory::Activities) / f64::from(days));

    let sights = snapshot
        .attractions
        .iter()
        .chain(snapshot.activities.iter())
        .collect::<Vec<_>>();
    let sight = |day: u32| pick(&sights, day);
    let restaurants = snapshot.restaurants.iter().collect::<Vec<_>>();
    let dinner = |day: u32| pick(&restaurants, day);

    let mut plans = Vec::with_capacity(days as usize);
    for day in 1..=days {
        let plan = if day == 1 {
            DayPlan {
                day,
                title: format!("Day {}: Arrival in {}", day, destination),
                morning: slot(
                    "09:00 - 12:00",
                    "Arrival and Hotel Check-in",
                    "Settle in and get acquainted with your accommodation",
                ),
                afternoon: slot(
                    "13:00 - 17:00",
                    &sight(day)
                        .map(|place| format!("Visit {}", place.name))
                        .unwrap_or_else(|| "Local Area Exploration".to_string()),
                    "Take a walk around your neighborhood and visit nearby attractions",
                ),
                evening: dinner_slot(dinner(day), "Welcome Dinner", "Enjoy your first meal in the city"),
                activities_budget,
            }
        } else if day == days {
            DayPlan {
                day,
                title: format!("Day {}: Departure from {}", day, destination),
                morning: slot(
                    "09:00 - 12:00",
                    &sight(day)
                        .map(|place| format!("Last look at {}", place.name))
                        .unwrap_or_else(|| "Last Minute Sightseeing".to_string()),
                    "Visit any remaining spots on your list",
                ),
                afternoon: slot(
                    "13:00 - 17:00",
                    "Final Experiences",
                    "Enjoy your last activities before departure",
                ),
                evening: dinner_slot(dinner(day), "Farewell Dinner", "One last memorable meal in the city"),
                activities_budget,
            }
        } else {
            let (afternoon_name, afternoon_description) = match preference {
                ActivityPreference::Relaxed => (
                    "Slow Afternoon",
                    "Cafe stop and an unhurried stroll, with time to rest before dinner",
                ),
                ActivityPreference::Moderate => (
                    "Afternoon Adventures",
                    "Continue discovering the city's highlights",
                ),
                ActivityPreference::Active => (
                    "Full Afternoon Excursion",
                    "Guided tour or outdoor excursion, back in time for dinner",
                ),
            };
            DayPlan {
                day,
                title: format!("Day {}: Exploring {}", day, destination),
                morning: slot(
                    "09:00 - 12:00",
                    &sight(day)
                        .map(|place| place.name.clone())
                        .unwrap_or_else(|| "Morning Activities".to_string()),
                    "Explore local attractions and sights",
                ),
                afternoon: slot("13:00 - 17:00", afternoon_name, afternoon_description),
                evening: dinner_slot(dinner(day), "Evening Relaxation", "Dinner and evening activities"),
                activities_budget,
            }
        };
        plans.push(plan);
    }

    plans
}

fn pick<'a>(places: &[&'a PlaceRecord], day: u32) -> Option<&'a PlaceRecord> {
    if places.is_empty() {
        None
    } else {
        Some(places[(day as usize - 1) % places.len()])
    }
}

fn dinner_slot(restaurant: Option<&PlaceRecord>, fallback: &str, description: &str) -> TimeSlot {
    match restaurant {
        Some(place) => slot(
            "18:00 - 21:00",
            &format!("{} at {}", fallback, place.name),
            description,
        ),
        None => slot("18:00 - 21:00", fallback, description),
    }
}

fn slot(time: &str, name: &str, description: &str) -> TimeSlot {
    TimeSlot {
        time: time.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    }
}

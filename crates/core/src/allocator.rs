//! Stepwise budget split: flights, hotels, food, then a fixed-ratio
//! distribution of whatever is left. Each step sees only the ledger produced
//! by the previous one, and the steps always run in `PIPELINE` order.

use std::collections::BTreeMap;

use tracing::{debug, error, info};

use crate::error::{ensure_budget, ensure_trip_shape, BudgetResult};
use crate::minimum::{flight_cost, food_cost, FALLBACK_NIGHTLY_RATE};
use crate::models::{
    BudgetAllocation, BudgetCategory, CategoryAllocation, LocationSnapshot, TripShape,
};

/// Hotels may take at most this share of what is left after flights.
pub const HOTEL_CAP_SHARE: f64 = 0.40;
/// Food may take at most this share of what is left after flights and hotels.
pub const FOOD_CAP_SHARE: f64 = 0.35;
pub const TRAVEL_WEIGHT: f64 = 0.20;
pub const ACTIVITIES_WEIGHT: f64 = 0.35;
pub const BUFFER_WEIGHT: f64 = 0.10;
/// Maximum allowed gap between `grand_total` and the original budget.
pub const RECONCILIATION_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Ledger {
    budget: f64,
    flights: f64,
    hotels: f64,
    food: f64,
    travel: f64,
    activities: f64,
    buffer: f64,
}

impl Ledger {
    fn allocated(&self) -> f64 {
        self.flights + self.hotels + self.food + self.travel + self.activities
    }

    fn remaining(&self) -> f64 {
        (self.budget - self.allocated()).max(0.0)
    }
}

struct StepInput<'a> {
    snapshot: &'a LocationSnapshot,
    shape: &'a TripShape,
}

type Step = fn(Ledger, &StepInput<'_>) -> Ledger;

const PIPELINE: [(&str, Step); 4] = [
    ("flights", allocate_flights),
    ("hotels", allocate_hotels),
    ("food", allocate_food),
    ("remainder", distribute_remainder),
];

pub fn allocate_budget(
    snapshot: &LocationSnapshot,
    budget: f64,
    shape: &TripShape,
) -> BudgetResult<BudgetAllocation> {
    ensure_budget(budget)?;
    ensure_trip_shape(shape.duration, shape.travelers)?;

    let input = StepInput { snapshot, shape };
    let ledger = PIPELINE.iter().fold(
        Ledger {
            budget,
            ..Ledger::default()
        },
        |ledger, (name, step)| {
            let next = step(ledger, &input);
            debug!(
                step = *name,
                allocated = next.allocated(),
                remaining = next.remaining(),
                "allocation step applied"
            );
            next
        },
    );

    let drift = (ledger.allocated() + ledger.buffer - budget).abs();
    if drift > RECONCILIATION_TOLERANCE {
        error!(
            budget,
            allocated = ledger.allocated(),
            buffer = ledger.buffer,
            drift,
            "allocation does not reconcile with budget"
        );
    }

    let allocation = finalize(&ledger);
    info!(
        destination = %snapshot.destination.name,
        flights = allocation.amount(BudgetCategory::Flights),
        hotels = allocation.amount(BudgetCategory::Hotels),
        food = allocation.amount(BudgetCategory::Food),
        travel = allocation.amount(BudgetCategory::Travel),
        activities = allocation.amount(BudgetCategory::Activities),
        remaining = allocation.remaining_budget,
        grand_total = allocation.grand_total,
        "budget allocated"
    );
    Ok(allocation)
}

fn allocate_flights(ledger: Ledger, input: &StepInput<'_>) -> Ledger {
    if !input.shape.include_flights {
        return ledger;
    }

    let cost = flight_cost(input.snapshot, input.shape);
    if cost > ledger.budget {
        debug!(
            cost,
            budget = ledger.budget,
            "flight cost exceeds budget, clamping"
        );
    }

    Ledger {
        flights: cost.min(ledger.remaining()),
        ..ledger
    }
}

fn allocate_hotels(ledger: Ledger, input: &StepInput<'_>) -> Ledger {
    if !input.shape.include_hotels {
        return ledger;
    }

    let snapshot = input.snapshot;
    let nightly = snapshot
        .budget_tier_nightly_rate()
        .or_else(|| snapshot.cheapest_nightly_rate())
        .unwrap_or(FALLBACK_NIGHTLY_RATE);
    let rooms = input.shape.rooms_needed();
    let hotel_total = nightly * f64::from(input.shape.duration) * f64::from(rooms);
    let cap = HOTEL_CAP_SHARE * ledger.remaining();
    let hotels = hotel_total.min(cap);

    debug!(
        hotels_found = snapshot.hotels.len(),
        nightly,
        rooms,
        hotel_total,
        cap,
        allocated = hotels,
        "hotel allocation"
    );

    Ledger { hotels, ..ledger }
}

fn allocate_food(ledger: Ledger, input: &StepInput<'_>) -> Ledger {
    let food_cost = food_cost(input.snapshot, input.shape);
    let cap = FOOD_CAP_SHARE * ledger.remaining();
    let food = food_cost.min(cap);

    debug!(
        restaurants_found = input.snapshot.restaurants.len(),
        food_cost,
        cap,
        allocated = food,
        "food allocation"
    );

    Ledger { food, ..ledger }
}

fn distribute_remainder(ledger: Ledger, _input: &StepInput<'_>) -> Ledger {
    let after_food = ledger.remaining();
    let weights = TRAVEL_WEIGHT + ACTIVITIES_WEIGHT + BUFFER_WEIGHT;

    Ledger {
        travel: after_food * (TRAVEL_WEIGHT / weights),
        activities: after_food * (ACTIVITIES_WEIGHT / weights),
        buffer: after_food * (BUFFER_WEIGHT / weights),
        ..ledger
    }
}

fn finalize(ledger: &Ledger) -> BudgetAllocation {
    let budget = ledger.budget;
    let raw = [
        (BudgetCategory::Flights, ledger.flights),
        (BudgetCategory::Hotels, ledger.hotels),
        (BudgetCategory::Food, ledger.food),
        (BudgetCategory::Travel, ledger.travel),
        (BudgetCategory::Activities, ledger.activities),
    ];

    let mut categories = raw
        .iter()
        .map(|&(category, amount)| {
            (
                category,
                CategoryAllocation {
                    amount: round_cents(amount),
                    percentage: 0.0,
                },
            )
        })
        .collect::<BTreeMap<_, _>>();
    let mut remaining = round_cents(ledger.buffer);

    // Independent rounding can leave a few cents unaccounted for; they go to
    // the buffer, or to the largest category if the buffer cannot absorb them.
    let original_budget = round_cents(budget);
    let rounded_sum = categories.values().map(|c| c.amount).sum::<f64>() + remaining;
    let residual = round_cents(original_budget - rounded_sum);
    if residual != 0.0 {
        if remaining + residual >= 0.0 {
            remaining = round_cents(remaining + residual);
        } else if let Some(largest) = categories
            .values_mut()
            .max_by(|a, b| a.amount.total_cmp(&b.amount))
        {
            largest.amount = round_cents(largest.amount + residual);
        }
    }

    // percentages follow the reconciled amounts, not the raw ledger
    for entry in categories.values_mut() {
        entry.percentage = round_cents(share_of(entry.amount, budget));
    }

    let total_allocated = round_cents(categories.values().map(|c| c.amount).sum());
    BudgetAllocation {
        categories,
        total_allocated,
        remaining_budget: remaining,
        remaining_percentage: round_cents(share_of(remaining, budget)),
        grand_total: round_cents(total_allocated + remaining),
        original_budget,
    }
}

pub(crate) fn round_cents(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // avoid "-0.00" in output
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub(crate) fn share_of(amount: f64, total: f64) -> f64 {
    if total > 0.0 {
        amount / total * 100.0
    } else {
        0.0
    }
}

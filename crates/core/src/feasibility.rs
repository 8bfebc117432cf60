use crate::models::{CostBreakdown, FeasibilityReport, TripShape};

/// Budgets down to this share of the computed floor are accepted.
pub const FEASIBILITY_TOLERANCE: f64 = 0.90;

pub fn check_feasibility(
    budget: f64,
    minimum: CostBreakdown,
    destination: &str,
    shape: &TripShape,
) -> FeasibilityReport {
    let minimum_budget = minimum.total();
    let sufficient = budget.is_finite() && budget >= minimum_budget * FEASIBILITY_TOLERANCE;

    let party = match shape.travelers {
        1 => "1 traveler".to_string(),
        n => format!("{n} travelers"),
    };
    let message = if sufficient {
        format!(
            "Your budget of {} is sufficient for this {}-day trip for {} to {}!",
            format_currency(budget),
            shape.duration,
            party,
            destination
        )
    } else {
        format!(
            "Your budget of {} is a bit low. We recommend at least {} for a comfortable {}-day trip for {} to {}.",
            format_currency(budget),
            format_currency(minimum_budget),
            shape.duration,
            party,
            destination
        )
    };

    FeasibilityReport {
        sufficient,
        minimum_budget,
        current_budget: budget,
        message,
        breakdown: minimum,
    }
}

/// `$1,234.50` style rendering.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

use tracing::info;

use crate::allocator::{round_cents, share_of};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{BudgetAllocation, BudgetCategory};

/// Parses user-supplied category keys, rejecting anything unknown.
pub fn parse_categories<S: AsRef<str>>(keys: &[S]) -> BudgetResult<Vec<BudgetCategory>> {
    keys.iter()
        .map(|key| {
            BudgetCategory::parse(key.as_ref())
                .ok_or_else(|| BudgetError::UnknownCategory(key.as_ref().to_string()))
        })
        .collect()
}

/// Folds the unallocated buffer into `selected`.
///
/// The buffer is split in proportion to the selected categories' current
/// amounts, or evenly when they are all empty. Percentages are re-based on the
/// new total allocated rather than on the original budget. With no buffer left
/// the allocation comes back unchanged.
pub fn reallocate(
    current: &BudgetAllocation,
    selected: &[BudgetCategory],
) -> BudgetResult<BudgetAllocation> {
    if selected.is_empty() {
        return Err(BudgetError::InvalidArgument(
            "at least one category must be selected".to_string(),
        ));
    }
    if let Some(missing) = selected
        .iter()
        .find(|category| !current.categories.contains_key(category))
    {
        return Err(BudgetError::UnknownCategory(missing.to_string()));
    }

    let buffer = current.remaining_budget;
    if buffer <= 0.0 {
        return Ok(current.clone());
    }

    let mut targets = selected.to_vec();
    targets.sort();
    targets.dedup();

    let weights = targets
        .iter()
        .map(|category| current.amount(*category).max(0.0))
        .collect::<Vec<_>>();
    let shares = split_cents(to_cents(buffer), &weights);

    let mut categories = current.categories.clone();
    for (category, cents) in targets.iter().zip(shares) {
        if let Some(entry) = categories.get_mut(category) {
            entry.amount = round_cents(entry.amount + cents as f64 / 100.0);
        }
    }

    let total_allocated = round_cents(categories.values().map(|c| c.amount).sum());
    for entry in categories.values_mut() {
        entry.percentage = round_cents(share_of(entry.amount, total_allocated));
    }

    info!(
        buffer,
        selected = ?targets,
        total_allocated,
        "buffer reallocated"
    );

    Ok(BudgetAllocation {
        categories,
        total_allocated,
        remaining_budget: 0.0,
        remaining_percentage: 0.0,
        grand_total: total_allocated,
        original_budget: current.original_budget,
    })
}

fn to_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Splits `total` cents by `weights` (evenly when they sum to zero) using the
/// largest-remainder rule. Every share is non-negative and the shares sum to
/// `total`. Ties on the remainder go to the earlier slot.
fn split_cents(total: i64, weights: &[f64]) -> Vec<i64> {
    let weight_sum = weights.iter().sum::<f64>();
    let exact = weights
        .iter()
        .map(|weight| {
            if weight_sum > 0.0 {
                total as f64 * weight / weight_sum
            } else {
                total as f64 / weights.len() as f64
            }
        })
        .collect::<Vec<_>>();

    let mut shares = exact.iter().map(|value| value.floor() as i64).collect::<Vec<_>>();
    let mut order = (0..exact.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        let frac_a = exact[a] - exact[a].floor();
        let frac_b = exact[b] - exact[b].floor();
        frac_b.total_cmp(&frac_a).then(a.cmp(&b))
    });

    let mut leftover = total - shares.iter().sum::<i64>();
    for idx in order.into_iter().cycle() {
        if leftover <= 0 {
            break;
        }
        shares[idx] += 1;
        leftover -= 1;
    }
    shares
}

pub mod allocator;
pub mod error;
pub mod estimator;
pub mod feasibility;
pub mod minimum;
pub mod models;
pub mod planner;
pub mod reallocator;

#[cfg(test)]
mod testing;

pub use allocator::allocate_budget;
pub use error::{BudgetError, BudgetResult};
pub use estimator::{estimate_cost, HotelTier, PriceCategory};
pub use feasibility::{check_feasibility, format_currency};
pub use minimum::compute_minimum_cost;
pub use models::*;
pub use planner::build_day_plans;
pub use reallocator::{parse_categories, reallocate};

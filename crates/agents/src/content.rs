use wayfare_core::{build_day_plans, BudgetAllocation, DayPlan, LocationSnapshot, TripParameters};

/// Produces the day-by-day narrative for an itinerary. Budget figures are
/// fixed before this runs; generators only fill in the days.
pub trait ContentGenerator: Send + Sync {
    fn daily_plans(
        &self,
        snapshot: &LocationSnapshot,
        parameters: &TripParameters,
        allocation: &BudgetAllocation,
    ) -> Vec<DayPlan>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContentGenerator;

impl ContentGenerator for TemplateContentGenerator {
    fn daily_plans(
        &self,
        snapshot: &LocationSnapshot,
        parameters: &TripParameters,
        allocation: &BudgetAllocation,
    ) -> Vec<DayPlan> {
        build_day_plans(
            snapshot,
            parameters.duration,
            parameters.activity_preference,
            allocation,
        )
    }
}

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BudgetError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unknown budget category: {0}")]
    UnknownCategory(String),
}

pub type BudgetResult<T> = Result<T, BudgetError>;

pub(crate) fn ensure_trip_shape(duration: u32, travelers: u32) -> BudgetResult<()> {
    if duration < 1 {
        return Err(BudgetError::InvalidArgument(
            "duration must be at least one night".to_string(),
        ));
    }
    if travelers < 1 {
        return Err(BudgetError::InvalidArgument(
            "travelers must be at least one".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_budget(budget: f64) -> BudgetResult<()> {
    if !budget.is_finite() || budget <= 0.0 {
        return Err(BudgetError::InvalidArgument(format!(
            "budget must be a positive amount, got {budget}"
        )));
    }
    Ok(())
}

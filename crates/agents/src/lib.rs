mod content;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use wayfare_core::{
    allocate_budget, check_feasibility, compute_minimum_cost, reallocate, BudgetAllocation,
    BudgetCategory, BudgetError, FeasibilityReport, Itinerary, LocationSnapshot, PlaceRecord,
    TripChanges, TripParameters,
};
use wayfare_observability::AppMetrics;
use wayfare_places::PlaceDataSource;
use wayfare_storage::ItineraryRepository;

pub use content::{ContentGenerator, TemplateContentGenerator};

const RECOMMENDED_HOTELS: usize = 3;
const RECOMMENDED_RESTAURANTS: usize = 5;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("itinerary {0} not found")]
    NotFound(String),
    #[error("{}", .0.message)]
    InsufficientBudget(FeasibilityReport),
    #[error(transparent)]
    Budget(#[from] BudgetError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type PlannerResult<T> = Result<T, PlannerError>;

type LockTable = parking_lot::Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum ModificationOutcome {
    Regenerated(Itinerary),
    /// The merged parameters did not pass the budget check; nothing was stored.
    BudgetWarning { message: String, minimum_budget: f64 },
    Unchanged(Itinerary),
}

#[derive(Clone)]
pub struct ItineraryPlanner<S, P>
where
    S: ItineraryRepository,
    P: PlaceDataSource,
{
    store: Arc<S>,
    places: Arc<P>,
    content: Arc<dyn ContentGenerator>,
    metrics: Arc<AppMetrics>,
    default_origin: String,
    locks: Arc<LockTable>,
}

impl<S, P> ItineraryPlanner<S, P>
where
    S: ItineraryRepository,
    P: PlaceDataSource,
{
    pub fn new(
        store: Arc<S>,
        places: Arc<P>,
        metrics: Arc<AppMetrics>,
        default_origin: impl Into<String>,
    ) -> Self {
        Self {
            store,
            places,
            content: Arc::new(TemplateContentGenerator),
            metrics,
            default_origin: default_origin.into(),
            locks: Arc::default(),
        }
    }

    pub fn with_content_generator(mut self, content: Arc<dyn ContentGenerator>) -> Self {
        self.content = content;
        self
    }

    pub fn metrics(&self) -> &AppMetrics {
        &self.metrics
    }

    #[instrument(skip(self, parameters), fields(destination = %parameters.destination))]
    pub async fn validate_budget(
        &self,
        parameters: &TripParameters,
    ) -> PlannerResult<FeasibilityReport> {
        let started = Instant::now();
        self.metrics.inc_request();
        let (_, report) = self.assess(parameters).await?;
        self.metrics.observe_latency(started.elapsed());
        Ok(report)
    }

    #[instrument(skip(self, parameters), fields(destination = %parameters.destination))]
    pub async fn create_itinerary(&self, parameters: TripParameters) -> PlannerResult<Itinerary> {
        let started = Instant::now();
        self.metrics.inc_request();

        let itinerary_id = Uuid::new_v4().to_string();
        let itinerary = self.generate(&itinerary_id, parameters, None).await?;
        self.store
            .upsert_itinerary(&itinerary)
            .await
            .context("failed storing itinerary")?;

        self.metrics.inc_itinerary_created();
        self.metrics.observe_latency(started.elapsed());
        info!(
            itinerary_id = %itinerary.itinerary_id,
            days = itinerary.daily_activities.len(),
            total_allocated = itinerary.budget_breakdown.total_allocated,
            "itinerary created"
        );
        Ok(itinerary)
    }

    pub async fn get_itinerary(&self, itinerary_id: &str) -> PlannerResult<Itinerary> {
        self.metrics.inc_request();
        self.load(itinerary_id).await
    }

    pub async fn recent_itineraries(&self, limit: usize) -> PlannerResult<Vec<Itinerary>> {
        self.metrics.inc_request();
        Ok(self.store.list_itineraries(limit).await?)
    }

    #[instrument(skip(self, categories))]
    pub async fn reallocate_budget(
        &self,
        itinerary_id: &str,
        categories: &[BudgetCategory],
    ) -> PlannerResult<BudgetAllocation> {
        let started = Instant::now();
        self.metrics.inc_request();
        let _lease = self.lease(itinerary_id).await;

        let mut itinerary = self.load(itinerary_id).await?;
        let updated = reallocate(&itinerary.budget_breakdown, categories)?;

        itinerary.budget_breakdown = updated.clone();
        itinerary.updated_at = Utc::now();
        self.store
            .upsert_itinerary(&itinerary)
            .await
            .context("failed storing reallocated itinerary")?;

        self.metrics.inc_reallocation();
        self.metrics.observe_latency(started.elapsed());
        info!(
            itinerary_id,
            categories = ?categories,
            remaining_budget = updated.remaining_budget,
            "budget reallocated"
        );
        Ok(updated)
    }

    #[instrument(skip(self, changes))]
    pub async fn modify_itinerary(
        &self,
        itinerary_id: &str,
        changes: &TripChanges,
    ) -> PlannerResult<ModificationOutcome> {
        let started = Instant::now();
        self.metrics.inc_request();
        let _lease = self.lease(itinerary_id).await;

        let current = self.load(itinerary_id).await?;
        if changes.is_empty() {
            return Ok(ModificationOutcome::Unchanged(current));
        }

        let parameters = changes.apply_to(&current.parameters);
        let itinerary = match self
            .generate(itinerary_id, parameters, Some(current.created_at))
            .await
        {
            Ok(itinerary) => itinerary,
            Err(PlannerError::InsufficientBudget(report)) => {
                return Ok(ModificationOutcome::BudgetWarning {
                    message: report.message,
                    minimum_budget: report.minimum_budget,
                });
            }
            Err(err) => return Err(err),
        };

        self.store
            .upsert_itinerary(&itinerary)
            .await
            .context("failed storing modified itinerary")?;

        self.metrics.inc_modification();
        self.metrics.observe_latency(started.elapsed());
        info!(itinerary_id, changes = ?changes, "itinerary regenerated");
        Ok(ModificationOutcome::Regenerated(itinerary))
    }

    async fn assess(
        &self,
        parameters: &TripParameters,
    ) -> PlannerResult<(LocationSnapshot, FeasibilityReport)> {
        let origin = parameters
            .user_location
            .as_deref()
            .unwrap_or(&self.default_origin);
        let snapshot = self
            .places
            .fetch(
                parameters.destination_city(),
                Some(origin),
                parameters.include_flights,
            )
            .await
            .with_context(|| format!("failed loading place data for {}", parameters.destination))?;

        let shape = parameters.shape();
        let minimum = compute_minimum_cost(&snapshot, &shape)?;
        let report = check_feasibility(
            parameters.budget,
            minimum,
            &parameters.destination,
            &shape,
        );
        Ok((snapshot, report))
    }

    /// Validate, allocate and lay out the days. Does not persist.
    async fn generate(
        &self,
        itinerary_id: &str,
        parameters: TripParameters,
        created_at: Option<chrono::DateTime<Utc>>,
    ) -> PlannerResult<Itinerary> {
        let (snapshot, report) = self.assess(&parameters).await?;
        if !report.sufficient {
            self.metrics.inc_budget_rejection();
            warn!(
                budget = parameters.budget,
                minimum_budget = report.minimum_budget,
                "budget below trip minimum"
            );
            return Err(PlannerError::InsufficientBudget(report));
        }

        let allocation = allocate_budget(&snapshot, parameters.budget, &parameters.shape())?;
        let daily_activities = self
            .content
            .daily_plans(&snapshot, &parameters, &allocation);

        let now = Utc::now();
        Ok(Itinerary {
            itinerary_id: itinerary_id.to_string(),
            hotels: top_rated(&snapshot.hotels, RECOMMENDED_HOTELS),
            restaurants: top_rated(&snapshot.restaurants, RECOMMENDED_RESTAURANTS),
            destination: snapshot.destination,
            parameters,
            budget_breakdown: allocation,
            daily_activities,
            created_at: created_at.unwrap_or(now),
            updated_at: now,
        })
    }

    async fn load(&self, itinerary_id: &str) -> PlannerResult<Itinerary> {
        self.store
            .load_itinerary(itinerary_id)
            .await
            .context("failed loading itinerary")?
            .ok_or_else(|| PlannerError::NotFound(itinerary_id.to_string()))
    }

    /// Serializes writers on one itinerary. The table entry is dropped again
    /// once the last holder or waiter lets go.
    async fn lease(&self, itinerary_id: &str) -> ItineraryLease {
        let lock = self
            .locks
            .lock()
            .entry(itinerary_id.to_string())
            .or_default()
            .clone();
        let mut lease = ItineraryLease {
            table: self.locks.clone(),
            itinerary_id: itinerary_id.to_string(),
            lock: Some(lock.clone()),
            guard: None,
        };
        lease.guard = Some(lock.lock_owned().await);
        lease
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.lock().len()
    }
}

struct ItineraryLease {
    table: Arc<LockTable>,
    itinerary_id: String,
    lock: Option<Arc<AsyncMutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ItineraryLease {
    fn drop(&mut self) {
        self.guard.take();
        self.lock.take();
        let mut table = self.table.lock();
        // one reference left means only the table still holds it
        if table
            .get(&self.itinerary_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.itinerary_id);
        }
    }
}

fn top_rated(places: &[PlaceRecord], limit: usize) -> Vec<PlaceRecord> {
    let mut ranked = places.to_vec();
    ranked.sort_by(|a, b| {
        b.rating
            .unwrap_or_default()
            .total_cmp(&a.rating.unwrap_or_default())
    });
    ranked.truncate(limit);
    ranked
}

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use sqlx::{Row, SqlitePool};
use wayfare_core::Itinerary;

pub trait ItineraryRepository: Send + Sync {
    async fn load_itinerary(&self, itinerary_id: &str) -> Result<Option<Itinerary>>;
    async fn upsert_itinerary(&self, itinerary: &Itinerary) -> Result<()>;
    /// Most recently updated first.
    async fn list_itineraries(&self, limit: usize) -> Result<Vec<Itinerary>>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    itineraries: Arc<RwLock<HashMap<String, Itinerary>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItineraryRepository for MemoryStore {
    async fn load_itinerary(&self, itinerary_id: &str) -> Result<Option<Itinerary>> {
        Ok(self.itineraries.read().get(itinerary_id).cloned())
    }

    async fn upsert_itinerary(&self, itinerary: &Itinerary) -> Result<()> {
        self.itineraries
            .write()
            .insert(itinerary.itinerary_id.clone(), itinerary.clone());
        Ok(())
    }

    async fn list_itineraries(&self, limit: usize) -> Result<Vec<Itinerary>> {
        let mut items = self.itineraries.read().values().cloned().collect::<Vec<_>>();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        items.truncate(limit);
        Ok(items)
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS itineraries (
              itinerary_id TEXT PRIMARY KEY,
              destination TEXT NOT NULL,
              total_budget REAL NOT NULL,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL,
              itinerary_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl ItineraryRepository for SqliteStore {
    async fn load_itinerary(&self, itinerary_id: &str) -> Result<Option<Itinerary>> {
        let row = sqlx::query(
            r#"
            SELECT itinerary_json
            FROM itineraries
            WHERE itinerary_id = ?1
            "#,
        )
        .bind(itinerary_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.get("itinerary_json");
        let itinerary = serde_json::from_str(&raw)
            .with_context(|| format!("corrupt itinerary record {}", itinerary_id))?;
        Ok(Some(itinerary))
    }

    async fn upsert_itinerary(&self, itinerary: &Itinerary) -> Result<()> {
        let itinerary_json = serde_json::to_string(itinerary)?;

        sqlx::query(
            r#"
            INSERT INTO itineraries (itinerary_id, destination, total_budget, created_at, updated_at, itinerary_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(itinerary_id) DO UPDATE SET
              destination=excluded.destination,
              total_budget=excluded.total_budget,
              updated_at=excluded.updated_at,
              itinerary_json=excluded.itinerary_json
            "#,
        )
        .bind(&itinerary.itinerary_id)
        .bind(&itinerary.destination.name)
        .bind(itinerary.parameters.budget)
        .bind(itinerary.created_at.to_rfc3339())
        .bind(itinerary.updated_at.to_rfc3339())
        .bind(itinerary_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_itineraries(&self, limit: usize) -> Result<Vec<Itinerary>> {
        let rows = sqlx::query(
            r#"
            SELECT itinerary_json
            FROM itineraries
            ORDER BY updated_at DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let raw: String = row.get("itinerary_json");
                serde_json::from_str(&raw).context("corrupt itinerary record")
            })
            .collect()
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }
}

impl ItineraryRepository for Store {
    async fn load_itinerary(&self, itinerary_id: &str) -> Result<Option<Itinerary>> {
        match self {
            Store::Memory(store) => store.load_itinerary(itinerary_id).await,
            Store::Sqlite(store) => store.load_itinerary(itinerary_id).await,
        }
    }

    async fn upsert_itinerary(&self, itinerary: &Itinerary) -> Result<()> {
        match self {
            Store::Memory(store) => store.upsert_itinerary(itinerary).await,
            Store::Sqlite(store) => store.upsert_itinerary(itinerary).await,
        }
    }

    async fn list_itineraries(&self, limit: usize) -> Result<Vec<Itinerary>> {
        match self {
            Store::Memory(store) => store.list_itineraries(limit).await,
            Store::Sqlite(store) => store.list_itineraries(limit).await,
        }
    }
}

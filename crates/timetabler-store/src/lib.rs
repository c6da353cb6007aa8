//! # Timetabler Store
//!
//! Document store adapters for the Timetabler API.
//!
//! Every collection sits behind an `async_trait` so the HTTP layer and the slot
//! manager never see which backend is in use:
//!
//! - [`schedule`]: one weekly schedule document per (year, class)
//! - [`subjects`]: subject reference data
//! - [`leaves`]: leave requests
//!
//! Two backends are provided. The in-memory stores are the default and back the
//! test suite; the PostgreSQL stores keep documents as JSONB rows.
//!
//! # Example
//!
//! ```ignore
//! use timetabler_config::StoreConfig;
//! use timetabler_store::Stores;
//!
//! let stores = Stores::connect(&StoreConfig::from_env()).await?;
//! let schedule = stores.schedules.get(&key).await?;
//! ```

pub mod error;
pub mod feed;
pub mod leaves;
pub mod schedule;
pub mod subjects;

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use timetabler_config::{StoreBackend, StoreConfig};

pub use error::{StoreError, StoreResult};
pub use feed::{ChangeFeed, Listener, Subscription};
pub use leaves::{DynLeaveStore, LeaveStore, MemoryLeaveStore, PgLeaveStore};
pub use schedule::{DynScheduleStore, MemoryScheduleStore, PgScheduleStore, ScheduleStore};
pub use subjects::{DynSubjectStore, MemorySubjectStore, PgSubjectStore, SubjectStore};

/// The store handles shared by the application.
#[derive(Clone)]
pub struct Stores {
    pub schedules: DynScheduleStore,
    pub subjects: DynSubjectStore,
    pub leaves: DynLeaveStore,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            schedules: Arc::new(MemoryScheduleStore::new()),
            subjects: Arc::new(MemorySubjectStore::new()),
            leaves: Arc::new(MemoryLeaveStore::new()),
        }
    }

    pub fn postgres(db: PgPool) -> Self {
        Self {
            schedules: Arc::new(PgScheduleStore::new(db.clone())),
            subjects: Arc::new(PgSubjectStore::new(db.clone())),
            leaves: Arc::new(PgLeaveStore::new(db)),
        }
    }

    /// Builds the configured backend, running migrations for PostgreSQL.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        match config.backend {
            StoreBackend::Memory => {
                info!("Using in-memory document store");
                Ok(Self::in_memory())
            }
            StoreBackend::Postgres => {
                let db = init_db_pool(config).await?;
                run_migrations(&db).await?;
                info!("Using PostgreSQL document store");
                Ok(Self::postgres(db))
            }
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

/// Opens a PostgreSQL pool from `DATABASE_URL`.
pub async fn init_db_pool(config: &StoreConfig) -> StoreResult<PgPool> {
    let database_url = config.database_url.as_deref().ok_or_else(|| {
        StoreError::unavailable("connect", "DATABASE_URL must be set for the postgres backend")
    })?;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .map_err(|e| StoreError::unavailable("connect", e))
}

pub async fn run_migrations(db: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("../../migrations")
        .run(db)
        .await
        .map_err(|e| StoreError::unavailable("migrate", e))
}

//! Subject reference data storage.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use timetabler_models::{Subject, SubjectId, SubjectType};

use crate::error::{StoreError, StoreResult};

#[async_trait]
pub trait SubjectStore: Send + Sync {
    /// Subjects taught in `year`, ordered by name.
    async fn list_by_year(&self, year: &str) -> StoreResult<Vec<Subject>>;

    async fn add(&self, subject: &Subject) -> StoreResult<()>;
}

pub type DynSubjectStore = Arc<dyn SubjectStore>;

#[derive(Debug, Default)]
pub struct MemorySubjectStore {
    subjects: RwLock<Vec<Subject>>,
}

impl MemorySubjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subjects(subjects: impl IntoIterator<Item = Subject>) -> Self {
        Self {
            subjects: RwLock::new(subjects.into_iter().collect()),
        }
    }
}

#[async_trait]
impl SubjectStore for MemorySubjectStore {
    async fn list_by_year(&self, year: &str) -> StoreResult<Vec<Subject>> {
        let mut subjects: Vec<Subject> = self
            .subjects
            .read()
            .iter()
            .filter(|subject| subject.year == year)
            .cloned()
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    async fn add(&self, subject: &Subject) -> StoreResult<()> {
        self.subjects.write().push(subject.clone());
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct SubjectRow {
    id: Uuid,
    name: String,
    teacher: String,
    kind: String,
    hours_per_week: i32,
    year: String,
}

impl TryFrom<SubjectRow> for Subject {
    type Error = StoreError;

    fn try_from(row: SubjectRow) -> Result<Self, Self::Error> {
        let kind = row.kind.parse::<SubjectType>().map_err(|e| StoreError::Corrupt {
            key: row.id.to_string(),
            message: e.to_string(),
        })?;

        Ok(Subject {
            id: SubjectId::from_uuid(row.id),
            name: row.name,
            teacher: row.teacher,
            kind,
            hours_per_week: row.hours_per_week,
            year: row.year,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgSubjectStore {
    db: PgPool,
}

impl PgSubjectStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubjectStore for PgSubjectStore {
    #[instrument(skip(self))]
    async fn list_by_year(&self, year: &str) -> StoreResult<Vec<Subject>> {
        let rows = sqlx::query_as::<_, SubjectRow>(
            r#"SELECT id, name, teacher, kind, hours_per_week, year
               FROM subjects WHERE year = $1 ORDER BY name"#,
        )
        .bind(year)
        .fetch_all(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx("list_subjects", year, e))?;

        rows.into_iter().map(Subject::try_from).collect()
    }

    #[instrument(skip(self, subject), fields(subject = %subject.name))]
    async fn add(&self, subject: &Subject) -> StoreResult<()> {
        sqlx::query(
            r#"INSERT INTO subjects (id, name, teacher, kind, hours_per_week, year)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(subject.id.into_inner())
        .bind(&subject.name)
        .bind(&subject.teacher)
        .bind(subject.kind.as_str())
        .bind(subject.hours_per_week)
        .bind(&subject.year)
        .execute(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx("add_subject", subject.id, e))?;

        Ok(())
    }
}

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::debug;

use shared::{
    domain::{Category, CourseId, Level},
    protocol::{Course, CoursePatch, NewCourse},
};

mod memory;
pub mod seed;
pub mod validate;

pub use memory::MemoryStore;
pub use seed::{seed_courses, seed_if_empty};

use validate::{apply_patch, validate_new, validate_patch, CourseDraft};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("course {0} not found")]
    NotFound(CourseId),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        StoreError::Internal(value.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Course collection used by the catalog service.
///
/// `list` orders by `created_at` descending with `id` descending as the tie
/// breaker, so pages stay stable while the collection is unchanged.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list(
        &self,
        category: Option<Category>,
        skip: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Course>, i64)>;

    async fn get(&self, id: CourseId) -> StoreResult<Option<Course>>;

    async fn create(&self, fields: NewCourse) -> StoreResult<Course>;

    async fn update(&self, id: CourseId, patch: CoursePatch) -> StoreResult<Course>;

    async fn delete(&self, id: CourseId) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
}

/// Current time truncated to microseconds, the precision kept by every backend.
pub(crate) fn now_micros() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

pub(crate) fn check_window(skip: i64, limit: i64) -> StoreResult<(i64, i64)> {
    if limit <= 0 {
        return Err(StoreError::InvalidInput(
            "limit must be greater than zero".into(),
        ));
    }
    Ok((skip.max(0), limit))
}

/// SQLite-backed catalog.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

const COURSE_COLUMNS: &str =
    "id, title, description, image, category, level, price, instructor, duration, created_at";

impl Storage {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options =
            SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to `sqlite::memory:` opens its own database.
        let max_connections = if is_memory_url(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run catalog migrations")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn insert(&self, draft: CourseDraft) -> StoreResult<Course> {
        let created_at = now_micros();
        let rec = sqlx::query(
            "INSERT INTO courses (title, description, image, category, level, price, instructor, duration, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.image)
        .bind(draft.category.as_str())
        .bind(draft.level.as_str())
        .bind(draft.price)
        .bind(&draft.instructor)
        .bind(&draft.duration)
        .bind(encode_timestamp(created_at))
        .fetch_one(&self.pool)
        .await?;

        Ok(Course {
            id: CourseId(rec.get::<i64, _>(0)),
            title: draft.title,
            description: draft.description,
            image: draft.image,
            category: draft.category,
            level: draft.level,
            price: draft.price,
            instructor: draft.instructor,
            duration: draft.duration,
            created_at,
        })
    }
}

#[async_trait]
impl CatalogStore for Storage {
    async fn list(
        &self,
        category: Option<Category>,
        skip: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Course>, i64)> {
        let (skip, limit) = check_window(skip, limit)?;
        let category = category.map(Category::as_str);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM courses WHERE (? IS NULL OR category = ?)",
        )
        .bind(category)
        .bind(category)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            "SELECT {COURSE_COLUMNS}
             FROM courses
             WHERE (? IS NULL OR category = ?)
             ORDER BY created_at DESC, id DESC
             LIMIT ? OFFSET ?"
        ))
        .bind(category)
        .bind(category)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(course_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;
        debug!(?category, skip, limit, total, "listed courses");
        Ok((items, total))
    }

    async fn get(&self, id: CourseId) -> StoreResult<Option<Course>> {
        let row = sqlx::query(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(course_from_row).transpose()?)
    }

    async fn create(&self, fields: NewCourse) -> StoreResult<Course> {
        let draft = validate_new(fields)?;
        self.insert(draft).await
    }

    async fn update(&self, id: CourseId, patch: CoursePatch) -> StoreResult<Course> {
        let patch = validate_patch(patch)?;

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        let mut course = course_from_row(&row)?;
        apply_patch(&mut course, patch);

        sqlx::query(
            "UPDATE courses
             SET title = ?, description = ?, image = ?, category = ?, level = ?,
                 price = ?, instructor = ?, duration = ?
             WHERE id = ?",
        )
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.image)
        .bind(course.category.as_str())
        .bind(course.level.as_str())
        .bind(course.price)
        .bind(&course.instructor)
        .bind(&course.duration)
        .bind(id.0)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(course)
    }

    async fn delete(&self, id: CourseId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

// Fixed-width UTC text so that lexical order in SQLite matches time order.
fn encode_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn course_from_row(row: &SqliteRow) -> anyhow::Result<Course> {
    let category: String = row.try_get("category")?;
    let level: String = row.try_get("level")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(Course {
        id: CourseId(row.try_get("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        image: row.try_get("image")?,
        category: Category::from_str(&category)?,
        level: Level::from_str(&level)?,
        price: row.try_get("price")?,
        instructor: row.try_get("instructor")?,
        duration: row.try_get("duration")?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| anyhow!("invalid created_at '{created_at}': {e}"))?
            .with_timezone(&Utc),
    })
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use async_trait::async_trait;
use tokio::sync::RwLock;

use shared::{
    domain::{Category, CourseId},
    protocol::{Course, CoursePatch, NewCourse},
};

use crate::{
    check_window, now_micros,
    validate::{apply_patch, validate_new, validate_patch},
    CatalogStore, StoreError, StoreResult,
};

/// Process-local catalog. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    last_id: i64,
    courses: Vec<Course>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list(
        &self,
        category: Option<Category>,
        skip: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Course>, i64)> {
        let (skip, limit) = check_window(skip, limit)?;
        let guard = self.inner.read().await;

        let mut matching: Vec<&Course> = guard
            .courses
            .iter()
            .filter(|course| category.map_or(true, |wanted| course.category == wanted))
            .collect();
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let items = matching
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn get(&self, id: CourseId) -> StoreResult<Option<Course>> {
        let guard = self.inner.read().await;
        Ok(guard.courses.iter().find(|course| course.id == id).cloned())
    }

    async fn create(&self, fields: NewCourse) -> StoreResult<Course> {
        let draft = validate_new(fields)?;
        let mut guard = self.inner.write().await;
        guard.last_id += 1;
        let course = Course {
            id: CourseId(guard.last_id),
            title: draft.title,
            description: draft.description,
            image: draft.image,
            category: draft.category,
            level: draft.level,
            price: draft.price,
            instructor: draft.instructor,
            duration: draft.duration,
            created_at: now_micros(),
        };
        guard.courses.push(course.clone());
        Ok(course)
    }

    async fn update(&self, id: CourseId, patch: CoursePatch) -> StoreResult<Course> {
        let patch = validate_patch(patch)?;
        let mut guard = self.inner.write().await;
        let course = guard
            .courses
            .iter_mut()
            .find(|course| course.id == id)
            .ok_or(StoreError::NotFound(id))?;
        apply_patch(course, patch);
        Ok(course.clone())
    }

    async fn delete(&self, id: CourseId) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let before = guard.courses.len();
        guard.courses.retain(|course| course.id != id);
        if guard.courses.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::{
    domain::{CategoryFilter, CourseId},
    error::ApiError,
    protocol::{
        ChatRequest, ChatResponse, Course, CoursePage, CoursePatch, MessageResponse, NewCourse,
        DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
    },
};
use storage::{CatalogStore, StoreError};
use tracing::{error, info};

pub const COURSE_NOT_FOUND: &str = "Course not found";
pub const COURSE_DELETED: &str = "Course deleted successfully";

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn CatalogStore>,
    pub default_page_size: i64,
}

impl ApiContext {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Raw listing parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListCoursesQuery {
    pub page: Option<i64>,
    pub filter: Option<String>,
    pub limit: Option<i64>,
}

pub fn courses_route() -> &'static str {
    "/api/courses"
}

pub fn chat_route() -> &'static str {
    "/api/chat"
}

pub async fn list_courses(ctx: &ApiContext, query: ListCoursesQuery) -> Result<CoursePage, ApiError> {
    let limit = query.limit.unwrap_or(ctx.default_page_size);
    if limit <= 0 {
        return Err(ApiError::validation("limit must be greater than zero"));
    }
    if limit > MAX_PAGE_SIZE {
        return Err(ApiError::validation(format!(
            "limit must not exceed {MAX_PAGE_SIZE}"
        )));
    }
    let filter = match query.filter.as_deref().map(str::trim) {
        None | Some("") => CategoryFilter::All,
        Some(raw) => raw
            .parse::<CategoryFilter>()
            .map_err(|e| ApiError::validation(e.to_string()))?,
    };
    let page = query.page.unwrap_or(1).max(1);
    let skip = (page - 1).saturating_mul(limit);

    let (items, total_matching) = ctx
        .store
        .list(filter.category(), skip, limit)
        .await
        .map_err(store_error)?;

    Ok(CoursePage {
        items,
        total_pages: total_pages(total_matching, limit),
        current_page: page,
        total_matching,
    })
}

pub async fn get_course(ctx: &ApiContext, raw_id: &str) -> Result<Course, ApiError> {
    let Some(id) = parse_id(raw_id) else {
        return Err(ApiError::not_found(COURSE_NOT_FOUND));
    };
    ctx.store
        .get(id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| ApiError::not_found(COURSE_NOT_FOUND))
}

pub async fn create_course(ctx: &ApiContext, fields: NewCourse) -> Result<Course, ApiError> {
    let course = ctx.store.create(fields).await.map_err(store_error)?;
    info!(course_id = %course.id, category = %course.category, "course created");
    Ok(course)
}

pub async fn update_course(
    ctx: &ApiContext,
    raw_id: &str,
    patch: CoursePatch,
) -> Result<Course, ApiError> {
    let id = parse_id(raw_id).ok_or_else(|| ApiError::not_found(COURSE_NOT_FOUND))?;
    let course = ctx.store.update(id, patch).await.map_err(store_error)?;
    info!(course_id = %course.id, "course updated");
    Ok(course)
}

pub async fn delete_course(ctx: &ApiContext, raw_id: &str) -> Result<MessageResponse, ApiError> {
    let id = parse_id(raw_id).ok_or_else(|| ApiError::not_found(COURSE_NOT_FOUND))?;
    ctx.store.delete(id).await.map_err(store_error)?;
    info!(course_id = %id, "course deleted");
    Ok(MessageResponse {
        message: COURSE_DELETED.to_string(),
    })
}

/// Canned assistant reply; no model is consulted.
pub fn chat_reply(req: &ChatRequest) -> Result<ChatResponse, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::validation("message must not be empty"));
    }
    Ok(ChatResponse {
        response: format!(
            "This is a mock response to: \"{message}\". In production, this would connect to an AI assistant."
        ),
    })
}

pub fn total_pages(total_matching: i64, limit: i64) -> i64 {
    if total_matching <= 0 || limit <= 0 {
        return 0;
    }
    (total_matching + limit - 1) / limit
}

// Ids that do not parse can never name a stored course.
fn parse_id(raw_id: &str) -> Option<CourseId> {
    raw_id.parse::<CourseId>().ok()
}

fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::InvalidInput(message) => ApiError::validation(message),
        StoreError::NotFound(_) => ApiError::not_found(COURSE_NOT_FOUND),
        StoreError::Internal(source) => {
            error!(error = %format!("{source:#}"), "catalog store failure");
            ApiError::internal()
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

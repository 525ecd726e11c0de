use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use server_api::{
    chat_reply, chat_route, courses_route, create_course, delete_course, get_course,
    list_courses, update_course, ApiContext, ListCoursesQuery,
};
use shared::{
    error::ApiError,
    protocol::{ChatRequest, ChatResponse, Course, CoursePage, CoursePatch, MessageResponse, NewCourse},
};
use storage::{seed_if_empty, CatalogStore, MemoryStore, Storage};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url, Settings, StoreBackend};

const MAX_BODY_BYTES: usize = 64 * 1024;

type HttpResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let store = open_store(&settings).await?;
    if settings.seed {
        seed_if_empty(store.as_ref())
            .await
            .context("failed to seed course catalog")?;
    }

    let api = ApiContext {
        store,
        default_page_size: settings.default_page_size,
    };
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, store = ?settings.store, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn CatalogStore>> {
    match settings.store {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Sqlite => {
            let database_url = prepare_database_url(&settings.database_url);
            let storage = Storage::new(&database_url).await.map_err(|error| {
                error!(
                    %database_url,
                    error = %format!("{error:#}"),
                    "failed to open SQLite database; verify parent directory exists and permissions are correct"
                );
                error
            })?;
            Ok(Arc::new(storage))
        }
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown requested");
}

fn build_router(state: Arc<AppState>) -> Router {
    let course_item_route = format!("{}/:id", courses_route());
    Router::new()
        .route("/healthz", get(healthz))
        .route(courses_route(), get(http_list_courses).post(http_create_course))
        .route(
            &course_item_route,
            get(http_get_course)
                .put(http_update_course)
                .delete(http_delete_course),
        )
        .route(chat_route(), post(http_chat))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err))
}

fn bad_body(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    reject(ApiError::validation(rejection.body_text()))
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.api.store.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(error = %format!("{error:#}"), "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_list_courses(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListCoursesQuery>, QueryRejection>,
) -> HttpResult<Json<CoursePage>> {
    let Query(query) =
        query.map_err(|rejection| reject(ApiError::validation(rejection.body_text())))?;
    let page = list_courses(&state.api, query).await.map_err(reject)?;
    Ok(Json(page))
}

async fn http_get_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HttpResult<Json<Course>> {
    let course = get_course(&state.api, &id).await.map_err(reject)?;
    Ok(Json(course))
}

async fn http_create_course(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewCourse>, JsonRejection>,
) -> HttpResult<(StatusCode, Json<Course>)> {
    let Json(fields) = body.map_err(bad_body)?;
    let course = create_course(&state.api, fields).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn http_update_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<CoursePatch>, JsonRejection>,
) -> HttpResult<Json<Course>> {
    let Json(patch) = body.map_err(bad_body)?;
    let course = update_course(&state.api, &id, patch)
        .await
        .map_err(reject)?;
    Ok(Json(course))
}

async fn http_delete_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HttpResult<Json<MessageResponse>> {
    let response = delete_course(&state.api, &id).await.map_err(reject)?;
    Ok(Json(response))
}

async fn http_chat(
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> HttpResult<Json<ChatResponse>> {
    let Json(req) = body.map_err(bad_body)?;
    let reply = chat_reply(&req).map_err(reject)?;
    Ok(Json(reply))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

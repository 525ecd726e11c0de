use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;
use shared::{
    domain::{CategoryFilter, CourseId},
    error::ApiError,
    protocol::{ChatRequest, ChatResponse, Course, CoursePage},
};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

pub mod error;
pub mod state;
pub mod view;

pub use error::ClientError;
pub use state::{CatalogState, ListingTicket, Rendering};
pub use view::CatalogView;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub request_timeout: Duration,
    /// `None` lets the server pick its default page size.
    pub page_size: Option<i64>,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            page_size: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ListCoursesParams<'a> {
    page: i64,
    filter: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<i64>,
}

/// Only the response to the most recently issued listing request may change
/// state or rendering.
pub struct CatalogClient<V: CatalogView> {
    http: Client,
    base_url: Url,
    page_size: Option<i64>,
    view: V,
    inner: Mutex<CatalogState>,
}

impl<V: CatalogView> CatalogClient<V> {
    pub fn new(config: ClientConfig, view: V) -> Result<Self, ClientError> {
        Self::with_static_items(config, view, Vec::new())
    }

    /// `static_items` is the content shown before the service answers and the
    /// source for offline filtering.
    pub fn with_static_items(
        config: ClientConfig,
        view: V,
        static_items: Vec<Course>,
    ) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(&config.server_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url,
            page_size: config.page_size,
            view,
            inner: Mutex::new(CatalogState::new(static_items)),
        })
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub async fn state(&self) -> CatalogState {
        self.inner.lock().await.clone()
    }

    pub async fn initialize(&self) -> Option<Rendering> {
        {
            let guard = self.inner.lock().await;
            if !guard.static_items.is_empty() {
                self.view
                    .render(&Rendering::Courses(guard.static_items.clone()));
            }
            self.view.render_pagination(1, 1);
        }
        self.refresh().await
    }

    pub async fn select_filter(&self, filter: CategoryFilter) -> Option<Rendering> {
        let ticket = {
            let mut guard = self.inner.lock().await;
            guard.current_filter = filter;
            guard.current_page = 1;
            guard.begin()
        };
        self.run(ticket).await
    }

    /// Moves to a 1-based page number. Selecting the current page does nothing.
    pub async fn select_page(&self, page: i64) -> Option<Rendering> {
        let page = page.max(1);
        let ticket = {
            let mut guard = self.inner.lock().await;
            if guard.current_page == page {
                return None;
            }
            guard.current_page = page;
            guard.begin()
        };
        let rendering = self.run(ticket).await;
        self.view.scroll_to_catalog();
        rendering
    }

    pub async fn open(&self, filter: CategoryFilter, page: i64) -> Option<Rendering> {
        let ticket = {
            let mut guard = self.inner.lock().await;
            guard.current_filter = filter;
            guard.current_page = page.max(1);
            guard.begin()
        };
        self.run(ticket).await
    }

    pub async fn refresh(&self) -> Option<Rendering> {
        let ticket = self.inner.lock().await.begin();
        self.run(ticket).await
    }

    async fn run(&self, ticket: ListingTicket) -> Option<Rendering> {
        if ticket.replaces_content() {
            self.view.show_loading();
        }

        let result = self.fetch_page(ticket.page, ticket.filter).await;

        let mut guard = self.inner.lock().await;
        let rendering = match result {
            Ok(page) => {
                let rendering = guard.apply_page(&ticket, page);
                if rendering.is_some() {
                    self.view
                        .render_pagination(guard.total_pages, guard.current_page);
                }
                rendering
            }
            Err(error) => {
                if guard.is_current(&ticket) {
                    warn!(
                        %error,
                        page = ticket.page,
                        filter = %ticket.filter,
                        "course listing unavailable; keeping local content"
                    );
                }
                guard.apply_failure(&ticket)
            }
        };

        match &rendering {
            Some(rendering) => self.view.render(rendering),
            None => debug!(
                seq = ticket.seq,
                latest = guard.latest_seq(),
                "discarding superseded listing response"
            ),
        }
        rendering
    }

    pub async fn fetch_page(
        &self,
        page: i64,
        filter: CategoryFilter,
    ) -> Result<CoursePage, ClientError> {
        let response = self
            .http
            .get(self.base_url.join("api/courses")?)
            .query(&ListCoursesParams {
                page,
                filter: filter.as_str(),
                limit: self.page_size,
            })
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    pub async fn fetch_course(&self, id: CourseId) -> Result<Course, ClientError> {
        let response = self
            .http
            .get(self.base_url.join(&format!("api/courses/{id}"))?)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    pub async fn send_chat(&self, message: &str) -> Result<ChatResponse, ClientError> {
        let response = self
            .http
            .post(self.base_url.join("api/chat")?)
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ApiError>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string(),
    };
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

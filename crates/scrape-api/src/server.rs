//! Axum server and routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use scrape_scheduler::{Scheduler, SchedulerError};
use scrape_types::{
    ArtifactHandle, ArtifactStore, ErrorResponse, JobId, JobStatusResponse, ProductRecord,
    ScrapeForm, Scraper, StartScrapeRequest, StartScrapeResponse,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Rows shown on the synchronous results page.
const PAGE_ROWS: usize = 20;

pub struct AppState {
    pub scheduler: Arc<dyn Scheduler>,
    /// Used directly by the synchronous `/scrape` page.
    pub scraper: Arc<dyn Scraper>,
    pub store: Arc<dyn ArtifactStore>,
    /// Artifact of the most recent synchronous scrape, served by `/download`.
    pub latest: RwLock<Option<ArtifactHandle>>,
}

impl AppState {
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        scraper: Arc<dyn Scraper>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            scheduler,
            scraper,
            store,
            latest: RwLock::new(None),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_home))
        .route("/start_scrape", post(handle_start_scrape))
        .route("/status/:job_id", get(handle_status))
        .route("/download/:job_id", get(handle_download))
        .route("/scrape", post(handle_sync_scrape))
        .route("/download", get(handle_download_latest))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error(status: StatusCode, msg: &str) -> Response {
    (status, Json(ErrorResponse::new(msg))).into_response()
}

fn not_ready() -> Response {
    error(StatusCode::NOT_FOUND, "not ready")
}

fn attachment(artifact: &ArtifactHandle, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn handle_start_scrape(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StartScrapeRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return error(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    if req.query().trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "search_query required");
    }
    // Negative or oversized values become 0 and are rejected by the registry.
    let max_pages = u32::try_from(req.max_pages).unwrap_or(0);
    match state.scheduler.submit(req.query(), max_pages).await {
        Ok(job_id) => Json(StartScrapeResponse::for_job(job_id)).into_response(),
        Err(SchedulerError::InvalidRequest(msg)) => error(StatusCode::BAD_REQUEST, &msg),
        Err(e) => {
            tracing::error!(error = %e, "submit failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn handle_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Response {
    let Ok(id) = job_id.parse::<JobId>() else {
        return error(StatusCode::NOT_FOUND, "job not found");
    };
    match state.scheduler.status(id).await {
        Ok(job) => Json(JobStatusResponse::from(&job)).into_response(),
        Err(SchedulerError::NotFound(_)) => error(StatusCode::NOT_FOUND, "job not found"),
        Err(e) => {
            tracing::error!(job_id = %id, error = %e, "status lookup failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn handle_download(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Response {
    let Ok(id) = job_id.parse::<JobId>() else {
        return not_ready();
    };
    match state.scheduler.download(id).await {
        Ok((artifact, bytes)) => attachment(&artifact, bytes),
        Err(SchedulerError::NotFound(_) | SchedulerError::NotReady(_)) => not_ready(),
        Err(e) => {
            tracing::error!(job_id = %id, error = %e, "download failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn handle_download_latest(State(state): State<Arc<AppState>>) -> Response {
    let Some(artifact) = state.latest.read().await.clone() else {
        return not_ready();
    };
    match state.store.load(&artifact).await {
        Ok(bytes) => attachment(&artifact, bytes),
        Err(e) => {
            tracing::warn!(error = %e, file = %artifact.file_name, "latest artifact unreadable");
            not_ready()
        }
    }
}

async fn handle_home() -> Html<String> {
    Html(render_page(&PageContent::default()))
}

/// One-shot scrape of the first results page, rendered inline. Bypasses the job registry.
async fn handle_sync_scrape(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ScrapeForm>,
) -> Html<String> {
    let query = form.query.trim().to_string();
    if query.is_empty() {
        return Html(render_page(&PageContent::message("Please enter a search query")));
    }

    let products = match state.scraper.scrape(&query, 1).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(query = %query, error = %e, "synchronous scrape failed");
            return Html(render_page(&PageContent::message(&format!(
                "Error fetching data: {}",
                e
            ))));
        }
    };
    if products.is_empty() {
        return Html(render_page(&PageContent::message(&format!(
            "No products found for '{}'",
            query
        ))));
    }

    match state.store.save(&query, &products).await {
        Ok(artifact) => *state.latest.write().await = Some(artifact),
        Err(e) => tracing::warn!(error = %e, "failed to store synchronous results"),
    }
    Html(render_page(&PageContent {
        message: None,
        query: Some(query),
        products,
    }))
}

async fn handle_health() -> &'static str {
    "ok"
}

#[derive(Default)]
struct PageContent {
    message: Option<String>,
    query: Option<String>,
    products: Vec<ProductRecord>,
}

impl PageContent {
    fn message(msg: &str) -> Self {
        Self {
            message: Some(msg.to_string()),
            ..Self::default()
        }
    }
}

fn render_page(content: &PageContent) -> String {
    let mut body = String::new();
    body.push_str(
        "<form action=\"/scrape\" method=\"post\">\
         <input type=\"text\" name=\"query\" placeholder=\"Search products\" required>\
         <button type=\"submit\">Search</button></form>\n",
    );
    if let Some(ref msg) = content.message {
        body.push_str(&format!("<h3>{}</h3>\n", escape_html(msg)));
    }
    if !content.products.is_empty() {
        let query = content.query.as_deref().unwrap_or_default();
        body.push_str(&format!(
            "<h2>Found {} products for '{}'</h2>\n<table>\n\
             <tr><th>Image</th><th>Title</th><th>Price</th><th>Link</th></tr>\n",
            content.products.len(),
            escape_html(query)
        ));
        for p in content.products.iter().take(PAGE_ROWS) {
            let image = p
                .image
                .as_deref()
                .map(|src| format!("<img src=\"{}\" alt=\"\">", escape_html(src)))
                .unwrap_or_default();
            let link = p.link.as_deref().unwrap_or("#");
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td>\
                 <td><a href=\"{}\" target=\"_blank\">View</a></td></tr>\n",
                image,
                escape_html(&p.name),
                escape_html(&p.price),
                escape_html(link)
            ));
        }
        body.push_str("</table>\n<a href=\"/download\"><button>Download CSV</button></a>\n");
    }
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n\
         <head><meta charset=\"UTF-8\"><title>Product Scraper</title></head>\n\
         <body>\n<h1>Product Scraper</h1>\n{}</body>\n</html>\n",
        body
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

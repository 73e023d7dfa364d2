//! HTTP interface to the query service.
//!
//! Provides endpoints for:
//! - `GET /weather` - Paginated daily records, filtered by `date` and/or `station_id`
//! - `GET /weather/stats` - Per station statistics, optionally for one `station_id`
//! - `GET /health` - Health check
//!
//! The two data routes are also served under `/api`.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    archive::Archive,
    errors::QueryError,
    filter::{self, Pagination, RecordFilter},
    service::QueryService,
};

/// Shared state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Root of the archive to serve.
    pub root: PathBuf,
}

impl AppState {
    /// Serve the archive at `root`.
    pub fn new(root: PathBuf) -> Self {
        AppState { root }
    }
}

/// Query string for `GET /weather`.
///
/// Everything is taken as a string so a malformed number is reported like any other invalid
/// parameter instead of being rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct WeatherParams {
    /// Exact match date, `YYYYMMDD`.
    pub date: Option<String>,
    /// Exact match station id.
    pub station_id: Option<String>,
    /// One based page number.
    pub page: Option<String>,
    /// Page size.
    pub per_page: Option<String>,
}

/// Query string for `GET /weather/stats`.
#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    /// Exact match station id.
    pub station_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct DataResponse<T> {
    data: Vec<T>,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Build the application router.
pub fn router(state: AppState, timeout: Duration) -> Router {
    let data_routes = Router::new()
        .route("/weather", get(weather_handler))
        .route("/weather/stats", get(weather_stats_handler));

    Router::new()
        .route("/health", get(health_handler))
        .merge(data_routes.clone())
        .nest("/api", data_routes)
        .layer(Extension(Arc::new(state)))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
}

/// GET /health - Basic health check
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /weather - Daily records
async fn weather_handler(
    Extension(state): Extension<Arc<AppState>>,
    params: Result<Query<WeatherParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return query_rejection(rejection),
    };

    info!(
        date = ?params.date,
        station_id = ?params.station_id,
        page = ?params.page,
        per_page = ?params.per_page,
        "fetching weather data"
    );

    let validated = RecordFilter::new(params.date.as_deref(), params.station_id.as_deref())
        .and_then(|filter| {
            let page = parse_int(params.page.as_deref(), Pagination::DEFAULT_PAGE, "Page number")?;
            let per_page = parse_int(
                params.per_page.as_deref(),
                Pagination::DEFAULT_PER_PAGE,
                "Items per page",
            )?;

            Ok((filter, Pagination::new(page, per_page)?))
        });

    let (filter, page) = match validated {
        Ok(vals) => vals,
        Err(err) => return error_response(err),
    };

    run_query(&state, move |service| service.records(&filter, page)).await
}

/// GET /weather/stats - Per station statistics
async fn weather_stats_handler(
    Extension(state): Extension<Arc<AppState>>,
    params: Result<Query<StatsParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return query_rejection(rejection),
    };

    info!(station_id = ?params.station_id, "fetching weather statistics");

    let station_id = match filter::stats_filter(params.station_id.as_deref()) {
        Ok(station_id) => station_id,
        Err(err) => return error_response(err),
    };

    run_query(&state, move |service| service.stats(station_id.as_ref())).await
}

// Repeated or undecodable parameters are reported like any other invalid value.
fn query_rejection(rejection: QueryRejection) -> Response {
    error_response(QueryError::Validation(rejection.body_text()))
}

fn parse_int(value: Option<&str>, default: i64, name: &str) -> Result<i64, QueryError> {
    match value.filter(|val| !val.is_empty()) {
        None => Ok(default),
        Some(val) => val
            .parse::<i64>()
            .map_err(|_| QueryError::Validation(format!("{} must be an integer", name))),
    }
}

/// Run a query against a fresh connection on the blocking pool.
async fn run_query<T, F>(state: &AppState, query: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(QueryService<'_>) -> Result<Vec<T>, QueryError> + Send + 'static,
{
    let root = state.root.clone();

    let joined = tokio::task::spawn_blocking(move || {
        let arch = Archive::connect(&root)?;
        query(QueryService::new(&arch))
    })
    .await;

    match joined {
        Ok(Ok(data)) => (StatusCode::OK, Json(DataResponse { data })).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(err) => {
            error!("query task failed: {}", err);
            internal_error()
        }
    }
}

fn error_response(err: QueryError) -> Response {
    let status = match err {
        QueryError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        QueryError::Storage(ref err) => {
            error!("error querying the archive: {}", err);
            return internal_error();
        }
        _ if err.is_not_found() => StatusCode::NOT_FOUND,
        _ => {
            error!("unexpected query outcome: {}", err);
            return internal_error();
        }
    };

    info!(status = status.as_u16(), "request rejected: {}", err);
    (
        status,
        Json(MessageResponse {
            message: err.to_string(),
        }),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageResponse {
            message: "Internal Server Error".to_owned(),
        }),
    )
        .into_response()
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/

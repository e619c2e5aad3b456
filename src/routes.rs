use axum::{
    body::Body,
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Json, Response as HttpResponse},
    routing::get,
    Router,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::Config,
    forecast::openmeteo::WeatherError,
    geolocation::Coordinates,
    page::PageContext,
    utils::{validate_coordinates, ErrorResponse},
    worker::{
        network::{Network, Request, Response},
        registration::{Registration, RegistrationStatus},
    },
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub origin: Url,
    pub registration: Arc<Registration>,
    pub page: Arc<PageContext>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherPageQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: &str, code: &str) -> ApiError {
    (status, Json(ErrorResponse::new(message, code)))
}

// Route handlers
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Rendered weather page. Without coordinates the configured position
/// source is used; failures render the status message, never an error page.
pub async fn weather_page(
    State(state): State<AppState>,
    Query(params): Query<WeatherPageQuery>,
) -> Html<String> {
    let coords = match (params.latitude, params.longitude) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
        _ => None,
    };

    let page = state.page.load(coords).await;
    Html(page.to_html(&state.config.base_path))
}

/// Raw forecast JSON, fetched through the worker (network-first).
pub async fn get_forecast(
    State(state): State<AppState>,
    Query(params): Query<ForecastQuery>,
) -> Result<HttpResponse, ApiError> {
    validate_coordinates(params.latitude, params.longitude)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e, "invalid_coordinates"))?;

    match state
        .page
        .client()
        .forecast_response(params.latitude, params.longitude)
        .await
    {
        Ok(response) => Ok(into_http(response)),
        Err(WeatherError::FetchFailed { status }) => {
            tracing::error!("Weather API responded with HTTP {}", status);
            Err(api_error(StatusCode::BAD_GATEWAY, "Weather fetch failed", "upstream_status"))
        }
        Err(e) => {
            tracing::error!("Forecast request failed: {}", e);
            Err(api_error(StatusCode::BAD_GATEWAY, &e.to_string(), "upstream_unavailable"))
        }
    }
}

pub async fn worker_status(State(state): State<AppState>) -> Json<RegistrationStatus> {
    Json(state.registration.status())
}

/// App shell and other same-origin assets, answered by the worker (cache-first).
pub async fn shell_asset(State(state): State<AppState>, uri: Uri) -> HttpResponse {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    let request = match Request::get_path(&state.origin, path) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Cannot resolve {} against origin: {}", path, e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match state.registration.fetch(&request).await {
        Ok(response) => into_http(response),
        Err(e) => {
            tracing::error!("No response for {}: {}", request.url, e);
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
    }
}

const SKIPPED_HEADERS: [&str; 3] = ["content-length", "transfer-encoding", "connection"];

fn into_http(response: Response) -> HttpResponse {
    let mut builder = axum::http::Response::builder().status(response.status);
    for (name, value) in &response.headers {
        if SKIPPED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|e| {
            tracing::error!("Invalid upstream response: {}", e);
            StatusCode::BAD_GATEWAY.into_response()
        })
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    let base = state.config.base_path.clone();

    Router::new()
        .route("/health", get(health))
        .route("/weather", get(weather_page))
        .route("/api/forecast", get(get_forecast))
        .route("/worker", get(worker_status))
        .route(&format!("{}/", base), get(shell_asset))
        .route(&format!("{}/*path", base), get(shell_asset))
        .with_state(state)
}

//! HTTP handlers for serial numbers and format administration.
//!
//! The service is synchronous and its row locks block, so every call into it
//! runs on the blocking pool via [`tokio::task::spawn_blocking`].

use crate::server::{
    service::{
        dto::{ApiJson, GenerateRequest, PreviewRequest, SerialResponse, parse_date},
        error::ApiError,
        oracle::LedgerOracle,
    },
    telemetry::{
        increment_candidates_skipped, increment_generation_retries, increment_requests,
        increment_serials_generated, record_generation_duration,
    },
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serialno::{CounterStore, FormatId, FormatUpdate, NewFormat, SerialFormat, SerialService};
use serde_json::{Value, json};
use std::{sync::Arc, time::Instant};
use tokio::task::spawn_blocking;
use tracing::{debug, instrument};

/// Shared handler state: one service over one store.
pub struct AppState<S> {
    service: Arc<SerialService<S>>,
}

impl<S> AppState<S> {
    pub fn new(service: Arc<SerialService<S>>) -> Self {
        Self { service }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

/// Every route, with state applied and no middleware.
pub fn router<S>(service: Arc<SerialService<S>>) -> Router
where
    S: CounterStore + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/api/serial-numbers/preview", post(preview::<S>))
        .route("/api/serial-numbers/generate", post(generate::<S>))
        .route(
            "/api/serial-formats",
            get(list_formats::<S>).post(create_format::<S>),
        )
        .route(
            "/api/serial-formats/{id}",
            get(get_format::<S>)
                .put(replace_format::<S>)
                .delete(delete_format::<S>),
        )
        .with_state(AppState::new(service))
}

/// Runs `f` against the service on the blocking pool.
async fn blocking<S, T, F>(state: &AppState<S>, f: F) -> Result<T, ApiError>
where
    S: CounterStore + 'static,
    T: Send + 'static,
    F: FnOnce(&SerialService<S>) -> serialno::Result<T> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    Ok(spawn_blocking(move || f(&service)).await??)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[instrument(level = "info", skip_all, fields(key = %req.key))]
async fn preview<S>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<PreviewRequest>,
) -> Result<Json<SerialResponse>, ApiError>
where
    S: CounterStore + 'static,
{
    increment_requests("preview");
    let at = parse_date(req.date.as_deref()).map_err(ApiError::BadRequest)?;

    let key = req.key;
    let generated = blocking(&state, move |service| service.preview(&key, at)).await?;
    Ok(Json(SerialResponse::preview(generated)))
}

#[instrument(level = "info", skip_all, fields(key = %req.key))]
async fn generate<S>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<GenerateRequest>,
) -> Result<Json<SerialResponse>, ApiError>
where
    S: CounterStore + 'static,
{
    increment_requests("generate");
    let start = Instant::now();

    let key = req.key;
    let result = blocking(&state, move |service| {
        service.generate(&key, &LedgerOracle::new(service.store()))
    })
    .await;
    record_generation_duration(start.elapsed().as_secs_f64() * 1_000.0);

    let generated = result?;
    increment_serials_generated();
    increment_candidates_skipped(generated.skipped);
    increment_generation_retries(u64::from(generated.attempts.saturating_sub(1)));
    debug!(value = %generated.value, number = generated.number, "serial issued");

    Ok(Json(SerialResponse::generated(
        generated.value,
        generated.number,
    )))
}

async fn list_formats<S>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<SerialFormat>>, ApiError>
where
    S: CounterStore + 'static,
{
    increment_requests("list_formats");
    Ok(Json(blocking(&state, |service| service.formats()).await?))
}

async fn create_format<S>(
    State(state): State<AppState<S>>,
    ApiJson(format): ApiJson<NewFormat>,
) -> Result<(StatusCode, Json<SerialFormat>), ApiError>
where
    S: CounterStore + 'static,
{
    increment_requests("create_format");
    let created = blocking(&state, move |service| service.create_format(format)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_format<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<u64>,
) -> Result<Json<SerialFormat>, ApiError>
where
    S: CounterStore + 'static,
{
    increment_requests("get_format");
    let id = FormatId::new(id);
    Ok(Json(blocking(&state, move |service| service.format(id)).await?))
}

async fn replace_format<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<u64>,
    ApiJson(update): ApiJson<FormatUpdate>,
) -> Result<Json<SerialFormat>, ApiError>
where
    S: CounterStore + 'static,
{
    increment_requests("replace_format");
    let id = FormatId::new(id);
    let replaced = blocking(&state, move |service| service.replace_format(id, update)).await?;
    Ok(Json(replaced))
}

async fn delete_format<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError>
where
    S: CounterStore + 'static,
{
    increment_requests("delete_format");
    let id = FormatId::new(id);
    blocking(&state, move |service| service.delete_format(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! API Handlers
//!
//! HTTP request handlers for the clinical endpoints, the cache
//! invalidation endpoint and the health check.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::clinical::{
    age_in_months, age_in_years, assess_child, body_mass_index, classify_blood_pressure,
    muac_risk, summarize_pregnancy, waist_circumference_risk,
};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::gateway::{Gateway, RateLimitOptions};
use crate::models::{
    validate_namespace, AdultAssessmentResponse, AdultQuery, AgeQuery, AgeResponse, BumpResponse,
    ChildAssessmentResponse, ChildQuery, HealthResponse, PregnancyQuery,
};
use crate::store::{MemoryStore, StoreMode};

/// Cache namespace shared by every clinical endpoint.
pub const CLINICAL_NAMESPACE: &str = "clinical";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    /// TTL in seconds of cached clinical responses
    pub cache_ttl: u64,
    /// Requests allowed per window for each endpoint
    pub rate_limit: u64,
    pub rate_window: String,
}

impl AppState {
    /// Creates a new AppState around `gateway`, taking cache and limit
    /// settings from `config`.
    pub fn new(gateway: Gateway, config: &Config) -> Self {
        Self {
            gateway: Arc::new(gateway),
            cache_ttl: config.default_cache_ttl,
            rate_limit: config.api_rate_limit,
            rate_window: config.api_rate_window.clone(),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Also returns the in-process store when it was selected, so the caller
    /// can start its cleanup task.
    pub fn from_config(config: &Config) -> (Self, Option<Arc<MemoryStore>>) {
        let (store, memory) = StoreMode::from_config(config);
        let gateway = Gateway::from_config(config, store);
        (Self::new(gateway, config), memory)
    }
}

/// Rate-limits, then serves `compute` through the clinical response cache.
///
/// `endpoint` names the limiter (`api:{endpoint}`); `key` identifies the
/// cached response within the clinical namespace.
async fn limited_and_cached<T, F>(
    state: &AppState,
    headers: &HeaderMap,
    endpoint: &str,
    key: String,
    compute: F,
) -> Result<Response>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T>,
{
    let prefix = format!("api:{}", endpoint);
    let outcome = state
        .gateway
        .check_rate_limit(
            headers,
            RateLimitOptions::new(&prefix, state.rate_limit, &state.rate_window),
        )
        .await?;
    if !outcome.ok() {
        info!(endpoint, "rate limit exceeded");
        return Ok(outcome.into_response());
    }

    let cached = state
        .gateway
        .cached_json(CLINICAL_NAMESPACE, &key, state.cache_ttl, || async move {
            compute()
        })
        .await?;

    let mut response = Json(cached.value).into_response();
    outcome.apply_headers(response.headers_mut());
    cached.status.apply_headers(response.headers_mut());
    Ok(response)
}

fn parse_query<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}

fn today_or_now(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

/// Handler for GET /api/clinical/child
pub async fn child_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<ChildQuery>, QueryRejection>,
) -> Result<Response> {
    let query = parse_query(query)?;
    if let Some(error_msg) = query.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let measurement = query.measurement();
    limited_and_cached(&state, &headers, "child", query.cache_key(), move || {
        Ok(ChildAssessmentResponse::from(assess_child(&measurement)))
    })
    .await
}

/// Handler for GET /api/clinical/adult
pub async fn adult_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<AdultQuery>, QueryRejection>,
) -> Result<Response> {
    let query = parse_query(query)?;
    if let Some(error_msg) = query.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let key = query.cache_key();
    limited_and_cached(&state, &headers, "adult", key, move || {
        let blood_pressure = query
            .systolic
            .zip(query.diastolic)
            .map(|(systolic, diastolic)| classify_blood_pressure(systolic, diastolic));
        let muac = query.muac_cm.map(|cm| (muac_risk(cm, query.gender), cm));
        let central_obesity = query
            .waist_cm
            .map(|cm| waist_circumference_risk(cm, query.gender));

        Ok(AdultAssessmentResponse::new(
            body_mass_index(query.weight_kg, query.height_cm),
            blood_pressure,
            muac,
            central_obesity,
        ))
    })
    .await
}

/// Handler for GET /api/clinical/pregnancy
pub async fn pregnancy_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<PregnancyQuery>, QueryRejection>,
) -> Result<Response> {
    let query = parse_query(query)?;
    let today = today_or_now(query.today);

    // The reference day is part of the key so cached weeks never go stale.
    let key = format!("pregnancy:lmp={}&today={}", query.lmp, today);
    limited_and_cached(&state, &headers, "pregnancy", key, move || {
        Ok(summarize_pregnancy(query.lmp, today))
    })
    .await
}

/// Handler for GET /api/clinical/age
pub async fn age_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<AgeQuery>, QueryRejection>,
) -> Result<Response> {
    let query = parse_query(query)?;
    let today = today_or_now(query.today);

    let key = format!("age:birth={}&today={}", query.birth_date, today);
    limited_and_cached(&state, &headers, "age", key, move || {
        Ok(AgeResponse {
            birth_date: query.birth_date,
            today,
            months: age_in_months(query.birth_date, today),
            years: age_in_years(query.birth_date, today),
        })
    })
    .await
}

/// Handler for POST /api/cache/:namespace/bump
///
/// Invalidates every cached response of the namespace.
pub async fn bump_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<BumpResponse>> {
    if let Some(error_msg) = validate_namespace(&namespace) {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let version = state.gateway.bump_cache_version(&namespace).await?;
    info!(namespace = %namespace, ?version, "cache namespace invalidated");
    Ok(Json(BumpResponse::new(namespace, version)))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        state.gateway.store().is_connected(),
        state.gateway.rate_limit_enabled(),
    ))
}

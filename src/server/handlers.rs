use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::jobs::db;
use crate::jobs::input::{JobInput, ListParams};
use crate::jobs::types::{FieldError, JobPage, JobRecord};
use crate::scrape::{scrape_and_merge, ScrapeOptions};
use crate::telemetry::{self};
use crate::telemetry::ops::serve::Phase as ServePhase;

use super::auth::check_scrape_token;
use super::error::ApiError;
use super::AppState;

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

type IdPath = Result<Path<i64>, PathRejection>;
type Body<T> = Result<Json<T>, JsonRejection>;
type Params<T> = Result<Query<T>, QueryRejection>;

pub async fn list_jobs(State(st): State<AppState>, params: Params<ListParams>) -> Result<Json<JobPage>, ApiError> {
    let Query(params) = params?;
    let query = params.validate().map_err(ApiError::Validation)?;
    Ok(Json(db::list_jobs(&st.pool, &query).await?))
}

pub async fn get_job(State(st): State<AppState>, id: IdPath) -> Result<Json<JobRecord>, ApiError> {
    let Path(id) = id?;
    let rec = db::get_job(&st.pool, id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(rec))
}

pub async fn create_job(State(st): State<AppState>, body: Body<JobInput>) -> Result<(StatusCode, Json<JobRecord>), ApiError> {
    let Json(input) = body?;
    let posting = input.validate_create().map_err(ApiError::Validation)?;
    let rec = db::insert_job(&st.pool, &posting).await?;
    Ok((StatusCode::CREATED, Json(rec)))
}

/// Serves both PUT and PATCH: only the fields present in the body change.
pub async fn update_job(
    State(st): State<AppState>,
    id: IdPath,
    body: Body<JobInput>,
) -> Result<Json<JobRecord>, ApiError> {
    let Path(id) = id?;
    let Json(input) = body?;
    let patch = input.validate_update().map_err(ApiError::Validation)?;
    let mut posting = db::get_job(&st.pool, id).await?.ok_or(ApiError::NotFound)?.posting;
    patch.apply_to(&mut posting);
    let rec = db::replace_job(&st.pool, id, &posting).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(rec))
}

pub async fn delete_job(State(st): State<AppState>, id: IdPath) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    if db::delete_job(&st.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[derive(Debug, Deserialize)]
pub struct TriggerParams {
    token: Option<String>,
    // parsed only after the token check so bad input never leaks past auth
    pages: Option<String>,
}

fn parse_pages(raw: Option<&str>) -> Result<u32, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(1),
        Some(s) => s
            .parse()
            .map_err(|_| ApiError::Validation(vec![FieldError::new("pages", "pages must be a positive integer")])),
    }
}

#[derive(Serialize)]
pub struct TriggerResponse {
    message: &'static str,
    count: usize,
}

/// Protected scrape trigger. Runs to completion inside the request; concurrent
/// triggers are not serialized.
pub async fn trigger_scrape(
    State(st): State<AppState>,
    params: Params<TriggerParams>,
    headers: HeaderMap,
) -> Result<Json<TriggerResponse>, ApiError> {
    let Query(params) = params?;
    let log = telemetry::serve();
    if let Err(e) = check_scrape_token(params.token.as_deref(), &headers, st.cfg.scrape_secret.as_deref()) {
        log.warn("🔒 scrape trigger rejected");
        return Err(e);
    }
    let opts = ScrapeOptions {
        pages: parse_pages(params.pages.as_deref())?,
        page_timeout: st.cfg.page_timeout,
        date_policy: st.cfg.date_policy,
        today: chrono::Utc::now().date_naive(),
    };
    let span = log.span_kv(&ServePhase::Trigger, [("pages", opts.pages.to_string())]);
    let report = scrape_and_merge(st.site.as_ref(), st.launcher.as_ref(), st.store.as_ref(), &opts)
        .instrument(span)
        .await?;
    log.info_kv("✅ scrape trigger done", [("count", report.count.to_string())]);
    Ok(Json(TriggerResponse { message: "Scrape completed", count: report.count }))
}

pub async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "message": "Route not found" })))
}

use anyhow::Context;
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{AnalyticsRequest, AnalyticsResponse},
    repo_types::ReportType,
};
use crate::{
    auth::{repo_types::EmployerProfile, session::CurrentIdentity},
    error::AppError,
    extract::ApiJson,
    notifications::{self, NewNotification},
    state::AppState,
    store::Store,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/employers/:id/approve", post(approve_employer))
        .route("/api/admin/analytics", post(generate_analytics))
}

#[instrument(skip(state, identity))]
pub async fn approve_employer(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(employer_id): Path<Uuid>,
) -> Result<Json<EmployerProfile>, AppError> {
    const FAILED: &str = "Failed to approve employer";
    let (admin, _) = identity.admin()?;
    let store = state.store.as_ref();

    if store
        .find_employer(employer_id)
        .await
        .map_err(AppError::storage(FAILED))?
        .is_none()
    {
        return Err(AppError::NotFound("Employer not found".into()));
    }

    let employer = store
        .approve_employer(employer_id, OffsetDateTime::now_utc())
        .await
        .map_err(AppError::storage(FAILED))?;

    notifications::deliver(store, NewNotification::account_approved(employer.user_id)).await;

    info!(%employer_id, approved_by = %admin.user.id, "employer approved");
    Ok(Json(employer))
}

#[instrument(skip(state, identity, body))]
pub async fn generate_analytics(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(body): ApiJson<AnalyticsRequest>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    const FAILED: &str = "Failed to generate analytics";
    let (_, admin) = identity.admin()?;
    let report: ReportType = body.report_type.parse()?;
    let store = state.store.as_ref();

    let metrics = collect_metrics(store, report, OffsetDateTime::now_utc())
        .await
        .map_err(AppError::storage(FAILED))?;

    store
        .record_analytics(admin.id, report, &metrics)
        .await
        .map_err(AppError::storage(FAILED))?;

    info!(report = report.as_str(), admin_id = %admin.id, "analytics report recorded");
    Ok(Json(AnalyticsResponse {
        success: true,
        metrics,
    }))
}

/// Counts for `report`, stamped with `lastUpdated`.
async fn collect_metrics(
    store: &dyn Store,
    report: ReportType,
    now: OffsetDateTime,
) -> anyhow::Result<Value> {
    let mut metrics = match report {
        ReportType::UserStats => to_object(store.user_stats().await?)?,
        ReportType::JobStats => to_object(store.job_stats().await?)?,
        ReportType::ApplicationStats => to_object(store.application_stats().await?)?,
    };
    metrics.insert("lastUpdated".into(), Value::String(now.format(&Rfc3339)?));
    Ok(Value::Object(metrics))
}

fn to_object(stats: impl Serialize) -> anyhow::Result<serde_json::Map<String, Value>> {
    match serde_json::to_value(stats).context("serialize report")? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("report serialized to non-object: {other}"),
    }
}

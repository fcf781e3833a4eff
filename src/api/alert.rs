use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::api::middleware::{require, AuthUser};
use crate::entities::{alert, prescription};
use crate::roles::Action;
use crate::scheduling::{pending_alerts, validate_and_normalize, AlertDraft, ScheduleError};

fn rejection(err: ScheduleError) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"error": err.to_string()})),
    )
        .into_response()
}

/// Resolve the prescription a draft points at. A dangling reference is a
/// rejected write, same as a missing one.
async fn load_linked_prescription(
    db: &DatabaseConnection,
    prescription_id: Option<i32>,
) -> Result<Option<prescription::Model>, Response> {
    let Some(id) = prescription_id else {
        return Ok(None);
    };
    match prescription::Entity::find_by_id(id).one(db).await {
        Ok(Some(p)) => Ok(Some(p)),
        Ok(None) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "Linked prescription not found"})),
        )
            .into_response()),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response()),
    }
}

pub async fn list_alerts(Extension(db): Extension<DatabaseConnection>) -> Response {
    match alert::Entity::find()
        .order_by_desc(alert::Column::CreatedAt)
        .all(&db)
        .await
    {
        Ok(alerts) => (StatusCode::OK, Json(alerts)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn get_alert(
    Extension(db): Extension<DatabaseConnection>,
    Path(alert_id): Path<Uuid>,
) -> Response {
    match alert::Entity::find_by_id(alert_id).one(&db).await {
        Ok(Some(a)) => (StatusCode::OK, Json(a)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Alert not found"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn create_alert(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Json(draft): Json<AlertDraft>,
) -> Response {
    if let Err(denied) = require(&auth, Action::ManageAlerts) {
        return denied;
    }

    let linked = match load_linked_prescription(&db, draft.prescription_id).await {
        Ok(linked) => linked,
        Err(response) => return response,
    };
    let normalized = match validate_and_normalize(&draft, linked.as_ref()) {
        Ok(normalized) => normalized,
        Err(err) => return rejection(err),
    };

    let kind = normalized.kind.as_str().to_string();
    let recurrence = normalized.recurrence.kind().as_str().to_string();
    let columns = normalized.recurrence.detail_columns();
    let now = chrono::Utc::now().naive_utc();
    let new_alert = alert::ActiveModel {
        id: Set(Uuid::new_v4()),
        patient_id: Set(normalized.patient_id),
        prescription_id: Set(normalized.prescription_id),
        kind: Set(kind),
        message: Set(normalized.message),
        recurrence: Set(recurrence),
        starts_at: Set(normalized.starts_at),
        ends_at: Set(normalized.ends_at),
        daily_time: Set(columns.daily_time),
        weekly_day: Set(columns.weekly_day),
        weekly_time: Set(columns.weekly_time),
        times_of_day: Set(columns.times_of_day),
        is_active: Set(normalized.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match new_alert.insert(&db).await {
        Ok(alert) => {
            tracing::Span::current()
                .record("table", "alerts")
                .record("action", "create_alert")
                .record("patient_id", alert.patient_id);
            metrics::counter!("medtrack_alerts_created_total").increment(1);
            metrics::gauge!("medtrack_alerts_total").increment(1.0);
            (StatusCode::CREATED, Json(alert)).into_response()
        }
        Err(e) => {
            error!("Failed to create alert: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

// Updates are full-record: the draft carries every field and runs through the
// same validator as create, so stale detail columns always get cleared.
pub async fn update_alert(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Path(alert_id): Path<Uuid>,
    Json(draft): Json<AlertDraft>,
) -> Response {
    if let Err(denied) = require(&auth, Action::ManageAlerts) {
        return denied;
    }

    let existing = match alert::Entity::find_by_id(alert_id).one(&db).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Alert not found"})),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    let linked = match load_linked_prescription(&db, draft.prescription_id).await {
        Ok(linked) => linked,
        Err(response) => return response,
    };
    let normalized = match validate_and_normalize(&draft, linked.as_ref()) {
        Ok(normalized) => normalized,
        Err(err) => return rejection(err),
    };

    let kind = normalized.kind.as_str().to_string();
    let recurrence = normalized.recurrence.kind().as_str().to_string();
    let columns = normalized.recurrence.detail_columns();

    let mut active_alert: alert::ActiveModel = existing.into();
    active_alert.patient_id = Set(normalized.patient_id);
    active_alert.prescription_id = Set(normalized.prescription_id);
    active_alert.kind = Set(kind);
    active_alert.message = Set(normalized.message);
    active_alert.recurrence = Set(recurrence);
    active_alert.starts_at = Set(normalized.starts_at);
    active_alert.ends_at = Set(normalized.ends_at);
    active_alert.daily_time = Set(columns.daily_time);
    active_alert.weekly_day = Set(columns.weekly_day);
    active_alert.weekly_time = Set(columns.weekly_time);
    active_alert.times_of_day = Set(columns.times_of_day);
    active_alert.is_active = Set(normalized.is_active);
    active_alert.updated_at = Set(chrono::Utc::now().naive_utc());

    match active_alert.update(&db).await {
        Ok(alert) => (StatusCode::OK, Json(alert)).into_response(),
        Err(e) => {
            error!("Failed to update alert: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

pub async fn delete_alert(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Path(alert_id): Path<Uuid>,
) -> Response {
    if let Err(denied) = require(&auth, Action::ManageAlerts) {
        return denied;
    }

    match alert::Entity::delete_by_id(alert_id).exec(&db).await {
        Ok(res) if res.rows_affected == 0 => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Alert not found"})),
        )
            .into_response(),
        Ok(_) => {
            metrics::gauge!("medtrack_alerts_total").decrement(1.0);
            (StatusCode::OK, Json(json!({"message": "Alert deleted"}))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

// GET /api/alerts/pending - polled by clients roughly once a minute
pub async fn get_pending_alerts(Extension(db): Extension<DatabaseConnection>) -> Response {
    let now = chrono::Utc::now().naive_utc();
    metrics::counter!("medtrack_pending_polls_total").increment(1);

    match pending_alerts(&db, now).await {
        Ok(alerts) => (StatusCode::OK, Json(json!({"alerts": alerts}))).into_response(),
        Err(e) => {
            error!("Failed to compute pending alerts: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to fetch pending alerts"})),
            )
                .into_response()
        }
    }
}

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde_json::json;

use crate::api::middleware::{require, AuthUser};
use crate::entities::{administration, prescription};
use crate::roles::Action;

#[derive(serde::Deserialize)]
pub struct CreateAdministrationRequest {
    prescription_id: i32,
    notes: Option<String>,
}

pub async fn list_administrations(Extension(db): Extension<DatabaseConnection>) -> Response {
    match administration::Entity::find()
        .order_by_desc(administration::Column::RecordedAt)
        .all(&db)
        .await
    {
        Ok(administrations) => (StatusCode::OK, Json(administrations)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

// The administering user is always the session user, never taken from the
// request body.
pub async fn create_administration(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateAdministrationRequest>,
) -> Response {
    if let Err(denied) = require(&auth, Action::RecordAdministration) {
        return denied;
    }

    match prescription::Entity::find_by_id(payload.prescription_id).one(&db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Prescription not found"})),
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
    }

    let new_administration = administration::ActiveModel {
        prescription_id: Set(payload.prescription_id),
        user_id: Set(auth.id),
        recorded_at: Set(chrono::Utc::now().naive_utc()),
        notes: Set(payload.notes),
        ..Default::default()
    };

    match new_administration.insert(&db).await {
        Ok(administration) => {
            tracing::Span::current()
                .record("table", "administrations")
                .record("action", "record_administration")
                .record("user_id", auth.id);
            metrics::counter!("medtrack_administrations_recorded_total").increment(1);
            (StatusCode::CREATED, Json(administration)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn delete_administration(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Path(administration_id): Path<i32>,
) -> Response {
    if let Err(denied) = require(&auth, Action::RecordAdministration) {
        return denied;
    }

    match administration::Entity::delete_by_id(administration_id).exec(&db).await {
        Ok(res) if res.rows_affected == 0 => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Administration not found"})),
        )
            .into_response(),
        Ok(_) => (
            StatusCode::OK,
            Json(json!({"message": "Administration deleted"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

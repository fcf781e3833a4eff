use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set};
use serde_json::json;

use crate::api::middleware::{require, AuthUser};
use crate::entities::medication;
use crate::roles::Action;

#[derive(serde::Deserialize)]
pub struct CreateMedicationRequest {
    name: String,
    dosage: String,
    route: String,
}

pub async fn list_medications(Extension(db): Extension<DatabaseConnection>) -> Response {
    match medication::Entity::find()
        .order_by_asc(medication::Column::Name)
        .all(&db)
        .await
    {
        Ok(medications) => (StatusCode::OK, Json(medications)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn create_medication(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateMedicationRequest>,
) -> Response {
    if let Err(denied) = require(&auth, Action::ManageMedications) {
        return denied;
    }

    let now = chrono::Utc::now().naive_utc();
    let new_medication = medication::ActiveModel {
        name: Set(payload.name),
        dosage: Set(payload.dosage),
        route: Set(payload.route),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_medication.insert(&db).await {
        Ok(medication) => {
            metrics::gauge!("medtrack_medications_total").increment(1.0);
            (StatusCode::CREATED, Json(medication)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn get_medication(
    Extension(db): Extension<DatabaseConnection>,
    Path(medication_id): Path<i32>,
) -> Response {
    match medication::Entity::find_by_id(medication_id).one(&db).await {
        Ok(Some(m)) => (StatusCode::OK, Json(m)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Medication not found"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

#[derive(serde::Deserialize)]
pub struct UpdateMedicationRequest {
    name: Option<String>,
    dosage: Option<String>,
    route: Option<String>,
}

pub async fn update_medication(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Path(medication_id): Path<i32>,
    Json(payload): Json<UpdateMedicationRequest>,
) -> Response {
    if let Err(denied) = require(&auth, Action::ManageMedications) {
        return denied;
    }

    let medication = match medication::Entity::find_by_id(medication_id).one(&db).await {
        Ok(Some(m)) => m,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Medication not found"})),
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

    let mut active_medication = medication.into_active_model();
    if let Some(name) = payload.name {
        active_medication.name = Set(name);
    }
    if let Some(dosage) = payload.dosage {
        active_medication.dosage = Set(dosage);
    }
    if let Some(route) = payload.route {
        active_medication.route = Set(route);
    }
    active_medication.updated_at = Set(chrono::Utc::now().naive_utc());

    match active_medication.update(&db).await {
        Ok(m) => (StatusCode::OK, Json(m)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn delete_medication(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Path(medication_id): Path<i32>,
) -> Response {
    if let Err(denied) = require(&auth, Action::ManageMedications) {
        return denied;
    }

    match medication::Entity::delete_by_id(medication_id).exec(&db).await {
        Ok(res) if res.rows_affected == 0 => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Medication not found"})),
        )
            .into_response(),
        Ok(_) => {
            metrics::gauge!("medtrack_medications_total").decrement(1.0);
            (
                StatusCode::OK,
                Json(json!({"message": "Medication deleted"})),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

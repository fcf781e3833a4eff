use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set};
use serde_json::json;

use crate::api::middleware::{require, AuthUser};
use crate::entities::prescription;
use crate::roles::{Action, Role};

const STATUSES: &[&str] = &["active", "suspended", "ended"];

#[derive(serde::Deserialize)]
pub struct CreatePrescriptionRequest {
    patient_id: i32,
    medication_id: i32,
    dose: String,
    frequency: String,
    status: Option<String>,
    notes: Option<String>,
}

pub async fn list_prescriptions(Extension(db): Extension<DatabaseConnection>) -> Response {
    match prescription::Entity::find()
        .order_by_desc(prescription::Column::CreatedAt)
        .all(&db)
        .await
    {
        Ok(prescriptions) => (StatusCode::OK, Json(prescriptions)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn create_prescription(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreatePrescriptionRequest>,
) -> Response {
    if let Err(denied) = require(&auth, Action::Prescribe) {
        return denied;
    }

    let status = payload.status.unwrap_or_else(|| "active".to_string());
    if !STATUSES.contains(&status.as_str()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Status must be active, suspended or ended"})),
        )
            .into_response();
    }

    // doctors are recorded as the prescriber; administrators enter on behalf
    let prescribed_by = (auth.role == Role::Doctor).then_some(auth.id);

    let now = chrono::Utc::now().naive_utc();
    let new_prescription = prescription::ActiveModel {
        patient_id: Set(payload.patient_id),
        medication_id: Set(payload.medication_id),
        prescribed_by: Set(prescribed_by),
        dose: Set(payload.dose),
        frequency: Set(payload.frequency),
        status: Set(status),
        notes: Set(payload.notes),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_prescription.insert(&db).await {
        Ok(prescription) => {
            tracing::Span::current()
                .record("table", "prescriptions")
                .record("action", "create_prescription")
                .record("patient_id", prescription.patient_id);
            metrics::gauge!("medtrack_prescriptions_total").increment(1.0);
            (StatusCode::CREATED, Json(prescription)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn get_prescription(
    Extension(db): Extension<DatabaseConnection>,
    Path(prescription_id): Path<i32>,
) -> Response {
    match prescription::Entity::find_by_id(prescription_id).one(&db).await {
        Ok(Some(p)) => (StatusCode::OK, Json(p)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Prescription not found"})),
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
pub struct UpdatePrescriptionRequest {
    patient_id: Option<i32>,
    medication_id: Option<i32>,
    dose: Option<String>,
    frequency: Option<String>,
    status: Option<String>,
    notes: Option<String>,
}

pub async fn update_prescription(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Path(prescription_id): Path<i32>,
    Json(payload): Json<UpdatePrescriptionRequest>,
) -> Response {
    if let Err(denied) = require(&auth, Action::Prescribe) {
        return denied;
    }

    if let Some(status) = payload.status.as_deref() {
        if !STATUSES.contains(&status) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Status must be active, suspended or ended"})),
            )
                .into_response();
        }
    }

    let prescription = match prescription::Entity::find_by_id(prescription_id).one(&db).await {
        Ok(Some(p)) => p,
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
    };

    let mut active_prescription = prescription.into_active_model();
    if let Some(patient_id) = payload.patient_id {
        active_prescription.patient_id = Set(patient_id);
    }
    if let Some(medication_id) = payload.medication_id {
        active_prescription.medication_id = Set(medication_id);
    }
    if let Some(dose) = payload.dose {
        active_prescription.dose = Set(dose);
    }
    if let Some(frequency) = payload.frequency {
        active_prescription.frequency = Set(frequency);
    }
    if let Some(status) = payload.status {
        active_prescription.status = Set(status);
    }
    if let Some(notes) = payload.notes {
        active_prescription.notes = Set(Some(notes));
    }
    active_prescription.updated_at = Set(chrono::Utc::now().naive_utc());

    match active_prescription.update(&db).await {
        Ok(p) => (StatusCode::OK, Json(p)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn delete_prescription(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Path(prescription_id): Path<i32>,
) -> Response {
    if let Err(denied) = require(&auth, Action::Prescribe) {
        return denied;
    }

    // Cascades remove the prescription's administrations and alerts.
    match prescription::Entity::delete_by_id(prescription_id).exec(&db).await {
        Ok(res) if res.rows_affected == 0 => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Prescription not found"})),
        )
            .into_response(),
        Ok(_) => {
            metrics::gauge!("medtrack_prescriptions_total").decrement(1.0);
            (
                StatusCode::OK,
                Json(json!({"message": "Prescription deleted"})),
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

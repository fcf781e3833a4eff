use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set};
use serde_json::json;

use crate::api::middleware::{require, AuthUser};
use crate::entities::patient;
use crate::roles::Action;

#[derive(serde::Deserialize)]
pub struct CreatePatientRequest {
    name: String,
    national_id: Option<String>,
    birth_date: chrono::NaiveDate,
    sex: String,
    record_number: String,
    contact_phone: Option<String>,
    allergies: Option<String>,
    clinical_history: Option<String>,
}

pub async fn list_patients(Extension(db): Extension<DatabaseConnection>) -> Response {
    match patient::Entity::find()
        .order_by_asc(patient::Column::Name)
        .all(&db)
        .await
    {
        Ok(patients) => (StatusCode::OK, Json(patients)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn create_patient(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreatePatientRequest>,
) -> Response {
    if let Err(denied) = require(&auth, Action::ManagePatients) {
        return denied;
    }

    let now = chrono::Utc::now().naive_utc();
    let new_patient = patient::ActiveModel {
        name: Set(payload.name),
        national_id: Set(payload.national_id),
        birth_date: Set(payload.birth_date),
        sex: Set(payload.sex),
        record_number: Set(payload.record_number),
        contact_phone: Set(payload.contact_phone),
        allergies: Set(payload.allergies),
        clinical_history: Set(payload.clinical_history),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_patient.insert(&db).await {
        Ok(patient) => {
            metrics::gauge!("medtrack_patients_total").increment(1.0);
            (StatusCode::CREATED, Json(patient)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn get_patient(
    Extension(db): Extension<DatabaseConnection>,
    Path(patient_id): Path<i32>,
) -> Response {
    match patient::Entity::find_by_id(patient_id).one(&db).await {
        Ok(Some(p)) => (StatusCode::OK, Json(p)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Patient not found"})),
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
pub struct UpdatePatientRequest {
    name: Option<String>,
    national_id: Option<String>,
    birth_date: Option<chrono::NaiveDate>,
    sex: Option<String>,
    record_number: Option<String>,
    contact_phone: Option<String>,
    allergies: Option<String>,
    clinical_history: Option<String>,
}

pub async fn update_patient(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Path(patient_id): Path<i32>,
    Json(payload): Json<UpdatePatientRequest>,
) -> Response {
    if let Err(denied) = require(&auth, Action::ManagePatients) {
        return denied;
    }

    let patient = match patient::Entity::find_by_id(patient_id).one(&db).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Patient not found"})),
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

    let mut active_patient = patient.into_active_model();
    if let Some(name) = payload.name {
        active_patient.name = Set(name);
    }
    if let Some(national_id) = payload.national_id {
        active_patient.national_id = Set(Some(national_id));
    }
    if let Some(birth_date) = payload.birth_date {
        active_patient.birth_date = Set(birth_date);
    }
    if let Some(sex) = payload.sex {
        active_patient.sex = Set(sex);
    }
    if let Some(record_number) = payload.record_number {
        active_patient.record_number = Set(record_number);
    }
    if let Some(contact_phone) = payload.contact_phone {
        active_patient.contact_phone = Set(Some(contact_phone));
    }
    if let Some(allergies) = payload.allergies {
        active_patient.allergies = Set(Some(allergies));
    }
    if let Some(clinical_history) = payload.clinical_history {
        active_patient.clinical_history = Set(Some(clinical_history));
    }
    active_patient.updated_at = Set(chrono::Utc::now().naive_utc());

    match active_patient.update(&db).await {
        Ok(p) => (StatusCode::OK, Json(p)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn delete_patient(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Path(patient_id): Path<i32>,
) -> Response {
    if let Err(denied) = require(&auth, Action::ManagePatients) {
        return denied;
    }

    // Cascades take the patient's prescriptions and alerts with it.
    match patient::Entity::delete_by_id(patient_id).exec(&db).await {
        Ok(res) if res.rows_affected == 0 => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Patient not found"})),
        )
            .into_response(),
        Ok(_) => {
            metrics::gauge!("medtrack_patients_total").decrement(1.0);
            (StatusCode::OK, Json(json!({"message": "Patient deleted"}))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

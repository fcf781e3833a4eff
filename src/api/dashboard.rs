use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveTime;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde_json::json;

use crate::entities::{alert, prescription, prelude::*};

// GET /api/dashboard - ward overview counters plus the latest alerts
pub async fn get_dashboard(Extension(db): Extension<DatabaseConnection>) -> Response {
    let now = chrono::Utc::now().naive_utc();
    let midnight = now.date().and_time(NaiveTime::MIN);

    let patients = match Patient::find().count(&db).await {
        Ok(n) => n,
        Err(e) => return db_error(e),
    };
    let medications = match Medication::find().count(&db).await {
        Ok(n) => n,
        Err(e) => return db_error(e),
    };
    let prescriptions_today = match Prescription::find()
        .filter(prescription::Column::CreatedAt.gte(midnight))
        .count(&db)
        .await
    {
        Ok(n) => n,
        Err(e) => return db_error(e),
    };
    let recent_alerts = match Alert::find()
        .order_by_desc(alert::Column::CreatedAt)
        .limit(5)
        .all(&db)
        .await
    {
        Ok(alerts) => alerts,
        Err(e) => return db_error(e),
    };

    (
        StatusCode::OK,
        Json(json!({
            "patients": patients,
            "medications": medications,
            "prescriptions_today": prescriptions_today,
            "recent_alerts": recent_alerts,
        })),
    )
        .into_response()
}

fn db_error(e: sea_orm::DbErr) -> Response {
    tracing::error!("Dashboard query failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": e.to_string()})),
    )
        .into_response()
}

use crate::entities::{alert, medication, patient, prescription, user};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

/// Seed the entity-total gauges at startup; handlers keep them in step on
/// create/delete afterwards.
pub async fn init_metrics(db: &DatabaseConnection) {
    let user_count = user::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("medtrack_users_total").set(user_count as f64);

    let patient_count = patient::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("medtrack_patients_total").set(patient_count as f64);

    let medication_count = medication::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("medtrack_medications_total").set(medication_count as f64);

    let prescription_count = prescription::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("medtrack_prescriptions_total").set(prescription_count as f64);

    let alert_count = alert::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("medtrack_alerts_total").set(alert_count as f64);

    tracing::info!(
        "Initialized metrics: Users={}, Patients={}, Medications={}, Prescriptions={}, Alerts={}",
        user_count,
        patient_count,
        medication_count,
        prescription_count,
        alert_count
    );
}

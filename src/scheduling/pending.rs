//! The "what is due soon" computation behind the polling endpoint.
//!
//! Read-only: nothing here marks an alert delivered. An alert keeps showing
//! up on every poll until its occurrence moves past the look-ahead window.

use chrono::{Duration, NaiveDateTime};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use super::recurrence::{Recurrence, RecurrenceColumns, RecurrenceKind, PENDING_WINDOW_MINUTES};
use super::validate::AlertKind;
use crate::entities::{alert, prelude::*};

/// One row of the pending feed, shaped for the polling client.
#[derive(Debug, Clone, Serialize)]
pub struct PendingAlert {
    pub id: Uuid,
    pub patient: String,
    pub kind: String,
    pub message: String,
    pub due_at: NaiveDateTime,
    pub medication: Option<String>,
}

/// Decide whether a stored alert is due within the look-ahead window and, if
/// so, at which occurrence. Pure: the only clock is the `now` argument.
pub fn due_within_window(alert: &alert::Model, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if !alert.is_active {
        return None;
    }
    let kind = RecurrenceKind::parse(&alert.recurrence).ok()?;
    let columns = RecurrenceColumns {
        daily_time: alert.daily_time,
        weekly_day: alert.weekly_day,
        weekly_time: alert.weekly_time,
        times_of_day: alert.times_of_day.clone(),
    };
    let recurrence = Recurrence::from_columns(kind, &columns)?;

    let occurrence = recurrence.next_occurrence(now, alert.starts_at);
    if occurrence < now || occurrence > now + Duration::minutes(PENDING_WINDOW_MINUTES) {
        return None;
    }
    // the occurrence must also fall inside the alert's own active window
    if occurrence < alert.starts_at {
        return None;
    }
    if let Some(ends_at) = alert.ends_at {
        if occurrence > ends_at {
            return None;
        }
    }
    Some(occurrence)
}

/// All alerts due within the next [`PENDING_WINDOW_MINUTES`], ascending by
/// occurrence, with patient and medication names resolved for display.
pub async fn pending_alerts(
    db: &DatabaseConnection,
    now: NaiveDateTime,
) -> Result<Vec<PendingAlert>, DbErr> {
    let candidates = Alert::find()
        .filter(alert::Column::IsActive.eq(true))
        .all(db)
        .await?;

    let mut due: Vec<(alert::Model, NaiveDateTime)> = candidates
        .into_iter()
        .filter_map(|a| due_within_window(&a, now).map(|t| (a, t)))
        .collect();
    due.sort_by_key(|(_, occurrence)| *occurrence);

    // The due set is tiny (a 5-minute slice), so per-row name lookups are fine.
    let mut rows = Vec::with_capacity(due.len());
    for (alert, occurrence) in due {
        let patient = Patient::find_by_id(alert.patient_id)
            .one(db)
            .await?
            .map(|p| p.name)
            .unwrap_or_default();
        let medication = match alert.prescription_id {
            Some(prescription_id) => match Prescription::find_by_id(prescription_id).one(db).await? {
                Some(prescription) => Medication::find_by_id(prescription.medication_id)
                    .one(db)
                    .await?
                    .map(|m| m.name),
                None => None,
            },
            None => None,
        };
        let kind = AlertKind::parse(&alert.kind)
            .map(|k| k.label().to_string())
            .unwrap_or_else(|_| alert.kind.clone());
        rows.push(PendingAlert {
            id: alert.id,
            patient,
            kind,
            message: alert.message,
            due_at: occurrence,
            medication,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn row() -> alert::Model {
        alert::Model {
            id: Uuid::new_v4(),
            patient_id: 1,
            prescription_id: None,
            kind: "other".to_string(),
            message: "check vitals".to_string(),
            recurrence: "none".to_string(),
            starts_at: at(2024, 1, 1, 10, 2),
            ends_at: None,
            daily_time: None,
            weekly_day: None,
            weekly_time: None,
            times_of_day: None,
            is_active: true,
            created_at: at(2024, 1, 1, 0, 0),
            updated_at: at(2024, 1, 1, 0, 0),
        }
    }

    #[test]
    fn test_one_shot_due_inside_window() {
        let now = at(2024, 1, 1, 10, 0);
        assert_eq!(due_within_window(&row(), now), Some(at(2024, 1, 1, 10, 2)));
    }

    #[test]
    fn test_one_shot_window_boundary_is_inclusive() {
        let mut a = row();
        a.starts_at = at(2024, 1, 1, 10, 5);
        let now = at(2024, 1, 1, 10, 0);
        assert_eq!(due_within_window(&a, now), Some(at(2024, 1, 1, 10, 5)));
        a.starts_at = at(2024, 1, 1, 10, 6);
        assert_eq!(due_within_window(&a, now), None);
    }

    #[test]
    fn test_expired_one_shot_never_fires_again() {
        let mut a = row();
        a.starts_at = at(2023, 1, 1, 0, 0);
        a.ends_at = Some(at(2023, 6, 1, 0, 0));
        assert_eq!(due_within_window(&a, at(2024, 1, 1, 0, 0)), None);
    }

    #[test]
    fn test_daily_inside_and_outside_window() {
        let mut a = row();
        a.recurrence = "daily".to_string();
        a.starts_at = at(2023, 12, 1, 0, 0);
        a.daily_time = Some(hm(10, 3));
        let now = at(2024, 1, 1, 10, 0);
        assert_eq!(due_within_window(&a, now), Some(at(2024, 1, 1, 10, 3)));

        a.daily_time = Some(hm(10, 10));
        assert_eq!(due_within_window(&a, now), None);
    }

    #[test]
    fn test_weekly_far_occurrence_not_due_now() {
        // Friday 09:00 asked on Monday 08:00: next occurrence is days away
        let mut a = row();
        a.recurrence = "weekly".to_string();
        a.starts_at = at(2023, 12, 1, 0, 0);
        a.weekly_day = Some(4);
        a.weekly_time = Some(hm(9, 0));
        assert_eq!(due_within_window(&a, at(2024, 1, 1, 8, 0)), None);
    }

    #[test]
    fn test_weekly_due_at_its_slot() {
        let mut a = row();
        a.recurrence = "weekly".to_string();
        a.starts_at = at(2023, 12, 1, 0, 0);
        a.weekly_day = Some(4);
        a.weekly_time = Some(hm(9, 0));
        // Friday 2024-01-05, five minutes before the slot
        assert_eq!(
            due_within_window(&a, at(2024, 1, 5, 8, 55)),
            Some(at(2024, 1, 5, 9, 0))
        );
    }

    #[test]
    fn test_multiple_per_day_next_slot() {
        let mut a = row();
        a.recurrence = "multiple_per_day".to_string();
        a.starts_at = at(2023, 12, 1, 0, 0);
        a.times_of_day = Some("08:00,14:00,20:30".to_string());
        assert_eq!(
            due_within_window(&a, at(2024, 1, 1, 13, 58)),
            Some(at(2024, 1, 1, 14, 0))
        );
        assert_eq!(due_within_window(&a, at(2024, 1, 1, 15, 0)), None);
    }

    #[test]
    fn test_inactive_alert_never_due() {
        let mut a = row();
        a.is_active = false;
        assert_eq!(due_within_window(&a, at(2024, 1, 1, 10, 0)), None);
    }

    #[test]
    fn test_occurrence_before_window_start_not_due() {
        // recurring alert whose active period has not begun
        let mut a = row();
        a.recurrence = "daily".to_string();
        a.starts_at = at(2024, 2, 1, 0, 0);
        a.daily_time = Some(hm(10, 3));
        assert_eq!(due_within_window(&a, at(2024, 1, 1, 10, 0)), None);
    }

    #[test]
    fn test_occurrence_after_window_end_not_due() {
        let mut a = row();
        a.recurrence = "daily".to_string();
        a.starts_at = at(2023, 12, 1, 0, 0);
        a.ends_at = Some(at(2024, 1, 1, 10, 1));
        a.daily_time = Some(hm(10, 3));
        assert_eq!(due_within_window(&a, at(2024, 1, 1, 10, 0)), None);
    }

    #[test]
    fn test_malformed_row_is_skipped_not_due() {
        // daily kind with no stored time cannot come from the validator
        let mut a = row();
        a.recurrence = "daily".to_string();
        assert_eq!(due_within_window(&a, at(2024, 1, 1, 10, 0)), None);
    }
}

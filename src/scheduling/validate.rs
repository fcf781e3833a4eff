//! Write-time validation for alerts.
//!
//! Every create and every update runs through [`validate_and_normalize`];
//! there is no draft state and no partial update path around it.

use chrono::NaiveDateTime;
use serde::Deserialize;

use super::recurrence::{parse_time, parse_time_list, weekday_from_index, Recurrence, RecurrenceKind};
use super::ScheduleError;
use crate::entities::prescription;

/// What an alert is about. Prescription alerts are anchored to a prescription
/// and inherit its patient; anything else only needs a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Prescription,
    Other,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Prescription => "prescription",
            AlertKind::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ScheduleError> {
        match s {
            "prescription" => Ok(AlertKind::Prescription),
            "other" => Ok(AlertKind::Other),
            other => Err(ScheduleError::UnknownAlertKind(other.to_string())),
        }
    }

    /// Human-readable category shown in alert listings and the pending feed.
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::Prescription => "Medication schedule",
            AlertKind::Other => "Other",
        }
    }
}

/// An alert exactly as submitted: kinds still strings, detail fields still
/// raw and possibly contradictory. Doubles as the create/update request body.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertDraft {
    pub kind: String,
    pub patient_id: i32,
    pub prescription_id: Option<i32>,
    pub message: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub recurrence: String,
    pub daily_time: Option<String>,
    pub weekly_day: Option<i16>,
    pub weekly_time: Option<String>,
    pub times_of_day: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// A draft that survived every rule: kinds are typed, the recurrence is a
/// tagged variant, and the patient is the prescription's patient whenever a
/// prescription is linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAlert {
    pub kind: AlertKind,
    pub patient_id: i32,
    pub prescription_id: Option<i32>,
    pub message: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub recurrence: Recurrence,
    pub is_active: bool,
}

/// The sole write gate for alerts.
///
/// `prescription` is the row referenced by `draft.prescription_id`, loaded by
/// the caller; passing `None` for a prescription-kind draft is the
/// missing-link failure. The patient submitted on a prescription-kind draft
/// is overwritten, never reported as an error.
pub fn validate_and_normalize(
    draft: &AlertDraft,
    prescription: Option<&prescription::Model>,
) -> Result<NormalizedAlert, ScheduleError> {
    let kind = AlertKind::parse(&draft.kind)?;

    if kind == AlertKind::Prescription && prescription.is_none() {
        return Err(ScheduleError::MissingPrescriptionLink);
    }

    let patient_id = match (kind, prescription) {
        (AlertKind::Prescription, Some(p)) => p.patient_id,
        _ => draft.patient_id,
    };
    let prescription_id = prescription.map(|p| p.id).or(draft.prescription_id);

    let message = draft.message.trim();
    if message.is_empty() {
        return Err(ScheduleError::EmptyMessage);
    }

    if let Some(ends_at) = draft.ends_at {
        if ends_at < draft.starts_at {
            return Err(ScheduleError::InvalidActiveWindow);
        }
    }

    let recurrence = match RecurrenceKind::parse(&draft.recurrence)? {
        RecurrenceKind::None => Recurrence::None,
        RecurrenceKind::Daily => {
            let raw = present(&draft.daily_time).ok_or(ScheduleError::MissingDailyTime)?;
            Recurrence::Daily {
                time: parse_time(raw)?,
            }
        }
        RecurrenceKind::Weekly => {
            let (day, raw_time) = match (draft.weekly_day, present(&draft.weekly_time)) {
                (Some(day), Some(raw)) => (day, raw),
                _ => return Err(ScheduleError::MissingWeeklySchedule),
            };
            Recurrence::Weekly {
                weekday: weekday_from_index(day)?,
                time: parse_time(raw_time)?,
            }
        }
        RecurrenceKind::MultiplePerDay => {
            let raw = present(&draft.times_of_day).ok_or(ScheduleError::MissingMultipleTimes)?;
            Recurrence::MultiplePerDay {
                times: parse_time_list(raw)?,
            }
        }
    };

    Ok(NormalizedAlert {
        kind,
        patient_id,
        prescription_id,
        message: message.to_string(),
        starts_at: draft.starts_at,
        ends_at: draft.ends_at,
        recurrence,
        is_active: draft.is_active,
    })
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::recurrence::format_time_list;
    use chrono::{NaiveDate, NaiveTime, Weekday};

    fn starts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn draft() -> AlertDraft {
        AlertDraft {
            kind: "other".to_string(),
            patient_id: 1,
            prescription_id: None,
            message: "check vitals".to_string(),
            starts_at: starts(),
            ends_at: None,
            recurrence: "none".to_string(),
            daily_time: None,
            weekly_day: None,
            weekly_time: None,
            times_of_day: None,
            is_active: true,
        }
    }

    fn prescription_row(id: i32, patient_id: i32) -> prescription::Model {
        prescription::Model {
            id,
            patient_id,
            medication_id: 10,
            prescribed_by: None,
            dose: "500mg".to_string(),
            frequency: "8/8h".to_string(),
            status: "active".to_string(),
            notes: None,
            created_at: starts(),
            updated_at: starts(),
        }
    }

    /// Feed a normalized alert back through the validator as a fresh draft.
    fn redraft(normalized: &NormalizedAlert) -> AlertDraft {
        let columns = normalized.recurrence.detail_columns();
        AlertDraft {
            kind: normalized.kind.as_str().to_string(),
            patient_id: normalized.patient_id,
            prescription_id: normalized.prescription_id,
            message: normalized.message.clone(),
            starts_at: normalized.starts_at,
            ends_at: normalized.ends_at,
            recurrence: normalized.recurrence.kind().as_str().to_string(),
            daily_time: columns.daily_time.map(|t| t.format("%H:%M").to_string()),
            weekly_day: columns.weekly_day,
            weekly_time: columns.weekly_time.map(|t| t.format("%H:%M").to_string()),
            times_of_day: columns.times_of_day,
            is_active: normalized.is_active,
        }
    }

    #[test]
    fn test_prescription_kind_without_link_rejected() {
        let mut d = draft();
        d.kind = "prescription".to_string();
        assert_eq!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::MissingPrescriptionLink)
        );
    }

    #[test]
    fn test_prescription_kind_overwrites_patient() {
        let mut d = draft();
        d.kind = "prescription".to_string();
        d.patient_id = 999; // submitted patient is ignored
        d.prescription_id = Some(5);
        let p = prescription_row(5, 42);
        let normalized = validate_and_normalize(&d, Some(&p)).unwrap();
        assert_eq!(normalized.patient_id, 42);
        assert_eq!(normalized.prescription_id, Some(5));
    }

    #[test]
    fn test_other_kind_keeps_submitted_patient() {
        let normalized = validate_and_normalize(&draft(), None).unwrap();
        assert_eq!(normalized.patient_id, 1);
        assert_eq!(normalized.prescription_id, None);
    }

    #[test]
    fn test_daily_requires_time() {
        let mut d = draft();
        d.recurrence = "daily".to_string();
        assert_eq!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::MissingDailyTime)
        );
        d.daily_time = Some("   ".to_string());
        assert_eq!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::MissingDailyTime)
        );
    }

    #[test]
    fn test_daily_clears_other_detail_fields() {
        let mut d = draft();
        d.recurrence = "daily".to_string();
        d.daily_time = Some("10:03".to_string());
        // stale detail from a previous shape of the record
        d.weekly_day = Some(4);
        d.weekly_time = Some("09:00".to_string());
        d.times_of_day = Some("08:00,12:00".to_string());
        let normalized = validate_and_normalize(&d, None).unwrap();
        assert_eq!(
            normalized.recurrence,
            Recurrence::Daily {
                time: NaiveTime::from_hms_opt(10, 3, 0).unwrap()
            }
        );
        let columns = normalized.recurrence.detail_columns();
        assert!(columns.weekly_day.is_none());
        assert!(columns.weekly_time.is_none());
        assert!(columns.times_of_day.is_none());
    }

    #[test]
    fn test_weekly_requires_day_even_with_time() {
        let mut d = draft();
        d.recurrence = "weekly".to_string();
        d.weekly_time = Some("09:00".to_string());
        assert_eq!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::MissingWeeklySchedule)
        );
    }

    #[test]
    fn test_weekly_requires_time_even_with_day() {
        let mut d = draft();
        d.recurrence = "weekly".to_string();
        d.weekly_day = Some(4);
        assert_eq!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::MissingWeeklySchedule)
        );
    }

    #[test]
    fn test_weekly_rejects_out_of_range_day() {
        let mut d = draft();
        d.recurrence = "weekly".to_string();
        d.weekly_day = Some(9);
        d.weekly_time = Some("09:00".to_string());
        assert_eq!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::InvalidWeekday(9))
        );
    }

    #[test]
    fn test_weekly_normalizes() {
        let mut d = draft();
        d.recurrence = "weekly".to_string();
        d.weekly_day = Some(4);
        d.weekly_time = Some("09:00".to_string());
        d.daily_time = Some("10:00".to_string()); // stale, must be dropped
        let normalized = validate_and_normalize(&d, None).unwrap();
        assert_eq!(
            normalized.recurrence,
            Recurrence::Weekly {
                weekday: Weekday::Fri,
                time: NaiveTime::from_hms_opt(9, 0, 0).unwrap()
            }
        );
        assert!(normalized.recurrence.detail_columns().daily_time.is_none());
    }

    #[test]
    fn test_multiple_requires_entries() {
        let mut d = draft();
        d.recurrence = "multiple_per_day".to_string();
        assert_eq!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::MissingMultipleTimes)
        );
        d.times_of_day = Some("  ".to_string());
        assert_eq!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::MissingMultipleTimes)
        );
    }

    #[test]
    fn test_multiple_rejects_whole_write_on_bad_entry() {
        let mut d = draft();
        d.recurrence = "multiple_per_day".to_string();
        d.times_of_day = Some("08:00,25:61".to_string());
        assert_eq!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::InvalidTimeFormat("25:61".to_string()))
        );
    }

    #[test]
    fn test_multiple_normalizes_to_canonical_list() {
        let mut d = draft();
        d.recurrence = "multiple_per_day".to_string();
        d.times_of_day = Some(" 20:30,08:00 , 14:00".to_string());
        let normalized = validate_and_normalize(&d, None).unwrap();
        let columns = normalized.recurrence.detail_columns();
        assert_eq!(columns.times_of_day.as_deref(), Some("08:00,14:00,20:30"));
    }

    #[test]
    fn test_none_clears_everything() {
        let mut d = draft();
        d.daily_time = Some("08:00".to_string());
        d.weekly_day = Some(2);
        d.weekly_time = Some("09:00".to_string());
        d.times_of_day = Some("08:00".to_string());
        let normalized = validate_and_normalize(&d, None).unwrap();
        assert_eq!(normalized.recurrence, Recurrence::None);
        assert_eq!(
            normalized.recurrence.detail_columns(),
            Default::default()
        );
    }

    #[test]
    fn test_blank_message_rejected() {
        let mut d = draft();
        d.message = "  ".to_string();
        assert_eq!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::EmptyMessage)
        );
    }

    #[test]
    fn test_window_end_before_start_rejected() {
        let mut d = draft();
        d.ends_at = Some(starts() - chrono::Duration::days(1));
        assert_eq!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::InvalidActiveWindow)
        );
    }

    #[test]
    fn test_unknown_kind_and_recurrence_rejected() {
        let mut d = draft();
        d.kind = "interaction".to_string();
        assert!(matches!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::UnknownAlertKind(_))
        ));

        let mut d = draft();
        d.recurrence = "hourly".to_string();
        assert!(matches!(
            validate_and_normalize(&d, None),
            Err(ScheduleError::UnknownRecurrence(_))
        ));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let mut d = draft();
        d.recurrence = "multiple_per_day".to_string();
        d.times_of_day = Some("14:00, 08:00,08:00".to_string());
        let first = validate_and_normalize(&d, None).unwrap();
        let second = validate_and_normalize(&redraft(&first), None).unwrap();
        assert_eq!(first, second);
        // and the canonical text form is stable too
        if let Recurrence::MultiplePerDay { times } = &second.recurrence {
            assert_eq!(format_time_list(times), "08:00,14:00");
        } else {
            panic!("expected multiple_per_day");
        }
    }

    #[test]
    fn test_idempotent_for_prescription_kind() {
        let mut d = draft();
        d.kind = "prescription".to_string();
        d.prescription_id = Some(5);
        d.recurrence = "daily".to_string();
        d.daily_time = Some("08:00".to_string());
        let p = prescription_row(5, 42);
        let first = validate_and_normalize(&d, Some(&p)).unwrap();
        let second = validate_and_normalize(&redraft(&first), Some(&p)).unwrap();
        assert_eq!(first, second);
    }
}

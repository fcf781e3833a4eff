//! Alert scheduling core: recurrence rules, write-time validation and the
//! pending-alert computation. Everything in here is synchronous and pure
//! except the storage reads in [`pending`].

pub mod pending;
pub mod recurrence;
pub mod validate;

pub use pending::{pending_alerts, PendingAlert};
pub use recurrence::{Recurrence, RecurrenceKind, PENDING_WINDOW_MINUTES};
pub use validate::{validate_and_normalize, AlertDraft, AlertKind, NormalizedAlert};

/// Rejected-write errors raised by the recurrence validator. A failed
/// validation never persists anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("prescription alerts must reference a prescription")]
    MissingPrescriptionLink,
    #[error("daily recurrence requires a time of day")]
    MissingDailyTime,
    #[error("weekly recurrence requires both a weekday and a time of day")]
    MissingWeeklySchedule,
    #[error("multiple-per-day recurrence requires at least one time entry")]
    MissingMultipleTimes,
    #[error("invalid time entry '{0}', expected HH:MM")]
    InvalidTimeFormat(String),
    #[error("weekday must be 0 (Monday) through 6 (Sunday), got {0}")]
    InvalidWeekday(i16),
    #[error("active window must not end before it starts")]
    InvalidActiveWindow,
    #[error("alert message must not be empty")]
    EmptyMessage,
    #[error("unknown alert kind '{0}'")]
    UnknownAlertKind(String),
    #[error("unknown recurrence '{0}'")]
    UnknownRecurrence(String),
}

//! Slot validation rules for appointment booking.
//!
//! The validator is a pure rule evaluator: given a proposed slot (date,
//! time, service type) and the current time, it returns the first rule
//! violation or a pass. It never touches the store; the booking handler
//! runs the store-backed collision pre-check between [`SlotValidator::validate`]
//! and [`SlotValidator::validate_duration`] so that rules are reported
//! in a stable order.
//!
//! # Policies
//!
//! - [`SlotPolicy::Discrete`] (default): the slot must be one of the
//!   fixed bookable times, the date must not be before today, and the
//!   service type must be known.
//! - [`SlotPolicy::Strict`]: additionally rejects slots earlier than
//!   the current instant (not just earlier days), weekend dates, and
//!   services whose duration would run past closing time.
//!
//! The discrete slot list is canonical in both policies; every listed
//! slot lies inside the 09:00-17:00 business window.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use super::ServiceType;

// =============================================================================
// Business Hours
// =============================================================================

/// Bookable slot start times. Hourly, skipping the 12:00 lunch hour.
pub const BOOKABLE_SLOTS: &[&str] = &[
    "09:00", "10:00", "11:00", "13:00", "14:00", "15:00", "16:00",
];

/// Hour the shop closes; a service must end strictly before this.
pub const CLOSING_HOUR: u32 = 17;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

// =============================================================================
// Types
// =============================================================================

/// A proposed slot, as received from the client.
///
/// Fields are kept as raw strings: parsing them is the first
/// validation rule, and its failure detail becomes the rejection
/// message.
#[derive(Debug, Clone)]
pub struct SlotCandidate {
    pub date: String,
    pub time: String,
    pub service_type: String,
}

/// Outcome of a validation pass: either a pass or the first rule
/// violation with its human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl Validation {
    fn ok() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// Which rule set applies. See the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotPolicy {
    #[default]
    Discrete,
    Strict,
}

// =============================================================================
// Validator
// =============================================================================

/// Evaluates booking rules against a proposed slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotValidator {
    policy: SlotPolicy,
}

impl SlotValidator {
    pub fn new(policy: SlotPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SlotPolicy {
        self.policy
    }

    /// Whether the strict rule set is active.
    pub fn is_strict(&self) -> bool {
        self.policy == SlotPolicy::Strict
    }

    /// Validate a candidate against the current local time.
    pub fn validate(&self, candidate: &SlotCandidate) -> Validation {
        self.validate_at(candidate, Local::now().naive_local())
    }

    /// Validate a candidate against an explicit `now`.
    ///
    /// Rules are checked in order, short-circuiting at the first
    /// failure: parse, not-in-the-past, slot membership, weekday
    /// (strict), service type.
    pub fn validate_at(&self, candidate: &SlotCandidate, now: NaiveDateTime) -> Validation {
        let (date, time) = match parse_slot(candidate) {
            Ok(parsed) => parsed,
            Err(message) => return Validation::rejected(message),
        };
        let start = NaiveDateTime::new(date, time);

        match self.policy {
            SlotPolicy::Discrete => {
                if date < now.date() {
                    return Validation::rejected("Appointment date cannot be in the past");
                }
            }
            SlotPolicy::Strict => {
                if start < now {
                    return Validation::rejected("Appointments must be scheduled for future dates");
                }
            }
        }

        if !BOOKABLE_SLOTS.contains(&candidate.time.as_str()) {
            return Validation::rejected("Invalid appointment time");
        }

        if self.is_strict() && matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Validation::rejected("Appointments cannot be scheduled on weekends");
        }

        if ServiceType::parse(&candidate.service_type).is_none() {
            return Validation::rejected("Invalid service type");
        }

        Validation::ok()
    }

    /// Check that the service fits before closing time (strict only).
    ///
    /// Runs after the collision pre-check, so the caller must have
    /// already passed [`validate`](Self::validate); unparseable input
    /// here is rejected with the same parse messages as rule 1.
    pub fn validate_duration(&self, candidate: &SlotCandidate) -> Validation {
        if !self.is_strict() {
            return Validation::ok();
        }

        let (date, time) = match parse_slot(candidate) {
            Ok(parsed) => parsed,
            Err(message) => return Validation::rejected(message),
        };
        let Some(service) = ServiceType::parse(&candidate.service_type) else {
            return Validation::rejected("Invalid service type");
        };

        let duration = service.duration_minutes();
        let end = NaiveDateTime::new(date, time) + Duration::minutes(duration);

        // Ending exactly on the closing hour counts as running past it:
        // the bay must be clear before 17:00.
        if end.date() > date || end.hour() >= CLOSING_HOUR {
            return Validation::rejected(format!(
                "Service duration of {} minutes exceeds business hours",
                duration
            ));
        }

        Validation::ok()
    }
}

/// Parse the candidate's date and time fields, or produce the
/// rejection message for the first field that fails.
fn parse_slot(candidate: &SlotCandidate) -> Result<(NaiveDate, NaiveTime), String> {
    let date = NaiveDate::parse_from_str(&candidate.date, DATE_FORMAT)
        .map_err(|e| format!("Invalid appointment date '{}': {}", candidate.date, e))?;
    let time = NaiveTime::parse_from_str(&candidate.time, TIME_FORMAT)
        .map_err(|e| format!("Invalid appointment time '{}': {}", candidate.time, e))?;
    Ok((date, time))
}

// =============================================================================
// Tests
// =============================================================================

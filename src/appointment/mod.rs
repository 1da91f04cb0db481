//! Appointment domain types and slot validation.
//!
//! An [`Appointment`] is the only domain entity in the system: a vehicle,
//! a service type, and a (date, time) slot, owned by the authenticated
//! account that booked it. The [`validator`] module holds the business
//! rules that decide whether a proposed slot is bookable.

pub mod validator;

pub use validator::{SlotCandidate, SlotPolicy, SlotValidator, Validation, BOOKABLE_SLOTS};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Service Types
// =============================================================================

/// The fixed set of services the shop offers.
///
/// Serialized in kebab-case both on the wire and in storage
/// (`oil-change`, `tire-rotation`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    OilChange,
    TireRotation,
    BrakeService,
    GeneralInspection,
    Repair,
}

impl ServiceType {
    /// All known service types, in menu order.
    pub const ALL: [ServiceType; 5] = [
        ServiceType::OilChange,
        ServiceType::TireRotation,
        ServiceType::BrakeService,
        ServiceType::GeneralInspection,
        ServiceType::Repair,
    ];

    /// Parse the wire/storage form. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "oil-change" => Some(ServiceType::OilChange),
            "tire-rotation" => Some(ServiceType::TireRotation),
            "brake-service" => Some(ServiceType::BrakeService),
            "general-inspection" => Some(ServiceType::GeneralInspection),
            "repair" => Some(ServiceType::Repair),
            _ => None,
        }
    }

    /// The wire/storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::OilChange => "oil-change",
            ServiceType::TireRotation => "tire-rotation",
            ServiceType::BrakeService => "brake-service",
            ServiceType::GeneralInspection => "general-inspection",
            ServiceType::Repair => "repair",
        }
    }

    /// How long a service of this type occupies the bay, in minutes.
    pub fn duration_minutes(&self) -> i64 {
        match self {
            ServiceType::OilChange => 60,
            ServiceType::TireRotation => 45,
            ServiceType::BrakeService => 120,
            ServiceType::GeneralInspection => 60,
            ServiceType::Repair => 180,
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Appointment Status
// =============================================================================

/// Lifecycle status of an appointment.
///
/// Every appointment is created as `Pending`. No transition operations
/// are exposed over the API; the later states exist for records managed
/// out of band (shop staff tooling writes to the same table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(AppointmentStatus::Pending),
            "Confirmed" => Some(AppointmentStatus::Confirmed),
            "Completed" => Some(AppointmentStatus::Completed),
            "Cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

// =============================================================================
// Appointment
// =============================================================================

/// The vehicle an appointment is for. Free-form, caller-supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub make: String,
    pub model: String,
    /// Kept as a string: callers send "2019" and "2019.5" alike.
    pub year: String,
}

/// A booked appointment record.
///
/// `id`, `owner_email`, `status`, and `created_at` are set by the server
/// at creation and never change. `owner_email` always comes from the
/// authenticated caller, never from the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub owner_email: String,
    pub vehicle: Vehicle,
    pub service_type: ServiceType,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Slot start, `HH:MM`
    pub time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Create a new `Pending` appointment owned by `owner_email`,
    /// stamped with a fresh id and the current time.
    pub fn new(
        owner_email: impl Into<String>,
        vehicle: Vehicle,
        service_type: ServiceType,
        date: impl Into<String>,
        time: impl Into<String>,
        description: impl Into<String>,
        image_url: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_email: owner_email.into(),
            vehicle,
            service_type,
            date: date.into(),
            time: time.into(),
            description: description.into(),
            image_url,
            status: AppointmentStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Appointment persistence abstraction.
//!
//! Appointments live in an external managed table. The
//! [`AppointmentStore`] trait is the seam between the booking handlers
//! and that table: the production implementation
//! ([`dynamo::DynamoAppointmentStore`]) issues DynamoDB operations,
//! integration tests substitute an in-memory mock.
//!
//! `create` is the authoritative guard against double-booking: it must
//! fail with [`StoreError::SlotTaken`] when the candidate's date+time
//! is already held, regardless of what any earlier read saw.

mod dynamo;

pub use dynamo::{DynamoAppointmentStore, OWNER_EMAIL_INDEX, SLOT_INDEX};

use async_trait::async_trait;

use crate::appointment::Appointment;
use crate::error::StoreError;

/// Document store operations for appointment records.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Persist a new appointment.
    ///
    /// Atomically claims both the record id and the date+time slot;
    /// returns [`StoreError::SlotTaken`] if another record already
    /// holds the slot.
    async fn create(&self, appointment: &Appointment) -> Result<(), StoreError>;

    /// All appointments owned by the given account, via the owner index.
    async fn list_by_owner(&self, owner_email: &str) -> Result<Vec<Appointment>, StoreError>;

    /// Whether any record already occupies this date+time slot.
    ///
    /// Advisory read used by the strict-mode pre-check; the result can
    /// be stale by the time a write happens, which is why `create`
    /// re-checks atomically.
    async fn slot_is_booked(&self, date: &str, time: &str) -> Result<bool, StoreError>;
}

//! DynamoDB-backed implementation of [`AppointmentStore`].
//!
//! # Table layout
//!
//! One table keyed by `appointmentId`. Appointment records carry the
//! full attribute set; each booked slot additionally owns a marker item
//! whose key is `slot#{date}#{time}`. Two global secondary indexes:
//!
//! - `OwnerEmailIndex` (hash `ownerEmail`) — per-account listing.
//!   Marker items carry no `ownerEmail`, so they never appear here.
//! - `SlotIndex` (hash `date`, range `time`) — collision lookups.
//!
//! # Double-booking guard
//!
//! `create` writes the record and the slot marker in one
//! `TransactWriteItems`, both puts conditioned on
//! `attribute_not_exists(appointmentId)`. The transaction is cancelled
//! with `ConditionalCheckFailed` when either the id or the slot is
//! already taken, so two concurrent bookings of the same slot cannot
//! both commit.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{AttributeValue, Put, Select, TransactWriteItem};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};

use crate::appointment::{Appointment, AppointmentStatus, ServiceType, Vehicle};
use crate::error::StoreError;

use super::AppointmentStore;

/// Secondary index over `ownerEmail`.
pub const OWNER_EMAIL_INDEX: &str = "OwnerEmailIndex";

/// Secondary index over (`date`, `time`).
pub const SLOT_INDEX: &str = "SlotIndex";

/// DynamoDB-backed appointment store.
#[derive(Clone)]
pub struct DynamoAppointmentStore {
    client: Client,
    table: String,
}

impl DynamoAppointmentStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl AppointmentStore for DynamoAppointmentStore {
    async fn create(&self, appointment: &Appointment) -> Result<(), StoreError> {
        let record = Put::builder()
            .table_name(&self.table)
            .set_item(Some(to_item(appointment)))
            .condition_expression("attribute_not_exists(appointmentId)")
            .build()
            .map_err(|e| StoreError::Upstream(e.to_string()))?;

        let marker = Put::builder()
            .table_name(&self.table)
            .set_item(Some(slot_marker_item(appointment)))
            .condition_expression("attribute_not_exists(appointmentId)")
            .build()
            .map_err(|e| StoreError::Upstream(e.to_string()))?;

        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(record).build())
            .transact_items(TransactWriteItem::builder().put(marker).build())
            .send()
            .await
            .map_err(|e| map_transact_error(e, &appointment.date, &appointment.time))?;

        Ok(())
    }

    async fn list_by_owner(&self, owner_email: &str) -> Result<Vec<Appointment>, StoreError> {
        let response = self
            .client
            .query()
            .table_name(&self.table)
            .index_name(OWNER_EMAIL_INDEX)
            .key_condition_expression("ownerEmail = :email")
            .expression_attribute_values(":email", AttributeValue::S(owner_email.to_string()))
            .send()
            .await
            .map_err(classify_sdk_error)?;

        response.items().iter().map(from_item).collect()
    }

    async fn slot_is_booked(&self, date: &str, time: &str) -> Result<bool, StoreError> {
        // `date` and `time` are DynamoDB reserved words, hence the aliases
        let response = self
            .client
            .query()
            .table_name(&self.table)
            .index_name(SLOT_INDEX)
            .key_condition_expression("#d = :date AND #t = :time")
            .expression_attribute_names("#d", "date")
            .expression_attribute_names("#t", "time")
            .expression_attribute_values(":date", AttributeValue::S(date.to_string()))
            .expression_attribute_values(":time", AttributeValue::S(time.to_string()))
            .select(Select::Count)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        Ok(response.count() > 0)
    }
}

// =============================================================================
// Item Mapping
// =============================================================================

/// Primary key of the marker item that holds a slot.
fn slot_marker_id(date: &str, time: &str) -> String {
    format!("slot#{}#{}", date, time)
}

/// Serialize an appointment into a DynamoDB item map.
fn to_item(appointment: &Appointment) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::from([
        (
            "appointmentId".to_string(),
            AttributeValue::S(appointment.id.clone()),
        ),
        (
            "ownerEmail".to_string(),
            AttributeValue::S(appointment.owner_email.clone()),
        ),
        (
            "carMake".to_string(),
            AttributeValue::S(appointment.vehicle.make.clone()),
        ),
        (
            "carModel".to_string(),
            AttributeValue::S(appointment.vehicle.model.clone()),
        ),
        (
            "carYear".to_string(),
            AttributeValue::S(appointment.vehicle.year.clone()),
        ),
        (
            "serviceType".to_string(),
            AttributeValue::S(appointment.service_type.as_str().to_string()),
        ),
        ("date".to_string(), AttributeValue::S(appointment.date.clone())),
        ("time".to_string(), AttributeValue::S(appointment.time.clone())),
        (
            "description".to_string(),
            AttributeValue::S(appointment.description.clone()),
        ),
        (
            "status".to_string(),
            AttributeValue::S(appointment.status.as_str().to_string()),
        ),
        (
            "createdAt".to_string(),
            AttributeValue::S(appointment.created_at.to_rfc3339()),
        ),
    ]);

    if let Some(ref image_url) = appointment.image_url {
        item.insert("imageUrl".to_string(), AttributeValue::S(image_url.clone()));
    }

    item
}

/// The marker item claiming an appointment's slot.
///
/// Carries `date`/`time` so it lands in `SlotIndex`, but no
/// `ownerEmail`, keeping it out of per-account listings.
fn slot_marker_item(appointment: &Appointment) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (
            "appointmentId".to_string(),
            AttributeValue::S(slot_marker_id(&appointment.date, &appointment.time)),
        ),
        (
            "heldBy".to_string(),
            AttributeValue::S(appointment.id.clone()),
        ),
        ("date".to_string(), AttributeValue::S(appointment.date.clone())),
        ("time".to_string(), AttributeValue::S(appointment.time.clone())),
    ])
}

/// Deserialize a DynamoDB item back into an appointment.
fn from_item(item: &HashMap<String, AttributeValue>) -> Result<Appointment, StoreError> {
    let service_type_raw = string_attr(item, "serviceType")?;
    let service_type = ServiceType::parse(&service_type_raw).ok_or_else(|| {
        StoreError::MalformedRecord(format!("unknown service type '{}'", service_type_raw))
    })?;

    let status_raw = string_attr(item, "status")?;
    let status = AppointmentStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::MalformedRecord(format!("unknown status '{}'", status_raw)))?;

    let created_at_raw = string_attr(item, "createdAt")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map_err(|e| StoreError::MalformedRecord(format!("bad createdAt: {}", e)))?
        .with_timezone(&Utc);

    Ok(Appointment {
        id: string_attr(item, "appointmentId")?,
        owner_email: string_attr(item, "ownerEmail")?,
        vehicle: Vehicle {
            make: string_attr(item, "carMake")?,
            model: string_attr(item, "carModel")?,
            year: string_attr(item, "carYear")?,
        },
        service_type,
        date: string_attr(item, "date")?,
        time: string_attr(item, "time")?,
        description: optional_string_attr(item, "description").unwrap_or_default(),
        image_url: optional_string_attr(item, "imageUrl"),
        status,
        created_at,
    })
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Result<String, StoreError> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .cloned()
        .ok_or_else(|| StoreError::MalformedRecord(format!("missing attribute '{}'", name)))
}

fn optional_string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Option<String> {
    item.get(name).and_then(|value| value.as_s().ok()).cloned()
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Map a cancelled transaction to `SlotTaken` when a condition failed;
/// anything else is an upstream failure.
fn map_transact_error(
    err: SdkError<TransactWriteItemsError>,
    date: &str,
    time: &str,
) -> StoreError {
    if let Some(TransactWriteItemsError::TransactionCanceledException(cancelled)) =
        err.as_service_error()
    {
        let condition_failed = cancelled
            .cancellation_reasons()
            .iter()
            .any(|reason| reason.code() == Some("ConditionalCheckFailed"));
        if condition_failed {
            return StoreError::SlotTaken {
                date: date.to_string(),
                time: time.to_string(),
            };
        }
    }

    classify_sdk_error(err)
}

/// Classify a generic SDK failure: timeouts become `Timeout`,
/// everything else `Upstream` with the raw detail for the logs.
fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::TimeoutError(_) => StoreError::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_timeout() => StoreError::Timeout,
        _ => StoreError::Upstream(format!("{:?}", err)),
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Entity and request payloads for the property intake workflow.
//!
//! Entities are owned by the backend and are read-only here. Request payloads (`New*`,
//! `PropertyUpdate`) are what the workflow submits; they carry already-validated field types so
//! a payload that reaches the wire is well-formed by construction.

use crate::ids::*;
use chrono::{DateTime, Utc};
use pims_types::{BagNumber, NonEmptyText};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One selectable option of a lookup list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice<I> {
    pub id: I,
    pub name: String,
}

impl<I> Choice<I> {
    pub fn new(id: I, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

pub type Location = Choice<LocationId>;
pub type Lookup = Choice<LookupId>;
pub type PropertyTypeOption = Choice<PropertyTypeId>;
pub type PropertyStatusOption = Choice<PropertyStatusId>;

fn join_name(first: &str, middle: Option<&str>, last: &str) -> String {
    [Some(first), middle, Some(last)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prisoner {
    pub id: PrisonerId,
    pub prisoner_number: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
}

impl Prisoner {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, self.middle_name.as_deref(), &self.last_name)
    }
}

impl std::fmt::Display for Prisoner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.full_name(), self.prisoner_number)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: VisitorId,
    pub prisoner: PrisonerId,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

impl Visitor {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, self.middle_name.as_deref(), &self.last_name)
    }

    /// Case-insensitive search over name parts, ID number and contact.
    ///
    /// Every whitespace-separated term of `query` must match at least one field, so
    /// "jane 0772" finds Jane whose phone starts 0772. A blank query matches everyone.
    pub fn matches(&self, query: &str) -> bool {
        let fields: Vec<String> = [
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.last_name.as_str()),
            self.id_number.as_deref(),
            self.contact.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect();

        query
            .split_whitespace()
            .map(str::to_lowercase)
            .all(|term| fields.iter().any(|field| field.contains(&term)))
    }
}

/// An item a visitor brought in for a prisoner, pending property intake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorItem {
    pub id: VisitorItemId,
    pub visitor: VisitorId,
    pub name: String,
    pub category: CategoryId,
    pub measurement_unit: UnitId,
    pub quantity: Decimal,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub bag_no: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextOfKin {
    pub id: NextOfKinId,
    pub prisoner: PrisonerId,
    pub first_name: String,
    pub last_name: String,
    pub relationship: LookupId,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NextOfKin {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, None, &self.last_name)
    }
}

/// Address selections from the location hierarchy; unset levels are omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<LocationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<LocationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<LocationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_county: Option<LocationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parish: Option<LocationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village: Option<LocationId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNextOfKin {
    pub prisoner: PrisonerId,
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub sex: LookupId,
    pub relationship: LookupId,
    #[serde(default)]
    pub id_type: Option<LookupId>,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub address: Address,
    pub created_by: UserId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProperty {
    pub prisoner: PrisonerId,
    pub visitor: VisitorId,
    pub visitor_item: VisitorItemId,
    pub category: CategoryId,
    pub measurement_unit: UnitId,
    pub quantity: Decimal,
    #[serde(default)]
    pub amount: Option<Decimal>,
    pub property_type: PropertyTypeId,
    pub property_status: PropertyStatusId,
    pub bag_no: BagNumber,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub next_of_kin: Option<NextOfKinId>,
    pub created_by: UserId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub prisoner: PrisonerId,
    #[serde(default)]
    pub visitor: Option<VisitorId>,
    #[serde(default)]
    pub visitor_item: Option<VisitorItemId>,
    pub category: CategoryId,
    pub measurement_unit: UnitId,
    pub quantity: Decimal,
    #[serde(default)]
    pub amount: Option<Decimal>,
    pub property_type: PropertyTypeId,
    pub property_status: PropertyStatusId,
    pub bag_no: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub next_of_kin: Option<NextOfKinId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Editable fields of an existing property, sent as `PATCH /properties/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyUpdate {
    pub property_type: PropertyTypeId,
    pub property_status: PropertyStatusId,
    pub bag_no: BagNumber,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub next_of_kin: Option<NextOfKinId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPropertyStatusChange {
    pub property: PropertyId,
    pub status: PropertyStatusId,
    pub effective_date: DateTime<Utc>,
    pub reason: NonEmptyText,
    #[serde(default)]
    pub destination: Option<String>,
    pub created_by: UserId,
}

/// Audit record of a property status change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyStatusChange {
    pub id: StatusChangeId,
    pub property: PropertyId,
    pub status: PropertyStatusId,
    pub effective_date: DateTime<Utc>,
    pub reason: String,
    #[serde(default)]
    pub destination: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttendance {
    pub appearance: AppearanceId,
    pub attended_on: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
    pub created_by: UserId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: AttendanceId,
    pub appearance: AppearanceId,
    pub attended_on: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

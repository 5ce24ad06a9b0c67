//! Typed identifiers for backend-owned records.
//!
//! The backend issues integer primary keys. Each record kind gets its own newtype so a visitor id
//! can never be passed where a prisoner id is expected.

use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub i64);

            impl $name {
                pub fn get(self) -> i64 {
                    self.0
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl std::str::FromStr for $name {
                type Err = std::num::ParseIntError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    s.trim().parse().map($name)
                }
            }
        )*
    };
}

record_id!(
    /// Prisoner primary key.
    PrisonerId,
    /// Visitor primary key.
    VisitorId,
    /// Primary key of an item a visitor brought in.
    VisitorItemId,
    /// Persisted property primary key.
    PropertyId,
    /// Next-of-kin primary key.
    NextOfKinId,
    /// Item category primary key.
    CategoryId,
    /// Measurement unit primary key.
    UnitId,
    /// Property type primary key.
    PropertyTypeId,
    /// Property status primary key.
    PropertyStatusId,
    /// Any node of the region → village hierarchy.
    LocationId,
    /// Global lookup rows (sex, relationship and ID types).
    LookupId,
    /// Staff user primary key.
    UserId,
    /// Court appearance primary key.
    AppearanceId,
    /// Attendance record primary key.
    AttendanceId,
    /// Property status change audit record primary key.
    StatusChangeId,
);

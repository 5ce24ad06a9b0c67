//! Per-session cache of reference data.
//!
//! Location levels, global lookups and category-scoped property options change rarely, so a
//! successful non-empty answer is kept for the lifetime of the session and reused the next time
//! the same scope is needed. Empty and failed answers are never cached. Prisoner-specific lists
//! (visitors, items, next of kin) are not reference data and always go to the server.

use crate::fetch::Fetched;
use crate::wire::{
    CategoryId, Location, LocationId, LocationLevel, Lookup, LookupId, LookupKind,
    PropertyStatusOption, PropertyTypeOption,
};
use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceCache {
    locations: HashMap<(LocationLevel, Option<LocationId>), Vec<Location>>,
    lookups: HashMap<LookupKind, Vec<Lookup>>,
    property_types: HashMap<CategoryId, Vec<PropertyTypeOption>>,
    property_statuses: HashMap<CategoryId, Vec<PropertyStatusOption>>,
}

impl ReferenceCache {
    pub fn locations(&self, level: LocationLevel, parent: Option<LocationId>) -> Option<&[Location]> {
        self.locations.get(&(level, parent)).map(Vec::as_slice)
    }

    pub fn lookups(&self, kind: LookupKind) -> Option<&[Lookup]> {
        self.lookups.get(&kind).map(Vec::as_slice)
    }

    pub fn property_types(&self, category: CategoryId) -> Option<&[PropertyTypeOption]> {
        self.property_types.get(&category).map(Vec::as_slice)
    }

    pub fn property_statuses(&self, category: CategoryId) -> Option<&[PropertyStatusOption]> {
        self.property_statuses.get(&category).map(Vec::as_slice)
    }

    pub fn lookup_name(&self, kind: LookupKind, id: LookupId) -> Option<&str> {
        self.lookups(kind)?
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.name.as_str())
    }

    /// Keep the rows of a successful, non-empty reference response.
    ///
    /// Returns whether anything was stored.
    pub fn absorb(&mut self, fetched: &Fetched) -> bool {
        match fetched {
            Fetched::Locations {
                level,
                parent,
                result: Ok(rows),
            } if !rows.is_empty() => {
                self.locations.insert((*level, *parent), rows.clone());
            }
            Fetched::Lookup {
                kind,
                result: Ok(rows),
            } if !rows.is_empty() => {
                self.lookups.insert(*kind, rows.clone());
            }
            Fetched::PropertyTypes {
                category,
                result: Ok(rows),
            } if !rows.is_empty() => {
                self.property_types.insert(*category, rows.clone());
            }
            Fetched::PropertyStatuses {
                category,
                result: Ok(rows),
            } if !rows.is_empty() => {
                self.property_statuses.insert(*category, rows.clone());
            }
            _ => return false,
        }
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

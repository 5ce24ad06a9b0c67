//! In-memory records behind the stub endpoints.
//!
//! Creation endpoints check the same relationships the real backend enforces (an item belongs
//! to the visitor, a status applies to the item's category, bag numbers are unique) so client
//! code sees realistic rejections.

use crate::error::{StubError, StubResult};
use crate::seed::{ScopedOption, Seed, SeedLocation};
use api_shared::{
    Attendance, AttendanceId, CategoryId, Location, LocationId, LocationLevel, Lookup,
    LookupKind, NewAttendance, NewNextOfKin, NewProperty, NewPropertyStatusChange, NextOfKin,
    NextOfKinId, Prisoner, PrisonerId, Property, PropertyId, PropertyStatusChange,
    PropertyStatusId, PropertyStatusOption, PropertyTypeId, PropertyTypeOption, PropertyUpdate,
    StatusChangeId, Visitor, VisitorId, VisitorItem,
};
use chrono::Utc;
use std::collections::BTreeMap;

/// First id handed out to records created at runtime.
const FIRST_RUNTIME_ID: i64 = 1000;

#[derive(Debug)]
pub struct Store {
    seed: Seed,
    properties: BTreeMap<PropertyId, Property>,
    status_changes: Vec<PropertyStatusChange>,
    attendances: Vec<Attendance>,
    next_id: i64,
}

impl Store {
    pub fn new(mut seed: Seed) -> Self {
        let properties = std::mem::take(&mut seed.properties)
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        Self {
            seed,
            properties,
            status_changes: Vec::new(),
            attendances: Vec::new(),
            next_id: FIRST_RUNTIME_ID,
        }
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn locations(&self, level: LocationLevel, parent: Option<LocationId>) -> Vec<Location> {
        self.seed
            .locations
            .iter()
            .filter(|l: &&SeedLocation| l.level == level)
            .filter(|l| parent.is_none() || l.parent == parent)
            .map(|l| Location::new(l.id, l.name.clone()))
            .collect()
    }

    pub fn lookups(&self, kind: LookupKind) -> Vec<Lookup> {
        let lookups = &self.seed.lookups;
        match kind {
            LookupKind::Sexes => lookups.sexes.clone(),
            LookupKind::Relationships => lookups.relationships.clone(),
            LookupKind::IdTypes => lookups.id_types.clone(),
            LookupKind::ItemCategories => lookups.item_categories.clone(),
            LookupKind::Units => lookups.units.clone(),
        }
    }

    pub fn prisoners(&self, search: Option<&str>) -> Vec<Prisoner> {
        let query = search.unwrap_or_default().trim().to_lowercase();
        self.seed
            .prisoners
            .iter()
            .filter(|p| {
                query.is_empty()
                    || p.full_name().to_lowercase().contains(&query)
                    || p.prisoner_number.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    pub fn visitors(&self, prisoner: Option<PrisonerId>) -> Vec<Visitor> {
        self.seed
            .visitors
            .iter()
            .filter(|v| prisoner.map_or(true, |p| v.prisoner == p))
            .cloned()
            .collect()
    }

    pub fn visitor_items(&self, visitor: Option<VisitorId>) -> Vec<VisitorItem> {
        self.seed
            .visitor_items
            .iter()
            .filter(|i| visitor.map_or(true, |v| i.visitor == v))
            .cloned()
            .collect()
    }

    pub fn property_types(&self, category: Option<CategoryId>) -> Vec<PropertyTypeOption> {
        scoped(&self.seed.property_types, category)
    }

    pub fn property_statuses(&self, category: Option<CategoryId>) -> Vec<PropertyStatusOption> {
        scoped(&self.seed.property_statuses, category)
    }

    pub fn next_of_kin(&self, prisoner: Option<PrisonerId>) -> Vec<NextOfKin> {
        self.seed
            .next_of_kin
            .iter()
            .filter(|n| prisoner.map_or(true, |p| n.prisoner == p))
            .cloned()
            .collect()
    }

    pub fn create_next_of_kin(&mut self, request: NewNextOfKin) -> StubResult<NextOfKin> {
        self.prisoner(request.prisoner)?;
        require_lookup(&self.seed.lookups.sexes, request.sex, "sex")?;
        require_lookup(
            &self.seed.lookups.relationships,
            request.relationship,
            "relationship",
        )?;

        let record = NextOfKin {
            id: NextOfKinId(self.allocate_id()),
            prisoner: request.prisoner,
            first_name: request.first_name.into_inner(),
            last_name: request.last_name.into_inner(),
            relationship: request.relationship,
            phone: request.phone,
        };
        // Newest first, as the backend orders them.
        self.seed.next_of_kin.insert(0, record.clone());
        tracing::info!(id = %record.id, prisoner = %record.prisoner, "next of kin created");
        Ok(record)
    }

    pub fn property(&self, id: PropertyId) -> StubResult<Property> {
        self.properties
            .get(&id)
            .cloned()
            .ok_or_else(|| StubError::NotFound(format!("property {id}")))
    }

    pub fn create_property(&mut self, request: NewProperty) -> StubResult<Property> {
        self.prisoner(request.prisoner)?;
        let item = self
            .seed
            .visitor_items
            .iter()
            .find(|i| i.id == request.visitor_item)
            .ok_or_else(|| StubError::NotFound(format!("visitor item {}", request.visitor_item)))?;
        if item.visitor != request.visitor {
            return Err(StubError::BadRequest(format!(
                "visitor item {} was not brought by visitor {}",
                item.id, request.visitor
            )));
        }
        if item.category != request.category {
            return Err(StubError::BadRequest(format!(
                "visitor item {} is in category {}, not {}",
                item.id, item.category, request.category
            )));
        }
        self.check_classification(
            request.category,
            request.property_type,
            request.property_status,
        )?;
        self.check_bag(request.bag_no.as_str(), None)?;

        let property = Property {
            id: PropertyId(self.allocate_id()),
            prisoner: request.prisoner,
            visitor: Some(request.visitor),
            visitor_item: Some(request.visitor_item),
            category: request.category,
            measurement_unit: request.measurement_unit,
            quantity: request.quantity,
            amount: request.amount,
            property_type: request.property_type,
            property_status: request.property_status,
            bag_no: request.bag_no.to_string(),
            destination: request.destination,
            note: request.note,
            next_of_kin: request.next_of_kin,
            created_at: Some(Utc::now()),
        };
        self.properties.insert(property.id, property.clone());
        tracing::info!(id = %property.id, bag = %property.bag_no, "property created");
        Ok(property)
    }

    pub fn update_property(
        &mut self,
        id: PropertyId,
        request: PropertyUpdate,
    ) -> StubResult<Property> {
        let category = self.property(id)?.category;
        self.check_classification(category, request.property_type, request.property_status)?;
        self.check_bag(request.bag_no.as_str(), Some(id))?;

        let property = self
            .properties
            .get_mut(&id)
            .ok_or_else(|| StubError::NotFound(format!("property {id}")))?;
        property.property_type = request.property_type;
        property.property_status = request.property_status;
        property.bag_no = request.bag_no.to_string();
        property.destination = request.destination;
        property.note = request.note;
        property.next_of_kin = request.next_of_kin;
        Ok(property.clone())
    }

    pub fn delete_property(&mut self, id: PropertyId) -> StubResult<()> {
        self.properties
            .remove(&id)
            .map(|_| tracing::info!(%id, "property deleted"))
            .ok_or_else(|| StubError::NotFound(format!("property {id}")))
    }

    /// Record the audit entry and move the property to the new status.
    pub fn create_status_change(
        &mut self,
        request: NewPropertyStatusChange,
    ) -> StubResult<PropertyStatusChange> {
        let current = self.property(request.property)?;
        self.check_classification(current.category, current.property_type, request.status)?;

        let record = PropertyStatusChange {
            id: StatusChangeId(self.allocate_id()),
            property: request.property,
            status: request.status,
            effective_date: request.effective_date,
            reason: request.reason.into_inner(),
            destination: request.destination,
        };
        if let Some(property) = self.properties.get_mut(&request.property) {
            property.property_status = request.status;
            if record.destination.is_some() {
                property.destination = record.destination.clone();
            }
        }
        self.status_changes.push(record.clone());
        Ok(record)
    }

    pub fn create_attendance(&mut self, request: NewAttendance) -> StubResult<Attendance> {
        let record = Attendance {
            id: AttendanceId(self.allocate_id()),
            appearance: request.appearance,
            attended_on: request.attended_on,
            note: request.note,
        };
        self.attendances.push(record.clone());
        Ok(record)
    }

    pub fn status_changes(&self, property: PropertyId) -> Vec<PropertyStatusChange> {
        self.status_changes
            .iter()
            .filter(|c| c.property == property)
            .cloned()
            .collect()
    }

    fn prisoner(&self, id: PrisonerId) -> StubResult<&Prisoner> {
        self.seed
            .prisoners
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StubError::NotFound(format!("prisoner {id}")))
    }

    fn check_classification(
        &self,
        category: CategoryId,
        property_type: PropertyTypeId,
        status: PropertyStatusId,
    ) -> StubResult<()> {
        if !self
            .property_types(Some(category))
            .iter()
            .any(|t| t.id == property_type)
        {
            return Err(StubError::BadRequest(format!(
                "property type {property_type} does not apply to category {category}"
            )));
        }
        if !self
            .property_statuses(Some(category))
            .iter()
            .any(|s| s.id == status)
        {
            return Err(StubError::BadRequest(format!(
                "property status {status} does not apply to category {category}"
            )));
        }
        Ok(())
    }

    fn check_bag(&self, bag: &str, except: Option<PropertyId>) -> StubResult<()> {
        let taken = self
            .properties
            .values()
            .any(|p| Some(p.id) != except && p.bag_no.eq_ignore_ascii_case(bag));
        if taken {
            return Err(StubError::BadRequest(format!(
                "bag number {bag} is already in use"
            )));
        }
        Ok(())
    }
}

fn scoped<I: Copy>(
    options: &[ScopedOption<I>],
    category: Option<CategoryId>,
) -> Vec<api_shared::Choice<I>> {
    options
        .iter()
        .filter(|o| o.applies_to(category))
        .map(ScopedOption::choice)
        .collect()
}

fn require_lookup(rows: &[Lookup], id: api_shared::LookupId, what: &str) -> StubResult<()> {
    if rows.iter().any(|l| l.id == id) {
        Ok(())
    } else {
        Err(StubError::BadRequest(format!("unknown {what} {id}")))
    }
}

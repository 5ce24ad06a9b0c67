//! Fixtures and an in-memory [`RecordsApi`] for unit tests.

use crate::actor::Actor;
use crate::api::RecordsApi;
use crate::draft::{DraftEdit, DraftId};
use crate::error::{ApiError, ApiResult};
use crate::fetch::{Fetch, Fetched};
use crate::intake::IntakeForm;
use crate::wire::{
    Attendance, AttendanceId, CategoryId, Choice, Location, LocationId, LocationLevel, Lookup,
    LookupId, LookupKind, NewAttendance, NewNextOfKin, NewProperty, NewPropertyStatusChange,
    NextOfKin, NextOfKinId, Page, Prisoner, PrisonerId, Property, PropertyId,
    PropertyStatusChange, PropertyStatusId, PropertyStatusOption, PropertyTypeId,
    PropertyTypeOption, PropertyUpdate, StatusChangeId, UnitId, UserId, Visitor, VisitorId,
    VisitorItem, VisitorItemId,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

pub fn actor() -> Actor {
    Actor::new(UserId(7), "Officer Okello").expect("actor should be valid")
}

pub fn visitor(id: i64, prisoner: i64, first: &str, last: &str) -> Visitor {
    Visitor {
        id: VisitorId(id),
        prisoner: PrisonerId(prisoner),
        first_name: first.to_string(),
        middle_name: None,
        last_name: last.to_string(),
        id_number: None,
        contact: None,
    }
}

pub fn visitor_item(id: i64, visitor: i64, category: i64) -> VisitorItem {
    VisitorItem {
        id: VisitorItemId(id),
        visitor: VisitorId(visitor),
        name: format!("Item {id}"),
        category: CategoryId(category),
        measurement_unit: UnitId(1),
        quantity: Decimal::ONE,
        amount: None,
        bag_no: None,
    }
}

pub fn type_option(id: i64, name: &str) -> PropertyTypeOption {
    Choice::new(PropertyTypeId(id), name)
}

pub fn status_option(id: i64, name: &str) -> PropertyStatusOption {
    Choice::new(PropertyStatusId(id), name)
}

pub fn lookup(id: i64, name: &str) -> Lookup {
    Choice::new(LookupId(id), name)
}

pub fn location(id: i64, name: &str) -> Location {
    Choice::new(LocationId(id), name)
}

pub fn next_of_kin(id: i64, prisoner: i64, first: &str, last: &str) -> NextOfKin {
    NextOfKin {
        id: NextOfKinId(id),
        prisoner: PrisonerId(prisoner),
        first_name: first.to_string(),
        last_name: last.to_string(),
        relationship: LookupId(5),
        phone: None,
    }
}

/// A stored property of type 1 with bag `B-{id}`.
pub fn property(id: i64, category: i64, status: i64) -> Property {
    Property {
        id: PropertyId(id),
        prisoner: PrisonerId(1),
        visitor: Some(VisitorId(1)),
        visitor_item: Some(VisitorItemId(10)),
        category: CategoryId(category),
        measurement_unit: UnitId(1),
        quantity: Decimal::ONE,
        amount: None,
        property_type: PropertyTypeId(1),
        property_status: PropertyStatusId(status),
        bag_no: format!("B-{id}"),
        destination: None,
        note: None,
        next_of_kin: None,
        created_at: None,
    }
}

/// What the backend would return for `request`.
pub fn created_property(id: i64, request: &NewProperty) -> Property {
    Property {
        id: PropertyId(id),
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
        destination: request.destination.clone(),
        note: request.note.clone(),
        next_of_kin: request.next_of_kin,
        created_at: None,
    }
}

/// Prisoner 1 with visitor 1 selected, items 10..=12 (category 1) loaded and next of kin 1 on
/// record. Property options are not cached yet.
pub fn ready_intake() -> IntakeForm {
    let mut form = IntakeForm::new();
    form.select_prisoner(PrisonerId(1));
    form.apply(Fetched::Visitors {
        prisoner: PrisonerId(1),
        result: Ok(vec![visitor(1, 1, "Jane", "Doe"), visitor(2, 1, "Peter", "Okot")]),
    });
    form.apply(Fetched::NextOfKin {
        prisoner: PrisonerId(1),
        result: Ok(vec![next_of_kin(1, 1, "Mary", "Akello")]),
    });
    form.select_visitor(VisitorId(1))
        .expect("select visitor should succeed");
    form.apply(Fetched::VisitorItems {
        visitor: VisitorId(1),
        result: Ok(vec![
            visitor_item(10, 1, 1),
            visitor_item(11, 1, 1),
            visitor_item(12, 1, 1),
        ]),
    });
    form
}

/// Point `draft` at `item`, answer any option requests, then choose type 1, status 1 and `bag`.
pub fn fill_draft(form: &mut IntakeForm, draft: DraftId, item: i64, bag: &str) {
    let fetches = form
        .select_visitor_item(draft, VisitorItemId(item))
        .expect("select item should succeed");
    for fetch in fetches {
        let fetched = match fetch {
            Fetch::PropertyTypes { category } => Fetched::PropertyTypes {
                category,
                result: Ok(vec![type_option(1, "Cash"), type_option(2, "Phone")]),
            },
            Fetch::PropertyStatuses { category } => Fetched::PropertyStatuses {
                category,
                result: Ok(vec![status_option(1, "In store"), status_option(2, "Released")]),
            },
            other => panic!("unexpected request {other:?}"),
        };
        form.apply(fetched);
    }
    for edit in [
        DraftEdit::PropertyType(Some(PropertyTypeId(1))),
        DraftEdit::PropertyStatus(Some(PropertyStatusId(1))),
        DraftEdit::Bag(bag.to_string()),
    ] {
        form.edit_draft(draft, edit).expect("edit should succeed");
    }
}

#[derive(Default)]
struct FakeState {
    prisoners: Vec<Prisoner>,
    visitors: HashMap<PrisonerId, Vec<Visitor>>,
    visitor_items: HashMap<VisitorId, Vec<VisitorItem>>,
    next_of_kin: HashMap<PrisonerId, Vec<NextOfKin>>,
    lookups: HashMap<LookupKind, Vec<Lookup>>,
    locations: HashMap<(LocationLevel, Option<LocationId>), Vec<Location>>,
    property_types: HashMap<CategoryId, Vec<PropertyTypeOption>>,
    property_statuses: HashMap<CategoryId, Vec<PropertyStatusOption>>,
    properties: BTreeMap<PropertyId, Property>,
    status_changes: Vec<PropertyStatusChange>,
    attendances: Vec<Attendance>,
    next_id: i64,
    failing: HashSet<&'static str>,
    failing_bags: HashSet<String>,
    calls: Vec<&'static str>,
}

impl FakeState {
    fn call(&mut self, method: &'static str) -> ApiResult<()> {
        self.calls.push(method);
        if self.failing.contains(method) {
            return Err(ApiError::Transport("connection refused".into()));
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        body: format!("{what} not found"),
    }
}

/// In-memory backend that records every call.
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    /// Prisoner 1 has visitors 1 and 2; prisoner 2 has none. Visitor 1 brought items 10..=12
    /// (category 1). Property 4 is stored in category 1 with status 1.
    pub fn seeded() -> Self {
        let mut state = FakeState {
            next_id: 100,
            ..FakeState::default()
        };
        state.prisoners = vec![
            Prisoner {
                id: PrisonerId(1),
                prisoner_number: "UG-0001".into(),
                first_name: "John".into(),
                middle_name: None,
                last_name: "Mukasa".into(),
            },
            Prisoner {
                id: PrisonerId(2),
                prisoner_number: "UG-0002".into(),
                first_name: "Paul".into(),
                middle_name: None,
                last_name: "Ouma".into(),
            },
        ];
        state.visitors.insert(
            PrisonerId(1),
            vec![visitor(1, 1, "Jane", "Doe"), visitor(2, 1, "Peter", "Okot")],
        );
        state.visitor_items.insert(
            VisitorId(1),
            vec![
                visitor_item(10, 1, 1),
                visitor_item(11, 1, 1),
                visitor_item(12, 1, 1),
            ],
        );
        state
            .next_of_kin
            .insert(PrisonerId(1), vec![next_of_kin(1, 1, "Mary", "Akello")]);
        state.lookups.insert(
            LookupKind::Sexes,
            vec![lookup(1, "Male"), lookup(2, "Female")],
        );
        state.lookups.insert(
            LookupKind::Relationships,
            vec![lookup(5, "Mother"), lookup(6, "Brother")],
        );
        state
            .lookups
            .insert(LookupKind::IdTypes, vec![lookup(8, "National ID")]);
        state
            .locations
            .insert((LocationLevel::Region, None), vec![location(1, "Central")]);
        state.locations.insert(
            (LocationLevel::District, Some(LocationId(1))),
            vec![location(11, "Kampala"), location(12, "Wakiso")],
        );
        state.property_types.insert(
            CategoryId(1),
            vec![type_option(1, "Cash"), type_option(2, "Phone")],
        );
        state.property_statuses.insert(
            CategoryId(1),
            vec![
                status_option(1, "In store"),
                status_option(2, "Released"),
                status_option(3, "Disposed"),
            ],
        );
        state.properties.insert(PropertyId(4), property(4, 1, 1));
        Self {
            state: Mutex::new(state),
        }
    }

    /// Make every call to `method` fail with a transport error.
    pub fn fail(&self, method: &'static str) {
        self.lock().failing.insert(method);
    }

    pub fn restore(&self, method: &'static str) {
        self.lock().failing.remove(method);
    }

    /// Reject property creation for this bag number.
    pub fn fail_bag(&self, bag: &str) {
        self.lock().failing_bags.insert(bag.to_string());
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|c| **c == method).count()
    }

    pub fn stored(&self, id: PropertyId) -> Option<Property> {
        self.lock().properties.get(&id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state lock should not be poisoned")
    }
}

#[async_trait]
impl RecordsApi for FakeApi {
    async fn list_locations(
        &self,
        level: LocationLevel,
        parent: Option<LocationId>,
    ) -> ApiResult<Page<Location>> {
        let mut state = self.lock();
        state.call("list_locations")?;
        let rows = state.locations.get(&(level, parent)).cloned();
        Ok(Page::of(rows.unwrap_or_default()))
    }

    async fn list_lookups(&self, kind: LookupKind) -> ApiResult<Page<Lookup>> {
        let mut state = self.lock();
        state.call("list_lookups")?;
        Ok(Page::of(state.lookups.get(&kind).cloned().unwrap_or_default()))
    }

    async fn list_prisoners(&self, search: Option<&str>) -> ApiResult<Page<Prisoner>> {
        let mut state = self.lock();
        state.call("list_prisoners")?;
        let query = search.unwrap_or_default().to_lowercase();
        let rows = state
            .prisoners
            .iter()
            .filter(|p| p.full_name().to_lowercase().contains(&query))
            .cloned()
            .collect();
        Ok(Page::of(rows))
    }

    async fn list_visitors(&self, prisoner: PrisonerId) -> ApiResult<Page<Visitor>> {
        let mut state = self.lock();
        state.call("list_visitors")?;
        // Prisoners without visitors answer with no `results` key at all.
        Ok(state
            .visitors
            .get(&prisoner)
            .cloned()
            .map(Page::of)
            .unwrap_or_default())
    }

    async fn list_visitor_items(&self, visitor: VisitorId) -> ApiResult<Page<VisitorItem>> {
        let mut state = self.lock();
        state.call("list_visitor_items")?;
        Ok(Page::of(
            state.visitor_items.get(&visitor).cloned().unwrap_or_default(),
        ))
    }

    async fn list_property_types(
        &self,
        category: Option<CategoryId>,
    ) -> ApiResult<Page<PropertyTypeOption>> {
        let mut state = self.lock();
        state.call("list_property_types")?;
        let rows = match category {
            Some(category) => state.property_types.get(&category).cloned().unwrap_or_default(),
            None => state.property_types.values().flatten().cloned().collect(),
        };
        Ok(Page::of(rows))
    }

    async fn list_property_statuses(
        &self,
        category: Option<CategoryId>,
    ) -> ApiResult<Page<PropertyStatusOption>> {
        let mut state = self.lock();
        state.call("list_property_statuses")?;
        let rows = match category {
            Some(category) => state
                .property_statuses
                .get(&category)
                .cloned()
                .unwrap_or_default(),
            None => state.property_statuses.values().flatten().cloned().collect(),
        };
        Ok(Page::of(rows))
    }

    async fn list_next_of_kin(&self, prisoner: PrisonerId) -> ApiResult<Page<NextOfKin>> {
        let mut state = self.lock();
        state.call("list_next_of_kin")?;
        Ok(Page::of(
            state.next_of_kin.get(&prisoner).cloned().unwrap_or_default(),
        ))
    }

    async fn create_next_of_kin(&self, request: &NewNextOfKin) -> ApiResult<NextOfKin> {
        let mut state = self.lock();
        state.call("create_next_of_kin")?;
        let record = NextOfKin {
            id: NextOfKinId(state.allocate_id()),
            prisoner: request.prisoner,
            first_name: request.first_name.to_string(),
            last_name: request.last_name.to_string(),
            relationship: request.relationship,
            phone: request.phone.clone(),
        };
        state
            .next_of_kin
            .entry(request.prisoner)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn get_property(&self, id: PropertyId) -> ApiResult<Property> {
        let mut state = self.lock();
        state.call("get_property")?;
        state
            .properties
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("property"))
    }

    async fn create_property(&self, request: &NewProperty) -> ApiResult<Property> {
        let mut state = self.lock();
        state.call("create_property")?;
        if state.failing_bags.contains(request.bag_no.as_str()) {
            return Err(ApiError::Status {
                status: 400,
                body: format!("bag {} is already in use", request.bag_no),
            });
        }
        let id = state.allocate_id();
        let stored = created_property(id, request);
        state.properties.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_property(
        &self,
        id: PropertyId,
        request: &PropertyUpdate,
    ) -> ApiResult<Property> {
        let mut state = self.lock();
        state.call("update_property")?;
        let stored = state
            .properties
            .get_mut(&id)
            .ok_or_else(|| not_found("property"))?;
        stored.property_type = request.property_type;
        stored.property_status = request.property_status;
        stored.bag_no = request.bag_no.to_string();
        stored.destination = request.destination.clone();
        stored.note = request.note.clone();
        stored.next_of_kin = request.next_of_kin;
        Ok(stored.clone())
    }

    async fn delete_property(&self, id: PropertyId) -> ApiResult<()> {
        let mut state = self.lock();
        state.call("delete_property")?;
        state
            .properties
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("property"))
    }

    async fn create_status_change(
        &self,
        request: &NewPropertyStatusChange,
    ) -> ApiResult<PropertyStatusChange> {
        let mut state = self.lock();
        state.call("create_status_change")?;
        let id = state.allocate_id();
        let stored = state
            .properties
            .get_mut(&request.property)
            .ok_or_else(|| not_found("property"))?;
        stored.property_status = request.status;
        let record = PropertyStatusChange {
            id: StatusChangeId(id),
            property: request.property,
            status: request.status,
            effective_date: request.effective_date,
            reason: request.reason.to_string(),
            destination: request.destination.clone(),
        };
        state.status_changes.push(record.clone());
        Ok(record)
    }

    async fn create_attendance(&self, request: &NewAttendance) -> ApiResult<Attendance> {
        let mut state = self.lock();
        state.call("create_attendance")?;
        let record = Attendance {
            id: AttendanceId(state.allocate_id()),
            appearance: request.appearance,
            attended_on: request.attended_on,
            note: request.note.clone(),
        };
        state.attendances.push(record.clone());
        Ok(record)
    }
}

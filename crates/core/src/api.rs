//! The backend port.
//!
//! [`RecordsApi`] is everything the workflow needs from the REST backend. `api-client` provides
//! the HTTP implementation; tests substitute an in-memory fake.

use crate::error::ApiResult;
use crate::wire::{
    Attendance, CategoryId, Location, LocationId, LocationLevel, Lookup, LookupKind, NewAttendance,
    NewNextOfKin, NewProperty, NewPropertyStatusChange, NextOfKin, Page, Prisoner, PrisonerId,
    Property, PropertyId, PropertyStatusChange, PropertyStatusOption, PropertyTypeOption,
    PropertyUpdate, Visitor, VisitorId, VisitorItem,
};
use async_trait::async_trait;

#[async_trait]
pub trait RecordsApi: Send + Sync {
    /// `GET /regions`, or the child level of `parent` (e.g. `GET /districts?region=`).
    async fn list_locations(
        &self,
        level: LocationLevel,
        parent: Option<LocationId>,
    ) -> ApiResult<Page<Location>>;

    async fn list_lookups(&self, kind: LookupKind) -> ApiResult<Page<Lookup>>;

    async fn list_prisoners(&self, search: Option<&str>) -> ApiResult<Page<Prisoner>>;

    async fn list_visitors(&self, prisoner: PrisonerId) -> ApiResult<Page<Visitor>>;

    async fn list_visitor_items(&self, visitor: VisitorId) -> ApiResult<Page<VisitorItem>>;

    /// Property types valid for `category`, or every type when `None`.
    async fn list_property_types(
        &self,
        category: Option<CategoryId>,
    ) -> ApiResult<Page<PropertyTypeOption>>;

    /// Property statuses valid for `category`, or every status when `None`.
    async fn list_property_statuses(
        &self,
        category: Option<CategoryId>,
    ) -> ApiResult<Page<PropertyStatusOption>>;

    async fn list_next_of_kin(&self, prisoner: PrisonerId) -> ApiResult<Page<NextOfKin>>;

    async fn create_next_of_kin(&self, request: &NewNextOfKin) -> ApiResult<NextOfKin>;

    async fn get_property(&self, id: PropertyId) -> ApiResult<Property>;

    async fn create_property(&self, request: &NewProperty) -> ApiResult<Property>;

    async fn update_property(&self, id: PropertyId, request: &PropertyUpdate)
        -> ApiResult<Property>;

    async fn delete_property(&self, id: PropertyId) -> ApiResult<()>;

    async fn create_status_change(
        &self,
        request: &NewPropertyStatusChange,
    ) -> ApiResult<PropertyStatusChange>;

    async fn create_attendance(&self, request: &NewAttendance) -> ApiResult<Attendance>;
}

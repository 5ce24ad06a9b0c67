//! `reqwest`-backed [`RecordsApi`].

use crate::config::ClientConfig;
use api_shared::auth::{header_value, AUTH_HEADER};
use api_shared::paths::{self, CATEGORY_PARAM, PRISONER_PARAM, SEARCH_PARAM, VISITOR_PARAM};
use api_shared::{
    Attendance, CategoryId, HealthRes, Location, LocationId, LocationLevel, Lookup, LookupKind,
    NewAttendance, NewNextOfKin, NewProperty, NewPropertyStatusChange, NextOfKin, Page, Prisoner,
    PrisonerId, Property, PropertyId, PropertyStatusChange, PropertyStatusOption,
    PropertyTypeOption, PropertyUpdate, Visitor, VisitorId, VisitorItem,
};
use async_trait::async_trait;
use pims_core::{ApiError, ApiResult, RecordsApi};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Talks to the PIMS REST backend.
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    config: ClientConfig,
}

fn transport(error: reqwest::Error) -> ApiError {
    ApiError::Transport(error.to_string())
}

impl HttpApi {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(transport)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.config.base_url()))
            .header(AUTH_HEADER, header_value(self.config.api_token()))
    }

    /// Send `builder`, turning any non-2xx status into [`ApiError::Status`].
    async fn execute(builder: RequestBuilder) -> ApiResult<String> {
        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(builder: RequestBuilder) -> ApiResult<T> {
        let body = Self::execute(builder).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<Page<T>> {
        Self::fetch(self.request(Method::GET, path).query(query)).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        Self::fetch(self.request(method, path).json(body)).await
    }

    /// `GET /health`. Needs no token.
    #[tracing::instrument(skip(self), err)]
    pub async fn health(&self) -> ApiResult<HealthRes> {
        Self::fetch(self.request(Method::GET, paths::HEALTH)).await
    }
}

fn scoped<I: ToString>(param: &str, id: Option<I>) -> Vec<(&str, String)> {
    id.map(|id| vec![(param, id.to_string())]).unwrap_or_default()
}

#[async_trait]
impl RecordsApi for HttpApi {
    #[tracing::instrument(skip(self), err)]
    async fn list_locations(
        &self,
        level: LocationLevel,
        parent: Option<LocationId>,
    ) -> ApiResult<Page<Location>> {
        let query = match level.parent_param() {
            Some(param) => scoped(param, parent),
            None => Vec::new(),
        };
        self.list(level.path(), &query).await
    }

    #[tracing::instrument(skip(self), err)]
    async fn list_lookups(&self, kind: LookupKind) -> ApiResult<Page<Lookup>> {
        self.list(kind.path(), &[]).await
    }

    #[tracing::instrument(skip(self), err)]
    async fn list_prisoners(&self, search: Option<&str>) -> ApiResult<Page<Prisoner>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        self.list(paths::PRISONERS, &scoped(SEARCH_PARAM, search))
            .await
    }

    #[tracing::instrument(skip(self), err)]
    async fn list_visitors(&self, prisoner: PrisonerId) -> ApiResult<Page<Visitor>> {
        self.list(paths::VISITORS, &scoped(PRISONER_PARAM, Some(prisoner)))
            .await
    }

    #[tracing::instrument(skip(self), err)]
    async fn list_visitor_items(&self, visitor: VisitorId) -> ApiResult<Page<VisitorItem>> {
        self.list(paths::VISITOR_ITEMS, &scoped(VISITOR_PARAM, Some(visitor)))
            .await
    }

    #[tracing::instrument(skip(self), err)]
    async fn list_property_types(
        &self,
        category: Option<CategoryId>,
    ) -> ApiResult<Page<PropertyTypeOption>> {
        self.list(paths::PROPERTY_TYPES, &scoped(CATEGORY_PARAM, category))
            .await
    }

    #[tracing::instrument(skip(self), err)]
    async fn list_property_statuses(
        &self,
        category: Option<CategoryId>,
    ) -> ApiResult<Page<PropertyStatusOption>> {
        self.list(paths::PROPERTY_STATUSES, &scoped(CATEGORY_PARAM, category))
            .await
    }

    #[tracing::instrument(skip(self), err)]
    async fn list_next_of_kin(&self, prisoner: PrisonerId) -> ApiResult<Page<NextOfKin>> {
        self.list(paths::NEXT_OF_KIN, &scoped(PRISONER_PARAM, Some(prisoner)))
            .await
    }

    #[tracing::instrument(skip(self, request), fields(prisoner = %request.prisoner), err)]
    async fn create_next_of_kin(&self, request: &NewNextOfKin) -> ApiResult<NextOfKin> {
        self.send_json(Method::POST, paths::NEXT_OF_KIN, request)
            .await
    }

    #[tracing::instrument(skip(self), err)]
    async fn get_property(&self, id: PropertyId) -> ApiResult<Property> {
        Self::fetch(self.request(Method::GET, &paths::property(id))).await
    }

    #[tracing::instrument(skip(self, request), fields(bag = %request.bag_no), err)]
    async fn create_property(&self, request: &NewProperty) -> ApiResult<Property> {
        self.send_json(Method::POST, paths::PROPERTIES, request)
            .await
    }

    #[tracing::instrument(skip(self, request), err)]
    async fn update_property(
        &self,
        id: PropertyId,
        request: &PropertyUpdate,
    ) -> ApiResult<Property> {
        self.send_json(Method::PATCH, &paths::property(id), request)
            .await
    }

    #[tracing::instrument(skip(self), err)]
    async fn delete_property(&self, id: PropertyId) -> ApiResult<()> {
        Self::execute(self.request(Method::DELETE, &paths::property(id)))
            .await
            .map(|_| ())
    }

    #[tracing::instrument(skip(self, request), fields(property = %request.property), err)]
    async fn create_status_change(
        &self,
        request: &NewPropertyStatusChange,
    ) -> ApiResult<PropertyStatusChange> {
        self.send_json(Method::POST, paths::PROPERTY_STATUS_CHANGES, request)
            .await
    }

    #[tracing::instrument(skip(self, request), fields(appearance = %request.appearance), err)]
    async fn create_attendance(&self, request: &NewAttendance) -> ApiResult<Attendance> {
        self.send_json(Method::POST, paths::ATTENDANCES, request)
            .await
    }
}

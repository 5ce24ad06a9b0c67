//! # API REST
//!
//! Development stub of the PIMS REST backend.
//!
//! Handles:
//! - HTTP endpoints with axum, seeded from YAML
//! - Token authentication on every endpoint except `/health`
//! - REST-specific concerns (JSON serialization, CORS, request tracing)
//!
//! Uses `api-shared` for the wire types, so the client and the stub cannot drift apart.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod seed;
pub mod store;

pub use error::{StubError, StubResult};
pub use seed::Seed;
pub use store::Store;

use api_shared::auth::{validate_api_token, AUTH_HEADER};
use api_shared::paths::{self, CATEGORY_PARAM, PRISONER_PARAM, SEARCH_PARAM, VISITOR_PARAM};
use api_shared::{
    Attendance, CategoryId, HealthRes, HealthService, Location, LocationId, LocationLevel,
    Lookup, LookupKind, NewAttendance, NewNextOfKin, NewProperty, NewPropertyStatusChange,
    NextOfKin, Page, Prisoner, PrisonerId, Property, PropertyId, PropertyStatusChange,
    PropertyStatusOption, PropertyTypeOption, PropertyUpdate, Visitor, VisitorId, VisitorItem,
};
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state of the stub server.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<Store>>,
    token: Arc<str>,
}

impl AppState {
    pub fn new(seed: Seed, token: impl Into<Arc<str>>) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::new(seed))),
            token: token.into(),
        }
    }

    /// Handlers never leave the store half-updated, so a poisoned lock is still usable.
    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type Params = Query<HashMap<String, String>>;

/// Parse an optional integer id from the query string.
fn param<I: FromStr>(params: &HashMap<String, String>, name: &str) -> StubResult<Option<I>> {
    params
        .get(name)
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            v.parse()
                .map_err(|_| StubError::BadRequest(format!("invalid {name}: {v}")))
        })
        .transpose()
}

/// Build the stub router.
///
/// Every route except `/health` sits behind the token check.
pub fn router(state: AppState) -> Router {
    let mut api = Router::new()
        .route(paths::PRISONERS, get(list_prisoners))
        .route(paths::VISITORS, get(list_visitors))
        .route(paths::VISITOR_ITEMS, get(list_visitor_items))
        .route(paths::PROPERTY_TYPES, get(list_property_types))
        .route(paths::PROPERTY_STATUSES, get(list_property_statuses))
        .route(
            paths::NEXT_OF_KIN,
            get(list_next_of_kin).post(create_next_of_kin),
        )
        .route(paths::PROPERTIES, axum::routing::post(create_property))
        .route(
            &format!("{}/:id", paths::PROPERTIES),
            get(read_property)
                .patch(update_property)
                .delete(delete_property),
        )
        .route(
            paths::PROPERTY_STATUS_CHANGES,
            axum::routing::post(create_status_change),
        )
        .route(paths::ATTENDANCES, axum::routing::post(create_attendance));

    for level in LocationLevel::ALL {
        api = api.route(
            level.path(),
            get(move |state: State<AppState>, params: Params| {
                list_locations(state, level, params)
            }),
        );
    }
    for kind in [
        LookupKind::Sexes,
        LookupKind::Relationships,
        LookupKind::IdTypes,
        LookupKind::ItemCategories,
        LookupKind::Units,
    ] {
        api = api.route(
            kind.path(),
            get(move |state: State<AppState>| list_lookups(state, kind)),
        );
    }

    let api = api.route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route(paths::HEALTH, get(health))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the stub on `listener` until the process stops.
///
/// # Errors
/// Returns an error if the HTTP server fails while running.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    match listener.local_addr() {
        Ok(addr) => tracing::info!("-- Serving PIMS stub on {}", addr),
        Err(e) => tracing::warn!("listener has no local address: {e}"),
    }
    axum::serve(listener, router(state)).await
}

async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StubError> {
    let header = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok());
    validate_api_token(header, &state.token)?;
    Ok(next.run(request).await)
}

/// Health check endpoint
///
/// # Returns
/// * `Json<HealthRes>` - Always healthy while the process is up
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

async fn list_locations(
    State(state): State<AppState>,
    level: LocationLevel,
    Query(params): Params,
) -> StubResult<Json<Page<Location>>> {
    let parent: Option<LocationId> = match level.parent_param() {
        Some(name) => param(&params, name)?,
        None => None,
    };
    Ok(Json(Page::of(state.store().locations(level, parent))))
}

async fn list_lookups(State(state): State<AppState>, kind: LookupKind) -> Json<Page<Lookup>> {
    Json(Page::of(state.store().lookups(kind)))
}

#[axum::debug_handler]
async fn list_prisoners(
    State(state): State<AppState>,
    Query(params): Params,
) -> Json<Page<Prisoner>> {
    let search = params.get(SEARCH_PARAM).map(String::as_str);
    Json(Page::of(state.store().prisoners(search)))
}

/// List the visitors registered for a prisoner.
///
/// A prisoner with no visitors gets `results: null`, as the production backend answers.
#[axum::debug_handler]
async fn list_visitors(
    State(state): State<AppState>,
    Query(params): Params,
) -> StubResult<Json<Page<Visitor>>> {
    let prisoner: Option<PrisonerId> = param(&params, PRISONER_PARAM)?;
    let visitors = state.store().visitors(prisoner);
    if visitors.is_empty() {
        return Ok(Json(Page::default()));
    }
    Ok(Json(Page::of(visitors)))
}

#[axum::debug_handler]
async fn list_visitor_items(
    State(state): State<AppState>,
    Query(params): Params,
) -> StubResult<Json<Page<VisitorItem>>> {
    let visitor: Option<VisitorId> = param(&params, VISITOR_PARAM)?;
    Ok(Json(Page::of(state.store().visitor_items(visitor))))
}

#[axum::debug_handler]
async fn list_property_types(
    State(state): State<AppState>,
    Query(params): Params,
) -> StubResult<Json<Page<PropertyTypeOption>>> {
    let category: Option<CategoryId> = param(&params, CATEGORY_PARAM)?;
    Ok(Json(Page::of(state.store().property_types(category))))
}

#[axum::debug_handler]
async fn list_property_statuses(
    State(state): State<AppState>,
    Query(params): Params,
) -> StubResult<Json<Page<PropertyStatusOption>>> {
    let category: Option<CategoryId> = param(&params, CATEGORY_PARAM)?;
    Ok(Json(Page::of(state.store().property_statuses(category))))
}

#[axum::debug_handler]
async fn list_next_of_kin(
    State(state): State<AppState>,
    Query(params): Params,
) -> StubResult<Json<Page<NextOfKin>>> {
    let prisoner: Option<PrisonerId> = param(&params, PRISONER_PARAM)?;
    Ok(Json(Page::of(state.store().next_of_kin(prisoner))))
}

/// Create a next-of-kin record
///
/// # Returns
/// * `201 Created` with the stored record
///
/// # Errors
/// * `404` if the prisoner does not exist
/// * `400` if the sex or relationship is unknown
#[axum::debug_handler]
async fn create_next_of_kin(
    State(state): State<AppState>,
    Json(request): Json<NewNextOfKin>,
) -> StubResult<(StatusCode, Json<NextOfKin>)> {
    let record = state.store().create_next_of_kin(request)?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[axum::debug_handler]
async fn read_property(
    State(state): State<AppState>,
    Path(id): Path<PropertyId>,
) -> StubResult<Json<Property>> {
    Ok(Json(state.store().property(id)?))
}

/// Create a property from a visitor item
///
/// # Returns
/// * `201 Created` with the stored property
///
/// # Errors
/// * `404` if the prisoner or visitor item does not exist
/// * `400` if the item belongs to another visitor or category, the type or status does not apply
///   to the category, or the bag number is taken
#[axum::debug_handler]
async fn create_property(
    State(state): State<AppState>,
    Json(request): Json<NewProperty>,
) -> StubResult<(StatusCode, Json<Property>)> {
    let property = state.store().create_property(request)?;
    Ok((StatusCode::CREATED, Json(property)))
}

#[axum::debug_handler]
async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<PropertyId>,
    Json(request): Json<PropertyUpdate>,
) -> StubResult<Json<Property>> {
    Ok(Json(state.store().update_property(id, request)?))
}

#[axum::debug_handler]
async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<PropertyId>,
) -> StubResult<StatusCode> {
    state.store().delete_property(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
async fn create_status_change(
    State(state): State<AppState>,
    Json(request): Json<NewPropertyStatusChange>,
) -> StubResult<(StatusCode, Json<PropertyStatusChange>)> {
    let record = state.store().create_status_change(request)?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[axum::debug_handler]
async fn create_attendance(
    State(state): State<AppState>,
    Json(request): Json<NewAttendance>,
) -> StubResult<(StatusCode, Json<Attendance>)> {
    let record = state.store().create_attendance(request)?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_shared::auth::header_value;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use serde_json::Value;
    use tower::ServiceExt;

    const TOKEN: &str = "test-token";

    fn app() -> Router {
        let seed = Seed::bundled().expect("bundled seed should parse");
        router(AppState::new(seed, TOKEN))
    }

    fn get_request(uri: &str) -> HttpRequest<Body> {
        HttpRequest::get(uri)
            .header(AUTH_HEADER, header_value(TOKEN))
            .body(Body::empty())
            .expect("request should build")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let response = app()
            .oneshot(
                HttpRequest::get("/health")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], "PIMS is alive");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app()
            .oneshot(
                HttpRequest::get("/regions")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["detail"], "missing API token");
    }

    #[tokio::test]
    async fn test_districts_are_scoped_to_region() {
        let response = app()
            .oneshot(get_request("/districts?region=2"))
            .await
            .expect("request should succeed");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][0]["name"], "Gulu");
    }

    #[tokio::test]
    async fn test_prisoner_without_visitors_gets_null_results() {
        let response = app()
            .oneshot(get_request("/visitors?prisoner=2"))
            .await
            .expect("request should succeed");
        let body = json_body(response).await;
        assert!(body["results"].is_null());
    }

    #[tokio::test]
    async fn test_bad_query_parameter_is_rejected() {
        let response = app()
            .oneshot(get_request("/property-types?category=cash"))
            .await
            .expect("request should succeed");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_property_is_not_found() {
        let response = app()
            .oneshot(get_request("/properties/404"))
            .await
            .expect("request should succeed");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["detail"], "property 404 not found");
    }

    #[tokio::test]
    async fn test_lookup_routes_answer_each_kind() {
        let response = app()
            .oneshot(get_request("/item-categories"))
            .await
            .expect("request should succeed");
        let body = json_body(response).await;
        assert_eq!(body["count"], 3);
        assert_eq!(body["results"][2]["name"], "Clothing");
    }
}

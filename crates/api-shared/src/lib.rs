//! # API Shared
//!
//! Wire definitions shared by the PIMS REST client and the development stub server.
//!
//! Contains:
//! - Typed record identifiers (`ids` module)
//! - The paginated list envelope returned by every list endpoint (`Page`)
//! - Entity and request payloads for the property intake workflow (`models` module)
//! - Endpoint paths and scoping parameters (`paths` module)
//! - Token authentication helpers and the health response

pub mod auth;
pub mod health;
pub mod ids;
pub mod models;
pub mod page;
pub mod paths;

pub use health::{HealthRes, HealthService};
pub use ids::*;
pub use models::*;
pub use page::Page;
pub use paths::{LocationLevel, LookupKind};

//! # API Client
//!
//! HTTP implementation of the workflow's [`RecordsApi`](pims_core::RecordsApi) port.
//!
//! Handles:
//! - Building requests against the configured backend with token authentication
//! - Mapping transport failures, non-success statuses and undecodable bodies to
//!   [`ApiError`](pims_core::ApiError)
//! - Startup configuration (`ClientConfig`)

#![warn(rust_2018_idioms)]

pub mod config;
pub mod http;

pub use config::{timeout_from_env_value, ClientConfig, ConfigError, DEFAULT_TIMEOUT};
pub use http::HttpApi;

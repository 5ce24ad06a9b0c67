//! # PIMS Core
//!
//! The property intake workflow for the PIMS records application.
//!
//! This crate holds the cascading-selection state machines and the orchestration around them:
//! - Reference data cache and the cascading location resolver
//! - Visitor and visitor-item resolution for a selected prisoner
//! - Classification derived from the visitor item a draft row points at
//! - Next-of-kin and property status-change sub-workflows
//! - The multi-item intake orchestrator and its partial-failure bookkeeping
//!
//! Every form type here is a synchronous state machine. Operations that need data return
//! [`Fetch`] requests instead of performing IO; responses come back through `apply`, which
//! discards anything whose triggering selection has since changed. The async
//! [`session`] module drives those requests against a [`RecordsApi`] and publishes progress on a
//! [`StatusChannel`].
//!
//! **No HTTP concerns**: the REST client lives in `api-client`, wire types in `api-shared`.

pub mod actor;
pub mod api;
pub mod attendance;
pub mod classification;
pub mod constants;
pub mod draft;
pub mod edit;
pub mod error;
pub mod fetch;
pub mod intake;
pub mod location;
pub mod next_of_kin;
pub mod reference;
pub mod remote;
pub mod session;
pub mod status;
pub mod status_change;
pub mod submission;
pub mod validation;
pub mod visitor;

#[cfg(test)]
pub(crate) mod test_support;

pub use actor::Actor;
pub use api::RecordsApi;
pub use attendance::{AttendanceFlag, AttendanceTransition};
pub use draft::{DraftEdit, DraftId, DraftList, PropertyDraft};
pub use edit::PropertyEditForm;
pub use error::{
    ApiError, ApiResult, Field, FieldError, ValidationErrors, WorkflowError, WorkflowResult,
};
pub use fetch::{Fetch, Fetched};
pub use intake::{IntakeForm, ItemOutcome, SubmissionOutcome, SubmissionReport};
pub use location::LocationResolver;
pub use next_of_kin::NextOfKinForm;
pub use reference::ReferenceCache;
pub use remote::{Remote, Resolution};
pub use session::{record_attendance, EditSession, IntakeSession};
pub use status::{Notice, StatusChannel, WorkflowStatus};
pub use status_change::StatusChangeForm;
pub use visitor::{IntakePhase, VisitorResolver};

pub use api_shared as wire;
pub use pims_types::{BagNumber, NonEmptyText, TextError};

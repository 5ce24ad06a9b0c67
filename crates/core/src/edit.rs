//! Editing an existing property record.
//!
//! Everything except the status is edited in place and saved with one `PATCH`. A status change
//! goes through [`StatusChangeForm`]: the form only shows the candidate status until the audit
//! record exists, and cancelling falls back to the recorded one.

use crate::actor::Actor;
use crate::draft::DraftEdit;
use crate::error::{ApiResult, Field, ValidationErrors, WorkflowError, WorkflowResult};
use crate::fetch::{Fetch, Fetched};
use crate::reference::ReferenceCache;
use crate::remote::{Remote, Resolution};
use crate::status_change::StatusChangeForm;
use crate::wire::{
    CategoryId, NewPropertyStatusChange, NextOfKinId, Property, PropertyStatusChange,
    PropertyStatusId, PropertyStatusOption, PropertyTypeId, PropertyTypeOption, PropertyUpdate,
};
use chrono::{DateTime, Utc};
use pims_types::{BagNumber, TextError};

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyEditForm {
    original: Property,
    property_type: PropertyTypeId,
    /// Last status backed by an audit record.
    status: PropertyStatusId,
    bag_no: String,
    destination: String,
    note: String,
    next_of_kin: Option<NextOfKinId>,
    types: Remote<CategoryId, PropertyTypeOption>,
    statuses: Remote<CategoryId, PropertyStatusOption>,
    pending: Option<StatusChangeForm>,
    committed: Vec<PropertyStatusChange>,
}

impl PropertyEditForm {
    pub fn open(property: Property, cache: &ReferenceCache) -> (Self, Vec<Fetch>) {
        let category = property.category;
        let mut fetches = Vec::new();

        let types = match cache.property_types(category) {
            Some(rows) => Remote::settled(category, rows.to_vec()),
            None => {
                fetches.push(Fetch::PropertyTypes { category });
                Remote::Loading(category)
            }
        };
        let statuses = match cache.property_statuses(category) {
            Some(rows) => Remote::settled(category, rows.to_vec()),
            None => {
                fetches.push(Fetch::PropertyStatuses { category });
                Remote::Loading(category)
            }
        };

        let form = Self {
            property_type: property.property_type,
            status: property.property_status,
            bag_no: property.bag_no.clone(),
            destination: property.destination.clone().unwrap_or_default(),
            note: property.note.clone().unwrap_or_default(),
            next_of_kin: property.next_of_kin,
            original: property,
            types,
            statuses,
            pending: None,
            committed: Vec::new(),
        };
        (form, fetches)
    }

    pub fn apply(&mut self, fetched: &Fetched) -> Resolution {
        match fetched {
            Fetched::PropertyTypes { category, result } => {
                self.types.resolve(category, result.clone())
            }
            Fetched::PropertyStatuses { category, result } => {
                self.statuses.resolve(category, result.clone())
            }
            _ => Resolution::Stale,
        }
    }

    pub fn retry(&mut self) -> Vec<Fetch> {
        let mut fetches = Vec::new();
        if let Some(category) = self.types.retry() {
            fetches.push(Fetch::PropertyTypes { category });
        }
        if let Some(category) = self.statuses.retry() {
            fetches.push(Fetch::PropertyStatuses { category });
        }
        fetches
    }

    pub fn original(&self) -> &Property {
        &self.original
    }

    pub fn property_type(&self) -> PropertyTypeId {
        self.property_type
    }

    pub fn bag_no(&self) -> &str {
        &self.bag_no
    }

    pub fn types(&self) -> &Remote<CategoryId, PropertyTypeOption> {
        &self.types
    }

    pub fn statuses(&self) -> &Remote<CategoryId, PropertyStatusOption> {
        &self.statuses
    }

    /// Status shown in the form: the candidate while a change is pending.
    pub fn displayed_status(&self) -> PropertyStatusId {
        self.pending
            .as_ref()
            .map_or(self.status, StatusChangeForm::candidate)
    }

    pub fn recorded_status(&self) -> PropertyStatusId {
        self.status
    }

    pub fn status_change(&self) -> Option<&StatusChangeForm> {
        self.pending.as_ref()
    }

    pub fn status_change_mut(&mut self) -> Option<&mut StatusChangeForm> {
        self.pending.as_mut()
    }

    /// Audit records created while this form was open.
    pub fn committed_changes(&self) -> &[PropertyStatusChange] {
        &self.committed
    }

    /// Apply a field edit. Status edits are routed through [`Self::select_status`].
    pub fn edit(&mut self, edit: DraftEdit, now: DateTime<Utc>) -> WorkflowResult<()> {
        match edit {
            DraftEdit::PropertyType(Some(id)) => {
                if !self.types.is_ready() {
                    return Err(WorkflowError::NotReady(
                        "property types have not loaded".to_string(),
                    ));
                }
                if !self.types.items().iter().any(|o| o.id == id) {
                    return Err(WorkflowError::InvalidSelection(format!(
                        "property type {id} is not valid for this category"
                    )));
                }
                self.property_type = id;
            }
            DraftEdit::PropertyType(None) | DraftEdit::PropertyStatus(None) => {
                return Err(WorkflowError::InvalidSelection(
                    "an existing property must keep a type and status".to_string(),
                ));
            }
            DraftEdit::PropertyStatus(Some(id)) => self.select_status(id, now)?,
            DraftEdit::Bag(value) => self.bag_no = value,
            DraftEdit::Destination(value) => self.destination = value,
            DraftEdit::Note(value) => self.note = value,
            DraftEdit::NextOfKin(value) => self.next_of_kin = value,
        }
        Ok(())
    }

    /// Choose a new status.
    ///
    /// Choosing the recorded status drops any pending change. Any other status opens the
    /// status-change dialog for it, replacing a pending one.
    pub fn select_status(&mut self, status: PropertyStatusId, now: DateTime<Utc>) -> WorkflowResult<()> {
        if !self.statuses.is_ready() {
            return Err(WorkflowError::NotReady(
                "property statuses have not loaded".to_string(),
            ));
        }
        if !self.statuses.items().iter().any(|o| o.id == status) {
            return Err(WorkflowError::InvalidSelection(format!(
                "property status {status} is not valid for this category"
            )));
        }

        if status == self.status {
            self.pending = None;
        } else {
            tracing::debug!(property = %self.original.id, from = %self.status, to = %status, "status change started");
            self.pending = Some(StatusChangeForm::open(self.original.id, status, now));
        }
        Ok(())
    }

    /// Abandon the pending change; the form shows the recorded status again.
    pub fn cancel_status_change(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!(property = %self.original.id, "status change cancelled");
        }
    }

    pub fn begin_status_change(&mut self, actor: &Actor) -> WorkflowResult<NewPropertyStatusChange> {
        let form = self.pending.as_mut().ok_or_else(|| {
            WorkflowError::NotReady("no status change is pending".to_string())
        })?;
        form.begin_submit(actor)
    }

    /// Record the audit call's outcome. Only success moves the recorded status.
    pub fn finish_status_change(
        &mut self,
        result: ApiResult<PropertyStatusChange>,
    ) -> WorkflowResult<PropertyStatusChange> {
        let Some(form) = self.pending.as_mut() else {
            return Err(WorkflowError::NotReady(
                "no status change is pending".to_string(),
            ));
        };
        let record = form.finish_submit(result)?;
        self.status = record.status;
        self.pending = None;
        self.committed.push(record.clone());
        Ok(record)
    }

    /// Build the `PATCH` body. Blocked while a status change is pending.
    pub fn validate(&self) -> Result<PropertyUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.pending.is_some() {
            errors.invalid(
                Field::StatusChange,
                "record a reason for the status change or cancel it before saving",
            );
        }
        if !self.types.is_ready() {
            errors.invalid(Field::PropertyType, "property types have not loaded");
        } else if !self.types.items().iter().any(|o| o.id == self.property_type) {
            errors.invalid(Field::PropertyType, "property type is not a valid choice");
        }

        let bag_no = match BagNumber::parse(&self.bag_no) {
            Ok(bag) => Some(bag),
            Err(TextError::Empty) => {
                errors.missing(Field::Bag);
                None
            }
            Err(error) => {
                errors.invalid(Field::Bag, format!("bag number: {error}"));
                None
            }
        };
        let destination = non_blank(&self.destination);
        let note = non_blank(&self.note);

        let Some(bag_no) = bag_no else {
            return Err(errors);
        };
        errors.into_result(|| PropertyUpdate {
            property_type: self.property_type,
            property_status: self.status,
            bag_no,
            destination,
            note,
            next_of_kin: self.next_of_kin,
        })
    }
}

fn non_blank(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

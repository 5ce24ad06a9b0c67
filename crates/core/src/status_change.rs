//! Audit dialog required before an existing property's status may change.

use crate::actor::Actor;
use crate::constants::{MAX_NOTE_LEN, MAX_REASON_LEN};
use crate::error::{ApiResult, Field, ValidationErrors, WorkflowResult};
use crate::submission::Submission;
use crate::wire::{NewPropertyStatusChange, PropertyId, PropertyStatusChange, PropertyStatusId};
use chrono::{DateTime, Utc};
use pims_types::{NonEmptyText, TextError};

#[derive(Clone, Debug, PartialEq)]
pub struct StatusChangeForm {
    property: PropertyId,
    candidate: PropertyStatusId,
    pub reason: String,
    pub effective_date: DateTime<Utc>,
    pub destination: String,
    submission: Submission,
}

impl StatusChangeForm {
    /// Pre-filled with the property and the status being moved to; the effective date starts
    /// at `now`.
    pub fn open(property: PropertyId, candidate: PropertyStatusId, now: DateTime<Utc>) -> Self {
        Self {
            property,
            candidate,
            reason: String::new(),
            effective_date: now,
            destination: String::new(),
            submission: Submission::default(),
        }
    }

    pub fn property(&self) -> PropertyId {
        self.property
    }

    pub fn candidate(&self) -> PropertyStatusId {
        self.candidate
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn validate(&self, actor: &Actor) -> Result<NewPropertyStatusChange, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let reason = match NonEmptyText::bounded(&self.reason, MAX_REASON_LEN) {
            Ok(reason) => Some(reason),
            Err(TextError::Empty) => {
                errors.missing(Field::Reason);
                None
            }
            Err(error) => {
                errors.invalid(Field::Reason, format!("reason: {error}"));
                None
            }
        };

        let destination = self.destination.trim();
        if destination.chars().count() > MAX_NOTE_LEN {
            errors.invalid(
                Field::Destination,
                format!("destination exceeds maximum length of {MAX_NOTE_LEN} characters"),
            );
        }

        let Some(reason) = reason else {
            return Err(errors);
        };
        errors.into_result(|| NewPropertyStatusChange {
            property: self.property,
            status: self.candidate,
            effective_date: self.effective_date,
            reason,
            destination: (!destination.is_empty()).then(|| destination.to_string()),
            created_by: actor.id,
        })
    }

    pub fn begin_submit(&mut self, actor: &Actor) -> WorkflowResult<NewPropertyStatusChange> {
        let request = self.validate(actor)?;
        self.submission.begin()?;
        Ok(request)
    }

    pub fn finish_submit(
        &mut self,
        result: ApiResult<PropertyStatusChange>,
    ) -> ApiResult<PropertyStatusChange> {
        self.submission.finish(result)
    }
}

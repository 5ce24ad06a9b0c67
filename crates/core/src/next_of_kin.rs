//! Embedded next-of-kin creation.
//!
//! Opened from a draft row's next-of-kin field. The form loads its own global lookups and
//! address cascade; the parent form only sees the created record, which it prepends to its list.

use crate::actor::Actor;
use crate::error::{ApiResult, Field, ValidationErrors, WorkflowResult};
use crate::fetch::{Fetch, Fetched};
use crate::location::LocationResolver;
use crate::reference::ReferenceCache;
use crate::remote::{Remote, Resolution};
use crate::submission::Submission;
use crate::wire::{LocationId, LocationLevel, Lookup, LookupId, LookupKind, NewNextOfKin, NextOfKin, PrisonerId};
use pims_types::{NonEmptyText, TextError};

/// Name fields are bounded like the backend's columns.
const MAX_NAME_LEN: usize = 100;

/// Values typed into the form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NextOfKinFields {
    pub first_name: String,
    pub last_name: String,
    pub sex: Option<LookupId>,
    pub relationship: Option<LookupId>,
    pub id_type: Option<LookupId>,
    pub id_number: String,
    pub phone: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NextOfKinForm {
    prisoner: PrisonerId,
    pub fields: NextOfKinFields,
    sexes: Remote<(), Lookup>,
    relationships: Remote<(), Lookup>,
    id_types: Remote<(), Lookup>,
    location: LocationResolver,
    submission: Submission,
}

impl NextOfKinForm {
    /// A blank form for `prisoner` plus the lookups it still needs.
    pub fn open(prisoner: PrisonerId, cache: &ReferenceCache) -> (Self, Vec<Fetch>) {
        let mut form = Self {
            prisoner,
            fields: NextOfKinFields::default(),
            sexes: Remote::Idle,
            relationships: Remote::Idle,
            id_types: Remote::Idle,
            location: LocationResolver::default(),
            submission: Submission::default(),
        };

        let mut fetches = Vec::new();
        for kind in [LookupKind::Sexes, LookupKind::Relationships, LookupKind::IdTypes] {
            let state = match cache.lookups(kind) {
                Some(rows) => Remote::settled((), rows.to_vec()),
                None => {
                    fetches.push(Fetch::Lookup(kind));
                    Remote::Loading(())
                }
            };
            if let Some(slot) = form.lookup_mut(kind) {
                *slot = state;
            }
        }
        fetches.extend(form.location.start(cache));
        (form, fetches)
    }

    pub fn prisoner(&self) -> PrisonerId {
        self.prisoner
    }

    /// Offer a response; only lookups and locations concern this form.
    pub fn apply(&mut self, fetched: &Fetched) -> Resolution {
        match fetched {
            Fetched::Lookup { kind, result } => match self.lookup_mut(*kind) {
                Some(slot) => slot.resolve(&(), result.clone()),
                None => Resolution::Stale,
            },
            Fetched::Locations {
                level,
                parent,
                result,
            } => self.location.apply(*level, *parent, result.clone()),
            _ => Resolution::Stale,
        }
    }

    pub fn select_location(
        &mut self,
        level: LocationLevel,
        id: LocationId,
        cache: &ReferenceCache,
    ) -> WorkflowResult<Option<Fetch>> {
        self.location.select(level, id, cache)
    }

    pub fn location(&self) -> &LocationResolver {
        &self.location
    }

    pub fn lookup(&self, kind: LookupKind) -> Option<&Remote<(), Lookup>> {
        match kind {
            LookupKind::Sexes => Some(&self.sexes),
            LookupKind::Relationships => Some(&self.relationships),
            LookupKind::IdTypes => Some(&self.id_types),
            LookupKind::ItemCategories | LookupKind::Units => None,
        }
    }

    fn lookup_mut(&mut self, kind: LookupKind) -> Option<&mut Remote<(), Lookup>> {
        match kind {
            LookupKind::Sexes => Some(&mut self.sexes),
            LookupKind::Relationships => Some(&mut self.relationships),
            LookupKind::IdTypes => Some(&mut self.id_types),
            LookupKind::ItemCategories | LookupKind::Units => None,
        }
    }

    /// Re-request every failed lookup and location level.
    pub fn retry(&mut self) -> Vec<Fetch> {
        let mut fetches = Vec::new();
        for kind in [LookupKind::Sexes, LookupKind::Relationships, LookupKind::IdTypes] {
            if let Some(slot) = self.lookup_mut(kind) {
                if slot.retry().is_some() {
                    fetches.push(Fetch::Lookup(kind));
                }
            }
        }
        fetches.extend(self.location.retry_failed());
        fetches
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    /// Check every field and build the creation payload.
    pub fn validate(&self, actor: &Actor) -> Result<NewNextOfKin, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let first_name = required_name(&self.fields.first_name, Field::FirstName, &mut errors);
        let last_name = required_name(&self.fields.last_name, Field::LastName, &mut errors);
        let sex = required_choice(&self.sexes, self.fields.sex, Field::Sex, &mut errors);
        let relationship = required_choice(
            &self.relationships,
            self.fields.relationship,
            Field::Relationship,
            &mut errors,
        );

        let id_number = non_blank(&self.fields.id_number);
        if self.fields.id_type.is_some() && id_number.is_none() {
            errors.invalid(Field::IdNumber, "ID number is required when an ID type is chosen");
        }

        let (Some(first_name), Some(last_name), Some(sex), Some(relationship)) =
            (first_name, last_name, sex, relationship)
        else {
            return Err(errors);
        };

        errors.into_result(|| NewNextOfKin {
            prisoner: self.prisoner,
            first_name,
            last_name,
            sex,
            relationship,
            id_type: self.fields.id_type,
            id_number,
            phone: non_blank(&self.fields.phone),
            address: self.location.address(),
            created_by: actor.id,
        })
    }

    /// Validate and mark the form as submitting.
    pub fn begin_submit(&mut self, actor: &Actor) -> WorkflowResult<NewNextOfKin> {
        let request = self.validate(actor)?;
        self.submission.begin()?;
        Ok(request)
    }

    /// Record the creation outcome. On failure the form keeps its data for another attempt.
    pub fn finish_submit(&mut self, result: ApiResult<NextOfKin>) -> ApiResult<NextOfKin> {
        self.submission.finish(result)
    }
}

fn non_blank(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn required_name(
    input: &str,
    field: Field,
    errors: &mut ValidationErrors,
) -> Option<NonEmptyText> {
    match NonEmptyText::bounded(input, MAX_NAME_LEN) {
        Ok(text) => Some(text),
        Err(TextError::Empty) => {
            errors.missing(field);
            None
        }
        Err(error) => {
            errors.invalid(field, format!("{field}: {error}"));
            None
        }
    }
}

fn required_choice(
    options: &Remote<(), Lookup>,
    selected: Option<LookupId>,
    field: Field,
    errors: &mut ValidationErrors,
) -> Option<LookupId> {
    match selected {
        None => {
            errors.missing(field);
            None
        }
        Some(id) if options.is_ready() && !options.items().iter().any(|o| o.id == id) => {
            errors.invalid(field, format!("{field} is not a valid choice"));
            None
        }
        Some(id) => Some(id),
    }
}

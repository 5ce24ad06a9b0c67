//! Pre-submission validation of the intake form.
//!
//! Validation runs over the whole form before any network call and collects every problem it
//! finds, so the user sees all missing fields at once. Only a clean form yields payloads.

use crate::actor::Actor;
use crate::classification;
use crate::constants::MAX_NOTE_LEN;
use crate::draft::{DraftId, DraftList, PropertyDraft};
use crate::error::{Field, ValidationErrors};
use crate::remote::Remote;
use crate::visitor::{IntakePhase, VisitorResolver};
use crate::wire::{Choice, NewProperty, VisitorItemId};
use pims_types::{BagNumber, TextError};
use std::collections::HashMap;

/// Validates the intake form and builds one creation payload per draft.
///
/// # Arguments
///
/// * `visitors` - Prisoner, visitor and visitor-item state of the form.
/// * `drafts` - The property rows to submit.
/// * `actor` - Staff member stamped as `created_by` on every payload.
///
/// # Errors
///
/// Returns every validation failure found, form-level fields first and then each draft row in
/// order. No payload is produced unless the whole form is valid.
pub fn validate_intake(
    visitors: &VisitorResolver,
    drafts: &DraftList,
    actor: &Actor,
) -> Result<Vec<(DraftId, NewProperty)>, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_selection(visitors, &mut errors);

    let mut first_use: HashMap<VisitorItemId, usize> = HashMap::new();
    let mut payloads = Vec::with_capacity(drafts.len());

    for (index, draft) in drafts.iter().enumerate() {
        let position = index + 1;
        let before = errors.len();

        check_visitor_item(visitors, draft, position, &mut first_use, &mut errors);
        check_option(
            &draft.options().types,
            draft.property_type(),
            Field::PropertyType,
            position,
            draft.id(),
            &mut errors,
        );
        check_option(
            &draft.options().statuses,
            draft.property_status(),
            Field::PropertyStatus,
            position,
            draft.id(),
            &mut errors,
        );
        if let Some(reason) = classification::blocking_reason(draft) {
            errors.invalid_on(position, draft.id(), Field::PropertyType, reason);
        }

        let bag_no = check_bag(draft.bag_no(), position, draft.id(), &mut errors);
        let destination = optional_text(
            draft.destination(),
            Field::Destination,
            position,
            draft.id(),
            &mut errors,
        );
        let note = optional_text(draft.note(), Field::Note, position, draft.id(), &mut errors);

        if errors.len() > before {
            continue;
        }

        let (
            Some(prisoner),
            Some(visitor),
            Some(derived),
            Some(property_type),
            Some(property_status),
            Some(bag_no),
        ) = (
            visitors.prisoner(),
            visitors.selected_visitor(),
            draft.derived(),
            draft.property_type(),
            draft.property_status(),
            bag_no,
        )
        else {
            continue;
        };

        payloads.push((
            draft.id(),
            NewProperty {
                prisoner,
                visitor: visitor.id,
                visitor_item: derived.visitor_item,
                category: derived.category,
                measurement_unit: derived.measurement_unit,
                quantity: derived.quantity,
                amount: derived.amount,
                property_type,
                property_status,
                bag_no,
                destination,
                note,
                next_of_kin: draft.next_of_kin(),
                created_by: actor.id,
            },
        ));
    }

    errors.into_result(|| payloads)
}

/// Form-level checks: a prisoner, a visitor and a settled item list.
fn check_selection(visitors: &VisitorResolver, errors: &mut ValidationErrors) {
    match visitors.phase() {
        IntakePhase::NoPrisoner => {
            errors.missing(Field::Prisoner);
            errors.missing(Field::Visitor);
        }
        IntakePhase::VisitorsReady => errors.missing(Field::Visitor),
        IntakePhase::ItemsReady => {}
        IntakePhase::VisitorsLoading
        | IntakePhase::VisitorsEmpty
        | IntakePhase::VisitorsFailed => {
            let reason = visitors.blocking_reason().unwrap_or_default();
            errors.invalid(Field::Visitor, reason);
        }
        IntakePhase::ItemsLoading | IntakePhase::ItemsEmpty | IntakePhase::ItemsFailed => {
            let reason = visitors.blocking_reason().unwrap_or_default();
            errors.invalid(Field::VisitorItem, reason);
        }
    }
}

fn check_visitor_item(
    visitors: &VisitorResolver,
    draft: &PropertyDraft,
    position: usize,
    first_use: &mut HashMap<VisitorItemId, usize>,
    errors: &mut ValidationErrors,
) {
    let Some(item) = draft.visitor_item() else {
        errors.missing_on(position, draft.id(), Field::VisitorItem);
        return;
    };

    if visitors.phase() == IntakePhase::ItemsReady && visitors.item(item).is_none() {
        errors.invalid_on(
            position,
            draft.id(),
            Field::VisitorItem,
            "visitor item does not belong to the selected visitor",
        );
    }
    match first_use.get(&item) {
        Some(first) => errors.invalid_on(
            position,
            draft.id(),
            Field::VisitorItem,
            format!("visitor item is already used by item {first}"),
        ),
        None => {
            first_use.insert(item, position);
        }
    }
}

/// A required choice must be set and, once options have arrived, be one of them.
fn check_option<K, I: PartialEq>(
    options: &Remote<K, Choice<I>>,
    selected: Option<I>,
    field: Field,
    position: usize,
    draft: DraftId,
    errors: &mut ValidationErrors,
) {
    match selected {
        None => errors.missing_on(position, draft, field),
        Some(id) if options.is_ready() && !options.items().iter().any(|o| o.id == id) => {
            errors.invalid_on(position, draft, field, format!("{field} is not a valid choice"));
        }
        Some(_) => {}
    }
}

fn check_bag(
    input: &str,
    position: usize,
    draft: DraftId,
    errors: &mut ValidationErrors,
) -> Option<BagNumber> {
    match BagNumber::parse(input) {
        Ok(bag) => Some(bag),
        Err(TextError::Empty) => {
            errors.missing_on(position, draft, Field::Bag);
            None
        }
        Err(error) => {
            errors.invalid_on(position, draft, Field::Bag, format!("bag number: {error}"));
            None
        }
    }
}

/// Trimmed free text; blank means absent.
pub(crate) fn optional_text(
    input: &str,
    field: Field,
    position: usize,
    draft: DraftId,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() > MAX_NOTE_LEN {
        errors.invalid_on(
            position,
            draft,
            field,
            format!("{field} exceeds maximum length of {MAX_NOTE_LEN} characters"),
        );
        return None;
    }
    Some(trimmed.to_string())
}

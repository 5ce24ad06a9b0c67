//! The multi-item property intake form.
//!
//! Sequences prisoner → visitor → visitor item → classification for every draft row, hosts the
//! embedded next-of-kin dialog, and turns the rows into one creation call each on submit.
//! Selections only ever invalidate what is downstream of them.

use crate::actor::Actor;
use crate::classification;
use crate::draft::{DraftAction, DraftEdit, DraftId, DraftList};
use crate::error::{ApiError, ApiResult, WorkflowError, WorkflowResult};
use crate::fetch::{Fetch, Fetched};
use crate::location::LocationResolver;
use crate::next_of_kin::NextOfKinForm;
use crate::reference::ReferenceCache;
use crate::remote::{Remote, Resolution};
use crate::validation::validate_intake;
use crate::visitor::{IntakePhase, VisitorResolver};
use crate::wire::{
    LocationId, LocationLevel, NewNextOfKin, NewProperty, NextOfKin, PrisonerId, Property,
    PropertyId, VisitorId, VisitorItemId,
};

/// Result of one draft's creation call.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemOutcome {
    pub draft: DraftId,
    /// 1-based row number at the time of submission.
    pub position: usize,
    pub result: Result<PropertyId, ApiError>,
}

/// Per-item outcomes of a submission where at least one call failed.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionReport {
    outcomes: Vec<ItemOutcome>,
}

impl SubmissionReport {
    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

impl std::fmt::Display for SubmissionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} of {} items saved",
            self.succeeded().count(),
            self.outcomes.len()
        )?;
        for outcome in self.failed() {
            if let Err(error) = &outcome.result {
                write!(f, "; item {} failed: {error}", outcome.position)?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionOutcome {
    /// Every draft was created; the form has been cleared.
    Completed(Vec<Property>),
    /// Some drafts failed. Created drafts were removed, failed ones are still on the form.
    Partial(SubmissionReport),
}

#[derive(Clone, Debug, PartialEq)]
struct NextOfKinModal {
    origin: DraftId,
    form: NextOfKinForm,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntakeForm {
    visitors: VisitorResolver,
    drafts: DraftList,
    next_of_kin: Remote<PrisonerId, NextOfKin>,
    /// Records created while the list was loading or failed, prepended once it arrives.
    injected: Vec<NextOfKin>,
    modal: Option<NextOfKinModal>,
    cache: ReferenceCache,
    submitting: bool,
}

impl IntakeForm {
    pub fn new() -> Self {
        Self::with_cache(ReferenceCache::default())
    }

    pub fn with_cache(cache: ReferenceCache) -> Self {
        Self {
            visitors: VisitorResolver::default(),
            drafts: DraftList::new(),
            next_of_kin: Remote::Idle,
            injected: Vec::new(),
            modal: None,
            cache,
            submitting: false,
        }
    }

    pub fn visitors(&self) -> &VisitorResolver {
        &self.visitors
    }

    pub fn drafts(&self) -> &DraftList {
        &self.drafts
    }

    pub fn next_of_kin(&self) -> &Remote<PrisonerId, NextOfKin> {
        &self.next_of_kin
    }

    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    pub fn phase(&self) -> IntakePhase {
        self.visitors.phase()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Choose the prisoner. Visitor, visitor items and next-of-kin choices on every row are
    /// dropped; user-entered bag, destination and note text is kept.
    pub fn select_prisoner(&mut self, prisoner: PrisonerId) -> Vec<Fetch> {
        let visitors = self.visitors.select_prisoner(prisoner);
        self.drafts = self
            .drafts
            .map_all(|d| d.clear_visitor_item().clear_next_of_kin());
        self.next_of_kin = Remote::Loading(prisoner);
        self.injected.clear();
        self.modal = None;
        vec![visitors, Fetch::NextOfKin { prisoner }]
    }

    pub fn select_visitor(&mut self, visitor: VisitorId) -> WorkflowResult<Fetch> {
        let fetch = self.visitors.select_visitor(visitor)?;
        self.drafts = self.drafts.map_all(|d| d.clear_visitor_item());
        Ok(fetch)
    }

    /// Point one row at a visitor item, deriving its classification.
    pub fn select_visitor_item(
        &mut self,
        draft: DraftId,
        item: VisitorItemId,
    ) -> WorkflowResult<Vec<Fetch>> {
        let item = self.visitors.item(item).cloned().ok_or_else(|| {
            WorkflowError::InvalidSelection(format!(
                "visitor item {item} was not brought by the selected visitor"
            ))
        })?;

        let mut fetches = Vec::new();
        let cache = &self.cache;
        let drafts = self.drafts.map_draft(draft, |d| {
            let (d, needed) = classification::select_visitor_item(d, &item, cache);
            fetches = needed;
            d
        })?;
        fetches.retain(|fetch| !classification::already_pending(&drafts, draft, fetch));
        self.drafts = drafts;
        Ok(fetches)
    }

    pub fn add_draft(&mut self) -> WorkflowResult<DraftId> {
        self.ensure_idle()?;
        self.drafts = self.drafts.apply(DraftAction::Add)?;
        Ok(self.drafts.last().id())
    }

    pub fn remove_draft(&mut self, draft: DraftId) -> WorkflowResult<()> {
        self.ensure_idle()?;
        self.drafts = self.drafts.apply(DraftAction::Remove(draft))?;
        if self.modal.as_ref().is_some_and(|m| m.origin == draft) {
            self.modal = None;
        }
        Ok(())
    }

    /// Edit a user-entered field of one row. Choices must come from the options on offer.
    pub fn edit_draft(&mut self, draft: DraftId, edit: DraftEdit) -> WorkflowResult<()> {
        self.ensure_idle()?;
        let row = self
            .drafts
            .get(draft)
            .ok_or(WorkflowError::UnknownDraft(draft))?;

        match &edit {
            DraftEdit::PropertyType(Some(id)) => {
                let types = &row.options().types;
                if !types.items().iter().any(|o| o.id == *id) {
                    return Err(WorkflowError::InvalidSelection(format!(
                        "property type {id} is not offered for this item"
                    )));
                }
            }
            DraftEdit::PropertyStatus(Some(id)) => {
                let statuses = &row.options().statuses;
                if !statuses.items().iter().any(|o| o.id == *id) {
                    return Err(WorkflowError::InvalidSelection(format!(
                        "property status {id} is not offered for this item"
                    )));
                }
            }
            DraftEdit::NextOfKin(Some(id)) => {
                if !self.next_of_kin.items().iter().any(|n| n.id == *id) {
                    return Err(WorkflowError::InvalidSelection(format!(
                        "next of kin {id} is not registered for this prisoner"
                    )));
                }
            }
            _ => {}
        }

        self.drafts = self.drafts.apply(DraftAction::Edit(draft, edit))?;
        Ok(())
    }

    /// Rows are frozen while their creation calls are in flight.
    fn ensure_idle(&self) -> WorkflowResult<()> {
        if self.submitting {
            return Err(WorkflowError::NotReady(
                "a submission is already in progress".to_string(),
            ));
        }
        Ok(())
    }

    /// Route a response to whichever part of the form is waiting for it.
    pub fn apply(&mut self, fetched: Fetched) -> Resolution {
        self.cache.absorb(&fetched);
        match fetched {
            Fetched::Visitors { prisoner, result } => {
                self.visitors.apply_visitors(prisoner, result)
            }
            Fetched::VisitorItems { visitor, result } => self.visitors.apply_items(visitor, result),
            Fetched::NextOfKin { prisoner, result } => self.apply_next_of_kin(prisoner, result),
            Fetched::PropertyTypes { category, result } => {
                let (drafts, resolution) =
                    classification::apply_property_types(&self.drafts, category, &result);
                self.drafts = drafts;
                resolution
            }
            Fetched::PropertyStatuses { category, result } => {
                let (drafts, resolution) =
                    classification::apply_property_statuses(&self.drafts, category, &result);
                self.drafts = drafts;
                resolution
            }
            other @ (Fetched::Lookup { .. } | Fetched::Locations { .. }) => match &mut self.modal {
                Some(modal) => modal.form.apply(&other),
                None => Resolution::Stale,
            },
        }
    }

    fn apply_next_of_kin(
        &mut self,
        prisoner: PrisonerId,
        result: ApiResult<Vec<NextOfKin>>,
    ) -> Resolution {
        let resolution = self.next_of_kin.resolve(&prisoner, result);
        if resolution.is_stale() || self.injected.is_empty() || self.next_of_kin.is_failed() {
            return resolution;
        }

        for record in std::mem::take(&mut self.injected) {
            if !self.next_of_kin.items().iter().any(|n| n.id == record.id) {
                self.next_of_kin.prepend(record);
            }
        }
        match resolution {
            Resolution::Empty if self.next_of_kin.is_ready() => {
                Resolution::Ready(self.next_of_kin.items().len())
            }
            other => other,
        }
    }

    /// Re-issue every failed request on the form.
    pub fn retry(&mut self) -> Vec<Fetch> {
        let mut fetches: Vec<Fetch> = self.visitors.retry().into_iter().collect();
        if let Some(prisoner) = self.next_of_kin.retry() {
            fetches.push(Fetch::NextOfKin { prisoner });
        }

        let mut retried = Vec::new();
        self.drafts = self.drafts.map_all(|d| {
            let (d, needed) = classification::retry(d);
            retried.extend(needed);
            d
        });
        for fetch in retried {
            if !fetches.contains(&fetch) {
                fetches.push(fetch);
            }
        }

        if let Some(modal) = &mut self.modal {
            fetches.extend(modal.form.retry());
        }
        fetches
    }

    /// Open the next-of-kin dialog from row `draft`.
    pub fn open_next_of_kin(&mut self, draft: DraftId) -> WorkflowResult<Vec<Fetch>> {
        let prisoner = self
            .visitors
            .prisoner()
            .ok_or_else(|| WorkflowError::NotReady("select a prisoner first".to_string()))?;
        if !self.drafts.contains(draft) {
            return Err(WorkflowError::UnknownDraft(draft));
        }

        let (form, fetches) = NextOfKinForm::open(prisoner, &self.cache);
        self.modal = Some(NextOfKinModal {
            origin: draft,
            form,
        });
        Ok(fetches)
    }

    pub fn next_of_kin_form(&self) -> Option<&NextOfKinForm> {
        self.modal.as_ref().map(|m| &m.form)
    }

    pub fn next_of_kin_form_mut(&mut self) -> Option<&mut NextOfKinForm> {
        self.modal.as_mut().map(|m| &mut m.form)
    }

    /// Row the open dialog was launched from.
    pub fn next_of_kin_origin(&self) -> Option<DraftId> {
        self.modal.as_ref().map(|m| m.origin)
    }

    pub fn select_next_of_kin_location(
        &mut self,
        level: LocationLevel,
        id: LocationId,
    ) -> WorkflowResult<Option<Fetch>> {
        let modal = self.modal.as_mut().ok_or_else(no_dialog)?;
        modal.form.select_location(level, id, &self.cache)
    }

    pub fn next_of_kin_location(&self) -> Option<&LocationResolver> {
        self.next_of_kin_form().map(NextOfKinForm::location)
    }

    pub fn begin_next_of_kin(&mut self, actor: &Actor) -> WorkflowResult<NewNextOfKin> {
        let modal = self.modal.as_mut().ok_or_else(no_dialog)?;
        modal.form.begin_submit(actor)
    }

    /// Finish the dialog's creation call.
    ///
    /// On success the record goes to the head of this prisoner's next-of-kin list without a
    /// re-fetch, the dialog closes, and no row's selection changes. A list that is still loading
    /// or has failed keeps its state and takes the record once it arrives. On failure the dialog
    /// stays open with its data and the list is untouched.
    pub fn complete_next_of_kin(
        &mut self,
        result: ApiResult<NextOfKin>,
    ) -> WorkflowResult<NextOfKin> {
        let modal = self.modal.as_mut().ok_or_else(no_dialog)?;
        let record = modal.form.finish_submit(result)?;
        self.modal = None;

        if self.next_of_kin.key() == Some(&record.prisoner) {
            if self.next_of_kin.is_loading() || self.next_of_kin.is_failed() {
                self.injected.push(record.clone());
            } else {
                self.next_of_kin.prepend(record.clone());
            }
        }
        tracing::info!(next_of_kin = %record.id, prisoner = %record.prisoner, "next of kin created");
        Ok(record)
    }

    pub fn close_next_of_kin(&mut self) {
        self.modal = None;
    }

    /// Why the form cannot be submitted yet, if anything blocks it outright.
    pub fn blocking_reason(&self) -> Option<String> {
        if let Some(reason) = self.visitors.blocking_reason() {
            return Some(reason);
        }
        self.drafts.iter().enumerate().find_map(|(index, draft)| {
            classification::blocking_reason(draft).map(|reason| format!("item {}: {reason}", index + 1))
        })
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && self.blocking_reason().is_none()
    }

    /// Validate the whole form and hand out one payload per row.
    ///
    /// # Errors
    ///
    /// `WorkflowError::Validation` with every problem found, or `NotReady` while a previous
    /// submission is still running. Nothing is marked as submitting on error.
    pub fn begin_submission(
        &mut self,
        actor: &Actor,
    ) -> WorkflowResult<Vec<(DraftId, NewProperty)>> {
        self.ensure_idle()?;
        let batch = validate_intake(&self.visitors, &self.drafts, actor)?;
        self.submitting = true;
        tracing::info!(items = batch.len(), %actor, "submitting property intake");
        Ok(batch)
    }

    /// Fold the per-row creation results back into the form.
    ///
    /// `results` must be in the order [`Self::begin_submission`] handed the rows out, which is
    /// row order.
    ///
    /// Nothing is retried or rolled back. If every call succeeded the form is cleared (the
    /// reference cache is kept); otherwise created rows are removed and failed rows stay as
    /// they were.
    pub fn finish_submission(
        &mut self,
        results: Vec<(DraftId, ApiResult<Property>)>,
    ) -> SubmissionOutcome {
        self.submitting = false;

        let outcomes: Vec<ItemOutcome> = results
            .iter()
            .enumerate()
            .map(|(index, (draft, result))| ItemOutcome {
                draft: *draft,
                position: index + 1,
                result: result.as_ref().map(|p| p.id).map_err(Clone::clone),
            })
            .collect();

        if outcomes.iter().all(|o| o.result.is_ok()) {
            let created: Vec<Property> = results.into_iter().filter_map(|(_, r)| r.ok()).collect();
            tracing::info!(items = created.len(), "property intake saved");
            self.reset();
            return SubmissionOutcome::Completed(created);
        }

        let saved: Vec<DraftId> = outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.draft)
            .collect();
        self.drafts = self.drafts.without(&saved);

        let report = SubmissionReport { outcomes };
        tracing::warn!(%report, "property intake partially saved");
        SubmissionOutcome::Partial(report)
    }

    /// Clear everything except the reference cache.
    pub fn reset(&mut self) {
        let cache = std::mem::take(&mut self.cache);
        *self = Self::with_cache(cache);
    }
}

impl Default for IntakeForm {
    fn default() -> Self {
        Self::new()
    }
}

fn no_dialog() -> WorkflowError {
    WorkflowError::NotReady("the next-of-kin dialog is not open".to_string())
}

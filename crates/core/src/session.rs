//! Async drivers that connect the form state machines to a [`RecordsApi`].
//!
//! A session owns one form, runs the requests it asks for and feeds the responses back. Progress
//! and outcomes are published on the [`StatusChannel`] handed in by the caller, which may be
//! shared with other sessions on the same screen.

use crate::actor::Actor;
use crate::api::RecordsApi;
use crate::attendance::AttendanceFlag;
use crate::draft::{DraftEdit, DraftId};
use crate::edit::PropertyEditForm;
use crate::error::{WorkflowError, WorkflowResult};
use crate::fetch::{self, Fetch, Fetched};
use crate::intake::{IntakeForm, SubmissionOutcome};
use crate::next_of_kin::NextOfKinForm;
use crate::reference::ReferenceCache;
use crate::remote::Resolution;
use crate::status::{LoadingGuard, Notice, StatusChannel};
use crate::status_change::StatusChangeForm;
use crate::wire::{
    Attendance, LocationId, LocationLevel, NextOfKin, PrisonerId, Property, PropertyId,
    PropertyStatusChange, PropertyStatusId, VisitorId, VisitorItemId,
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;

/// Run `fetches` concurrently and hand each response to `apply`, then publish the most severe
/// empty or failed outcome of the batch.
async fn run_fetches<A, F>(api: &A, status: &StatusChannel, fetches: Vec<Fetch>, mut apply: F)
where
    A: RecordsApi + ?Sized,
    F: FnMut(Fetched) -> Resolution,
{
    if fetches.is_empty() {
        return;
    }
    let guards: Vec<LoadingGuard> = fetches
        .iter()
        .map(|f| status.begin(f.loading_message()))
        .collect();
    let responses = fetch::run_all(api, fetches).await;
    drop(guards);

    let outcomes: Vec<(Fetch, Resolution)> = responses
        .into_iter()
        .map(|fetched| {
            let request = fetched.request();
            (request, apply(fetched))
        })
        .collect();
    status.report_batch(outcomes.iter().map(|(f, r)| (f, r)));
}

/// Publish the notice `error` calls for before handing it back.
fn surface(status: &StatusChannel, error: WorkflowError) -> WorkflowError {
    match &error {
        WorkflowError::Validation(errors) => status.notify(Notice::Validation(errors.clone())),
        WorkflowError::Api(api) => status.notify(Notice::ServerError(api.to_string())),
        _ => {}
    }
    error
}

/// Drives an [`IntakeForm`].
///
/// Each selection holds `&mut self` until its requests have been applied, so a session never
/// has two selections in flight. Callers that let the user change a selection mid-request
/// drive the [`IntakeForm`] directly; its key checks drop the superseded responses.
pub struct IntakeSession<A: RecordsApi + ?Sized> {
    api: Arc<A>,
    form: IntakeForm,
    status: StatusChannel,
}

impl<A: RecordsApi + ?Sized> IntakeSession<A> {
    pub fn new(api: Arc<A>, status: StatusChannel) -> Self {
        Self {
            api,
            form: IntakeForm::new(),
            status,
        }
    }

    pub fn form(&self) -> &IntakeForm {
        &self.form
    }

    pub fn status(&self) -> &StatusChannel {
        &self.status
    }

    async fn load(&mut self, fetches: Vec<Fetch>) {
        let form = &mut self.form;
        run_fetches(&*self.api, &self.status, fetches, |fetched| form.apply(fetched)).await;
    }

    pub async fn select_prisoner(&mut self, prisoner: PrisonerId) {
        let fetches = self.form.select_prisoner(prisoner);
        self.load(fetches).await;
    }

    pub async fn select_visitor(&mut self, visitor: VisitorId) -> WorkflowResult<()> {
        let fetch = self.form.select_visitor(visitor)?;
        self.load(vec![fetch]).await;
        Ok(())
    }

    pub async fn select_visitor_item(
        &mut self,
        draft: DraftId,
        item: VisitorItemId,
    ) -> WorkflowResult<()> {
        let fetches = self.form.select_visitor_item(draft, item)?;
        self.load(fetches).await;
        Ok(())
    }

    pub fn add_draft(&mut self) -> WorkflowResult<DraftId> {
        self.form.add_draft()
    }

    pub fn remove_draft(&mut self, draft: DraftId) -> WorkflowResult<()> {
        self.form.remove_draft(draft)
    }

    pub fn edit_draft(&mut self, draft: DraftId, edit: DraftEdit) -> WorkflowResult<()> {
        self.form.edit_draft(draft, edit)
    }

    /// Re-issue every failed request on the form.
    pub async fn retry(&mut self) {
        self.status.clear_notice();
        let fetches = self.form.retry();
        self.load(fetches).await;
    }

    pub async fn open_next_of_kin(&mut self, draft: DraftId) -> WorkflowResult<()> {
        let fetches = self.form.open_next_of_kin(draft)?;
        self.load(fetches).await;
        Ok(())
    }

    pub fn next_of_kin_form_mut(&mut self) -> Option<&mut NextOfKinForm> {
        self.form.next_of_kin_form_mut()
    }

    pub async fn select_next_of_kin_location(
        &mut self,
        level: LocationLevel,
        id: LocationId,
    ) -> WorkflowResult<()> {
        if let Some(fetch) = self.form.select_next_of_kin_location(level, id)? {
            self.load(vec![fetch]).await;
        }
        Ok(())
    }

    /// Create the next of kin described by the open dialog.
    pub async fn save_next_of_kin(&mut self, actor: &Actor) -> WorkflowResult<NextOfKin> {
        let request = self
            .form
            .begin_next_of_kin(actor)
            .map_err(|e| surface(&self.status, e))?;
        let result = {
            let _guard = self.status.begin("Saving next of kin...");
            self.api.create_next_of_kin(&request).await
        };
        let record = self
            .form
            .complete_next_of_kin(result)
            .map_err(|e| surface(&self.status, e))?;
        self.status.notify(Notice::Success(format!(
            "Next of kin {} added",
            record.full_name()
        )));
        Ok(record)
    }

    pub fn close_next_of_kin(&mut self) {
        self.form.close_next_of_kin();
    }

    /// Validate every row, then issue one creation call per row.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Validation` without touching the backend when any row is
    /// incomplete. Failed creation calls are not errors: they come back in
    /// [`SubmissionOutcome::Partial`].
    pub async fn submit(&mut self, actor: &Actor) -> WorkflowResult<SubmissionOutcome> {
        let batch = self
            .form
            .begin_submission(actor)
            .map_err(|e| surface(&self.status, e))?;
        self.status.clear_notice();

        let api = &*self.api;
        let results = {
            let _guard = self.status.begin(format!("Saving {} items...", batch.len()));
            join_all(batch.into_iter().map(|(draft, request)| async move {
                (draft, api.create_property(&request).await)
            }))
            .await
        };

        let outcome = self.form.finish_submission(results);
        match &outcome {
            SubmissionOutcome::Completed(created) => {
                let message = match created.len() {
                    1 => "1 item saved".to_string(),
                    n => format!("{n} items saved"),
                };
                self.status.notify(Notice::Success(message))
            }
            SubmissionOutcome::Partial(report) => {
                self.status.notify(Notice::PartialSubmission(report.clone()))
            }
        }
        Ok(outcome)
    }
}

/// Drives a [`PropertyEditForm`] for one stored property.
pub struct EditSession<A: RecordsApi + ?Sized> {
    api: Arc<A>,
    form: PropertyEditForm,
    cache: ReferenceCache,
    status: StatusChannel,
}

impl<A: RecordsApi + ?Sized> EditSession<A> {
    /// Fetch property `id` and the options of its category.
    pub async fn load(api: Arc<A>, id: PropertyId, status: StatusChannel) -> WorkflowResult<Self> {
        let property = {
            let _guard = status.begin("Loading property...");
            api.get_property(id).await
        }
        .map_err(|e| surface(&status, e.into()))?;

        let cache = ReferenceCache::default();
        let (form, fetches) = PropertyEditForm::open(property, &cache);
        let mut session = Self {
            api,
            form,
            cache,
            status,
        };
        session.load_options(fetches).await;
        Ok(session)
    }

    async fn load_options(&mut self, fetches: Vec<Fetch>) {
        let form = &mut self.form;
        let cache = &mut self.cache;
        run_fetches(&*self.api, &self.status, fetches, |fetched| {
            cache.absorb(&fetched);
            form.apply(&fetched)
        })
        .await;
    }

    pub fn form(&self) -> &PropertyEditForm {
        &self.form
    }

    pub fn edit(&mut self, edit: DraftEdit, now: DateTime<Utc>) -> WorkflowResult<()> {
        self.form.edit(edit, now)
    }

    /// Choosing a status other than the recorded one opens the status-change dialog.
    pub fn select_status(&mut self, status: PropertyStatusId, now: DateTime<Utc>) -> WorkflowResult<()> {
        self.form.select_status(status, now)
    }

    pub fn status_change_mut(&mut self) -> Option<&mut StatusChangeForm> {
        self.form.status_change_mut()
    }

    pub fn cancel_status_change(&mut self) {
        self.form.cancel_status_change();
    }

    /// Create the audit record for the pending status change.
    pub async fn submit_status_change(
        &mut self,
        actor: &Actor,
    ) -> WorkflowResult<PropertyStatusChange> {
        let request = self
            .form
            .begin_status_change(actor)
            .map_err(|e| surface(&self.status, e))?;
        let result = {
            let _guard = self.status.begin("Recording status change...");
            self.api.create_status_change(&request).await
        };
        let record = self
            .form
            .finish_status_change(result)
            .map_err(|e| surface(&self.status, e))?;
        self.status
            .notify(Notice::Success("Status change recorded".to_string()));
        Ok(record)
    }

    pub async fn retry(&mut self) {
        self.status.clear_notice();
        let fetches = self.form.retry();
        self.load_options(fetches).await;
    }

    /// Save the edited fields with one `PATCH`. The form is re-opened on the stored record.
    pub async fn save(&mut self) -> WorkflowResult<Property> {
        let update = self
            .form
            .validate()
            .map_err(|e| surface(&self.status, e.into()))?;
        let id = self.form.original().id;
        let saved = {
            let _guard = self.status.begin("Saving property...");
            self.api.update_property(id, &update).await
        }
        .map_err(|e| surface(&self.status, e.into()))?;

        let (form, fetches) = PropertyEditForm::open(saved.clone(), &self.cache);
        self.form = form;
        self.load_options(fetches).await;
        self.status
            .notify(Notice::Success(format!("Property {id} saved")));
        Ok(saved)
    }

    /// Delete the property. The session is consumed either way.
    pub async fn delete(self) -> WorkflowResult<()> {
        let id = self.form.original().id;
        let result = {
            let _guard = self.status.begin("Deleting property...");
            self.api.delete_property(id).await
        };
        result.map_err(|e| surface(&self.status, e.into()))?;
        tracing::info!(property = %id, "property deleted");
        self.status
            .notify(Notice::Success(format!("Property {id} deleted")));
        Ok(())
    }
}

/// Create the attendance record for an open prompt on `flag`.
pub async fn record_attendance<A: RecordsApi + ?Sized>(
    api: &A,
    flag: &mut AttendanceFlag,
    actor: &Actor,
    status: &StatusChannel,
) -> WorkflowResult<Attendance> {
    let request = flag.begin_record(actor).map_err(|e| surface(status, e))?;
    let result = {
        let _guard = status.begin("Recording attendance...");
        api.create_attendance(&request).await
    };
    let record = flag.finish_record(result).map_err(|e| surface(status, e))?;
    status.notify(Notice::Success("Attendance recorded".to_string()));
    Ok(record)
}

//! Shared workflow status: a loading indicator plus the latest user-facing notice.
//!
//! One [`StatusChannel`] is created per screen and handed by reference to every nested
//! workflow, which publishes progress through it. Observers subscribe to the underlying watch
//! channel and always see the latest snapshot.

use crate::error::ValidationErrors;
use crate::fetch::Fetch;
use crate::intake::SubmissionReport;
use crate::remote::Resolution;
use std::sync::Arc;
use tokio::sync::watch;

/// A user-facing message, classified by how it should be presented.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    /// A request failed. The selection that triggered it is kept and can be retried.
    ServerError(String),
    /// A request succeeded with no rows. Informational, not an error.
    Empty(String),
    Validation(ValidationErrors),
    PartialSubmission(SubmissionReport),
    Success(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::ServerError(_) | Notice::Validation(_) | Notice::PartialSubmission(_)
        )
    }

    /// The notice a fetch outcome calls for. Ready and stale outcomes call for none.
    pub fn for_fetch(fetch: &Fetch, resolution: &Resolution) -> Option<Notice> {
        match resolution {
            Resolution::Empty => Some(Notice::Empty(fetch.empty_message())),
            Resolution::Failed(error) => Some(Notice::ServerError(fetch.failure_message(error))),
            Resolution::Ready(_) | Resolution::Stale => None,
        }
    }

    /// Errors outrank informational notices when several compete for the slot.
    fn severity(&self) -> u8 {
        match self {
            Notice::Success(_) => 0,
            Notice::Empty(_) => 1,
            Notice::ServerError(_) | Notice::Validation(_) | Notice::PartialSubmission(_) => 2,
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::ServerError(message) | Notice::Empty(message) | Notice::Success(message) => {
                f.write_str(message)
            }
            Notice::Validation(errors) => write!(f, "Please correct the form: {errors}"),
            Notice::PartialSubmission(report) => write!(f, "{report}"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkflowStatus {
    /// Operations currently in flight.
    pub pending: usize,
    /// Progress text of the most recent operation still running.
    pub message: Option<String>,
    pub notice: Option<Notice>,
}

impl WorkflowStatus {
    pub fn loading(&self) -> bool {
        self.pending > 0
    }
}

#[derive(Clone, Debug)]
pub struct StatusChannel {
    tx: Arc<watch::Sender<WorkflowStatus>>,
}

impl StatusChannel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(WorkflowStatus::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowStatus> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> WorkflowStatus {
        self.tx.borrow().clone()
    }

    /// Mark an operation as running until the returned guard is dropped.
    pub fn begin(&self, message: impl Into<String>) -> LoadingGuard {
        let message = message.into();
        self.tx.send_modify(|status| {
            status.pending += 1;
            status.message = Some(message);
        });
        LoadingGuard {
            tx: Arc::clone(&self.tx),
        }
    }

    pub fn notify(&self, notice: Notice) {
        match &notice {
            Notice::ServerError(message) => tracing::warn!(%message, "server error"),
            Notice::Validation(errors) => tracing::debug!(count = errors.len(), "validation failed"),
            Notice::PartialSubmission(report) => {
                tracing::warn!(failed = report.failed().count(), "partial submission")
            }
            Notice::Empty(message) | Notice::Success(message) => tracing::debug!(%message),
        }
        self.tx.send_modify(|status| status.notice = Some(notice));
    }

    pub fn clear_notice(&self) {
        self.tx.send_modify(|status| status.notice = None);
    }

    /// Publish the notice a fetch outcome calls for. Ready and stale outcomes publish nothing.
    pub fn report(&self, fetch: &Fetch, resolution: &Resolution) {
        if let Some(notice) = Notice::for_fetch(fetch, resolution) {
            self.notify(notice);
        }
    }

    /// Publish the single most severe notice of a batch of outcomes.
    ///
    /// `outcomes` are in request order; on equal severity the earlier request wins, so callers
    /// list the requests the user is waiting on first.
    pub fn report_batch<'a>(
        &self,
        outcomes: impl IntoIterator<Item = (&'a Fetch, &'a Resolution)>,
    ) {
        let mut chosen: Option<Notice> = None;
        for notice in outcomes
            .into_iter()
            .filter_map(|(fetch, resolution)| Notice::for_fetch(fetch, resolution))
        {
            if chosen.as_ref().map_or(true, |c| notice.severity() > c.severity()) {
                chosen = Some(notice);
            }
        }
        if let Some(notice) = chosen {
            self.notify(notice);
        }
    }
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the channel in its loading state while alive.
#[must_use = "the operation counts as finished once the guard is dropped"]
pub struct LoadingGuard {
    tx: Arc<watch::Sender<WorkflowStatus>>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.tx.send_modify(|status| {
            status.pending = status.pending.saturating_sub(1);
            if status.pending == 0 {
                status.message = None;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::wire::PrisonerId;

    #[test]
    fn test_nested_operations_keep_loading_until_last_guard_drops() {
        let status = StatusChannel::new();
        let outer = status.begin("Loading visitors...");
        let inner = status.begin("Loading next of kin...");
        assert_eq!(status.snapshot().pending, 2);

        drop(inner);
        assert!(status.snapshot().loading());
        drop(outer);

        let snapshot = status.snapshot();
        assert!(!snapshot.loading());
        assert_eq!(snapshot.message, None);
    }

    #[test]
    fn test_report_distinguishes_empty_from_failure() {
        let status = StatusChannel::new();
        let fetch = Fetch::Visitors {
            prisoner: PrisonerId(2),
        };

        status.report(&fetch, &Resolution::Empty);
        assert!(matches!(status.snapshot().notice, Some(Notice::Empty(_))));

        status.report(
            &fetch,
            &Resolution::Failed(ApiError::Transport("refused".into())),
        );
        let notice = status.snapshot().notice.expect("notice should be set");
        assert!(notice.is_error());
        assert!(notice.to_string().contains("Could not load visitors"));

        status.clear_notice();
        status.report(&fetch, &Resolution::Stale);
        assert_eq!(status.snapshot().notice, None);
    }

    #[test]
    fn test_batch_keeps_failure_over_later_empty() {
        let status = StatusChannel::new();
        let visitors = Fetch::Visitors {
            prisoner: PrisonerId(2),
        };
        let next_of_kin = Fetch::NextOfKin {
            prisoner: PrisonerId(2),
        };
        let failed = Resolution::Failed(ApiError::Transport("refused".into()));

        status.report_batch([(&visitors, &failed), (&next_of_kin, &Resolution::Empty)]);
        let notice = status.snapshot().notice.expect("notice should be set");
        assert!(matches!(notice, Notice::ServerError(ref m) if m.contains("visitors")));

        status.clear_notice();
        status.report_batch([
            (&visitors, &Resolution::Empty),
            (&next_of_kin, &Resolution::Empty),
        ]);
        let notice = status.snapshot().notice.expect("notice should be set");
        assert_eq!(notice, Notice::Empty(visitors.empty_message()));

        status.clear_notice();
        status.report_batch([(&visitors, &Resolution::Ready(2))]);
        assert_eq!(status.snapshot().notice, None);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let status = StatusChannel::new();
        let mut rx = status.subscribe();
        let clone = status.clone();
        clone.notify(Notice::Success("Saved".into()));
        rx.changed().await.expect("sender should be alive");
        assert_eq!(
            rx.borrow().notice,
            Some(Notice::Success("Saved".into()))
        );
    }
}

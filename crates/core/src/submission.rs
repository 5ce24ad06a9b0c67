//! Submit state shared by the create dialogs.

use crate::error::{ApiError, ApiResult, WorkflowError, WorkflowResult};

/// Where a dialog is in its single create call.
///
/// A failed call leaves the dialog open with its data, so `Failed` accepts another attempt.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Submission {
    #[default]
    Editing,
    Submitting,
    Failed(ApiError),
}

impl Submission {
    pub(crate) fn begin(&mut self) -> WorkflowResult<()> {
        if self.is_submitting() {
            return Err(WorkflowError::NotReady(
                "a submission is already in progress".to_string(),
            ));
        }
        *self = Submission::Submitting;
        Ok(())
    }

    /// Record the outcome of the call, passing it through.
    pub(crate) fn finish<T>(&mut self, result: ApiResult<T>) -> ApiResult<T> {
        *self = match &result {
            Ok(_) => Submission::Editing,
            Err(error) => Submission::Failed(error.clone()),
        };
        result
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, Submission::Submitting)
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Submission::Failed(error) => Some(error),
            _ => None,
        }
    }
}

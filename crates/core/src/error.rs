use crate::draft::DraftId;

/// A request to the backend was rejected or never completed.
///
/// This is the "server error" class: surfaced to the user, the triggering selection is kept and
/// the operation can be retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether repeating the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || matches!(status, 408 | 429),
            ApiError::Decode(_) => false,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Form fields that validation can complain about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Prisoner,
    Visitor,
    DraftItems,
    VisitorItem,
    PropertyType,
    PropertyStatus,
    Bag,
    Destination,
    Note,
    FirstName,
    LastName,
    Sex,
    Relationship,
    IdNumber,
    Reason,
    StatusChange,
    AttendedOn,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Prisoner => "prisoner",
            Field::Visitor => "visitor",
            Field::DraftItems => "property items",
            Field::VisitorItem => "visitor item",
            Field::PropertyType => "property type",
            Field::PropertyStatus => "property status",
            Field::Bag => "bag number",
            Field::Destination => "destination",
            Field::Note => "note",
            Field::FirstName => "first name",
            Field::LastName => "last name",
            Field::Sex => "sex",
            Field::Relationship => "relationship",
            Field::IdNumber => "ID number",
            Field::Reason => "reason",
            Field::StatusChange => "status change",
            Field::AttendedOn => "attendance date",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One local validation failure.
///
/// `item` is the 1-based position of the draft row the error belongs to, `None` for form-level
/// fields such as the prisoner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub item: Option<usize>,
    pub draft: Option<DraftId>,
    pub field: Field,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.item {
            Some(position) => write!(f, "item {position}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Every validation failure found in one pass, in form order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// A required form-level field is unset.
    pub fn missing(&mut self, field: Field) {
        self.push(None, field, format!("{field} is required"));
    }

    /// A required field of draft row `position` is unset.
    pub fn missing_on(&mut self, position: usize, draft: DraftId, field: Field) {
        self.push(
            Some((position, draft)),
            field,
            format!("{field} is required"),
        );
    }

    pub fn invalid(&mut self, field: Field, message: impl Into<String>) {
        self.push(None, field, message.into());
    }

    pub fn invalid_on(
        &mut self,
        position: usize,
        draft: DraftId,
        field: Field,
        message: impl Into<String>,
    ) {
        self.push(Some((position, draft)), field, message.into());
    }

    fn push(&mut self, item: Option<(usize, DraftId)>, field: Field, message: String) {
        self.0.push(FieldError {
            item: item.map(|(position, _)| position),
            draft: item.map(|(_, draft)| draft),
            field,
            message,
        });
    }

    /// Whether any error names `field`, on any row.
    pub fn mentions(&self, field: Field) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Errors attached to one draft row.
    pub fn for_draft(&self, draft: DraftId) -> impl Iterator<Item = &FieldError> {
        self.0.iter().filter(move |e| e.draft == Some(draft))
    }

    /// `Ok(value)` when nothing was collected, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    #[error("unknown property item {0}")]
    UnknownDraft(DraftId),
    #[error("not ready: {0}")]
    NotReady(String),
}

impl From<ValidationErrors> for WorkflowError {
    fn from(errors: ValidationErrors) -> Self {
        WorkflowError::Validation(errors)
    }
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_display_every_entry_in_order() {
        let draft = DraftId::new();
        let mut errors = ValidationErrors::new();
        errors.missing(Field::Prisoner);
        errors.missing_on(2, draft, Field::PropertyType);
        errors.invalid_on(2, draft, Field::Bag, "bag number contains invalid characters");

        assert_eq!(
            errors.to_string(),
            "prisoner is required; item 2: property type is required; \
             item 2: bag number contains invalid characters"
        );
        assert_eq!(errors.for_draft(draft).count(), 2);
        assert!(errors.mentions(Field::Bag));
        assert!(!errors.mentions(Field::Visitor));
    }

    #[test]
    fn test_into_result_only_builds_value_when_clean() {
        let clean = ValidationErrors::new().into_result(|| 7);
        assert_eq!(clean, Ok(7));

        let mut errors = ValidationErrors::new();
        errors.missing(Field::Reason);
        let dirty = errors.into_result(|| -> i32 { panic!("must not build") });
        assert!(dirty.is_err());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ApiError::Transport("reset".into()).is_retryable());
        assert!(ApiError::Status {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!ApiError::Status {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!ApiError::Decode("eof".into()).is_retryable());
    }
}

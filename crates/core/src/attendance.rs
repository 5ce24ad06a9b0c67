//! The "mark as attended" toggle on a court appearance.
//!
//! Switching the toggle on does not set the flag directly: it opens a prompt for the attendance
//! record, and only a created record turns the flag on. Switching it off clears the flag and
//! leaves any existing attendance record alone.

use crate::actor::Actor;
use crate::constants::MAX_NOTE_LEN;
use crate::error::{ApiResult, Field, ValidationErrors, WorkflowError, WorkflowResult};
use crate::submission::Submission;
use crate::wire::{AppearanceId, Attendance, AttendanceId, NewAttendance};
use chrono::{DateTime, Utc};

/// Details collected before an attendance record is created.
#[derive(Clone, Debug, PartialEq)]
pub struct AttendancePrompt {
    pub attended_on: DateTime<Utc>,
    pub note: String,
    submission: Submission,
}

/// What a toggle did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttendanceTransition {
    /// The prompt was opened; the flag turns on once the record is created.
    MarkAttended,
    /// The flag was cleared. `linked` is the record that stays on the server, if any.
    ClearAttended { linked: Option<AttendanceId> },
    NoChange,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttendanceFlag {
    appearance: AppearanceId,
    attended: bool,
    linked: Option<Attendance>,
    prompt: Option<AttendancePrompt>,
}

impl AttendanceFlag {
    pub fn new(appearance: AppearanceId) -> Self {
        Self {
            appearance,
            attended: false,
            linked: None,
            prompt: None,
        }
    }

    pub fn appearance(&self) -> AppearanceId {
        self.appearance
    }

    pub fn is_attended(&self) -> bool {
        self.attended
    }

    pub fn linked(&self) -> Option<&Attendance> {
        self.linked.as_ref()
    }

    pub fn prompt(&self) -> Option<&AttendancePrompt> {
        self.prompt.as_ref()
    }

    pub fn prompt_mut(&mut self) -> Option<&mut AttendancePrompt> {
        self.prompt.as_mut()
    }

    pub fn toggle(&mut self, on: bool, now: DateTime<Utc>) -> AttendanceTransition {
        match (on, self.attended, self.prompt.is_some()) {
            (true, false, false) => {
                self.prompt = Some(AttendancePrompt {
                    attended_on: now,
                    note: String::new(),
                    submission: Submission::default(),
                });
                AttendanceTransition::MarkAttended
            }
            (false, true, _) => {
                self.attended = false;
                let linked = self.linked.as_ref().map(|record| record.id);
                tracing::debug!(appearance = %self.appearance, ?linked, "attendance cleared");
                AttendanceTransition::ClearAttended { linked }
            }
            (false, false, true) => {
                self.cancel_prompt();
                AttendanceTransition::NoChange
            }
            _ => AttendanceTransition::NoChange,
        }
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    pub fn begin_record(&mut self, actor: &Actor) -> WorkflowResult<NewAttendance> {
        let appearance = self.appearance;
        let prompt = self
            .prompt
            .as_mut()
            .ok_or_else(|| WorkflowError::NotReady("attendance prompt is not open".to_string()))?;

        let note = prompt.note.trim();
        if note.chars().count() > MAX_NOTE_LEN {
            let mut errors = ValidationErrors::new();
            errors.invalid(
                Field::Note,
                format!("note exceeds maximum length of {MAX_NOTE_LEN} characters"),
            );
            return Err(errors.into());
        }
        let request = NewAttendance {
            appearance,
            attended_on: prompt.attended_on,
            note: (!note.is_empty()).then(|| note.to_string()),
            created_by: actor.id,
        };
        prompt.submission.begin()?;
        Ok(request)
    }

    /// Record the creation outcome; success sets the flag and closes the prompt.
    pub fn finish_record(&mut self, result: ApiResult<Attendance>) -> WorkflowResult<Attendance> {
        let prompt = self
            .prompt
            .as_mut()
            .ok_or_else(|| WorkflowError::NotReady("attendance prompt is not open".to_string()))?;
        let record = prompt.submission.finish(result)?;
        self.attended = true;
        self.linked = Some(record.clone());
        self.prompt = None;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::test_support::actor;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn record() -> Attendance {
        Attendance {
            id: AttendanceId(5),
            appearance: AppearanceId(3),
            attended_on: now(),
            note: None,
        }
    }

    #[test]
    fn test_marking_opens_prompt_without_setting_flag() {
        let mut flag = AttendanceFlag::new(AppearanceId(3));
        assert_eq!(flag.toggle(true, now()), AttendanceTransition::MarkAttended);
        assert!(!flag.is_attended());
        assert_eq!(flag.prompt().map(|p| p.attended_on), Some(now()));
        assert_eq!(flag.toggle(true, now()), AttendanceTransition::NoChange);
    }

    #[test]
    fn test_created_record_sets_flag() {
        let mut flag = AttendanceFlag::new(AppearanceId(3));
        flag.toggle(true, now());
        if let Some(prompt) = flag.prompt_mut() {
            prompt.note = " on time ".into();
        }
        let request = flag.begin_record(&actor()).expect("begin should succeed");
        assert_eq!(request.note.as_deref(), Some("on time"));

        flag.finish_record(Ok(record()))
            .expect("finish should succeed");
        assert!(flag.is_attended());
        assert!(flag.prompt().is_none());
        assert_eq!(flag.linked().map(|a| a.id), Some(AttendanceId(5)));
    }

    #[test]
    fn test_failed_record_keeps_prompt_open() {
        let mut flag = AttendanceFlag::new(AppearanceId(3));
        flag.toggle(true, now());
        flag.begin_record(&actor()).expect("begin should succeed");
        assert!(flag
            .finish_record(Err(ApiError::Transport("reset".into())))
            .is_err());
        assert!(!flag.is_attended());
        assert!(flag.prompt().is_some());
    }

    #[test]
    fn test_clearing_leaves_linked_record() {
        let mut flag = AttendanceFlag::new(AppearanceId(3));
        flag.toggle(true, now());
        flag.begin_record(&actor()).expect("begin should succeed");
        flag.finish_record(Ok(record()))
            .expect("finish should succeed");

        assert_eq!(
            flag.toggle(false, now()),
            AttendanceTransition::ClearAttended {
                linked: Some(AttendanceId(5))
            }
        );
        assert!(!flag.is_attended());
        assert!(flag.linked().is_some());
    }

    #[test]
    fn test_switching_off_cancels_open_prompt() {
        let mut flag = AttendanceFlag::new(AppearanceId(3));
        flag.toggle(true, now());
        assert_eq!(flag.toggle(false, now()), AttendanceTransition::NoChange);
        assert!(flag.prompt().is_none());
    }
}

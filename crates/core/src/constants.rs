//! Constants used throughout the PIMS core crate.
//!
//! Limits enforced locally before anything reaches the backend.

/// Maximum number of property rows one intake form may hold.
pub const MAX_DRAFT_ITEMS: usize = 50;

/// Maximum length of a status-change reason, in characters.
pub const MAX_REASON_LEN: usize = 500;

/// Maximum length of free-text destination and note fields, in characters.
pub const MAX_NOTE_LEN: usize = 1000;

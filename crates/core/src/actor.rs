//! The staff member records are created on behalf of.
//!
//! Every creation payload is stamped with `created_by`. The actor is passed explicitly into the
//! function that builds the payload; there is no ambient "current user".

use crate::wire::UserId;
use pims_types::{NonEmptyText, TextError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    /// Backend user id stamped as `created_by`.
    pub id: UserId,

    /// Display name, used in logs and CLI output.
    pub name: NonEmptyText,
}

impl Actor {
    pub fn new(id: UserId, name: impl AsRef<str>) -> Result<Self, TextError> {
        Ok(Self {
            id,
            name: NonEmptyText::new(name)?,
        })
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

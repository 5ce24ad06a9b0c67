//! Property rows of the multi-item intake form.
//!
//! A [`PropertyDraft`] is never persisted on its own; it lives in a [`DraftList`] owned by one
//! intake form and becomes one `POST /properties` call on submit. Transitions are pure: each
//! takes the current value and returns the next one, so a rejected transition leaves the caller's
//! state untouched.

use crate::constants::MAX_DRAFT_ITEMS;
use crate::error::{WorkflowError, WorkflowResult};
use crate::remote::Remote;
use crate::wire::{
    CategoryId, NextOfKinId, PropertyStatusId, PropertyStatusOption, PropertyTypeId,
    PropertyTypeOption, UnitId, VisitorItem, VisitorItemId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Local identity of a draft row, stable across reordering and removal of its neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(Uuid);

impl DraftId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DraftId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DraftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Facts copied from the selected visitor item. Read-only on the draft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Derived {
    pub visitor_item: VisitorItemId,
    pub name: String,
    pub category: CategoryId,
    pub measurement_unit: UnitId,
    pub quantity: Decimal,
    pub amount: Option<Decimal>,
}

impl From<&VisitorItem> for Derived {
    fn from(item: &VisitorItem) -> Self {
        Self {
            visitor_item: item.id,
            name: item.name.clone(),
            category: item.category,
            measurement_unit: item.measurement_unit,
            quantity: item.quantity,
            amount: item.amount,
        }
    }
}

/// Property type and status options scoped to the draft's item category.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassificationOptions {
    pub types: Remote<CategoryId, PropertyTypeOption>,
    pub statuses: Remote<CategoryId, PropertyStatusOption>,
}

/// A user edit to one draft row.
///
/// Derived fields have no variant: they change only by selecting a visitor item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DraftEdit {
    PropertyType(Option<PropertyTypeId>),
    PropertyStatus(Option<PropertyStatusId>),
    Bag(String),
    Destination(String),
    Note(String),
    NextOfKin(Option<NextOfKinId>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDraft {
    id: DraftId,
    pub(crate) derived: Option<Derived>,
    pub(crate) options: ClassificationOptions,
    property_type: Option<PropertyTypeId>,
    property_status: Option<PropertyStatusId>,
    bag_no: String,
    destination: String,
    note: String,
    next_of_kin: Option<NextOfKinId>,
}

impl PropertyDraft {
    pub fn new() -> Self {
        Self {
            id: DraftId::new(),
            derived: None,
            options: ClassificationOptions::default(),
            property_type: None,
            property_status: None,
            bag_no: String::new(),
            destination: String::new(),
            note: String::new(),
            next_of_kin: None,
        }
    }

    pub fn id(&self) -> DraftId {
        self.id
    }

    pub fn derived(&self) -> Option<&Derived> {
        self.derived.as_ref()
    }

    pub fn visitor_item(&self) -> Option<VisitorItemId> {
        self.derived.as_ref().map(|d| d.visitor_item)
    }

    pub fn category(&self) -> Option<CategoryId> {
        self.derived.as_ref().map(|d| d.category)
    }

    pub fn options(&self) -> &ClassificationOptions {
        &self.options
    }

    pub fn property_type(&self) -> Option<PropertyTypeId> {
        self.property_type
    }

    pub fn property_status(&self) -> Option<PropertyStatusId> {
        self.property_status
    }

    pub fn bag_no(&self) -> &str {
        &self.bag_no
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn next_of_kin(&self) -> Option<NextOfKinId> {
        self.next_of_kin
    }

    pub fn with_edit(mut self, edit: DraftEdit) -> Self {
        match edit {
            DraftEdit::PropertyType(value) => self.property_type = value,
            DraftEdit::PropertyStatus(value) => self.property_status = value,
            DraftEdit::Bag(value) => self.bag_no = value,
            DraftEdit::Destination(value) => self.destination = value,
            DraftEdit::Note(value) => self.note = value,
            DraftEdit::NextOfKin(value) => self.next_of_kin = value,
        }
        self
    }

    /// Replace every derived field with the facts of `item`.
    ///
    /// When the category changes the type, status and their option lists are dropped, since
    /// both are only meaningful within one category.
    pub fn derive_from(mut self, item: &VisitorItem) -> Self {
        if self.category() != Some(item.category) {
            self.property_type = None;
            self.property_status = None;
            self.options = ClassificationOptions::default();
        }
        self.derived = Some(Derived::from(item));
        self
    }

    pub fn clear_visitor_item(mut self) -> Self {
        self.derived = None;
        self.property_type = None;
        self.property_status = None;
        self.options = ClassificationOptions::default();
        self
    }

    pub fn clear_next_of_kin(mut self) -> Self {
        self.next_of_kin = None;
        self
    }

    /// Whether anything has been entered on this row.
    pub fn is_blank(&self) -> bool {
        self.derived.is_none()
            && self.property_type.is_none()
            && self.property_status.is_none()
            && self.bag_no.trim().is_empty()
            && self.destination.trim().is_empty()
            && self.note.trim().is_empty()
            && self.next_of_kin.is_none()
    }
}

impl Default for PropertyDraft {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DraftAction {
    Add,
    Remove(DraftId),
    /// Remove several rows at once, e.g. the ones that were just saved.
    RemoveMany(Vec<DraftId>),
    Edit(DraftId, DraftEdit),
    /// Drop the visitor item (and everything derived from it) on every row.
    ClearVisitorItems,
    ClearNextOfKin,
}

/// The ordered rows of one intake form. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct DraftList {
    drafts: Vec<PropertyDraft>,
}

impl DraftList {
    /// A list holding one blank row.
    pub fn new() -> Self {
        Self {
            drafts: vec![PropertyDraft::new()],
        }
    }

    /// Return the list that results from `action`, leaving `self` unchanged.
    pub fn apply(&self, action: DraftAction) -> WorkflowResult<Self> {
        match action {
            DraftAction::Add => {
                if self.drafts.len() >= MAX_DRAFT_ITEMS {
                    return Err(WorkflowError::NotReady(format!(
                        "an intake holds at most {MAX_DRAFT_ITEMS} items"
                    )));
                }
                let mut drafts = self.drafts.clone();
                drafts.push(PropertyDraft::new());
                Ok(Self { drafts })
            }
            DraftAction::Remove(id) => {
                if !self.contains(id) {
                    return Err(WorkflowError::UnknownDraft(id));
                }
                Ok(self.without(&[id]))
            }
            DraftAction::RemoveMany(ids) => Ok(self.without(&ids)),
            DraftAction::Edit(id, edit) => self.map_draft(id, |draft| draft.with_edit(edit)),
            DraftAction::ClearVisitorItems => Ok(self.map_all(PropertyDraft::clear_visitor_item)),
            DraftAction::ClearNextOfKin => Ok(self.map_all(PropertyDraft::clear_next_of_kin)),
        }
    }

    /// Replace one row with `f(row)`.
    pub fn map_draft(
        &self,
        id: DraftId,
        f: impl FnOnce(PropertyDraft) -> PropertyDraft,
    ) -> WorkflowResult<Self> {
        let index = self
            .drafts
            .iter()
            .position(|d| d.id == id)
            .ok_or(WorkflowError::UnknownDraft(id))?;
        let mut drafts = self.drafts.clone();
        let draft = drafts.remove(index);
        drafts.insert(index, f(draft));
        Ok(Self { drafts })
    }

    pub(crate) fn map_all(&self, f: impl FnMut(PropertyDraft) -> PropertyDraft) -> Self {
        Self {
            drafts: self.drafts.iter().cloned().map(f).collect(),
        }
    }

    pub(crate) fn without(&self, ids: &[DraftId]) -> Self {
        let drafts: Vec<PropertyDraft> = self
            .drafts
            .iter()
            .filter(|d| !ids.contains(&d.id))
            .cloned()
            .collect();
        if drafts.is_empty() {
            Self::new()
        } else {
            Self { drafts }
        }
    }

    pub fn get(&self, id: DraftId) -> Option<&PropertyDraft> {
        self.drafts.iter().find(|d| d.id == id)
    }

    /// 1-based row number as shown to the user.
    pub fn position(&self, id: DraftId) -> Option<usize> {
        self.drafts.iter().position(|d| d.id == id).map(|i| i + 1)
    }

    pub fn contains(&self, id: DraftId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyDraft> {
        self.drafts.iter()
    }

    pub fn ids(&self) -> Vec<DraftId> {
        self.drafts.iter().map(PropertyDraft::id).collect()
    }

    pub fn first(&self) -> &PropertyDraft {
        &self.drafts[0]
    }

    pub fn last(&self) -> &PropertyDraft {
        &self.drafts[self.drafts.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    /// Always false: the list keeps at least one row.
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

impl Default for DraftList {
    fn default() -> Self {
        Self::new()
    }
}

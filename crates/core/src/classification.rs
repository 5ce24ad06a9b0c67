//! Property classification derived from a draft's visitor item.
//!
//! Selecting a visitor item locks category, unit, quantity and amount on the draft and scopes
//! the property type and status choices to that category.

use crate::draft::{DraftList, PropertyDraft};
use crate::error::ApiError;
use crate::fetch::Fetch;
use crate::reference::ReferenceCache;
use crate::remote::{Remote, Resolution};
use crate::wire::{CategoryId, PropertyStatusOption, PropertyTypeOption, VisitorItem};
use crate::DraftId;

/// Point `draft` at `item` and load the category-scoped options it needs.
///
/// Options already settled for the same category are kept; cached options are applied directly.
/// The returned requests are the ones still outstanding.
pub fn select_visitor_item(
    draft: PropertyDraft,
    item: &VisitorItem,
    cache: &ReferenceCache,
) -> (PropertyDraft, Vec<Fetch>) {
    let mut draft = draft.derive_from(item);
    let category = item.category;
    let mut fetches = Vec::new();

    if draft.options.types.key() != Some(&category) || draft.options.types.is_failed() {
        draft.options.types = match cache.property_types(category) {
            Some(rows) => Remote::settled(category, rows.to_vec()),
            None => {
                fetches.push(Fetch::PropertyTypes { category });
                Remote::Loading(category)
            }
        };
    }
    if draft.options.statuses.key() != Some(&category) || draft.options.statuses.is_failed() {
        draft.options.statuses = match cache.property_statuses(category) {
            Some(rows) => Remote::settled(category, rows.to_vec()),
            None => {
                fetches.push(Fetch::PropertyStatuses { category });
                Remote::Loading(category)
            }
        };
    }

    tracing::debug!(
        draft = %draft.id(),
        item = %item.id,
        %category,
        pending = fetches.len(),
        "visitor item selected"
    );
    (draft, fetches)
}

/// Offer a property type list to every draft waiting on `category`.
pub fn apply_property_types(
    drafts: &DraftList,
    category: CategoryId,
    result: &Result<Vec<PropertyTypeOption>, ApiError>,
) -> (DraftList, Resolution) {
    let mut resolution = Resolution::Stale;
    let next = drafts.map_all(|mut draft| {
        let outcome = draft.options.types.resolve(&category, result.clone());
        if !outcome.is_stale() {
            let valid = draft
                .property_type()
                .is_some_and(|id| draft.options.types.items().iter().any(|o| o.id == id));
            if !valid {
                draft = draft.with_edit(crate::DraftEdit::PropertyType(None));
            }
        }
        resolution = std::mem::replace(&mut resolution, Resolution::Stale).merge(outcome);
        draft
    });
    (next, resolution)
}

/// Offer a property status list to every draft waiting on `category`.
pub fn apply_property_statuses(
    drafts: &DraftList,
    category: CategoryId,
    result: &Result<Vec<PropertyStatusOption>, ApiError>,
) -> (DraftList, Resolution) {
    let mut resolution = Resolution::Stale;
    let next = drafts.map_all(|mut draft| {
        let outcome = draft.options.statuses.resolve(&category, result.clone());
        if !outcome.is_stale() {
            let valid = draft
                .property_status()
                .is_some_and(|id| draft.options.statuses.items().iter().any(|o| o.id == id));
            if !valid {
                draft = draft.with_edit(crate::DraftEdit::PropertyStatus(None));
            }
        }
        resolution = std::mem::replace(&mut resolution, Resolution::Stale).merge(outcome);
        draft
    });
    (next, resolution)
}

/// Re-request failed option lists on one draft.
pub fn retry(draft: PropertyDraft) -> (PropertyDraft, Vec<Fetch>) {
    let mut draft = draft;
    let mut fetches = Vec::new();
    if let Some(category) = draft.options.types.retry() {
        fetches.push(Fetch::PropertyTypes { category });
    }
    if let Some(category) = draft.options.statuses.retry() {
        fetches.push(Fetch::PropertyStatuses { category });
    }
    (draft, fetches)
}

/// Why `draft` cannot be submitted because of its option lists, if it cannot.
pub fn blocking_reason(draft: &PropertyDraft) -> Option<String> {
    let category = draft.category()?;
    let describe = |what: &str, loading: bool, empty: bool, error: Option<&ApiError>| {
        if loading {
            Some(format!("{what} are still loading"))
        } else if empty {
            Some(format!(
                "no {what} are configured for item category {category}"
            ))
        } else {
            error.map(|e| format!("{what} could not be loaded: {e}"))
        }
    };
    let types = &draft.options.types;
    let statuses = &draft.options.statuses;
    describe(
        "property types",
        types.is_loading(),
        types.is_empty(),
        types.error(),
    )
    .or_else(|| {
        describe(
            "property statuses",
            statuses.is_loading(),
            statuses.is_empty(),
            statuses.error(),
        )
    })
}

/// Drafts other than `except` already waiting on `fetch`.
pub(crate) fn already_pending(drafts: &DraftList, except: DraftId, fetch: &Fetch) -> bool {
    drafts.iter().filter(|d| d.id() != except).any(|d| match fetch {
        Fetch::PropertyTypes { category } => d.options.types == Remote::Loading(*category),
        Fetch::PropertyStatuses { category } => d.options.statuses == Remote::Loading(*category),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::DraftEdit;
    use crate::fetch::Fetched;
    use crate::test_support::{status_option, type_option, visitor_item};
    use crate::wire::{PropertyStatusId, PropertyTypeId};

    #[test]
    fn test_selecting_item_requests_category_scoped_options() {
        let cache = ReferenceCache::default();
        let (draft, fetches) =
            select_visitor_item(PropertyDraft::new(), &visitor_item(10, 1, 3), &cache);

        assert_eq!(
            fetches,
            vec![
                Fetch::PropertyTypes {
                    category: CategoryId(3)
                },
                Fetch::PropertyStatuses {
                    category: CategoryId(3)
                },
            ]
        );
        assert_eq!(draft.category(), Some(CategoryId(3)));
        assert!(draft.options().types.is_loading());
        assert!(draft.options().statuses.is_loading());
    }

    #[test]
    fn test_cached_options_apply_without_requests() {
        let mut cache = ReferenceCache::default();
        cache.absorb(&Fetched::PropertyTypes {
            category: CategoryId(3),
            result: Ok(vec![type_option(1, "Cash")]),
        });
        let (draft, fetches) =
            select_visitor_item(PropertyDraft::new(), &visitor_item(10, 1, 3), &cache);
        assert_eq!(
            fetches,
            vec![Fetch::PropertyStatuses {
                category: CategoryId(3)
            }]
        );
        assert!(draft.options().types.is_ready());
    }

    #[test]
    fn test_reselect_in_new_category_reloads_options() {
        let cache = ReferenceCache::default();
        let (draft, _) = select_visitor_item(PropertyDraft::new(), &visitor_item(10, 1, 3), &cache);
        let (draft, fetches) = select_visitor_item(draft, &visitor_item(11, 1, 4), &cache);
        assert_eq!(fetches.len(), 2);
        assert_eq!(draft.options().types, Remote::Loading(CategoryId(4)));
    }

    #[test]
    fn test_options_resolve_every_waiting_draft() {
        let cache = ReferenceCache::default();
        let list = DraftList::new()
            .apply(crate::draft::DraftAction::Add)
            .expect("add should succeed");
        let ids = list.ids();
        let list = list
            .map_draft(ids[0], |d| select_visitor_item(d, &visitor_item(10, 1, 3), &cache).0)
            .and_then(|l| {
                l.map_draft(ids[1], |d| select_visitor_item(d, &visitor_item(11, 1, 3), &cache).0)
            })
            .expect("map should succeed");

        let (list, resolution) =
            apply_property_types(&list, CategoryId(3), &Ok(vec![type_option(1, "Cash")]));
        assert_eq!(resolution, Resolution::Ready(1));
        assert!(list.iter().all(|d| d.options().types.is_ready()));

        let (_, again) = apply_property_types(&list, CategoryId(3), &Ok(vec![]));
        assert_eq!(again, Resolution::Stale);
    }

    #[test]
    fn test_empty_status_list_blocks_but_keeps_draft_editable() {
        let cache = ReferenceCache::default();
        let list = DraftList::new();
        let id = list.first().id();
        let list = list
            .map_draft(id, |d| select_visitor_item(d, &visitor_item(10, 1, 3), &cache).0)
            .expect("map should succeed");
        let (list, _) =
            apply_property_types(&list, CategoryId(3), &Ok(vec![type_option(1, "Cash")]));
        let (list, resolution) = apply_property_statuses(&list, CategoryId(3), &Ok(vec![]));
        assert_eq!(resolution, Resolution::Empty);

        let list = list
            .apply(crate::draft::DraftAction::Edit(
                id,
                DraftEdit::PropertyType(Some(PropertyTypeId(1))),
            ))
            .expect("edit should succeed");
        let draft = list.get(id).expect("draft should exist");
        assert_eq!(draft.property_type(), Some(PropertyTypeId(1)));
        let reason = blocking_reason(draft).expect("empty statuses should block");
        assert!(reason.contains("no property statuses"), "{reason}");
    }

    #[test]
    fn test_selection_outside_new_options_is_dropped() {
        let cache = ReferenceCache::default();
        let (draft, _) = select_visitor_item(PropertyDraft::new(), &visitor_item(10, 1, 3), &cache);
        let draft = draft.with_edit(DraftEdit::PropertyStatus(Some(PropertyStatusId(9))));
        let id = draft.id();
        let single = DraftList::new().map_all(|_| draft.clone());
        let (single, _) = apply_property_statuses(
            &single,
            CategoryId(3),
            &Ok(vec![status_option(1, "In store")]),
        );
        assert_eq!(single.get(id).and_then(PropertyDraft::property_status), None);
    }

    #[test]
    fn test_failed_options_retry_same_category() {
        let cache = ReferenceCache::default();
        let (draft, _) = select_visitor_item(PropertyDraft::new(), &visitor_item(10, 1, 3), &cache);
        let single = DraftList::new().map_all(|_| draft.clone());
        let (single, resolution) = apply_property_types(
            &single,
            CategoryId(3),
            &Err(ApiError::Transport("reset".into())),
        );
        assert!(matches!(resolution, Resolution::Failed(_)));
        let failed = single.first().clone();
        assert!(blocking_reason(&failed)
            .expect("failed types should block")
            .contains("could not be loaded"));

        let (_, fetches) = retry(failed);
        assert_eq!(
            fetches,
            vec![Fetch::PropertyTypes {
                category: CategoryId(3)
            }]
        );
    }
}

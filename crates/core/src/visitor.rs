//! Prisoner → visitor → visitor-item resolution.
//!
//! The state is a single tagged union: a visitor selection can only exist inside a settled,
//! non-empty visitor list, and visitor items only under a selected visitor. No visitor request
//! can be produced without a concrete prisoner id, and no item request without a visitor id.

use crate::error::{ApiError, WorkflowError, WorkflowResult};
use crate::fetch::Fetch;
use crate::remote::Resolution;
use crate::wire::{PrisonerId, Visitor, VisitorId, VisitorItem, VisitorItemId};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum VisitorStage {
    #[default]
    NoPrisoner,
    VisitorsLoading {
        prisoner: PrisonerId,
    },
    VisitorsEmpty {
        prisoner: PrisonerId,
    },
    VisitorsFailed {
        prisoner: PrisonerId,
        error: ApiError,
    },
    VisitorsReady {
        prisoner: PrisonerId,
        visitors: Vec<Visitor>,
        selection: VisitorSelection,
    },
}

/// Visitor choice within a ready visitor list.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum VisitorSelection {
    #[default]
    Unselected,
    ItemsLoading {
        visitor: VisitorId,
    },
    ItemsEmpty {
        visitor: VisitorId,
    },
    ItemsFailed {
        visitor: VisitorId,
        error: ApiError,
    },
    ItemsReady {
        visitor: VisitorId,
        items: Vec<VisitorItem>,
    },
}

impl VisitorSelection {
    fn visitor(&self) -> Option<VisitorId> {
        match self {
            VisitorSelection::Unselected => None,
            VisitorSelection::ItemsLoading { visitor }
            | VisitorSelection::ItemsEmpty { visitor }
            | VisitorSelection::ItemsFailed { visitor, .. }
            | VisitorSelection::ItemsReady { visitor, .. } => Some(*visitor),
        }
    }
}

/// Flattened view of [`VisitorStage`] for display and assertions.
///
/// Selecting a prisoner or a visitor issues the dependent request in the same transition, so the
/// intermediate "selected" steps surface directly as the corresponding `*Loading` phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntakePhase {
    NoPrisoner,
    VisitorsLoading,
    VisitorsEmpty,
    VisitorsFailed,
    VisitorsReady,
    ItemsLoading,
    ItemsEmpty,
    ItemsFailed,
    ItemsReady,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisitorResolver {
    stage: VisitorStage,
}

impl VisitorResolver {
    /// Start over for `prisoner`, dropping any visitor and item selection.
    pub fn select_prisoner(&mut self, prisoner: PrisonerId) -> Fetch {
        tracing::debug!(%prisoner, "prisoner selected");
        self.stage = VisitorStage::VisitorsLoading { prisoner };
        Fetch::Visitors { prisoner }
    }

    pub fn apply_visitors(
        &mut self,
        prisoner: PrisonerId,
        result: Result<Vec<Visitor>, ApiError>,
    ) -> Resolution {
        match self.stage {
            VisitorStage::VisitorsLoading { prisoner: current } if current == prisoner => {}
            _ => {
                tracing::warn!(%prisoner, "discarding stale visitor list");
                return Resolution::Stale;
            }
        }

        let (stage, resolution) = match result {
            Ok(visitors) if visitors.is_empty() => {
                (VisitorStage::VisitorsEmpty { prisoner }, Resolution::Empty)
            }
            Ok(visitors) => {
                let count = visitors.len();
                (
                    VisitorStage::VisitorsReady {
                        prisoner,
                        visitors,
                        selection: VisitorSelection::Unselected,
                    },
                    Resolution::Ready(count),
                )
            }
            Err(error) => {
                tracing::warn!(%prisoner, %error, "visitor list failed");
                (
                    VisitorStage::VisitorsFailed {
                        prisoner,
                        error: error.clone(),
                    },
                    Resolution::Failed(error),
                )
            }
        };
        self.stage = stage;
        resolution
    }

    /// Choose a visitor from the ready list; any previous item list is dropped.
    pub fn select_visitor(&mut self, visitor: VisitorId) -> WorkflowResult<Fetch> {
        let VisitorStage::VisitorsReady {
            visitors,
            selection,
            ..
        } = &mut self.stage
        else {
            return Err(WorkflowError::NotReady(
                "visitors have not been loaded for a prisoner".to_string(),
            ));
        };
        if !visitors.iter().any(|v| v.id == visitor) {
            return Err(WorkflowError::InvalidSelection(format!(
                "visitor {visitor} is not registered for this prisoner"
            )));
        }

        tracing::debug!(%visitor, "visitor selected");
        *selection = VisitorSelection::ItemsLoading { visitor };
        Ok(Fetch::VisitorItems { visitor })
    }

    pub fn apply_items(
        &mut self,
        visitor: VisitorId,
        result: Result<Vec<VisitorItem>, ApiError>,
    ) -> Resolution {
        let selection = match &mut self.stage {
            VisitorStage::VisitorsReady { selection, .. }
                if *selection == (VisitorSelection::ItemsLoading { visitor }) =>
            {
                selection
            }
            _ => {
                tracing::warn!(%visitor, "discarding stale visitor items");
                return Resolution::Stale;
            }
        };

        match result {
            Ok(items) if items.is_empty() => {
                *selection = VisitorSelection::ItemsEmpty { visitor };
                Resolution::Empty
            }
            Ok(items) => {
                let count = items.len();
                *selection = VisitorSelection::ItemsReady { visitor, items };
                Resolution::Ready(count)
            }
            Err(error) => {
                tracing::warn!(%visitor, %error, "visitor items failed");
                *selection = VisitorSelection::ItemsFailed {
                    visitor,
                    error: error.clone(),
                };
                Resolution::Failed(error)
            }
        }
    }

    /// Re-issue whichever request failed, keeping the selection that triggered it.
    pub fn retry(&mut self) -> Option<Fetch> {
        match self.stage {
            VisitorStage::VisitorsFailed { prisoner, .. } => Some(self.select_prisoner(prisoner)),
            VisitorStage::VisitorsReady {
                ref mut selection, ..
            } => match *selection {
                VisitorSelection::ItemsFailed { visitor, .. } => {
                    *selection = VisitorSelection::ItemsLoading { visitor };
                    Some(Fetch::VisitorItems { visitor })
                }
                _ => None,
            },
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.stage = VisitorStage::NoPrisoner;
    }

    pub fn stage(&self) -> &VisitorStage {
        &self.stage
    }

    pub fn phase(&self) -> IntakePhase {
        match &self.stage {
            VisitorStage::NoPrisoner => IntakePhase::NoPrisoner,
            VisitorStage::VisitorsLoading { .. } => IntakePhase::VisitorsLoading,
            VisitorStage::VisitorsEmpty { .. } => IntakePhase::VisitorsEmpty,
            VisitorStage::VisitorsFailed { .. } => IntakePhase::VisitorsFailed,
            VisitorStage::VisitorsReady { selection, .. } => match selection {
                VisitorSelection::Unselected => IntakePhase::VisitorsReady,
                VisitorSelection::ItemsLoading { .. } => IntakePhase::ItemsLoading,
                VisitorSelection::ItemsEmpty { .. } => IntakePhase::ItemsEmpty,
                VisitorSelection::ItemsFailed { .. } => IntakePhase::ItemsFailed,
                VisitorSelection::ItemsReady { .. } => IntakePhase::ItemsReady,
            },
        }
    }

    pub fn prisoner(&self) -> Option<PrisonerId> {
        match &self.stage {
            VisitorStage::NoPrisoner => None,
            VisitorStage::VisitorsLoading { prisoner }
            | VisitorStage::VisitorsEmpty { prisoner }
            | VisitorStage::VisitorsFailed { prisoner, .. }
            | VisitorStage::VisitorsReady { prisoner, .. } => Some(*prisoner),
        }
    }

    pub fn visitors(&self) -> &[Visitor] {
        match &self.stage {
            VisitorStage::VisitorsReady { visitors, .. } => visitors,
            _ => &[],
        }
    }

    /// Visitors matching a free-text query, in list order.
    pub fn search<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Visitor> + 'a {
        self.visitors().iter().filter(move |v| v.matches(query))
    }

    pub fn selected_visitor(&self) -> Option<&Visitor> {
        match &self.stage {
            VisitorStage::VisitorsReady {
                visitors,
                selection,
                ..
            } => {
                let id = selection.visitor()?;
                visitors.iter().find(|v| v.id == id)
            }
            _ => None,
        }
    }

    pub fn items(&self) -> &[VisitorItem] {
        match &self.stage {
            VisitorStage::VisitorsReady {
                selection: VisitorSelection::ItemsReady { items, .. },
                ..
            } => items,
            _ => &[],
        }
    }

    pub fn item(&self, id: VisitorItemId) -> Option<&VisitorItem> {
        self.items().iter().find(|item| item.id == id)
    }

    pub fn error(&self) -> Option<&ApiError> {
        match &self.stage {
            VisitorStage::VisitorsFailed { error, .. } => Some(error),
            VisitorStage::VisitorsReady {
                selection: VisitorSelection::ItemsFailed { error, .. },
                ..
            } => Some(error),
            _ => None,
        }
    }

    /// Why the intake cannot progress past this resolver, if it cannot.
    pub fn blocking_reason(&self) -> Option<String> {
        let reason = match self.phase() {
            IntakePhase::ItemsReady => return None,
            IntakePhase::NoPrisoner => "Select a prisoner.".to_string(),
            IntakePhase::VisitorsLoading => "Visitors are still loading.".to_string(),
            IntakePhase::VisitorsEmpty => self
                .prisoner()
                .map(|prisoner| Fetch::Visitors { prisoner }.empty_message())
                .unwrap_or_default(),
            IntakePhase::VisitorsFailed | IntakePhase::ItemsFailed => {
                let detail = self.error().map(ToString::to_string).unwrap_or_default();
                format!("Loading failed ({detail}). Retry to continue.")
            }
            IntakePhase::VisitorsReady => "Select a visitor.".to_string(),
            IntakePhase::ItemsLoading => "Visitor items are still loading.".to_string(),
            IntakePhase::ItemsEmpty => "No items have been recorded for this visitor.".to_string(),
        };
        Some(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{visitor, visitor_item};

    fn ready_for_prisoner_one() -> VisitorResolver {
        let mut resolver = VisitorResolver::default();
        resolver.select_prisoner(PrisonerId(1));
        resolver.apply_visitors(
            PrisonerId(1),
            Ok(vec![visitor(1, 1, "Jane", "Doe"), visitor(2, 1, "Peter", "Okot")]),
        );
        resolver
    }

    #[test]
    fn test_prisoner_selection_requests_visitors() {
        let mut resolver = VisitorResolver::default();
        assert_eq!(resolver.phase(), IntakePhase::NoPrisoner);

        let fetch = resolver.select_prisoner(PrisonerId(7));
        assert_eq!(
            fetch,
            Fetch::Visitors {
                prisoner: PrisonerId(7)
            }
        );
        assert_eq!(resolver.phase(), IntakePhase::VisitorsLoading);
        assert_eq!(resolver.prisoner(), Some(PrisonerId(7)));
    }

    #[test]
    fn test_zero_visitors_is_empty_not_failed() {
        let mut resolver = VisitorResolver::default();
        resolver.select_prisoner(PrisonerId(2));
        assert_eq!(
            resolver.apply_visitors(PrisonerId(2), Ok(vec![])),
            Resolution::Empty
        );
        assert_eq!(resolver.phase(), IntakePhase::VisitorsEmpty);
        assert_eq!(
            resolver.stage(),
            &VisitorStage::VisitorsEmpty {
                prisoner: PrisonerId(2)
            }
        );

        let reason = resolver.blocking_reason().expect("empty visitors should block");
        assert!(reason.contains("no registered visitors"), "{reason}");
        assert_eq!(resolver.retry(), None);
    }

    #[test]
    fn test_failed_visitors_can_be_retried() {
        let mut resolver = VisitorResolver::default();
        resolver.select_prisoner(PrisonerId(1));
        resolver.apply_visitors(PrisonerId(1), Err(ApiError::Transport("reset".into())));
        assert_eq!(resolver.phase(), IntakePhase::VisitorsFailed);
        assert_eq!(resolver.prisoner(), Some(PrisonerId(1)));

        assert_eq!(
            resolver.retry(),
            Some(Fetch::Visitors {
                prisoner: PrisonerId(1)
            })
        );
        assert_eq!(resolver.phase(), IntakePhase::VisitorsLoading);
    }

    #[test]
    fn test_stale_visitor_list_is_discarded() {
        let mut resolver = VisitorResolver::default();
        resolver.select_prisoner(PrisonerId(1));
        resolver.select_prisoner(PrisonerId(2));

        let late = resolver.apply_visitors(PrisonerId(1), Ok(vec![visitor(1, 1, "Jane", "Doe")]));
        assert_eq!(late, Resolution::Stale);
        assert_eq!(resolver.phase(), IntakePhase::VisitorsLoading);
        assert!(resolver.visitors().is_empty());
    }

    #[test]
    fn test_visitor_selection_requests_items() {
        let mut resolver = ready_for_prisoner_one();
        assert_eq!(resolver.phase(), IntakePhase::VisitorsReady);

        let fetch = resolver
            .select_visitor(VisitorId(2))
            .expect("select should succeed");
        assert_eq!(
            fetch,
            Fetch::VisitorItems {
                visitor: VisitorId(2)
            }
        );
        assert_eq!(resolver.phase(), IntakePhase::ItemsLoading);
        assert_eq!(
            resolver.selected_visitor().map(|v| v.full_name()),
            Some("Peter Okot".to_string())
        );

        resolver.apply_items(VisitorId(2), Ok(vec![visitor_item(20, 2, 1)]));
        assert_eq!(resolver.phase(), IntakePhase::ItemsReady);
        assert!(resolver.item(VisitorItemId(20)).is_some());
        assert_eq!(resolver.blocking_reason(), None);
    }

    #[test]
    fn test_no_item_request_without_visitors() {
        let mut resolver = VisitorResolver::default();
        assert!(resolver.select_visitor(VisitorId(1)).is_err());

        let mut resolver = ready_for_prisoner_one();
        let err = resolver
            .select_visitor(VisitorId(99))
            .expect_err("unknown visitor should be rejected");
        assert!(matches!(err, WorkflowError::InvalidSelection(_)));
        assert_eq!(resolver.phase(), IntakePhase::VisitorsReady);
    }

    #[test]
    fn test_switching_visitor_discards_previous_items() {
        let mut resolver = ready_for_prisoner_one();
        resolver
            .select_visitor(VisitorId(1))
            .expect("select should succeed");
        resolver
            .select_visitor(VisitorId(2))
            .expect("select should succeed");

        let late = resolver.apply_items(VisitorId(1), Ok(vec![visitor_item(10, 1, 1)]));
        assert_eq!(late, Resolution::Stale);
        assert!(resolver.items().is_empty());

        resolver.apply_items(VisitorId(2), Ok(vec![]));
        assert_eq!(resolver.phase(), IntakePhase::ItemsEmpty);
    }

    #[test]
    fn test_new_prisoner_resets_visitor_and_items() {
        let mut resolver = ready_for_prisoner_one();
        resolver
            .select_visitor(VisitorId(1))
            .expect("select should succeed");
        resolver.apply_items(VisitorId(1), Ok(vec![visitor_item(10, 1, 1)]));

        resolver.select_prisoner(PrisonerId(3));
        assert_eq!(resolver.selected_visitor(), None);
        assert!(resolver.items().is_empty());
        assert_eq!(resolver.phase(), IntakePhase::VisitorsLoading);
    }

    #[test]
    fn test_failed_items_retry_keeps_visitor() {
        let mut resolver = ready_for_prisoner_one();
        resolver
            .select_visitor(VisitorId(1))
            .expect("select should succeed");
        resolver.apply_items(
            VisitorId(1),
            Err(ApiError::Status {
                status: 502,
                body: "bad gateway".into(),
            }),
        );
        assert_eq!(resolver.phase(), IntakePhase::ItemsFailed);
        assert_eq!(
            resolver.retry(),
            Some(Fetch::VisitorItems {
                visitor: VisitorId(1)
            })
        );
        assert_eq!(resolver.phase(), IntakePhase::ItemsLoading);
    }

    #[test]
    fn test_search_filters_ready_visitors() {
        let resolver = ready_for_prisoner_one();
        let names: Vec<String> = resolver.search("okot").map(Visitor::full_name).collect();
        assert_eq!(names, vec!["Peter Okot".to_string()]);
        assert_eq!(resolver.search("").count(), 2);
    }
}

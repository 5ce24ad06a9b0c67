//! Data requests issued by the form state machines, and their typed responses.
//!
//! A form never performs IO itself. Each transition that needs server data returns one or more
//! [`Fetch`] values carrying the exact scoping parameters of the request. The caller runs them
//! with [`run`] and hands the resulting [`Fetched`] back to the form, which compares those
//! parameters with its current selection before applying anything.

use crate::api::RecordsApi;
use crate::error::{ApiError, ApiResult};
use crate::wire::{
    CategoryId, Location, LocationId, LocationLevel, Lookup, LookupKind, NextOfKin, Page,
    PrisonerId, PropertyStatusOption, PropertyTypeOption, Visitor, VisitorId, VisitorItem,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fetch {
    Locations {
        level: LocationLevel,
        parent: Option<LocationId>,
    },
    Lookup(LookupKind),
    Visitors {
        prisoner: PrisonerId,
    },
    VisitorItems {
        visitor: VisitorId,
    },
    NextOfKin {
        prisoner: PrisonerId,
    },
    PropertyTypes {
        category: CategoryId,
    },
    PropertyStatuses {
        category: CategoryId,
    },
}

impl Fetch {
    /// Progress text shown while the request is in flight.
    pub fn loading_message(&self) -> String {
        match self {
            Fetch::Locations { level, .. } => format!("Loading {}...", level.plural()),
            Fetch::Lookup(kind) => format!("Loading {}...", kind.label()),
            Fetch::Visitors { .. } => "Loading visitors...".to_string(),
            Fetch::VisitorItems { .. } => "Loading visitor items...".to_string(),
            Fetch::NextOfKin { .. } => "Loading next of kin...".to_string(),
            Fetch::PropertyTypes { .. } => "Loading property types...".to_string(),
            Fetch::PropertyStatuses { .. } => "Loading property statuses...".to_string(),
        }
    }

    /// Explanation shown when the request succeeded with zero rows.
    pub fn empty_message(&self) -> String {
        match self {
            Fetch::Locations {
                level,
                parent: None,
            } => format!("No {} have been set up.", level.plural()),
            Fetch::Locations { level, .. } => {
                let parent = level.parent().map_or("parent", |p| p.label());
                format!("No {} found for the selected {parent}.", level.plural())
            }
            Fetch::Lookup(kind) => format!("No {} have been set up.", kind.label()),
            Fetch::Visitors { .. } => "This prisoner has no registered visitors. \
                 Register a visitor before recording property."
                .to_string(),
            Fetch::VisitorItems { .. } => {
                "No items have been recorded for this visitor.".to_string()
            }
            Fetch::NextOfKin { .. } => "This prisoner has no next of kin on record.".to_string(),
            Fetch::PropertyTypes { .. } => {
                "No property types are configured for this item category.".to_string()
            }
            Fetch::PropertyStatuses { .. } => {
                "No property statuses are configured for this item category.".to_string()
            }
        }
    }

    /// Notification text for a failed request.
    pub fn failure_message(&self, error: &ApiError) -> String {
        let what = match self {
            Fetch::Locations { level, .. } => level.plural(),
            Fetch::Lookup(kind) => kind.label(),
            Fetch::Visitors { .. } => "visitors",
            Fetch::VisitorItems { .. } => "visitor items",
            Fetch::NextOfKin { .. } => "next of kin",
            Fetch::PropertyTypes { .. } => "property types",
            Fetch::PropertyStatuses { .. } => "property statuses",
        };
        format!("Could not load {what}: {error}")
    }
}

/// A completed [`Fetch`]: the request parameters echoed back with the result.
#[derive(Clone, Debug, PartialEq)]
pub enum Fetched {
    Locations {
        level: LocationLevel,
        parent: Option<LocationId>,
        result: ApiResult<Vec<Location>>,
    },
    Lookup {
        kind: LookupKind,
        result: ApiResult<Vec<Lookup>>,
    },
    Visitors {
        prisoner: PrisonerId,
        result: ApiResult<Vec<Visitor>>,
    },
    VisitorItems {
        visitor: VisitorId,
        result: ApiResult<Vec<VisitorItem>>,
    },
    NextOfKin {
        prisoner: PrisonerId,
        result: ApiResult<Vec<NextOfKin>>,
    },
    PropertyTypes {
        category: CategoryId,
        result: ApiResult<Vec<PropertyTypeOption>>,
    },
    PropertyStatuses {
        category: CategoryId,
        result: ApiResult<Vec<PropertyStatusOption>>,
    },
}

impl Fetched {
    /// The request this response answers.
    pub fn request(&self) -> Fetch {
        match self {
            Fetched::Locations { level, parent, .. } => Fetch::Locations {
                level: *level,
                parent: *parent,
            },
            Fetched::Lookup { kind, .. } => Fetch::Lookup(*kind),
            Fetched::Visitors { prisoner, .. } => Fetch::Visitors {
                prisoner: *prisoner,
            },
            Fetched::VisitorItems { visitor, .. } => Fetch::VisitorItems { visitor: *visitor },
            Fetched::NextOfKin { prisoner, .. } => Fetch::NextOfKin {
                prisoner: *prisoner,
            },
            Fetched::PropertyTypes { category, .. } => Fetch::PropertyTypes {
                category: *category,
            },
            Fetched::PropertyStatuses { category, .. } => Fetch::PropertyStatuses {
                category: *category,
            },
        }
    }
}

fn rows<T>(page: ApiResult<Page<T>>) -> ApiResult<Vec<T>> {
    page.map(Page::into_results)
}

/// Perform one request against `api`.
pub async fn run<A: RecordsApi + ?Sized>(api: &A, fetch: Fetch) -> Fetched {
    match fetch {
        Fetch::Locations { level, parent } => Fetched::Locations {
            level,
            parent,
            result: rows(api.list_locations(level, parent).await),
        },
        Fetch::Lookup(kind) => Fetched::Lookup {
            kind,
            result: rows(api.list_lookups(kind).await),
        },
        Fetch::Visitors { prisoner } => Fetched::Visitors {
            prisoner,
            result: rows(api.list_visitors(prisoner).await),
        },
        Fetch::VisitorItems { visitor } => Fetched::VisitorItems {
            visitor,
            result: rows(api.list_visitor_items(visitor).await),
        },
        Fetch::NextOfKin { prisoner } => Fetched::NextOfKin {
            prisoner,
            result: rows(api.list_next_of_kin(prisoner).await),
        },
        Fetch::PropertyTypes { category } => Fetched::PropertyTypes {
            category,
            result: rows(api.list_property_types(Some(category)).await),
        },
        Fetch::PropertyStatuses { category } => Fetched::PropertyStatuses {
            category,
            result: rows(api.list_property_statuses(Some(category)).await),
        },
    }
}

/// Perform independent requests concurrently, preserving their order.
pub async fn run_all<A: RecordsApi + ?Sized>(api: &A, fetches: Vec<Fetch>) -> Vec<Fetched> {
    futures::future::join_all(fetches.into_iter().map(|fetch| run(api, fetch))).await
}

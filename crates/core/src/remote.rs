//! Load state of one server-backed option list.

use crate::error::ApiError;

/// Where a server-backed list is in its lifecycle.
///
/// `K` is the scoping parameter the list was requested with (a parent id, a category, or `()`
/// for global lists). Keeping it in every non-idle state is what lets a late response be matched
/// against the request that is currently wanted.
#[derive(Clone, Debug, PartialEq)]
pub enum Remote<K, T> {
    /// Nothing requested; the prerequisite selection is missing.
    Idle,
    Loading(K),
    Ready { key: K, items: Vec<T> },
    /// The server answered with zero rows. Valid, but blocks whatever depends on a choice.
    Empty(K),
    /// The request failed; [`Remote::retry`] re-enters `Loading` with the same key.
    Failed { key: K, error: ApiError },
}

/// What happened when a response was offered to a piece of state.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Ready(usize),
    Empty,
    Failed(ApiError),
    /// The state was no longer waiting for this response; it was dropped.
    Stale,
}

impl Resolution {
    pub fn is_stale(&self) -> bool {
        matches!(self, Resolution::Stale)
    }

    /// Combine the outcomes of one response applied to several consumers, keeping the most
    /// informative one.
    pub fn merge(self, other: Resolution) -> Resolution {
        match (self, other) {
            (Resolution::Stale, r) | (r, Resolution::Stale) => r,
            (Resolution::Failed(e), _) | (_, Resolution::Failed(e)) => Resolution::Failed(e),
            (Resolution::Empty, _) | (_, Resolution::Empty) => Resolution::Empty,
            (Resolution::Ready(a), Resolution::Ready(b)) => Resolution::Ready(a.max(b)),
        }
    }
}

impl<K, T> Default for Remote<K, T> {
    fn default() -> Self {
        Remote::Idle
    }
}

impl<K: Clone + PartialEq, T> Remote<K, T> {
    /// A settled state built from already-known rows (for example the reference cache).
    pub fn settled(key: K, items: Vec<T>) -> Self {
        if items.is_empty() {
            Remote::Empty(key)
        } else {
            Remote::Ready { key, items }
        }
    }

    /// Offer a response for `key`. Only applied while loading that exact key.
    pub fn resolve(&mut self, key: &K, result: Result<Vec<T>, ApiError>) -> Resolution {
        match self {
            Remote::Loading(current) if current == key => {}
            _ => return Resolution::Stale,
        }

        let (next, resolution) = match result {
            Ok(items) if items.is_empty() => (Remote::Empty(key.clone()), Resolution::Empty),
            Ok(items) => {
                let count = items.len();
                (
                    Remote::Ready {
                        key: key.clone(),
                        items,
                    },
                    Resolution::Ready(count),
                )
            }
            Err(error) => (
                Remote::Failed {
                    key: key.clone(),
                    error: error.clone(),
                },
                Resolution::Failed(error),
            ),
        };
        *self = next;
        resolution
    }

    /// Re-enter `Loading` after a failure, returning the key to request again.
    pub fn retry(&mut self) -> Option<K> {
        match self {
            Remote::Failed { key, .. } => {
                let key = key.clone();
                *self = Remote::Loading(key.clone());
                Some(key)
            }
            _ => None,
        }
    }

    /// Put `item` at the head of the list without a round trip.
    ///
    /// Only `Ready` and `Empty` lists accept it. Any other state is left alone and `false` is
    /// returned; a failed list stays retryable.
    pub fn prepend(&mut self, item: T) -> bool {
        match std::mem::take(self) {
            Remote::Ready { key, mut items } => {
                items.insert(0, item);
                *self = Remote::Ready { key, items };
                true
            }
            Remote::Empty(key) => {
                *self = Remote::Ready {
                    key,
                    items: vec![item],
                };
                true
            }
            other => {
                *self = other;
                false
            }
        }
    }
}

impl<K, T> Remote<K, T> {
    pub fn items(&self) -> &[T] {
        match self {
            Remote::Ready { items, .. } => items,
            _ => &[],
        }
    }

    pub fn key(&self) -> Option<&K> {
        match self {
            Remote::Idle => None,
            Remote::Loading(key) | Remote::Empty(key) => Some(key),
            Remote::Ready { key, .. } | Remote::Failed { key, .. } => Some(key),
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Remote::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Remote::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Remote::Loading(_))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Remote::Ready { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Remote::Empty(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Remote::Failed { .. })
    }
}

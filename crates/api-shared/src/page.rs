//! The paginated list envelope.

use serde::{Deserialize, Serialize};

/// Envelope returned by every list endpoint: `{ results, count, next, previous }`.
///
/// `results` may be missing or `null` on some endpoints; both read as an empty list. An empty
/// list is a valid answer ("no data exists"), never a failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Option<Vec<T>>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

impl<T> Page<T> {
    /// A single-page envelope holding all of `results`.
    pub fn of(results: Vec<T>) -> Self {
        Self {
            count: Some(results.len() as u64),
            results: Some(results),
            next: None,
            previous: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.as_ref().map_or(true, Vec::is_empty)
    }

    pub fn into_results(self) -> Vec<T> {
        self.results.unwrap_or_default()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            results: None,
            count: None,
            next: None,
            previous: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_results_reads_as_empty() {
        let page: Page<u32> =
            serde_json::from_str(r#"{"count": 0, "next": null, "previous": null}"#)
                .expect("deserialize should succeed");
        assert!(page.is_empty());
        assert!(page.into_results().is_empty());
    }

    #[test]
    fn test_null_results_reads_as_empty() {
        let page: Page<u32> =
            serde_json::from_str(r#"{"results": null}"#).expect("deserialize should succeed");
        assert!(page.is_empty());
    }

    #[test]
    fn test_empty_object_reads_as_empty() {
        let page: Page<String> = serde_json::from_str("{}").expect("deserialize should succeed");
        assert!(page.is_empty());
        assert_eq!(page.count, None);
    }

    #[test]
    fn test_results_are_returned_in_order() {
        let page: Page<u32> = serde_json::from_str(
            r#"{"results": [3, 1, 2], "count": 3, "next": "http://x/?page=2"}"#,
        )
        .expect("deserialize should succeed");
        assert_eq!(page.next.as_deref(), Some("http://x/?page=2"));
        assert_eq!(page.into_results(), vec![3, 1, 2]);
    }
}

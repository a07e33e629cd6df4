//! Shared API payloads
//!
//! Envelope types reused by every service: paged list responses, the
//! acknowledgement returned by asynchronous operations, and tag pairs.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// One page of a list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub contents: Vec<T>,
    #[serde(default)]
    pub total_count: i64,
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self {
            contents: Vec::new(),
            total_count: 0,
        }
    }
}

/// Acknowledgement of a submitted asynchronous operation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AsyncResponse {
    pub resource_id: String,
    pub request_id: String,
    pub resource_state: String,
}

/// Tag key/value pair as the tag service names it
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase", default)]
pub struct Tag {
    pub tag_key: String,
    pub tag_value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag_key: key.into(),
            tag_value: value.into(),
        }
    }
}

/// Page selection for list endpoints; see [`all_pages`] for full listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub size: u32,
}

impl Page {
    /// Page size used when enumerating a whole listing
    pub const DEFAULT_SIZE: u32 = 1_000;

    pub fn first(size: u32) -> Self {
        Self { page: 0, size }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first(Self::DEFAULT_SIZE)
    }
}

/// Fetch a listing page by page and concatenate the contents
///
/// Stops once `total_count` items have arrived or a page comes back empty.
pub async fn all_pages<T, F, Fut>(mut fetch: F) -> Result<ListResponse<T>>
where
    F: FnMut(Page) -> Fut,
    Fut: Future<Output = Result<ListResponse<T>>>,
{
    let mut page = Page::default();
    let mut all = ListResponse::default();
    loop {
        let resp = fetch(page).await?;
        let received = resp.contents.len();
        all.total_count = resp.total_count;
        all.contents.extend(resp.contents);
        if received == 0 || all.contents.len() as i64 >= all.total_count {
            return Ok(all);
        }
        tracing::debug!(
            "fetched {} of {} items, requesting page {}",
            all.contents.len(),
            all.total_count,
            page.page + 1
        );
        page = page.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_response_defaults() {
        let list: ListResponse<Tag> = serde_json::from_value(json!({})).unwrap();
        assert!(list.contents.is_empty());
        assert_eq!(list.total_count, 0);

        let list: ListResponse<Tag> = serde_json::from_value(json!({
            "contents": [{"tagKey": "env", "tagValue": "dev"}],
            "totalCount": 1
        }))
        .unwrap();
        assert_eq!(list.contents, vec![Tag::new("env", "dev")]);
    }

    fn page_of(total: i64, items: std::ops::Range<u32>) -> ListResponse<u32> {
        ListResponse {
            contents: items.collect(),
            total_count: total,
        }
    }

    #[tokio::test]
    async fn test_all_pages_follows_total_count() {
        let mut requested = Vec::new();
        let all = all_pages(|page| {
            requested.push(page.page);
            let resp = match page.page {
                0 => page_of(5, 0..2),
                1 => page_of(5, 2..4),
                _ => page_of(5, 4..5),
            };
            async move { Ok(resp) }
        })
        .await
        .unwrap();
        assert_eq!(all.contents, vec![0, 1, 2, 3, 4]);
        assert_eq!(all.total_count, 5);
        assert_eq!(requested, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_all_pages_stops_on_empty_page() {
        let mut calls = 0;
        let all = all_pages(|page| {
            calls += 1;
            let resp = if page.page == 0 { page_of(10, 0..3) } else { page_of(10, 0..0) };
            async move { Ok(resp) }
        })
        .await
        .unwrap();
        assert_eq!(all.contents.len(), 3);
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_all_pages_single_page_without_total() {
        let mut calls = 0;
        let all = all_pages(|_| {
            calls += 1;
            async move { Ok(page_of(0, 0..4)) }
        })
        .await
        .unwrap();
        assert_eq!(all.contents.len(), 4);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_all_pages_propagates_errors() {
        let err = all_pages::<u32, _, _>(|_| async move {
            Err(crate::error::Error::Cancelled)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, crate::error::Error::Cancelled));
    }

    #[test]
    fn test_async_response_tolerates_missing_fields() {
        let ack: AsyncResponse = serde_json::from_value(json!({"resourceId": "VPC-1"})).unwrap();
        assert_eq!(ack.resource_id, "VPC-1");
        assert_eq!(ack.request_id, "");
    }
}

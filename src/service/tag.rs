//! Tag Service
//!
//! Tags are keyed by resource ID. The server treats the key as the identity
//! of a tag: detach is by key, attach takes a batch of pairs.

use crate::context::Context;
use crate::error::Result;
use crate::scp::client::{seg, Query, ScpClient, Service};
use crate::scp::{all_pages, ListResponse, Tag};
use serde_json::Value;

pub struct TagService<'a> {
    client: &'a ScpClient,
}

fn tags_path(resource_id: &str) -> String {
    format!("v2/resources/{}/tags", seg(resource_id))
}

impl<'a> TagService<'a> {
    pub fn new(client: &'a ScpClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, ctx: &Context, resource_id: &str) -> Result<Vec<Tag>> {
        let path = tags_path(resource_id);
        let path = path.as_str();
        let resp: ListResponse<Tag> = all_pages(|page| async move {
            self.client
                .get(ctx, Service::Tag, path, &Query::new().page(page))
                .await
        })
        .await?;
        Ok(resp.contents)
    }

    /// Remove the tag with this key
    pub async fn detach(&self, ctx: &Context, resource_id: &str, key: &str) -> Result<()> {
        let path = format!("{}/{}", tags_path(resource_id), seg(key));
        let _: Value = self.client.delete(ctx, Service::Tag, &path).await?;
        Ok(())
    }

    /// Add all pairs in one call
    pub async fn attach(&self, ctx: &Context, resource_id: &str, tags: &[Tag]) -> Result<()> {
        let body = serde_json::json!({ "tags": tags });
        let _: Value = self
            .client
            .post(ctx, Service::Tag, &tags_path(resource_id), &body)
            .await?;
        Ok(())
    }
}

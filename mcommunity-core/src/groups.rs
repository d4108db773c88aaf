//! `/groups` endpoints. All of them require a bearer token.
//!
//! Responses are returned unchanged. The documented success statuses are:
//!
//! | operation          | status |
//! |--------------------|--------|
//! | `create`           | 201    |
//! | `delete`           | 204    |
//! | everything else    | 200    |
//!
//! `create` answers 409 when the cn or email already exists and 400 for
//! malformed bodies such as duplicate member values.

use reqwest::Method;
use tracing::info;

use crate::client::{DirectoryClient, NoBody};
use crate::error::Result;
use crate::http::ApiResponse;
use crate::model::{AttributeChange, ExpireRequest, GroupCn, GroupPatch, NewGroup};

const GROUPS: &str = "groups";

/// Request builder for group lookups and lifecycle operations.
#[derive(Debug, Clone, Copy)]
pub struct Groups<'a> {
    client: &'a DirectoryClient,
}

impl<'a> Groups<'a> {
    pub(crate) fn new(client: &'a DirectoryClient) -> Self {
        Self { client }
    }

    /// `GET /groups/{cn}/`.
    pub async fn get(&self, cn: &GroupCn) -> Result<ApiResponse> {
        let url = self.client.url(&[GROUPS, cn.as_str()])?;
        self.client.send_authorized::<NoBody>(Method::GET, url, None).await
    }

    /// `POST /groups/`.
    pub async fn create(&self, group: &NewGroup) -> Result<ApiResponse> {
        info!("creating group {}", group.cn);
        let url = self.client.url(&[GROUPS])?;
        self.client.send_authorized(Method::POST, url, Some(group)).await
    }

    /// `PATCH /groups/{cn}/`: replace single-valued attributes. The app ID must be an owner.
    pub async fn patch(&self, cn: &GroupCn, patch: &GroupPatch) -> Result<ApiResponse> {
        let url = self.client.url(&[GROUPS, cn.as_str()])?;
        self.client.send_authorized(Method::PATCH, url, Some(patch)).await
    }

    /// `DELETE /groups/{cn}/`: permanent. The app ID must be an owner.
    pub async fn delete(&self, cn: &GroupCn) -> Result<ApiResponse> {
        info!("deleting group {}", cn);
        let url = self.client.url(&[GROUPS, cn.as_str()])?;
        self.client.send_authorized::<NoBody>(Method::DELETE, url, None).await
    }

    /// `POST /groups/{cn}/renew/`: extend expiry to a year from today,
    /// un-expiring the group if needed.
    pub async fn renew(&self, cn: &GroupCn) -> Result<ApiResponse> {
        let url = self.client.url(&[GROUPS, cn.as_str(), "renew"])?;
        self.client.send_authorized::<NoBody>(Method::POST, url, None).await
    }

    /// `POST /groups/{cn}/expire/`: soft-delete, permanently removed after `days`.
    pub async fn expire(&self, cn: &GroupCn, days: u32) -> Result<ApiResponse> {
        info!("expiring group {} in {} days", cn, days);
        let url = self.client.url(&[GROUPS, cn.as_str(), "expire"])?;
        self.client
            .send_authorized(Method::POST, url, Some(&ExpireRequest { days }))
            .await
    }

    /// `POST /groups/{cn}/{attribute}/`: add and delete values of a
    /// multi-valued attribute such as `member` or `owner`.
    pub async fn modify_attribute(
        &self,
        cn: &GroupCn,
        attribute: &str,
        change: &AttributeChange,
    ) -> Result<ApiResponse> {
        let url = self.client.url(&[GROUPS, cn.as_str(), attribute])?;
        self.client.send_authorized(Method::POST, url, Some(change)).await
    }
}

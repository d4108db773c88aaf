//! `/people` endpoints.
//!
//! Everything here is public except [`People::vcard`], which needs a bearer token.

use reqwest::Method;
use tracing::debug;

use crate::client::{DirectoryClient, NoBody};
use crate::error::Result;
use crate::http::ApiResponse;
use crate::model::{SearchRequest, Uniqname};

const PEOPLE: &str = "people";

/// Request builder for person lookups.
#[derive(Debug, Clone, Copy)]
pub struct People<'a> {
    client: &'a DirectoryClient,
}

impl<'a> People<'a> {
    pub(crate) fn new(client: &'a DirectoryClient) -> Self {
        Self { client }
    }

    /// `GET /people/`: a short list of people.
    pub async fn list(&self) -> Result<ApiResponse> {
        let url = self.client.url(&[PEOPLE])?;
        self.client.send_public::<NoBody>(Method::GET, url, None).await
    }

    /// `GET /people/{uid}/`: attributes of one person.
    pub async fn get(&self, uid: &Uniqname) -> Result<ApiResponse> {
        let url = self.client.url(&[PEOPLE, uid.as_str()])?;
        self.client.send_public::<NoBody>(Method::GET, url, None).await
    }

    /// `POST /people/search/`.
    pub async fn search(&self, request: &SearchRequest) -> Result<ApiResponse> {
        debug!(parts = request.search_parts.len(), "searching people");
        let url = self.client.url(&[PEOPLE, "search"])?;
        self.client.send_public(Method::POST, url, Some(request)).await
    }

    /// `POST /people/find/`.
    pub async fn find(&self, request: &SearchRequest) -> Result<ApiResponse> {
        let url = self.client.url(&[PEOPLE, "find"])?;
        self.client.send_public(Method::POST, url, Some(request)).await
    }

    /// `GET /people/{uid}/vcard/`. Requires authorization; 404 if no vCard.
    pub async fn vcard(&self, uid: &Uniqname) -> Result<ApiResponse> {
        let url = self.client.url(&[PEOPLE, uid.as_str(), "vcard"])?;
        self.client.send_authorized::<NoBody>(Method::GET, url, None).await
    }

    /// `GET /people/{uid}/name_coach/`. 404 if unavailable.
    pub async fn name_coach(&self, uid: &Uniqname) -> Result<ApiResponse> {
        let url = self.client.url(&[PEOPLE, uid.as_str(), "name_coach"])?;
        self.client.send_public::<NoBody>(Method::GET, url, None).await
    }
}

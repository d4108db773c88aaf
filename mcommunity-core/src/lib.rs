//! # MCommunity Core
//!
//! Client library for the MCommunity directory REST API.
//!
//! This crate provides:
//! - An [`Authorizer`] that obtains and refreshes bearer tokens for an application ID
//! - [`People`] and [`Groups`] request builders over the API's endpoints
//! - [`ClientConfig`] loading from a TOML file and `MCOMMUNITY_*` environment variables
//!
//! Responses come back as [`ApiResponse`] with the status and raw body intact;
//! [`ApiResponse::into_result`] turns a non-success status into an [`ApiError`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mcommunity_core::{ClientConfig, DirectoryClient, Uniqname};
//!
//! async fn lookup() -> mcommunity_core::Result<()> {
//!     let client = DirectoryClient::new(&ClientConfig::load(None)?)?;
//!     let response = client.people().vcard(&Uniqname::new("bjensen")).await?;
//!     println!("status_code={} body={}", response.status.as_u16(), response.body);
//!     Ok(())
//! }
//! ```

pub mod authorize;
pub mod client;
pub mod config;
pub mod error;
pub mod groups;
pub mod http;
pub mod model;
pub mod people;
pub mod secret;
pub mod token;

// Re-export commonly used types at crate root
pub use authorize::{AuthHeaderProvider, Authorizer, StaticAuth};

pub use client::DirectoryClient;

pub use config::{ClientConfig, Credentials};

pub use error::{ApiError, Result};

pub use groups::Groups;

pub use http::{ApiBase, ApiResponse};

pub use model::{
    AttributeChange,
    ExpireRequest,
    GroupCn,
    GroupPatch,
    LogicalOperator,
    NewGroup,
    PersonDn,
    SearchPart,
    SearchRequest,
    SearchType,
    Uniqname,
};

pub use people::People;

pub use secret::Secret;

pub use token::{
    AuthorizationHeader,
    RefreshTokenPolicy,
    TokenPair,
    TokenState,
};

//! API models for request and response payloads

use serde::{Deserialize, Serialize};

use common::pagination::{Page, PageRequest, ValidationError};

pub mod comment;
pub mod good;
pub mod music;
pub mod post;
pub mod user;
pub mod video;

/// Outcome codes carried in every envelope
pub mod code {
    pub const SUCCESS: u16 = 200;
    pub const VALIDATION: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const NOT_FOUND: u16 = 404;
    pub const DATA_SOURCE: u16 = 500;
}

/// Uniform wrapper around every response body
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: code::SUCCESS,
            msg: String::new(),
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    pub fn failure(code: u16, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Query parameters accepted by every paged endpoint
///
/// Values are kept as raw strings so a malformed number degrades to the
/// default page instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    #[serde(rename = "pageNo")]
    pub page_no: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
    /// Resource identifier for the endpoints scoped to one video or user
    pub id: Option<String>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::lenient(self.page_no.as_deref(), self.page_size.as_deref())
    }

    /// The `id` parameter, required by the scoped endpoints
    pub fn required_id(&self) -> Result<&str, ValidationError> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::Missing("id"))
    }
}

/// Response for the collection panel: collected videos and music
#[derive(Debug, Clone, Serialize)]
pub struct CollectResponse {
    pub video: Page<video::Video>,
    pub music: Page<music::Music>,
}

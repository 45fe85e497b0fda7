//! Widget request routing
//!
//! Maps an inbound (method, path) pair onto exactly one storage operation:
//! - GET /        - list every widget
//! - GET /{name}  - widget metadata
//! - POST /{name} - create or overwrite a widget
//! - DELETE /{name} - delete a widget
//!
//! Anything else is rejected before any remote call is made.

mod service;

use bytes::Bytes;
use http::{HeaderMap, Method};
use std::collections::BTreeMap;

use crate::errors::{Result, WidgetError};

pub use service::WidgetService;

/// Header prefix carrying user-defined object metadata
const META_PREFIX: &str = "x-amz-meta-";

/// One inbound invocation, independent of the front end that received it
#[derive(Debug, Clone)]
pub struct WidgetRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl WidgetRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Request `Content-Type`, if present and printable
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// User metadata from `x-amz-meta-*` headers, prefix stripped
    pub fn user_metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();

        for (key, value) in self.headers.iter() {
            if let Some(key_str) = key.as_str().strip_prefix(META_PREFIX) {
                if let Ok(value_str) = value.to_str() {
                    metadata.insert(key_str.to_string(), value_str.to_string());
                }
            }
        }

        metadata
    }
}

/// The single storage operation an invocation performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListAll,
    GetMetadata(String),
    Create(String),
    Delete(String),
}

impl Operation {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ListAll => "list",
            Operation::GetMetadata(_) => "get",
            Operation::Create(_) => "create",
            Operation::Delete(_) => "delete",
        }
    }
}

/// Widget name addressed by `path`
///
/// A single leading `/` is stripped; a non-empty remainder is the name,
/// taken verbatim. No percent-decoding, case folding or trailing-slash
/// trimming is applied, so `/a/b` names `a/b` and `/a/` names `a/`.
pub fn widget_name(path: &str) -> Option<&str> {
    let name = path.strip_prefix('/').unwrap_or(path);
    (!name.is_empty()).then_some(name)
}

/// Select the operation for `method` and `path`
pub fn route(method: &Method, path: &str) -> Result<Operation> {
    let name = widget_name(path).map(str::to_string);

    match (method, name) {
        (&Method::GET, None) => Ok(Operation::ListAll),
        (&Method::GET, Some(name)) => Ok(Operation::GetMetadata(name)),
        (&Method::POST, Some(name)) => Ok(Operation::Create(name)),
        (&Method::DELETE, Some(name)) => Ok(Operation::Delete(name)),
        (&Method::POST, None) | (&Method::DELETE, None) => Err(WidgetError::MissingIdentifier),
        (other, _) => Err(WidgetError::UnsupportedMethod(other.to_string())),
    }
}

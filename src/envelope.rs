//! Response envelope shared by the Lambda and server front ends
//!
//! Every invocation produces exactly one `Envelope`. Bodies are always
//! strings; JSON payloads are serialized here, never handed back as native
//! structures.

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::errors::{Result, WidgetError};
use crate::storage::WidgetMetadata;

const CONTENT_TYPE: &str = "Content-Type";

/// `{statusCode, headers, body}` as understood by API Gateway proxy integrations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Serialize)]
struct WidgetList<'a> {
    widgets: &'a [String],
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl Envelope {
    fn new(status: StatusCode, body: String) -> Self {
        Self {
            status_code: status.as_u16(),
            headers: BTreeMap::new(),
            body,
        }
    }

    fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Self> {
        let body = serde_json::to_string(value)?;
        Ok(Self::new(status, body).with_header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref()))
    }

    /// `GET /` - `{"widgets": [...]}`
    pub fn widget_list(names: &[String]) -> Result<Self> {
        Self::json(StatusCode::OK, &WidgetList { widgets: names })
    }

    /// `GET /{name}` - the widget's metadata as a JSON object
    pub fn widget_metadata(metadata: &WidgetMetadata) -> Result<Self> {
        Self::json(StatusCode::OK, metadata)
    }

    /// `POST /{name}` - echoes the stored content under its content type
    pub fn created(content: &[u8], content_type: &str) -> Self {
        Self::new(StatusCode::OK, String::from_utf8_lossy(content).into_owned())
            .with_header(CONTENT_TYPE, content_type)
    }

    /// `DELETE /{name}` - plain-text confirmation
    pub fn deleted(name: &str) -> Self {
        Self::new(StatusCode::OK, format!("Successfully deleted widget {}", name))
    }

    /// Any failure, as `{"error": message}`
    pub fn from_error(err: &WidgetError) -> Self {
        let message = err.to_string();
        match serde_json::to_string(&ErrorBody { error: &message }) {
            Ok(body) => Self::new(err.status(), body)
                .with_header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref()),
            Err(_) => Self::new(err.status(), message),
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        for (name, value) in self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => warn!(header = %name, "Dropping header that is not valid HTTP"),
            }
        }

        response
    }
}

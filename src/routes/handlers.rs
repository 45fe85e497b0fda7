//! Request handler for the local server

use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
};
use bytes::Bytes;
use std::sync::Arc;

use crate::envelope::Envelope;
use crate::widgets::{WidgetRequest, WidgetService};

/// Forward any request to the widget service
///
/// Only the URI path is used: query strings are ignored and percent-escapes
/// are kept as-is.
pub async fn invoke(
    State(service): State<Arc<WidgetService>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Envelope {
    let request = WidgetRequest::new(method, uri.path())
        .with_headers(headers)
        .with_body(body);

    service.handle(request).await
}

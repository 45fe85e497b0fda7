//! AWS Lambda front end
//!
//! Receives API Gateway REST proxy events, hands them to the widget service
//! and returns the `{statusCode, headers, body}` envelope.

use base64::{engine::general_purpose, Engine as _};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use lambda_runtime::{service_fn, LambdaEvent};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::envelope::Envelope;
use crate::errors::{Result, WidgetError};
use crate::widgets::{WidgetRequest, WidgetService};

/// The subset of an API Gateway proxy event the service reads
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyEvent {
    pub http_method: String,
    pub path: String,
    pub headers: Option<HashMap<String, String>>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

impl ProxyEvent {
    /// Convert into a `WidgetRequest`
    pub fn into_request(self) -> Result<WidgetRequest> {
        let method = Method::from_bytes(self.http_method.as_bytes())
            .map_err(|_| WidgetError::UnsupportedMethod(self.http_method.clone()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in self.headers.unwrap_or_default() {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %name, "Ignoring header that is not valid HTTP"),
            }
        }

        let body = match self.body {
            Some(body) if self.is_base64_encoded => general_purpose::STANDARD
                .decode(body.as_bytes())
                .map_err(|e| WidgetError::InvalidRequest(format!("body is not valid base64: {}", e)))?,
            Some(body) => body.into_bytes(),
            None => Vec::new(),
        };

        Ok(WidgetRequest::new(method, self.path)
            .with_headers(headers)
            .with_body(body))
    }
}

/// Handle one Lambda invocation
pub async fn handle_event(service: &WidgetService, event: ProxyEvent) -> Envelope {
    match event.into_request() {
        Ok(request) => service.handle(request).await,
        Err(err) => {
            warn!(error = %err, "Rejected malformed proxy event");
            Envelope::from_error(&err)
        }
    }
}

/// Run the Lambda runtime loop until the execution environment shuts down
pub async fn run(service: Arc<WidgetService>) -> anyhow::Result<()> {
    info!("Starting Lambda runtime");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<ProxyEvent>| {
        let service = service.clone();
        async move {
            info!(request_id = %event.context.request_id, "Lambda invocation");
            Ok::<Envelope, lambda_runtime::Error>(handle_event(&service, event.payload).await)
        }
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
}

//! Widget dispatch: route, perform one store call, build the envelope

use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::envelope::Envelope;
use crate::errors::Result;
use crate::storage::{NewWidget, WidgetStore};
use crate::widgets::{route, Operation, WidgetRequest};

/// Content type stored when the request does not name one
const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Stateless request handler shared by every invocation
#[derive(Clone)]
pub struct WidgetService {
    store: Arc<dyn WidgetStore>,
}

impl WidgetService {
    pub fn new(store: Arc<dyn WidgetStore>) -> Self {
        Self { store }
    }

    /// Handle one invocation
    ///
    /// Never fails: routing, validation and storage errors all become an
    /// error envelope.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn handle(&self, request: WidgetRequest) -> Envelope {
        match self.dispatch(request).await {
            Ok(envelope) => {
                info!(status = envelope.status_code, "Request completed");
                envelope
            }
            Err(err) => {
                if err.is_client_error() {
                    warn!(error = %err, status = err.status().as_u16(), "Request rejected");
                } else {
                    error!(error = %err, status = err.status().as_u16(), "Request failed");
                }
                Envelope::from_error(&err)
            }
        }
    }

    async fn dispatch(&self, request: WidgetRequest) -> Result<Envelope> {
        let operation = route(&request.method, &request.path)?;
        info!(operation = operation.name(), "Dispatching widget operation");

        match operation {
            Operation::ListAll => {
                let names = self.store.list().await?;
                Envelope::widget_list(&names)
            }
            Operation::GetMetadata(name) => {
                let metadata = self.store.head(&name).await?;
                Envelope::widget_metadata(&metadata)
            }
            Operation::Create(name) => {
                let widget = new_widget(&name, &request);
                let content = widget.content.clone();
                let content_type = widget.content_type.clone();
                self.store.put(&name, widget).await?;
                Ok(Envelope::created(&content, &content_type))
            }
            Operation::Delete(name) => {
                self.store.delete(&name).await?;
                Ok(Envelope::deleted(&name))
            }
        }
    }
}

/// Content to store for a create request
///
/// An empty body gets a generated placeholder so a bare `POST /{name}`
/// still produces a widget.
fn new_widget(name: &str, request: &WidgetRequest) -> NewWidget {
    let metadata = request.user_metadata();

    if request.body.is_empty() {
        let placeholder = format!("{} created: {}", name, Utc::now().to_rfc2822());
        return NewWidget {
            content: Bytes::from(placeholder),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            metadata,
        };
    }

    NewWidget {
        content: request.body.clone(),
        content_type: request
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string(),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::WidgetError;
    use crate::storage::{MemoryWidgetStore, WidgetMetadata};
    use async_trait::async_trait;
    use http::{HeaderMap, HeaderValue, Method};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> WidgetService {
        WidgetService::new(Arc::new(MemoryWidgetStore::new()))
    }

    fn body_json(envelope: &Envelope) -> Value {
        serde_json::from_str(&envelope.body).unwrap()
    }

    /// Store that counts calls and fails every one of them
    #[derive(Default)]
    struct FailingStore {
        calls: AtomicUsize,
    }

    impl FailingStore {
        fn fail<T>(&self) -> Result<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(WidgetError::Upstream("AccessDenied: Access Denied".into()))
        }
    }

    #[async_trait]
    impl WidgetStore for FailingStore {
        async fn list(&self) -> Result<Vec<String>> {
            self.fail()
        }
        async fn head(&self, _name: &str) -> Result<WidgetMetadata> {
            self.fail()
        }
        async fn put(&self, _name: &str, _widget: NewWidget) -> Result<()> {
            self.fail()
        }
        async fn delete(&self, _name: &str) -> Result<()> {
            self.fail()
        }
    }

    #[tokio::test]
    async fn test_list_on_empty_bucket() {
        let envelope = service().handle(WidgetRequest::new(Method::GET, "/")).await;
        assert_eq!(envelope.status_code, 200);
        assert_eq!(body_json(&envelope)["widgets"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_create_then_get_reports_metadata() {
        let service = service();
        let created = service.handle(WidgetRequest::new(Method::POST, "/gear")).await;
        assert_eq!(created.status_code, 200);
        assert!(created.body.starts_with("gear created: "));

        let fetched = service.handle(WidgetRequest::new(Method::GET, "/gear")).await;
        assert_eq!(fetched.status_code, 200);
        let body = body_json(&fetched);
        assert_eq!(body["ContentType"], "application/json");
        assert!(body["ETag"].is_string());
        assert_eq!(body["ContentLength"], created.body.len());

        let listed = service.handle(WidgetRequest::new(Method::GET, "/")).await;
        assert_eq!(body_json(&listed)["widgets"], serde_json::json!(["gear"]));
    }

    #[tokio::test]
    async fn test_create_with_caller_content() {
        let service = service();
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        headers.insert("x-amz-meta-owner", HeaderValue::from_static("ops"));

        let created = service
            .handle(
                WidgetRequest::new(Method::POST, "/gear")
                    .with_headers(headers)
                    .with_body("eleven teeth"),
            )
            .await;
        assert_eq!(created.body, "eleven teeth");
        assert_eq!(created.headers["Content-Type"], "text/plain");

        let body = body_json(&service.handle(WidgetRequest::new(Method::GET, "/gear")).await);
        assert_eq!(body["ContentLength"], 12);
        assert_eq!(body["ContentType"], "text/plain");
        assert_eq!(body["Metadata"]["owner"], "ops");
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let service = service();
        service.handle(WidgetRequest::new(Method::POST, "/gear")).await;

        let deleted = service.handle(WidgetRequest::new(Method::DELETE, "/gear")).await;
        assert_eq!(deleted.status_code, 200);
        assert_eq!(deleted.body, "Successfully deleted widget gear");

        let fetched = service.handle(WidgetRequest::new(Method::GET, "/gear")).await;
        assert_eq!(fetched.status_code, 404);
        assert_eq!(body_json(&fetched)["error"], "Widget not found: gear");
    }

    #[tokio::test]
    async fn test_delete_missing_widget_succeeds() {
        let envelope = service()
            .handle(WidgetRequest::new(Method::DELETE, "/never-existed"))
            .await;
        assert_eq!(envelope.status_code, 200);
    }

    #[tokio::test]
    async fn test_missing_name_makes_no_remote_call() {
        let store = Arc::new(FailingStore::default());
        let service = WidgetService::new(store.clone());

        for method in [Method::POST, Method::DELETE] {
            let envelope = service.handle(WidgetRequest::new(method, "/")).await;
            assert_eq!(envelope.status_code, 400);
            assert_eq!(body_json(&envelope)["error"], "Widget name missing");
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_method_names_the_method() {
        let store = Arc::new(FailingStore::default());
        let service = WidgetService::new(store.clone());

        let envelope = service.handle(WidgetRequest::new(Method::PATCH, "/gear")).await;
        assert_eq!(envelope.status_code, 400);
        assert!(envelope.body.contains("PATCH"));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_500_with_diagnostics() {
        let store = Arc::new(FailingStore::default());
        let service = WidgetService::new(store.clone());

        let envelope = service.handle(WidgetRequest::new(Method::GET, "/")).await;
        assert_eq!(envelope.status_code, 500);
        assert!(envelope.body.contains("AccessDenied"));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }
}

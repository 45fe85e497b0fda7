//! HTTP routes for the local server
//!
//! Every method and path is forwarded to the widget service, which applies
//! the same routing table the Lambda front end uses:
//! - GET /        - list widgets
//! - GET /{name}  - widget metadata
//! - POST /{name} - create widget
//! - DELETE /{name} - delete widget

mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;

use crate::widgets::WidgetService;

/// Create the widget API router
pub fn create_router(service: Arc<WidgetService>, max_body_size: usize) -> Router {
    Router::new()
        .fallback(handlers::invoke)
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryWidgetStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let service = WidgetService::new(Arc::new(MemoryWidgetStore::new()));
        create_router(Arc::new(service), 1024)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: &'static str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_crud_over_http() {
        let app = app();

        let (status, body) = send(&app, "GET", "/", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"widgets":[]}"#);

        let (status, body) = send(&app, "POST", "/gear", "{\"teeth\":11}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{\"teeth\":11}");

        let (status, body) = send(&app, "GET", "/gear", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#""ContentLength":12"#));

        let (status, _) = send(&app, "DELETE", "/gear", "").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", "/gear", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_query_string_is_not_part_of_the_name() {
        let app = app();
        send(&app, "POST", "/gear?color=blue", "").await;

        let (_, body) = send(&app, "GET", "/", "").await;
        assert_eq!(body, r#"{"widgets":["gear"]}"#);
    }

    #[tokio::test]
    async fn test_rejections() {
        let app = app();

        let (status, body) = send(&app, "PUT", "/gear", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("PUT"));

        let (status, body) = send(&app, "DELETE", "/", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Widget name missing"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let big = "x".repeat(2048);
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/gear")
                    .body(Body::from(big))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}

//! Storage backend abstraction layer
//!
//! Every invocation performs exactly one call through [`WidgetStore`]. The
//! S3 backend talks to the configured bucket through the AWS SDK; the
//! memory backend keeps widgets in-process for local development and tests.

mod memory;
mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{BackendType, Config};
use crate::errors::Result;

pub use memory::MemoryWidgetStore;
pub use s3::S3WidgetStore;

/// Metadata of a stored widget, as returned by a HEAD call
///
/// Every field is optional because the store may omit any of them; absent
/// values still serialize (as `null`) so callers always see the same keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WidgetMetadata {
    pub content_length: Option<i64>,
    pub content_type: Option<String>,
    #[serde(rename = "ETag")]
    pub e_tag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub storage_class: Option<String>,
    pub server_side_encryption: Option<String>,
    pub version_id: Option<String>,
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Content written by a create call
#[derive(Debug, Clone)]
pub struct NewWidget {
    pub content: Bytes,
    pub content_type: String,
    /// User-defined metadata stored alongside the object
    pub metadata: BTreeMap<String, String>,
}

/// Storage backend trait for widget operations
///
/// Implementations make a single remote call per method and never retry.
#[async_trait]
pub trait WidgetStore: Send + Sync {
    /// Names of all widgets, in store order (first page only)
    async fn list(&self) -> Result<Vec<String>>;

    /// Metadata of one widget; `WidgetError::NotFound` when absent
    async fn head(&self, name: &str) -> Result<WidgetMetadata>;

    /// Write or overwrite a widget unconditionally
    async fn put(&self, name: &str, widget: NewWidget) -> Result<()>;

    /// Remove a widget; succeeds when it does not exist
    async fn delete(&self, name: &str) -> Result<()>;
}

/// Create a storage backend based on configuration
///
/// The S3 client itself is built lazily on the first call.
pub fn create_backend(config: &Config) -> Arc<dyn WidgetStore> {
    match config.backend.backend_type {
        BackendType::S3 => Arc::new(S3WidgetStore::new(config.backend.clone())),
        BackendType::Memory => Arc::new(MemoryWidgetStore::new()),
    }
}

//! In-process widget store
//!
//! Mirrors the S3 semantics the service relies on: lexicographic listing,
//! unconditional overwrite, idempotent delete, quoted MD5 entity tags.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::{Result, WidgetError};
use crate::storage::{NewWidget, WidgetMetadata, WidgetStore};

#[derive(Debug, Clone)]
struct StoredWidget {
    content: Bytes,
    content_type: String,
    metadata: BTreeMap<String, String>,
    e_tag: String,
    last_modified: DateTime<Utc>,
}

/// Widget store backed by an ordered in-memory map
#[derive(Debug, Default)]
pub struct MemoryWidgetStore {
    widgets: RwLock<BTreeMap<String, StoredWidget>>,
}

impl MemoryWidgetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WidgetStore for MemoryWidgetStore {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.widgets.read().await.keys().cloned().collect())
    }

    async fn head(&self, name: &str) -> Result<WidgetMetadata> {
        let widgets = self.widgets.read().await;
        let widget = widgets.get(name).ok_or_else(|| WidgetError::NotFound {
            name: name.to_string(),
        })?;

        Ok(WidgetMetadata {
            content_length: Some(widget.content.len() as i64),
            content_type: Some(widget.content_type.clone()),
            e_tag: Some(widget.e_tag.clone()),
            last_modified: Some(widget.last_modified),
            storage_class: Some("STANDARD".to_string()),
            server_side_encryption: None,
            version_id: None,
            metadata: Some(widget.metadata.clone()),
        })
    }

    async fn put(&self, name: &str, widget: NewWidget) -> Result<()> {
        let e_tag = format!("\"{:x}\"", md5::compute(&widget.content));
        debug!(name = %name, e_tag = %e_tag, "Storing widget in memory");

        let stored = StoredWidget {
            content: widget.content,
            content_type: widget.content_type,
            metadata: widget.metadata,
            e_tag,
            last_modified: Utc::now(),
        };
        self.widgets.write().await.insert(name.to_string(), stored);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.widgets.write().await.remove(name);
        Ok(())
    }
}

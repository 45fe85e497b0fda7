//! AWS S3 widget store
//!
//! Uses aws-sdk-s3 against a single bucket. The client is created on first
//! use and reused for every later invocation in the same execution
//! environment; it carries no per-request state.
//!
//! Credentials come from the default AWS provider chain:
//! - Lambda execution role
//! - Environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY)
//! - Shared config/credentials files
//! - ECS task role / EC2 instance metadata

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectOutput;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::config::BackendConfig;
use crate::errors::{Result, WidgetError};
use crate::storage::{NewWidget, WidgetMetadata, WidgetStore};

/// AWS S3 widget store
pub struct S3WidgetStore {
    settings: BackendConfig,
    client: OnceCell<Client>,
}

impl S3WidgetStore {
    /// Create a store whose client is built lazily from `settings`
    pub fn new(settings: BackendConfig) -> Self {
        Self {
            settings,
            client: OnceCell::new(),
        }
    }

    /// Create a store around an already configured client
    #[cfg(test)]
    pub fn with_client(client: Client, settings: BackendConfig) -> Self {
        Self {
            settings,
            client: OnceCell::from(client),
        }
    }

    fn bucket(&self) -> &str {
        &self.settings.bucket
    }

    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| build_client(&self.settings))
            .await
    }
}

async fn build_client(settings: &BackendConfig) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &settings.region {
        loader = loader.region(Region::new(region.clone()));
    }
    let sdk_config = loader.load().await;

    let mut builder =
        aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(settings.force_path_style);

    // Configure endpoint (for S3-compatible services like MinIO)
    if let Some(endpoint) = &settings.endpoint {
        builder = builder.endpoint_url(endpoint);
    }

    debug!(bucket = %settings.bucket, endpoint = ?settings.endpoint, "S3 client initialized");
    Client::from_conf(builder.build())
}

fn upstream<E, R>(operation: &str, err: SdkError<E, R>) -> WidgetError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug + 'static,
{
    WidgetError::Upstream(format!("{} failed: {}", operation, DisplayErrorContext(&err)))
}

fn metadata_from_head(output: &HeadObjectOutput) -> WidgetMetadata {
    WidgetMetadata {
        content_length: output.content_length(),
        content_type: output.content_type().map(str::to_string),
        e_tag: output.e_tag().map(str::to_string),
        last_modified: output
            .last_modified()
            .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())),
        storage_class: output.storage_class().map(|c| c.as_str().to_string()),
        server_side_encryption: output
            .server_side_encryption()
            .map(|e| e.as_str().to_string()),
        version_id: output.version_id().map(str::to_string),
        metadata: output
            .metadata()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
    }
}

#[async_trait]
impl WidgetStore for S3WidgetStore {
    #[instrument(skip(self), fields(bucket = %self.bucket()))]
    async fn list(&self) -> Result<Vec<String>> {
        let output = self
            .client()
            .await
            .list_objects_v2()
            .bucket(self.bucket())
            .send()
            .await
            .map_err(|e| upstream("ListObjectsV2", e))?;

        let names: Vec<String> = output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        debug!(count = names.len(), truncated = ?output.is_truncated(), "Listed widgets");
        Ok(names)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket()))]
    async fn head(&self, name: &str) -> Result<WidgetMetadata> {
        let output = self
            .client()
            .await
            .head_object()
            .bucket(self.bucket())
            .key(name)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|err| err.is_not_found()) {
                    WidgetError::NotFound {
                        name: name.to_string(),
                    }
                } else {
                    upstream("HeadObject", e)
                }
            })?;

        Ok(metadata_from_head(&output))
    }

    #[instrument(skip(self, widget), fields(bucket = %self.bucket(), size = widget.content.len()))]
    async fn put(&self, name: &str, widget: NewWidget) -> Result<()> {
        let metadata: Option<HashMap<String, String>> = if widget.metadata.is_empty() {
            None
        } else {
            Some(widget.metadata.into_iter().collect())
        };

        self.client()
            .await
            .put_object()
            .bucket(self.bucket())
            .key(name)
            .content_type(widget.content_type)
            .set_metadata(metadata)
            .body(ByteStream::from(widget.content))
            .send()
            .await
            .map_err(|e| upstream("PutObject", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket()))]
    async fn delete(&self, name: &str) -> Result<()> {
        self.client()
            .await
            .delete_object()
            .bucket(self.bucket())
            .key(name)
            .send()
            .await
            .map_err(|e| upstream("DeleteObject", e))?;

        Ok(())
    }
}

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use bytes::Bytes;

use super::{ObjectStorage, StorageError, StoredObject};

/// Connection settings for an S3-compatible endpoint
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Upload objects with the `public-read` canned ACL
    pub public_read: bool,
}

#[derive(Clone)]
pub struct S3Storage {
    client: S3Client,
    public_read: bool,
}

impl S3Storage {
    /// Path-style client with a 2s connect timeout and a single attempt
    pub async fn new(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key,
            &settings.secret_key,
            None,
            None,
            "staffbook-static",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(settings.region.clone()))
            .endpoint_url(&settings.endpoint)
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(Duration::from_secs(2))
                    .build(),
            )
            .retry_config(RetryConfig::standard().with_max_attempts(1))
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: S3Client::from_conf(s3_config),
            public_read: settings.public_read,
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type);
        if self.public_read {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }
        request
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("put_object failed: {e}")))?;
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Ok(None);
            }
            Err(err) => {
                return Err(StorageError::Backend(format!("get_object failed: {err}")));
            }
        };

        let content_type = output.content_type().map(str::to_string);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("read object body failed: {e}")))?
            .into_bytes();

        Ok(Some(StoredObject {
            bytes,
            content_type,
        }))
    }

    async fn health_check(&self, bucket: &str) -> bool {
        if let Err(e) = self.client.list_buckets().send().await {
            tracing::debug!(error = %e, "S3 list_buckets failed");
            return false;
        }
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(bucket, error = %e, "S3 head_bucket failed");
                false
            }
        }
    }
}

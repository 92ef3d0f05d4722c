/*!
Remote object-storage backend over Amazon S3.

Each directory role maps to a configured bucket; the role-relative path is
the object key, so both backends expose identical path semantics. Every
operation is retried on transient-class failures (timeouts, throttling)
under the backend's [`RetryPolicy`]; non-transient failures (auth,
not-found) fail immediately. Retry exhaustion surfaces as
`BackendUnavailable`.

The SDK is async; the backend owns a private runtime and drives it with
blocking calls, keeping the facade a synchronous surface.
*/

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use super::{matches_pattern, StorageBackend};
use crate::config::RemoteConfig;
use crate::path::{Role, StoragePath};
use crate::{Result, StoreError};
use filestore_retry::{with_retry, RetryError, RetryFailure, RetryPolicy};

/// Amazon S3 storage backend
///
/// Uses the standard AWS credential provider chain (environment variables,
/// shared credentials file, instance roles). Construction fails fast with
/// `BackendUnavailable` when no credentials are available, so hosts can
/// fall back to a local-backend facade explicitly.
#[derive(Debug)]
pub struct RemoteBackend {
    client: S3Client,
    containers: HashMap<String, String>,
    policy: RetryPolicy,
    runtime: Arc<Runtime>,
}

impl RemoteBackend {
    /// Create a backend from remote settings, verifying credentials.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let runtime = Runtime::new().map_err(|e| {
            StoreError::backend_unavailable(format!(
                "failed to create async runtime for object storage client: {e}"
            ))
        })?;

        let sdk_config = runtime.block_on(async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(region) = &config.region {
                loader = loader.region(Region::new(region.clone()));
            }
            loader.load().await
        });

        if sdk_config.credentials_provider().is_none() {
            return Err(StoreError::backend_unavailable(
                "object storage credentials not found; set AWS_ACCESS_KEY_ID, \
                 AWS_SECRET_ACCESS_KEY, and AWS_REGION",
            ));
        }

        let client = S3Client::new(&sdk_config);
        info!(
            containers = config.container_mapping.len(),
            "initialized remote storage backend"
        );

        Ok(RemoteBackend {
            client,
            containers: config.container_mapping.clone(),
            policy: config.retry.clone(),
            runtime: Arc::new(runtime),
        })
    }

    /// Bucket configured for a role. Unmapped roles fail at first use.
    fn container_for(&self, role: &Role) -> Result<&str> {
        self.containers
            .get(role.as_str())
            .map(String::as_str)
            .ok_or_else(|| {
                StoreError::config(format!(
                    "no container mapped for role '{role}'"
                ))
            })
    }
}

/// Classification of a service error code.
#[derive(Debug, PartialEq)]
enum ErrorClass {
    Transient,
    Permanent,
    MissingKey,
}

fn classify_service_code(code: &str) -> ErrorClass {
    match code {
        "NoSuchKey" | "NotFound" => ErrorClass::MissingKey,
        "SlowDown" | "RequestTimeout" | "InternalError" | "ServiceUnavailable"
        | "ThrottlingException" => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

/// Map an SDK error into a classified store error.
fn map_sdk_error<E>(op: &'static str, error: SdkError<E>, key: &str) -> RetryError<StoreError>
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    match &error {
        SdkError::DispatchFailure(_) => RetryError::Transient(StoreError::storage(format!(
            "{op} request failed to dispatch (key: {key})"
        ))),
        SdkError::TimeoutError(_) => RetryError::Transient(StoreError::storage(format!(
            "{op} request timed out (key: {key})"
        ))),
        SdkError::ResponseError(_) => RetryError::Transient(StoreError::storage(format!(
            "{op} received a malformed response (key: {key})"
        ))),
        SdkError::ServiceError(service_err) => {
            let code = service_err.err().code().unwrap_or("unknown");
            match classify_service_code(code) {
                ErrorClass::MissingKey => {
                    RetryError::Permanent(StoreError::not_found(key.to_string()))
                }
                ErrorClass::Transient => RetryError::Transient(StoreError::storage(format!(
                    "{op} throttled or unavailable ({code}, key: {key})"
                ))),
                ErrorClass::Permanent => RetryError::Permanent(StoreError::storage(format!(
                    "{op} service error ({code}): {}",
                    service_err.err().message().unwrap_or("unknown error")
                ))),
            }
        }
        _ => RetryError::Permanent(StoreError::storage(format!("{op} error: {error}"))),
    }
}

/// Collapse a retry outcome into the caller-facing error taxonomy.
fn surface<T>(result: std::result::Result<T, RetryFailure<StoreError>>) -> Result<T> {
    result.map_err(|failure| match failure {
        RetryFailure::Exhausted {
            operation,
            attempts,
            error,
        } => StoreError::backend_unavailable(format!(
            "remote backend unreachable: '{operation}' still failing after {attempts} attempts: {error}"
        )),
        RetryFailure::Permanent { error, .. } => error,
    })
}

fn listing_prefix(prefix: &StoragePath) -> String {
    if prefix.relative.is_empty() {
        String::new()
    } else {
        format!("{}/", prefix.relative)
    }
}

impl StorageBackend for RemoteBackend {
    fn write_bytes(&self, path: &StoragePath, data: &[u8]) -> Result<()> {
        let bucket = self.container_for(&path.role)?;
        let key = path.relative.as_str();
        debug!(bucket, key, size = data.len(), "putting object");

        surface(with_retry(&self.policy, "put_object", || {
            self.runtime
                .block_on(async {
                    self.client
                        .put_object()
                        .bucket(bucket)
                        .key(key)
                        .body(ByteStream::from(data.to_vec()))
                        .send()
                        .await
                })
                .map(|_| ())
                .map_err(|e| map_sdk_error("put_object", e, key))
        }))
    }

    fn read_bytes(&self, path: &StoragePath) -> Result<Vec<u8>> {
        let bucket = self.container_for(&path.role)?;
        let key = path.relative.as_str();
        debug!(bucket, key, "getting object");

        surface(with_retry(&self.policy, "get_object", || {
            self.runtime.block_on(async {
                let output = self
                    .client
                    .get_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| map_sdk_error("get_object", e, key))?;
                let data = output.body.collect().await.map_err(|e| {
                    RetryError::Transient(StoreError::storage(format!(
                        "failed to read object stream (key: {key}): {e}"
                    )))
                })?;
                Ok(data.into_bytes().to_vec())
            })
        }))
    }

    fn exists(&self, path: &StoragePath) -> bool {
        let bucket = match self.container_for(&path.role) {
            Ok(bucket) => bucket,
            Err(e) => {
                debug!(path = %path, error = %e, "existence check failed, treating as absent");
                return false;
            }
        };

        let result = self.runtime.block_on(async {
            self.client
                .head_object()
                .bucket(bucket)
                .key(&path.relative)
                .send()
                .await
        });

        match result {
            Ok(_) => true,
            Err(e) => {
                debug!(path = %path, error = %e, "existence check failed, treating as absent");
                false
            }
        }
    }

    fn list(&self, prefix: &StoragePath, pattern: Option<&str>) -> Result<Vec<String>> {
        let bucket = self.container_for(&prefix.role)?;
        let dir_prefix = listing_prefix(prefix);

        let keys = surface(with_retry(&self.policy, "list_objects", || {
            self.runtime.block_on(async {
                let mut keys: Vec<String> = Vec::new();
                let mut continuation: Option<String> = None;
                loop {
                    let mut request = self
                        .client
                        .list_objects_v2()
                        .bucket(bucket)
                        .delimiter("/");
                    if !dir_prefix.is_empty() {
                        request = request.prefix(&dir_prefix);
                    }
                    if let Some(token) = &continuation {
                        request = request.continuation_token(token);
                    }

                    let output = request
                        .send()
                        .await
                        .map_err(|e| map_sdk_error("list_objects", e, &dir_prefix))?;

                    for object in output.contents() {
                        if let Some(key) = object.key() {
                            keys.push(key.to_string());
                        }
                    }
                    match output.next_continuation_token() {
                        Some(token) => continuation = Some(token.to_string()),
                        None => break,
                    }
                }
                Ok(keys)
            })
        }))?;

        let mut names: Vec<String> = keys
            .iter()
            .filter_map(|key| key.strip_prefix(&dir_prefix))
            .filter(|name| !name.is_empty() && !name.contains('/'))
            .filter(|name| pattern.map_or(true, |p| matches_pattern(name, p)))
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    fn delete(&self, path: &StoragePath) -> Result<()> {
        let bucket = self.container_for(&path.role)?;
        let key = path.relative.as_str();
        debug!(bucket, key, "deleting object");

        surface(with_retry(&self.policy, "delete_object", || {
            self.runtime
                .block_on(async {
                    self.client
                        .delete_object()
                        .bucket(bucket)
                        .key(key)
                        .send()
                        .await
                })
                .map(|_| ())
                .map_err(|e| map_sdk_error("delete_object", e, key))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_code_classification() {
        assert_eq!(classify_service_code("SlowDown"), ErrorClass::Transient);
        assert_eq!(
            classify_service_code("InternalError"),
            ErrorClass::Transient
        );
        assert_eq!(classify_service_code("NoSuchKey"), ErrorClass::MissingKey);
        assert_eq!(
            classify_service_code("AccessDenied"),
            ErrorClass::Permanent
        );
        assert_eq!(
            classify_service_code("NoSuchBucket"),
            ErrorClass::Permanent
        );
    }

    #[test]
    fn listing_prefix_shapes() {
        assert_eq!(listing_prefix(&StoragePath::new("raw", "")), "");
        assert_eq!(
            listing_prefix(&StoragePath::new("raw", "2024/q1")),
            "2024/q1/"
        );
    }

    #[test]
    fn retry_exhaustion_surfaces_as_backend_unavailable() {
        let policy = RetryPolicy::new(
            2,
            std::time::Duration::from_millis(1),
            std::time::Duration::from_millis(2),
        );
        let outcome: std::result::Result<(), _> = with_retry(&policy, "op", || {
            Err(RetryError::Transient(StoreError::storage("timed out")))
        });
        let err = surface(outcome).unwrap_err();
        assert!(matches!(err, StoreError::BackendUnavailable(_)));
    }

    #[test]
    fn permanent_failures_surface_unchanged() {
        let outcome: std::result::Result<(), _> =
            with_retry(&RetryPolicy::none(), "op", || {
                Err(RetryError::Permanent(StoreError::not_found("raw/x.csv")))
            });
        let err = surface(outcome).unwrap_err();
        assert!(err.is_not_found());
    }
}

use crate::browser::navigator;
use crate::storage::endpoint::{host_label, normalize_endpoint};
use crate::storage::gateway::{ObjectStream, ObjectUpload, StorageGateway};
use crate::types::{BrowserError, BrowserResult, BucketInfo, Credentials, Listing, ObjectEntry, Prefix};
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{
    Credentials as AwsCredentials, Region, RequestChecksumCalculation, ResponseChecksumValidation,
};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, StreamExt};
use http_body::{Body, Frame};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_stream::wrappers::ReceiverStream;

/// Region sent to providers that ignore regions
pub const DEFAULT_REGION: &str = "auto";

const DELIMITER: &str = "/";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Adapter turning an `ObjectStream` into an `http_body::Body` for `ByteStream`.
///
/// The SDK wants a `Sync` body while `ObjectStream` is only `Send`, so a task
/// forwards chunks through a bounded channel. At most 64 chunks are buffered.
struct StreamBody {
    receiver: ReceiverStream<Result<Bytes, BoxError>>,
    remaining: Option<u64>,
}

impl StreamBody {
    fn new(mut stream: ObjectStream, content_length: Option<u64>) -> Self {
        let (tx, rx) = tokio::sync::mpsc::channel(64);

        tokio::spawn(async move {
            while let Some(result) = stream.next().await {
                let mapped = result.map_err(|e| Box::new(e) as BoxError);

                if tx.send(mapped).await.is_err() {
                    // Request dropped, stop reading
                    break;
                }
            }
        });

        Self {
            receiver: ReceiverStream::new(rx),
            remaining: content_length,
        }
    }
}

impl Body for StreamBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match Pin::new(&mut self.receiver).poll_next(cx) {
            Poll::Ready(Some(Ok(bytes))) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self.remaining {
            Some(length) => http_body::SizeHint::with_exact(length),
            None => http_body::SizeHint::default(),
        }
    }
}

/// Gateway to any S3-compatible endpoint.
///
/// A client is built per call from the request's credentials, so one gateway
/// serves any number of sessions.
#[derive(Debug, Clone)]
pub struct S3Gateway {
    region: String,
    force_path_style: bool,
}

impl Default for S3Gateway {
    fn default() -> Self {
        Self::new(DEFAULT_REGION, true)
    }
}

impl S3Gateway {
    pub fn new(region: impl Into<String>, force_path_style: bool) -> Self {
        Self {
            region: region.into(),
            force_path_style,
        }
    }

    fn client(&self, credentials: &Credentials) -> BrowserResult<S3Client> {
        if credentials.endpoint.trim().is_empty() {
            return Err(BrowserError::Validation("Endpoint is required".to_string()));
        }

        let endpoint = normalize_endpoint(&credentials.endpoint);
        tracing::debug!("Building S3 client for {} ({})", endpoint, credentials.key_hint());

        let aws_credentials = AwsCredentials::new(
            credentials.access_key_id.trim(),
            credentials.secret_access_key.trim(),
            None,
            None,
            "bucket-browser",
        );

        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version_latest()
            .region(Region::new(self.region.clone()))
            .credentials_provider(aws_credentials)
            .endpoint_url(endpoint)
            .force_path_style(self.force_path_style)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        Ok(S3Client::from_conf(config))
    }
}

fn to_utc(value: Option<&aws_sdk_s3::primitives::DateTime>) -> DateTime<Utc> {
    value
        .and_then(|dt| dt.to_millis().ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Turn an SDK failure into the browser's error taxonomy
fn classify<E>(err: SdkError<E, HttpResponse>, credentials: &Credentials) -> BrowserError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if matches!(err, SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)) {
        return BrowserError::Network(DisplayErrorContext(&err).to_string());
    }

    let status = err.raw_response().map(|response| response.status().as_u16());
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    classify_response(status, code.as_deref(), message, credentials)
}

const AUTH_CODES: &[&str] = &[
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "Unauthorized",
    "InvalidToken",
];

const NOT_FOUND_CODES: &[&str] = &["NoSuchBucket", "NoSuchKey", "NotFound"];

fn classify_response(
    status: Option<u16>,
    code: Option<&str>,
    message: String,
    credentials: &Credentials,
) -> BrowserError {
    let auth = matches!(status, Some(401 | 403)) || code.is_some_and(|c| AUTH_CODES.contains(&c));
    if auth {
        return BrowserError::Auth(auth_message(message, credentials));
    }

    if status == Some(404) || code.is_some_and(|c| NOT_FOUND_CODES.contains(&c)) {
        return BrowserError::NotFound(message);
    }

    match code {
        Some(code) => BrowserError::Provider(format!("{}: {}", code, message)),
        None => BrowserError::Provider(message),
    }
}

/// Adds a hint when the access key id is the account id from the endpoint,
/// a frequent mix-up with providers that put the account id in the host name
fn auth_message(message: String, credentials: &Credentials) -> String {
    let access_key_id = credentials.access_key_id.trim();
    let confused = host_label(&credentials.endpoint)
        .is_some_and(|label| !access_key_id.is_empty() && label.eq_ignore_ascii_case(access_key_id));

    if confused {
        format!(
            "{}. The Access Key ID is identical to the account ID in the endpoint; \
             use the Access Key ID generated for your API token instead",
            message
        )
    } else {
        message
    }
}

#[async_trait::async_trait]
impl StorageGateway for S3Gateway {
    async fn list_buckets(&self, credentials: &Credentials) -> BrowserResult<Vec<BucketInfo>> {
        let client = self.client(credentials)?;
        tracing::debug!("Listing buckets");

        let output = client
            .list_buckets()
            .send()
            .await
            .map_err(|err| classify(err, credentials))
            .inspect_err(|err| tracing::warn!("Failed to list buckets: {}", err))?;

        let buckets: Vec<BucketInfo> = output
            .buckets()
            .iter()
            .filter_map(|bucket| {
                Some(BucketInfo {
                    name: bucket.name()?.to_string(),
                    creation_date: bucket.creation_date().map(|dt| to_utc(Some(dt))),
                })
            })
            .collect();

        tracing::debug!("Found {} buckets", buckets.len());
        Ok(buckets)
    }

    async fn list_objects(
        &self,
        credentials: &Credentials,
        bucket: &str,
        prefix: &Prefix,
    ) -> BrowserResult<Listing> {
        let client = self.client(credentials)?;
        tracing::debug!("Listing objects: bucket={}, prefix={:?}", bucket, prefix.as_str());

        let mut request = client.list_objects_v2().bucket(bucket).delimiter(DELIMITER);
        if !prefix.is_root() {
            request = request.prefix(prefix.as_str());
        }

        let output = request
            .send()
            .await
            .map_err(|err| classify(err, credentials))
            .inspect_err(|err| tracing::warn!("Failed to list {}/{}: {}", bucket, prefix, err))?;

        let contents: Vec<ObjectEntry> = output
            .contents()
            .iter()
            .filter_map(|obj| {
                Some(ObjectEntry {
                    key: obj.key()?.to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified: to_utc(obj.last_modified()),
                })
            })
            .collect();

        let common_prefixes: Vec<String> = output
            .common_prefixes()
            .iter()
            .filter_map(|common| common.prefix().map(str::to_string))
            .collect();

        let listing = navigator::partition_listing(prefix, contents, common_prefixes);
        tracing::debug!(
            "Found {} files and {} folders",
            listing.files.len(),
            listing.folders.len()
        );
        Ok(listing)
    }

    async fn put_object(
        &self,
        credentials: &Credentials,
        bucket: &str,
        upload: ObjectUpload,
    ) -> BrowserResult<()> {
        let client = self.client(credentials)?;
        tracing::debug!("Putting object (streaming): {}/{}", bucket, upload.key);

        let body = ByteStream::from_body_1_x(StreamBody::new(upload.body, upload.content_length));

        let mut request = client
            .put_object()
            .bucket(bucket)
            .key(&upload.key)
            .content_type(&upload.content_type)
            .body(body);

        if let Some(length) = upload.content_length {
            request = request.content_length(length as i64);
        }

        request
            .send()
            .await
            .map_err(|err| classify(err, credentials))
            .inspect_err(|err| tracing::error!("Failed to put {}/{}: {}", bucket, upload.key, err))?;

        tracing::info!("Stored object: {}/{}", bucket, upload.key);
        Ok(())
    }

    async fn get_object(
        &self,
        credentials: &Credentials,
        bucket: &str,
        key: &str,
    ) -> BrowserResult<ObjectStream> {
        let client = self.client(credentials)?;
        tracing::debug!("Getting object: {}/{}", bucket, key);

        let output = client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(err, credentials))
            .inspect_err(|err| tracing::warn!("Failed to get {}/{}: {}", bucket, key, err))?;

        let stream = stream::try_unfold(output.body, |mut body| async move {
            let chunk = body
                .try_next()
                .await
                .map_err(|e| BrowserError::Network(format!("Failed to read object: {}", e)))?;
            Ok::<_, BrowserError>(chunk.map(|bytes| (bytes, body)))
        });

        Ok(Box::pin(stream))
    }

    async fn delete_object(
        &self,
        credentials: &Credentials,
        bucket: &str,
        key: &str,
    ) -> BrowserResult<()> {
        let client = self.client(credentials)?;
        tracing::debug!("Deleting object: {}/{}", bucket, key);

        client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(err, credentials))
            .inspect_err(|err| tracing::error!("Failed to delete {}/{}: {}", bucket, key, err))?;

        tracing::info!("Deleted object: {}/{}", bucket, key);
        Ok(())
    }
}

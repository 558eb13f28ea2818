use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::se::to_string as to_xml_string;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

type Buckets = BTreeMap<String, BTreeMap<String, (Bytes, DateTime<Utc>)>>;

#[derive(Clone)]
struct FakeState {
    buckets: Arc<Mutex<Buckets>>,
    access_key_id: String,
}

/// Minimal path-style S3 service on a random local port
///
/// Understands ListBuckets, ListObjectsV2 (prefix and delimiter), PutObject,
/// GetObject and DeleteObject. Requests signed with any other access key id
/// get `InvalidAccessKeyId`. Shuts down on drop.
pub struct FakeS3 {
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    #[allow(dead_code)] // Keep handle alive to prevent task abort
    handle: JoinHandle<()>,
    pub endpoint: String,
    state: FakeState,
}

impl FakeS3 {
    pub async fn start(access_key_id: &str, buckets: &[&str]) -> Self {
        let state = FakeState {
            buckets: Arc::new(Mutex::new(
                buckets
                    .iter()
                    .map(|name| (name.to_string(), BTreeMap::new()))
                    .collect(),
            )),
            access_key_id: access_key_id.to_string(),
        };

        let app = Router::new()
            .route("/", get(list_buckets))
            .route("/{bucket}", get(list_objects))
            .route(
                "/{bucket}/{*key}",
                get(get_object).put(put_object).delete(delete_object),
            )
            .layer(middleware::from_fn_with_state(state.clone(), check_access_key))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        FakeS3 {
            shutdown_tx: Some(shutdown_tx),
            handle,
            endpoint: format!("http://{}", addr),
            state,
        }
    }

    pub fn seed(&self, bucket: &str, key: &str, data: &str) {
        self.state
            .buckets
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), (Bytes::from(data.to_string()), Utc::now()));
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.state
            .buckets
            .lock()
            .unwrap()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|(data, _)| data.clone())
    }
}

impl Drop for FakeS3 {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Serialize)]
#[serde(rename = "Error")]
struct ErrorBody {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "RequestId")]
    request_id: String,
}

fn s3_error(status: StatusCode, code: &str, message: &str) -> Response {
    let body = ErrorBody {
        code: code.to_string(),
        message: message.to_string(),
        request_id: "fake-request".to_string(),
    };
    xml(status, &body)
}

fn xml<T: Serialize>(status: StatusCode, body: &T) -> Response {
    let xml = to_xml_string(body).unwrap();
    (
        status,
        [(header::CONTENT_TYPE, "application/xml")],
        format!(r#"<?xml version="1.0" encoding="UTF-8"?>{}"#, xml),
    )
        .into_response()
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Compares the `Credential=<id>/...` part of the SigV4 header; signatures are not checked
async fn check_access_key(State(state): State<FakeState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split("Credential=").nth(1))
        .and_then(|v| v.split('/').next())
        .map(str::to_string);

    if presented.as_deref() != Some(state.access_key_id.as_str()) {
        return s3_error(
            StatusCode::FORBIDDEN,
            "InvalidAccessKeyId",
            "The AWS Access Key Id you provided does not exist in our records.",
        );
    }

    next.run(request).await
}

#[derive(Serialize)]
#[serde(rename = "ListAllMyBucketsResult")]
struct ListAllMyBucketsResult {
    #[serde(rename = "Buckets")]
    buckets: BucketList,
}

#[derive(Serialize)]
struct BucketList {
    #[serde(rename = "Bucket")]
    bucket: Vec<BucketEntry>,
}

#[derive(Serialize)]
struct BucketEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "CreationDate")]
    creation_date: String,
}

async fn list_buckets(State(state): State<FakeState>) -> Response {
    let created = timestamp(&Utc::now());
    let bucket = state
        .buckets
        .lock()
        .unwrap()
        .keys()
        .map(|name| BucketEntry {
            name: name.clone(),
            creation_date: created.clone(),
        })
        .collect();

    xml(
        StatusCode::OK,
        &ListAllMyBucketsResult {
            buckets: BucketList { bucket },
        },
    )
}

#[derive(Deserialize)]
struct ListQuery {
    prefix: Option<String>,
    delimiter: Option<String>,
}

#[derive(Serialize)]
#[serde(rename = "ListBucketResult")]
struct ListBucketResult {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Prefix")]
    prefix: String,
    #[serde(rename = "KeyCount")]
    key_count: usize,
    #[serde(rename = "MaxKeys")]
    max_keys: usize,
    #[serde(rename = "IsTruncated")]
    is_truncated: bool,
    #[serde(rename = "Contents")]
    contents: Vec<Contents>,
    #[serde(rename = "CommonPrefixes")]
    common_prefixes: Vec<CommonPrefix>,
}

#[derive(Serialize)]
struct Contents {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "LastModified")]
    last_modified: String,
    #[serde(rename = "ETag")]
    etag: String,
    #[serde(rename = "Size")]
    size: usize,
    #[serde(rename = "StorageClass")]
    storage_class: String,
}

#[derive(Serialize)]
struct CommonPrefix {
    #[serde(rename = "Prefix")]
    prefix: String,
}

async fn list_objects(
    Path(bucket): Path<String>,
    Query(query): Query<ListQuery>,
    State(state): State<FakeState>,
) -> Response {
    let buckets = state.buckets.lock().unwrap();
    let Some(objects) = buckets.get(&bucket) else {
        return s3_error(
            StatusCode::NOT_FOUND,
            "NoSuchBucket",
            "The specified bucket does not exist",
        );
    };

    let prefix = query.prefix.unwrap_or_default();
    let mut contents = Vec::new();
    let mut folders = BTreeSet::new();

    for (key, (data, modified)) in objects.range(prefix.clone()..) {
        let Some(rest) = key.strip_prefix(prefix.as_str()) else {
            break;
        };

        let folded = query
            .delimiter
            .as_deref()
            .and_then(|delimiter| rest.find(delimiter).map(|at| at + delimiter.len()));

        match folded {
            Some(end) => {
                folders.insert(format!("{}{}", prefix, &rest[..end]));
            }
            None => contents.push(Contents {
                key: key.clone(),
                last_modified: timestamp(modified),
                etag: "\"fake\"".to_string(),
                size: data.len(),
                storage_class: "STANDARD".to_string(),
            }),
        }
    }

    let common_prefixes: Vec<CommonPrefix> = folders
        .into_iter()
        .map(|prefix| CommonPrefix { prefix })
        .collect();

    let result = ListBucketResult {
        name: bucket,
        prefix,
        key_count: contents.len() + common_prefixes.len(),
        max_keys: 1000,
        is_truncated: false,
        contents,
        common_prefixes,
    };
    xml(StatusCode::OK, &result)
}

async fn put_object(
    Path((bucket, key)): Path<(String, String)>,
    State(state): State<FakeState>,
    body: Bytes,
) -> Response {
    let mut buckets = state.buckets.lock().unwrap();
    let Some(objects) = buckets.get_mut(&bucket) else {
        return s3_error(
            StatusCode::NOT_FOUND,
            "NoSuchBucket",
            "The specified bucket does not exist",
        );
    };

    objects.insert(key, (body, Utc::now()));
    (StatusCode::OK, [(header::ETAG, "\"fake\"")]).into_response()
}

async fn get_object(
    Path((bucket, key)): Path<(String, String)>,
    State(state): State<FakeState>,
) -> Response {
    let buckets = state.buckets.lock().unwrap();
    match buckets.get(&bucket).and_then(|objects| objects.get(&key)) {
        Some((data, _)) => {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, "application/octet-stream".parse().unwrap());
            (StatusCode::OK, headers, data.clone()).into_response()
        }
        None => s3_error(
            StatusCode::NOT_FOUND,
            "NoSuchKey",
            "The specified key does not exist.",
        ),
    }
}

async fn delete_object(
    Path((bucket, key)): Path<(String, String)>,
    State(state): State<FakeState>,
) -> Response {
    if let Some(objects) = state.buckets.lock().unwrap().get_mut(&bucket) {
        objects.remove(&key);
    }
    StatusCode::NO_CONTENT.into_response()
}

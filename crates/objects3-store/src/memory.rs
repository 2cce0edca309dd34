//! In-memory object store for testing and local development

use crate::{types::*, ObjectStore, Result, StoreError, MAX_DELETE_KEYS, MAX_LIST_KEYS};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug)]
struct StoredObject {
    body: Bytes,
    etag: String,
    content_type: String,
    last_modified: DateTime<Utc>,
}

type Bucket = BTreeMap<String, StoredObject>;

/// An in-memory object store.
///
/// Keys are kept in lexicographic order per bucket and listed the way
/// ListObjectsV2 lists them. Buckets must be created before use. Clones
/// share the same contents.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    buckets: Arc<RwLock<HashMap<String, Bucket>>>,
    faults: Arc<RwLock<HashMap<String, (String, String)>>>,
}

impl MemoryObjectStore {
    /// Create a new store without buckets
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new store holding one empty bucket
    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::new();
        store.create_bucket(bucket);
        store
    }

    /// Create a bucket; existing buckets are left untouched
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets.write().entry(bucket.to_string()).or_default();
    }

    /// Number of objects in a bucket
    pub fn len(&self, bucket: &str) -> usize {
        self.buckets.read().get(bucket).map_or(0, |b| b.len())
    }

    /// Check whether a bucket holds no objects
    pub fn is_empty(&self, bucket: &str) -> bool {
        self.len(bucket) == 0
    }

    /// Check whether an object exists
    pub fn contains_key(&self, bucket: &str, key: &str) -> bool {
        self.buckets
            .read()
            .get(bucket)
            .is_some_and(|b| b.contains_key(key))
    }

    /// Make every get, put and delete of `key` fail with the given service error
    pub fn fail_key(&self, key: impl Into<String>, code: impl Into<String>, message: impl Into<String>) {
        self.faults
            .write()
            .insert(key.into(), (code.into(), message.into()));
    }

    /// Remove all injected failures
    pub fn clear_faults(&self) {
        self.faults.write().clear();
    }

    fn fault(&self, key: &str) -> Option<(String, String)> {
        self.faults.read().get(key).cloned()
    }

    fn check_fault(&self, key: &str) -> Result<()> {
        match self.fault(key) {
            Some((code, message)) => Err(StoreError::service(code, message)),
            None => Ok(()),
        }
    }
}

fn no_such_bucket(bucket: &str) -> StoreError {
    StoreError::service(
        "NoSuchBucket",
        format!("The specified bucket does not exist: {}", bucket),
    )
}

fn encode_token(marker: &str) -> String {
    URL_SAFE_NO_PAD.encode(marker)
}

fn decode_token(token: &str) -> Result<String> {
    URL_SAFE_NO_PAD
        .decode(token)
        .ok()
        .and_then(|raw| String::from_utf8(raw).ok())
        .ok_or_else(|| {
            StoreError::service("InvalidArgument", "The continuation token provided is incorrect")
        })
}

/// One slot of a listing page: a key, or a group of keys under a delimiter
enum ListEntry<'a> {
    Object(&'a str, &'a StoredObject),
    Prefix(String),
}

impl ListEntry<'_> {
    fn name(&self) -> &str {
        match self {
            ListEntry::Object(key, _) => key,
            ListEntry::Prefix(prefix) => prefix,
        }
    }
}

fn classify<'a>(
    key: &'a str,
    object: &'a StoredObject,
    prefix: &str,
    delimiter: Option<&str>,
) -> ListEntry<'a> {
    if let Some(delim) = delimiter.filter(|d| !d.is_empty()) {
        let suffix = &key[prefix.len()..];
        if let Some(pos) = suffix.find(delim) {
            return ListEntry::Prefix(format!("{}{}{}", prefix, &suffix[..pos], delim));
        }
    }
    ListEntry::Object(key, object)
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        response_content_type: Option<&str>,
    ) -> Result<GetObjectOutput> {
        let buckets = self.buckets.read();
        let objects = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        self.check_fault(key)?;

        let object = objects.get(key).ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;

        Ok(GetObjectOutput {
            body: object.body.clone(),
            etag: object.etag.clone(),
            content_length: object.body.len() as u64,
            content_type: Some(
                response_content_type
                    .unwrap_or(object.content_type.as_str())
                    .to_string(),
            ),
            last_modified: Some(object.last_modified),
            metadata: HashMap::new(),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<PutObjectOutput> {
        let mut buckets = self.buckets.write();
        let objects = buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        self.check_fault(key)?;

        let etag = hex::encode(Md5::digest(&body));
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                etag: etag.clone(),
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );

        Ok(PutObjectOutput {
            etag,
            version_id: None,
        })
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteObjectsOutput> {
        if keys.is_empty() {
            return Err(StoreError::service(
                "MalformedXML",
                "No objects specified for deletion",
            ));
        }
        if keys.len() > MAX_DELETE_KEYS {
            return Err(StoreError::service(
                "MalformedXML",
                format!("Maximum {} objects per delete request", MAX_DELETE_KEYS),
            ));
        }

        let mut buckets = self.buckets.write();
        let objects = buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;

        // A set, so confirmations come back in key order, not request order
        let mut deleted = BTreeSet::new();
        let mut errors = Vec::new();
        let mut seen = BTreeSet::new();

        for key in keys {
            if !seen.insert(key.as_str()) {
                continue;
            }
            match self.fault(key) {
                Some((code, message)) => errors.push(DeleteError {
                    key: key.clone(),
                    code,
                    message,
                }),
                None => {
                    // Missing keys count as deleted
                    objects.remove(key);
                    deleted.insert(key.clone());
                }
            }
        }

        debug!(deleted = deleted.len(), errors = errors.len(), "bulk delete");
        Ok(DeleteObjectsOutput {
            deleted: deleted.into_iter().map(DeletedObject::new).collect(),
            errors,
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        request: &ListObjectsRequest,
    ) -> Result<ListObjectsOutput> {
        let buckets = self.buckets.read();
        let objects = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;

        let prefix = request.prefix.as_str();
        let delimiter = request.delimiter.as_deref();
        let limit = request.max_keys.min(MAX_LIST_KEYS);
        let marker = request
            .continuation_token
            .as_deref()
            .map(decode_token)
            .transpose()?;

        let mut contents = Vec::new();
        let mut common_prefixes: Vec<CommonPrefix> = Vec::new();
        let mut last: Option<String> = None;
        let mut is_truncated = false;

        if limit > 0 {
            let matching = objects
                .range(prefix.to_string()..)
                .take_while(|(key, _)| key.starts_with(prefix));

            for (key, object) in matching {
                let entry = classify(key, object, prefix, delimiter);
                if marker.as_deref().is_some_and(|m| entry.name() <= m) {
                    continue;
                }
                // Keys of one group are contiguous
                if last.as_deref() == Some(entry.name()) {
                    continue;
                }
                if contents.len() + common_prefixes.len() == limit {
                    is_truncated = true;
                    break;
                }

                last = Some(entry.name().to_string());
                match entry {
                    ListEntry::Object(key, object) => contents.push(ObjectSummary {
                        key: key.to_string(),
                        last_modified: Some(object.last_modified),
                        etag: object.etag.clone(),
                        size: object.body.len() as u64,
                        storage_class: "STANDARD".to_string(),
                    }),
                    ListEntry::Prefix(prefix) => common_prefixes.push(CommonPrefix { prefix }),
                }
            }
        }

        let next_continuation_token = if is_truncated {
            last.as_deref().map(encode_token)
        } else {
            None
        };

        Ok(ListObjectsOutput {
            name: bucket.to_string(),
            prefix: prefix.to_string(),
            delimiter: request.delimiter.clone(),
            max_keys: limit,
            key_count: contents.len() + common_prefixes.len(),
            is_truncated,
            continuation_token: request.continuation_token.clone(),
            next_continuation_token,
            contents,
            common_prefixes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(keys: &[&str]) -> MemoryObjectStore {
        let store = MemoryObjectStore::with_bucket("docs");
        for key in keys {
            store
                .put_object("docs", key, Bytes::from_static(b"{}"), "application/json")
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryObjectStore::with_bucket("docs");
        let put = store
            .put_object("docs", "a.json", Bytes::from_static(b"{\"a\":1}"), "application/json")
            .await
            .unwrap();

        let got = store.get_object("docs", "a.json", None).await.unwrap();
        assert_eq!(&got.body[..], b"{\"a\":1}");
        assert_eq!(got.etag, put.etag);
        assert_eq!(got.content_length, 7);
        assert_eq!(got.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_missing_key_and_bucket() {
        let store = MemoryObjectStore::with_bucket("docs");

        let err = store.get_object("docs", "nope.json", None).await.unwrap_err();
        assert!(err.is_no_such_key());

        let err = store.get_object("other", "nope.json", None).await.unwrap_err();
        assert!(!err.is_no_such_key());
        assert_eq!(err.code(), Some("NoSuchBucket"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_and_unordered() {
        let store = seeded(&["b.json", "a.json"]).await;
        let keys = vec!["b.json".to_string(), "missing.json".to_string(), "a.json".to_string()];

        let result = store.delete_objects("docs", &keys).await.unwrap();
        assert!(result.errors.is_empty());
        assert_eq!(
            result.deleted,
            vec![
                DeletedObject::new("a.json"),
                DeletedObject::new("b.json"),
                DeletedObject::new("missing.json"),
            ]
        );
        assert!(store.is_empty("docs"));
    }

    #[tokio::test]
    async fn test_delete_rejects_empty_request() {
        let store = MemoryObjectStore::with_bucket("docs");
        let err = store.delete_objects("docs", &[]).await.unwrap_err();
        assert_eq!(err.code(), Some("MalformedXML"));
    }

    #[tokio::test]
    async fn test_faulted_key_reports_delete_error() {
        let store = seeded(&["a.json", "b.json"]).await;
        store.fail_key("b.json", "AccessDenied", "Access Denied");

        let keys = vec!["a.json".to_string(), "b.json".to_string()];
        let result = store.delete_objects("docs", &keys).await.unwrap();
        assert_eq!(result.deleted, vec![DeletedObject::new("a.json")]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].key, "b.json");
        assert!(store.contains_key("docs", "b.json"));

        let err = store.get_object("docs", "b.json", None).await.unwrap_err();
        assert!(err.is_access_denied());
    }

    #[tokio::test]
    async fn test_list_with_delimiter_groups_keys() {
        let store = seeded(&["p/sub1/a.json", "p/sub1/b.json", "p/sub2/c.json", "p/top.json"]).await;
        let request = ListObjectsRequest::new("p/", 100).with_delimiter("/");

        let page = store.list_objects("docs", &request).await.unwrap();
        assert_eq!(page.keys(), vec!["p/top.json"]);
        let prefixes: Vec<_> = page.common_prefixes.iter().map(|p| p.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["p/sub1/", "p/sub2/"]);
        assert_eq!(page.key_count, 3);
        assert!(!page.is_truncated);
    }

    #[tokio::test]
    async fn test_list_paginates_without_overlap() {
        let store = seeded(&["k/1", "k/2", "k/3", "k/4", "k/5", "other"]).await;
        let mut request = ListObjectsRequest::new("k/", 2);
        let mut seen = Vec::new();

        loop {
            let page = store.list_objects("docs", &request).await.unwrap();
            assert!(page.key_count <= 2);
            seen.extend(page.keys());
            match page.next_page_token() {
                Some(token) => request = request.clone().with_continuation_token(token),
                None => break,
            }
        }

        assert_eq!(seen, vec!["k/1", "k/2", "k/3", "k/4", "k/5"]);
    }

    #[tokio::test]
    async fn test_list_paginates_common_prefixes() {
        let store = seeded(&["p/a/1", "p/a/2", "p/b/1", "p/c"]).await;
        let request = ListObjectsRequest::new("p/", 1).with_delimiter("/");

        let first = store.list_objects("docs", &request).await.unwrap();
        assert_eq!(first.common_prefixes[0].prefix, "p/a/");
        let token = first.next_page_token().unwrap().to_string();

        let second = store
            .list_objects("docs", &request.clone().with_continuation_token(token))
            .await
            .unwrap();
        assert_eq!(second.common_prefixes[0].prefix, "p/b/");
        assert!(second.is_truncated);
    }

    #[tokio::test]
    async fn test_list_rejects_garbage_token() {
        let store = MemoryObjectStore::with_bucket("docs");
        let request = ListObjectsRequest::new("", 10).with_continuation_token("***");
        let err = store.list_objects("docs", &request).await.unwrap_err();
        assert_eq!(err.code(), Some("InvalidArgument"));
    }
}

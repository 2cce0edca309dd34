//! JSON primitives over an [`ObjectStore`]
//!
//! Each function is one round trip (one per 1000 keys for deletes). They
//! translate between raw bodies and JSON values and normalize the
//! "no such key" and bulk-delete result shapes; nothing else.

use crate::{Error, ResolvedOptions, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use objects3_store::{
    DeleteObjectsOutput, DeletedObject, ListObjectsOutput, ObjectStore, PutObjectOutput,
    JSON_CONTENT_TYPE, MAX_DELETE_KEYS,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// A fetched document with the object's storage metadata
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JsonObject<T = Value> {
    /// Parsed body
    pub body: T,
    /// ETag
    #[serde(rename = "ETag")]
    pub etag: String,
    /// Stored size in bytes
    pub content_length: u64,
    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Last modified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// User metadata
    pub metadata: HashMap<String, String>,
}

/// One key or many, for bulk delete
pub trait IntoKeys {
    fn into_keys(self) -> Vec<String>;
}

impl IntoKeys for &str {
    fn into_keys(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoKeys for String {
    fn into_keys(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoKeys for &String {
    fn into_keys(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<K: AsRef<str>> IntoKeys for Vec<K> {
    fn into_keys(self) -> Vec<String> {
        self.iter().map(|k| k.as_ref().to_string()).collect()
    }
}

impl<K: AsRef<str>> IntoKeys for &Vec<K> {
    fn into_keys(self) -> Vec<String> {
        self.as_slice().into_keys()
    }
}

impl<K: AsRef<str>> IntoKeys for &[K] {
    fn into_keys(self) -> Vec<String> {
        self.iter().map(|k| k.as_ref().to_string()).collect()
    }
}

impl<K: AsRef<str>, const N: usize> IntoKeys for [K; N] {
    fn into_keys(self) -> Vec<String> {
        self.as_slice().into_keys()
    }
}

impl<K: AsRef<str>, const N: usize> IntoKeys for &[K; N] {
    fn into_keys(self) -> Vec<String> {
        self.as_slice().into_keys()
    }
}

/// Fetch and parse one document.
///
/// Returns `Ok(None)` when the key does not exist; every other store
/// failure is returned unchanged.
#[instrument(skip(store))]
pub async fn get_document<T, S>(store: &S, bucket: &str, key: &str) -> Result<Option<JsonObject<T>>>
where
    T: DeserializeOwned,
    S: ObjectStore + ?Sized,
{
    let object = match store.get_object(bucket, key, Some(JSON_CONTENT_TYPE)).await {
        Ok(object) => object,
        Err(e) if e.is_no_such_key() => {
            debug!("no such key");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let body = serde_json::from_slice(&object.body).map_err(|source| Error::Decode {
        key: key.to_string(),
        source,
    })?;

    Ok(Some(JsonObject {
        body,
        etag: object.etag,
        content_length: object.content_length,
        content_type: object.content_type,
        last_modified: object.last_modified,
        metadata: object.metadata,
    }))
}

/// Serialize and write one document, replacing whatever the key held
#[instrument(skip(store, document))]
pub async fn put_document<T, S>(
    store: &S,
    bucket: &str,
    key: &str,
    document: &T,
) -> Result<PutObjectOutput>
where
    T: Serialize + ?Sized,
    S: ObjectStore + ?Sized,
{
    let body = serde_json::to_vec(document).map_err(|source| Error::Encode {
        key: key.to_string(),
        source,
    })?;

    let output = store
        .put_object(bucket, key, Bytes::from(body), JSON_CONTENT_TYPE)
        .await?;
    Ok(output)
}

/// Delete one or many keys.
///
/// `Deleted` comes back in the order of `keys`, whatever order the store
/// confirmed them in. An empty key set issues no request.
#[instrument(skip(store, keys))]
pub async fn delete_documents<S>(
    store: &S,
    bucket: &str,
    keys: impl IntoKeys,
) -> Result<DeleteObjectsOutput>
where
    S: ObjectStore + ?Sized,
{
    let keys = keys.into_keys();
    if keys.is_empty() {
        return Ok(DeleteObjectsOutput::default());
    }

    let mut confirmed = HashMap::with_capacity(keys.len());
    let mut errors = Vec::new();
    for batch in keys.chunks(MAX_DELETE_KEYS) {
        let output = store.delete_objects(bucket, batch).await?;
        debug!(
            requested = batch.len(),
            deleted = output.deleted.len(),
            errors = output.errors.len(),
            "bulk delete"
        );
        confirmed.extend(output.deleted.into_iter().map(|d| (d.key.clone(), d)));
        errors.extend(output.errors);
    }

    Ok(DeleteObjectsOutput {
        deleted: in_key_order(&keys, &confirmed),
        errors,
    })
}

/// Project unordered confirmations back through the caller's key order
fn in_key_order(keys: &[String], confirmed: &HashMap<String, DeletedObject>) -> Vec<DeletedObject> {
    keys.iter()
        .filter_map(|key| confirmed.get(key).cloned())
        .collect()
}

/// Read exactly one page of the listing under `prefix`
#[instrument(skip(store))]
pub async fn list_page<S>(
    store: &S,
    bucket: &str,
    prefix: &str,
    options: &ResolvedOptions,
) -> Result<ListObjectsOutput>
where
    S: ObjectStore + ?Sized,
{
    let page = store
        .list_objects(bucket, &options.list_request(prefix))
        .await?;
    debug!(
        key_count = page.key_count,
        truncated = page.is_truncated,
        "listed page"
    );
    Ok(page)
}

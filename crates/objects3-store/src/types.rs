//! Request and response types of the primitive store calls
//!
//! Field names serialize the way the storage service spells them
//! (`Key`, `ETag`, `IsTruncated`, ...).

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An object as returned by a get
#[derive(Clone, Debug)]
pub struct GetObjectOutput {
    /// Raw object body
    pub body: Bytes,
    /// ETag
    pub etag: String,
    /// Content length in bytes
    pub content_length: u64,
    /// Content type
    pub content_type: Option<String>,
    /// Last modified
    pub last_modified: Option<DateTime<Utc>>,
    /// User metadata
    pub metadata: HashMap<String, String>,
}

/// Put object result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutObjectOutput {
    /// ETag of the written object
    #[serde(rename = "ETag")]
    pub etag: String,
    /// Version ID (if versioning enabled)
    #[serde(rename = "VersionId", default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

/// One key confirmed deleted by a bulk delete
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeletedObject {
    pub key: String,
}

impl DeletedObject {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// One key a bulk delete failed to remove
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteError {
    pub key: String,
    pub code: String,
    pub message: String,
}

/// Result of a bulk delete
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteObjectsOutput {
    /// Keys removed (or already absent)
    pub deleted: Vec<DeletedObject>,
    /// Keys the service refused to remove
    pub errors: Vec<DeleteError>,
}

/// Parameters of one listing call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListObjectsRequest {
    /// Only keys starting with this prefix are listed
    pub prefix: String,
    /// Upper bound on `Contents` plus `CommonPrefixes` in the page
    pub max_keys: usize,
    /// Token from a previous truncated page
    pub continuation_token: Option<String>,
    /// Groups keys sharing a segment after the prefix
    pub delimiter: Option<String>,
}

impl ListObjectsRequest {
    pub fn new(prefix: impl Into<String>, max_keys: usize) -> Self {
        Self {
            prefix: prefix.into(),
            max_keys,
            continuation_token: None,
            delimiter: None,
        }
    }

    pub fn with_continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }
}

/// A listed object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectSummary {
    /// Object key
    pub key: String,
    /// Last modified time, when the listing reported one
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag
    #[serde(rename = "ETag")]
    pub etag: String,
    /// Size in bytes
    pub size: u64,
    /// Storage class
    pub storage_class: String,
}

/// A key group produced by a delimiter
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommonPrefix {
    pub prefix: String,
}

/// One page of a listing.
///
/// `E` is the entry type of `Contents`; higher layers swap it for
/// entries enriched with bodies or delete outcomes while keeping every
/// other listing field intact.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListObjectsOutput<E = ObjectSummary> {
    /// Bucket name
    pub name: String,
    /// Prefix echoed from the request
    pub prefix: String,
    /// Delimiter echoed from the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    /// Page size echoed from the request
    pub max_keys: usize,
    /// Number of `Contents` plus `CommonPrefixes` in this page
    pub key_count: usize,
    /// Whether more entries follow this page
    pub is_truncated: bool,
    /// Token the page was requested with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
    /// Token for the next page, set when truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_continuation_token: Option<String>,
    /// Listed objects, in key order
    pub contents: Vec<E>,
    /// Key groups, when a delimiter was given
    pub common_prefixes: Vec<CommonPrefix>,
}

impl<E> ListObjectsOutput<E> {
    /// Replace the entries of the page, keeping every other field
    pub fn map_contents<U>(self, f: impl FnMut(E) -> U) -> ListObjectsOutput<U> {
        ListObjectsOutput {
            name: self.name,
            prefix: self.prefix,
            delimiter: self.delimiter,
            max_keys: self.max_keys,
            key_count: self.key_count,
            is_truncated: self.is_truncated,
            continuation_token: self.continuation_token,
            next_continuation_token: self.next_continuation_token,
            contents: self.contents.into_iter().map(f).collect(),
            common_prefixes: self.common_prefixes,
        }
    }

    /// Token to resubmit for the following page, if there is one
    pub fn next_page_token(&self) -> Option<&str> {
        if self.is_truncated {
            self.next_continuation_token.as_deref()
        } else {
            None
        }
    }
}

impl ListObjectsOutput<ObjectSummary> {
    /// Keys of the listed objects, in listing order
    pub fn keys(&self) -> Vec<String> {
        self.contents.iter().map(|o| o.key.clone()).collect()
    }
}

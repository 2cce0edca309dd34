//! Listing pages merged with fetched bodies or delete outcomes

use crate::JsonObject;
use chrono::{DateTime, Utc};
use objects3_store::{DeleteError, DeletedObject, ListObjectsOutput, ObjectSummary};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// A page from [`get_prefix`](crate::JsonBucket::get_prefix)
pub type PrefixPage<T = Value> = ListObjectsOutput<PrefixEntry<T>>;

/// A listed object merged with its document.
///
/// Fields reported by the get override the listing's where both exist.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrefixEntry<T = Value> {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(rename = "ETag")]
    pub etag: String,
    pub size: u64,
    pub storage_class: String,
    /// `None` when the key vanished between the listing and the get
    pub body: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl<T> PrefixEntry<T> {
    pub(crate) fn merge(summary: ObjectSummary, object: Option<JsonObject<T>>) -> Self {
        match object {
            Some(object) => Self {
                key: summary.key,
                last_modified: object.last_modified.or(summary.last_modified),
                etag: object.etag,
                size: object.content_length,
                storage_class: summary.storage_class,
                body: Some(object.body),
                content_type: object.content_type,
                metadata: object.metadata,
            },
            None => Self {
                key: summary.key,
                last_modified: summary.last_modified,
                etag: summary.etag,
                size: summary.size,
                storage_class: summary.storage_class,
                body: None,
                content_type: None,
                metadata: HashMap::new(),
            },
        }
    }
}

/// What happened to one listed key during [`delete_prefix`](crate::JsonBucket::delete_prefix)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "Status", rename_all = "PascalCase", rename_all_fields = "PascalCase")]
pub enum DeleteStatus {
    /// Removed, or already gone
    Deleted,
    /// The store refused to remove it
    Failed { code: String, message: String },
    /// The store reported neither a deletion nor an error for the key
    Unconfirmed,
}

impl DeleteStatus {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteStatus::Deleted)
    }
}

/// A listed object with its delete outcome attached
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeletedEntry {
    #[serde(flatten)]
    pub summary: ObjectSummary,
    #[serde(flatten)]
    pub status: DeleteStatus,
}

/// A page from [`delete_prefix`](crate::JsonBucket::delete_prefix).
///
/// The bulk-delete lists sit next to the listing fields; both are empty
/// when the prefix held nothing.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeletePrefixPage {
    #[serde(flatten)]
    pub page: ListObjectsOutput<DeletedEntry>,
    pub deleted: Vec<DeletedObject>,
    pub errors: Vec<DeleteError>,
}

/// Result of [`delete_one`](crate::JsonBucket::delete_one)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteOneOutput {
    pub deleted: Option<DeletedObject>,
    pub errors: Vec<DeleteError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(key: &str) -> ObjectSummary {
        ObjectSummary {
            key: key.to_string(),
            last_modified: Some(
                DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            ),
            etag: "listed".to_string(),
            size: 2,
            storage_class: "STANDARD".to_string(),
        }
    }

    #[test]
    fn test_fetched_fields_override_listing() {
        let object = JsonObject {
            body: json!({ "name": "obj1" }),
            etag: "fetched".to_string(),
            content_length: 15,
            content_type: Some("application/json".to_string()),
            last_modified: None,
            metadata: HashMap::new(),
        };

        let entry = PrefixEntry::merge(summary("a/b1.json"), Some(object));
        assert_eq!(entry.etag, "fetched");
        assert_eq!(entry.size, 15);
        assert_eq!(entry.last_modified, summary("a/b1.json").last_modified);
        assert_eq!(entry.body, Some(json!({ "name": "obj1" })));
    }

    #[test]
    fn test_vanished_key_keeps_listing_fields() {
        let entry = PrefixEntry::<Value>::merge(summary("gone.json"), None);
        assert_eq!(entry.etag, "listed");
        assert!(entry.body.is_none());
    }

    #[test]
    fn test_deleted_entry_serializes_flat() {
        let entry = DeletedEntry {
            summary: summary("a.json"),
            status: DeleteStatus::Failed {
                code: "AccessDenied".to_string(),
                message: "Access Denied".to_string(),
            },
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["Key"], "a.json");
        assert_eq!(value["Status"], "Failed");
        assert_eq!(value["Code"], "AccessDenied");
    }
}

//! XML bodies of the S3 wire protocol

use crate::{
    types::*,
    Result, StoreError,
};
use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use serde::Deserialize;

const S3_XMLNS: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "Code")]
    pub code: Option<String>,
    #[serde(rename = "Message")]
    pub message: Option<String>,
    #[serde(rename = "RequestId")]
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListBucketResult {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Prefix", default)]
    prefix: Option<String>,
    #[serde(rename = "Delimiter", default)]
    delimiter: Option<String>,
    #[serde(rename = "MaxKeys", default)]
    max_keys: Option<usize>,
    #[serde(rename = "KeyCount", default)]
    key_count: Option<usize>,
    #[serde(rename = "IsTruncated", default)]
    is_truncated: bool,
    #[serde(rename = "ContinuationToken", default)]
    continuation_token: Option<String>,
    #[serde(rename = "NextContinuationToken", default)]
    next_continuation_token: Option<String>,
    #[serde(rename = "Contents", default)]
    contents: Vec<ContentsEntry>,
    #[serde(rename = "CommonPrefixes", default)]
    common_prefixes: Vec<CommonPrefixEntry>,
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "LastModified", default)]
    last_modified: Option<String>,
    #[serde(rename = "ETag", default)]
    etag: Option<String>,
    #[serde(rename = "Size", default)]
    size: Option<u64>,
    #[serde(rename = "StorageClass", default)]
    storage_class: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommonPrefixEntry {
    #[serde(rename = "Prefix")]
    prefix: String,
}

#[derive(Debug, Deserialize)]
struct DeleteResult {
    #[serde(rename = "Deleted", default)]
    deleted: Vec<DeletedEntry>,
    #[serde(rename = "Error", default)]
    errors: Vec<DeleteErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct DeletedEntry {
    #[serde(rename = "Key")]
    key: String,
}

#[derive(Debug, Deserialize)]
struct DeleteErrorEntry {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Code", default)]
    code: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

/// Parse an `<Error>` document, if the body is one
pub(crate) fn parse_error(xml: &str) -> Option<ErrorBody> {
    quick_xml::de::from_str(xml).ok()
}

/// Parse a ListObjectsV2 `<ListBucketResult>` document
pub(crate) fn parse_list_objects(
    xml: &str,
    bucket: &str,
    request: &ListObjectsRequest,
) -> Result<ListObjectsOutput> {
    let result: ListBucketResult =
        quick_xml::de::from_str(xml).map_err(|e| StoreError::XmlParse(e.to_string()))?;

    let contents: Vec<ObjectSummary> = result
        .contents
        .into_iter()
        .map(|entry| ObjectSummary {
            key: entry.key,
            last_modified: entry
                .last_modified
                .as_deref()
                .and_then(parse_timestamp),
            etag: entry
                .etag
                .map(|s| s.trim_matches('"').to_string())
                .unwrap_or_default(),
            size: entry.size.unwrap_or(0),
            storage_class: entry.storage_class.unwrap_or_else(|| "STANDARD".to_string()),
        })
        .collect();
    let common_prefixes: Vec<CommonPrefix> = result
        .common_prefixes
        .into_iter()
        .map(|p| CommonPrefix { prefix: p.prefix })
        .collect();

    let name = result
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| bucket.to_string());
    let key_count = result
        .key_count
        .unwrap_or(contents.len() + common_prefixes.len());

    Ok(ListObjectsOutput {
        name,
        prefix: result.prefix.unwrap_or_default(),
        delimiter: result.delimiter.filter(|d| !d.is_empty()),
        max_keys: result.max_keys.unwrap_or(request.max_keys),
        key_count,
        is_truncated: result.is_truncated,
        continuation_token: result
            .continuation_token
            .or_else(|| request.continuation_token.clone()),
        next_continuation_token: result.next_continuation_token,
        contents,
        common_prefixes,
    })
}

/// Parse a `<DeleteResult>` document
pub(crate) fn parse_delete_result(xml: &str) -> Result<DeleteObjectsOutput> {
    let result: DeleteResult =
        quick_xml::de::from_str(xml).map_err(|e| StoreError::XmlParse(e.to_string()))?;

    Ok(DeleteObjectsOutput {
        deleted: result
            .deleted
            .into_iter()
            .map(|d| DeletedObject { key: d.key })
            .collect(),
        errors: result
            .errors
            .into_iter()
            .map(|e| DeleteError {
                key: e.key,
                code: e.code.unwrap_or_default(),
                message: e.message.unwrap_or_default(),
            })
            .collect(),
    })
}

/// Build the `<Delete>` request body for a bulk delete
pub(crate) fn delete_request(keys: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Delete xmlns="{}"><Quiet>false</Quiet>"#,
        S3_XMLNS
    );
    for key in keys {
        xml.push_str("<Object><Key>");
        xml.push_str(&escape(key.as_str()));
        xml.push_str("</Key></Object>");
    }
    xml.push_str("</Delete>");
    xml
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

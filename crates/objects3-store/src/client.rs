//! S3-compatible HTTP backend

use crate::{
    types::*,
    xml, Config, ObjectStore, Result, StoreError,
};
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use reqwest::{header, Client, Method, Response};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Client for an S3-compatible endpoint, addressing buckets path-style
pub struct S3Client {
    config: Config,
    http: Client,
}

impl S3Client {
    /// Create a new client with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let user_agent = header::HeaderValue::from_str(&config.user_agent)
            .map_err(|e| StoreError::Config(format!("invalid user agent: {}", e)))?;
        headers.insert(header::USER_AGENT, user_agent);

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(StoreError::Http)?;

        Ok(Self { config, http })
    }

    /// Create with endpoint URL
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Self::new(Config::new(endpoint))
    }

    /// Create from `OBJECTS3_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        headers: Option<HashMap<&'static str, String>>,
        body: Option<Bytes>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.config.base_url(), path);
        let mut req = self.http.request(method.clone(), &url);

        if let Some(q) = query {
            req = req.query(q);
        }

        if let Some(token) = &self.config.access_token {
            req = req.bearer_auth(token);
        }

        if let Some(hdrs) = headers {
            for (k, v) in hdrs {
                req = req.header(k, v);
            }
        }

        if let Some(data) = body {
            req = req.body(data);
        }

        debug!("Sending {} request to {}", method, url);
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::from_s3_xml(&text, status.as_u16()));
        }

        Ok(response)
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    #[instrument(skip(self))]
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        response_content_type: Option<&str>,
    ) -> Result<GetObjectOutput> {
        let path = object_path(bucket, key);
        let query: Vec<(&str, String)> = response_content_type
            .map(|ct| vec![("response-content-type", ct.to_string())])
            .unwrap_or_default();

        let response = self
            .request(Method::GET, &path, Some(&query), None, None)
            .await?;

        let headers = response.headers();
        let etag = header_str(headers, header::ETAG)
            .map(|s| s.trim_matches('"').to_string())
            .unwrap_or_default();
        let content_type = header_str(headers, header::CONTENT_TYPE).map(str::to_string);
        let content_length = header_str(headers, header::CONTENT_LENGTH).and_then(|s| s.parse().ok());
        let last_modified = header_str(headers, header::LAST_MODIFIED)
            .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
            .map(|d| d.with_timezone(&Utc));

        let mut metadata = HashMap::new();
        for (name, value) in headers.iter() {
            if let Some(meta_key) = name.as_str().strip_prefix("x-amz-meta-") {
                if let Ok(v) = value.to_str() {
                    metadata.insert(meta_key.to_string(), v.to_string());
                }
            }
        }

        let body = response.bytes().await?;

        Ok(GetObjectOutput {
            content_length: content_length.unwrap_or(body.len() as u64),
            body,
            etag,
            content_type,
            last_modified,
            metadata,
        })
    }

    #[instrument(skip(self, body), fields(len = body.len()))]
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<PutObjectOutput> {
        let path = object_path(bucket, key);
        let mut headers = HashMap::new();
        headers.insert("Content-Type", content_type.to_string());

        let response = self
            .request(Method::PUT, &path, None, Some(headers), Some(body))
            .await?;

        let etag = header_str(response.headers(), header::ETAG)
            .map(|s| s.trim_matches('"').to_string())
            .unwrap_or_default();
        let version_id = response
            .headers()
            .get("x-amz-version-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(PutObjectOutput { etag, version_id })
    }

    #[instrument(skip(self, keys), fields(count = keys.len()))]
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteObjectsOutput> {
        let body = xml::delete_request(keys);
        let digest = Md5::digest(body.as_bytes());

        let mut headers = HashMap::new();
        headers.insert("Content-Type", "application/xml".to_string());
        headers.insert(
            "Content-MD5",
            base64::engine::general_purpose::STANDARD.encode(digest),
        );

        let path = bucket_path(bucket);
        let query = [("delete", String::new())];
        let response = self
            .request(Method::POST, &path, Some(&query), Some(headers), Some(Bytes::from(body)))
            .await?;
        let text = response.text().await?;
        xml::parse_delete_result(&text)
    }

    #[instrument(skip(self))]
    async fn list_objects(
        &self,
        bucket: &str,
        request: &ListObjectsRequest,
    ) -> Result<ListObjectsOutput> {
        let mut query = vec![
            ("list-type", "2".to_string()),
            ("prefix", request.prefix.clone()),
            ("max-keys", request.max_keys.to_string()),
        ];
        if let Some(delimiter) = &request.delimiter {
            query.push(("delimiter", delimiter.clone()));
        }
        if let Some(token) = &request.continuation_token {
            query.push(("continuation-token", token.clone()));
        }

        let path = bucket_path(bucket);
        let response = self.request(Method::GET, &path, Some(&query), None, None).await?;
        let text = response.text().await?;
        xml::parse_list_objects(&text, bucket, request)
    }
}

fn bucket_path(bucket: &str) -> String {
    format!("/{}", urlencoding::encode(bucket))
}

fn object_path(bucket: &str, key: &str) -> String {
    let encoded: Vec<_> = key.split('/').map(urlencoding::encode).collect();
    format!("{}/{}", bucket_path(bucket), encoded.join("/"))
}

fn header_str(headers: &header::HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

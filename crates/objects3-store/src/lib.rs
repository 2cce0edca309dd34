//! # objects3 store
//!
//! The object-storage seam underneath objects3.
//!
//! This crate provides:
//! - **`ObjectStore` trait**: the four primitive calls every backend offers
//!   (get, put, bulk delete, list one page)
//! - **`S3Client`**: an S3-compatible HTTP backend
//! - **`MemoryObjectStore`**: an in-process backend with the same listing and
//!   delete semantics, for tests and local development
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        objects3 (JSON documents)        │
//! ├─────────────────────────────────────────┤
//! │           ObjectStore Trait             │
//! ├────────────────────┬────────────────────┤
//! │      S3Client      │ MemoryObjectStore  │
//! ├────────────────────┴────────────────────┤
//! │      S3-compatible object storage       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use objects3_store::{Config, ObjectStore, S3Client};
//!
//! let store = S3Client::new(Config::new("http://localhost:9000"))?;
//! store.put_object("my-bucket", "hello.json", b"{}".to_vec().into(), "application/json").await?;
//! let object = store.get_object("my-bucket", "hello.json", None).await?;
//! ```

mod client;
mod config;
mod error;
mod memory;
mod types;
mod xml;

pub use client::S3Client;
pub use config::Config;
pub use error::{Result, StoreError};
pub use memory::MemoryObjectStore;
pub use types::*;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Content type written for, and requested from, JSON documents
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Largest page a single listing call may return
pub const MAX_LIST_KEYS: usize = 1000;

/// Largest key set a single bulk delete may carry
pub const MAX_DELETE_KEYS: usize = 1000;

/// The primitive calls of an object-storage service.
///
/// Implementations perform exactly one round trip per call: no retries,
/// no pagination, no caching.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object and its metadata.
    ///
    /// A missing key must surface as an error for which
    /// [`StoreError::is_no_such_key`] holds.
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        response_content_type: Option<&str>,
    ) -> Result<GetObjectOutput>;

    /// Write an object, replacing any previous body under the key
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<PutObjectOutput>;

    /// Delete a set of keys in one request.
    ///
    /// `Deleted` entries may come back in any order. Missing keys are
    /// reported as deleted.
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteObjectsOutput>;

    /// Read one page of a listing
    async fn list_objects(
        &self,
        bucket: &str,
        request: &ListObjectsRequest,
    ) -> Result<ListObjectsOutput>;
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        response_content_type: Option<&str>,
    ) -> Result<GetObjectOutput> {
        (**self).get_object(bucket, key, response_content_type).await
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<PutObjectOutput> {
        (**self).put_object(bucket, key, body, content_type).await
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteObjectsOutput> {
        (**self).delete_objects(bucket, keys).await
    }

    async fn list_objects(
        &self,
        bucket: &str,
        request: &ListObjectsRequest,
    ) -> Result<ListObjectsOutput> {
        (**self).list_objects(bucket, request).await
    }
}

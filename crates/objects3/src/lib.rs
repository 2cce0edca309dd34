//! # objects3
//!
//! JSON documents on S3-compatible object storage.
//!
//! ## Features
//!
//! - **Single key**: get, put and delete one document; a missing key reads
//!   as `None`, never as an error
//! - **Multiple keys**: concurrent fan-out with results in input order
//! - **Prefix**: list one page, fetch or delete everything on it, and follow
//!   continuation tokens as a stream
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     JsonBucket (multi-key, prefix)      │
//! ├─────────────────────────────────────────┤
//! │   json::{get,put,delete,list} prims     │
//! ├─────────────────────────────────────────┤
//! │        objects3_store::ObjectStore      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use objects3::{BulkOptions, JsonBucket, MemoryObjectStore};
//! use serde_json::{json, Value};
//!
//! let docs = JsonBucket::new(MemoryObjectStore::with_bucket("docs"), "docs");
//! docs.put_multiple(&["a/b1.json", "a/b2.json"], &[json!({"n": 1}), json!({"n": 2})], None).await?;
//!
//! let page = docs.get_prefix::<Value>("a/", None).await?;
//! for entry in &page.contents {
//!     println!("{} => {:?}", entry.key, entry.body);
//! }
//!
//! docs.delete_prefix("a/", Some(&BulkOptions::new().with_max_keys(1000))).await?;
//! ```

mod bucket;
mod error;
pub mod json;
mod options;
mod page;

pub use bucket::JsonBucket;
pub use error::{Error, Result};
pub use json::{IntoKeys, JsonObject};
pub use options::{BulkOptions, ResolvedOptions, DEFAULT_MAX_KEYS};
pub use page::{DeleteOneOutput, DeletePrefixPage, DeleteStatus, DeletedEntry, PrefixEntry, PrefixPage};

// Re-export the store seam so callers need a single dependency
pub use objects3_store::{
    CommonPrefix, Config, DeleteError, DeleteObjectsOutput, DeletedObject, ListObjectsOutput,
    MemoryObjectStore, ObjectStore, ObjectSummary, PutObjectOutput, S3Client, StoreError,
};

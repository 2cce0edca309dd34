//! Bucket-scoped document façade

use crate::{
    json::{self, IntoKeys, JsonObject},
    page::{DeleteOneOutput, DeletePrefixPage, DeleteStatus, DeletedEntry, PrefixEntry, PrefixPage},
    BulkOptions, Error, ResolvedOptions, Result,
};
use futures::{future::try_join_all, stream, Stream};
use objects3_store::{DeleteError, DeleteObjectsOutput, ListObjectsOutput, ObjectStore, PutObjectOutput};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// JSON documents in one bucket.
///
/// Holds the store handle, the bucket name and default listing options;
/// nothing else. Multi-key calls fan out concurrently and return results
/// in input order. The first failing key fails the whole call, and writes
/// that already landed are not rolled back.
#[derive(Clone)]
pub struct JsonBucket<S> {
    store: S,
    bucket: String,
    defaults: BulkOptions,
}

impl<S: ObjectStore> JsonBucket<S> {
    /// Create a façade over `bucket` with default options
    pub fn new(store: S, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            defaults: BulkOptions::default(),
        }
    }

    /// Set the instance-level listing options
    pub fn with_defaults(mut self, defaults: BulkOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Instance-level listing options
    pub fn defaults(&self) -> &BulkOptions {
        &self.defaults
    }

    fn resolve(&self, options: Option<&BulkOptions>) -> ResolvedOptions {
        match options {
            Some(call) => self.defaults.overlay(call).resolve(),
            None => self.defaults.resolve(),
        }
    }

    // ==================== Single Key ====================

    /// Fetch one document; `None` if the key does not exist
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn get_one<T: DeserializeOwned>(&self, key: &str) -> Result<Option<JsonObject<T>>> {
        json::get_document(&self.store, &self.bucket, key).await
    }

    /// Write one document
    #[instrument(skip(self, document), fields(bucket = %self.bucket))]
    pub async fn put_one<T: Serialize + ?Sized>(
        &self,
        key: &str,
        document: &T,
    ) -> Result<PutObjectOutput> {
        json::put_document(&self.store, &self.bucket, key, document).await
    }

    /// Delete one key; `deleted` is `None` only if the store refused.
    ///
    /// `options` carry listing controls only and do not change a keyed delete.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn delete_one(
        &self,
        key: &str,
        options: Option<&BulkOptions>,
    ) -> Result<DeleteOneOutput> {
        let output = json::delete_documents(&self.store, &self.bucket, key).await?;
        Ok(DeleteOneOutput {
            deleted: output.deleted.into_iter().next(),
            errors: output.errors,
        })
    }

    // ==================== Multiple Keys ====================

    /// Fetch several documents concurrently, in the order of `keys`
    #[instrument(skip(self, keys), fields(bucket = %self.bucket, count = keys.len()))]
    pub async fn get_multiple<T, K>(
        &self,
        keys: &[K],
        options: Option<&BulkOptions>,
    ) -> Result<Vec<Option<JsonObject<T>>>>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
    {
        debug!("fetching documents");
        try_join_all(keys.iter().map(|key| self.get_one(key.as_ref()))).await
    }

    /// Write `documents[i]` under `keys[i]` concurrently; results follow input order
    #[instrument(skip(self, keys, documents), fields(bucket = %self.bucket, count = keys.len()))]
    pub async fn put_multiple<T, K>(
        &self,
        keys: &[K],
        documents: &[T],
        options: Option<&BulkOptions>,
    ) -> Result<Vec<PutObjectOutput>>
    where
        T: Serialize,
        K: AsRef<str>,
    {
        if keys.len() != documents.len() {
            return Err(Error::LengthMismatch {
                keys: keys.len(),
                documents: documents.len(),
            });
        }

        debug!("writing documents");
        try_join_all(
            keys.iter()
                .zip(documents)
                .map(|(key, document)| self.put_one(key.as_ref(), document)),
        )
        .await
    }

    /// Delete several keys in one request; `Deleted` follows the order of `keys`
    #[instrument(skip(self, keys), fields(bucket = %self.bucket))]
    pub async fn delete_many(&self, keys: impl IntoKeys) -> Result<DeleteObjectsOutput> {
        json::delete_documents(&self.store, &self.bucket, keys).await
    }

    // ==================== Prefix ====================

    /// Read one listing page under `prefix`
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn list(&self, prefix: &str, options: Option<&BulkOptions>) -> Result<ListObjectsOutput> {
        json::list_page(&self.store, &self.bucket, prefix, &self.resolve(options)).await
    }

    /// Read one listing page and fetch the document behind every listed key.
    ///
    /// Listing fields (`IsTruncated`, `NextContinuationToken`,
    /// `CommonPrefixes`, ...) pass through untouched. Only one page is read.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn get_prefix<T: DeserializeOwned>(
        &self,
        prefix: &str,
        options: Option<&BulkOptions>,
    ) -> Result<PrefixPage<T>> {
        self.get_prefix_resolved(prefix, &self.resolve(options)).await
    }

    async fn get_prefix_resolved<T: DeserializeOwned>(
        &self,
        prefix: &str,
        options: &ResolvedOptions,
    ) -> Result<PrefixPage<T>> {
        let page = json::list_page(&self.store, &self.bucket, prefix, options).await?;
        let keys = page.keys();
        let objects = self.get_multiple::<T, String>(&keys, None).await?;

        let mut objects = objects.into_iter();
        Ok(page.map_contents(|summary| PrefixEntry::merge(summary, objects.next().flatten())))
    }

    /// Read one listing page and delete every listed key.
    ///
    /// Each entry carries its own outcome; the page also exposes the
    /// bulk-delete `Deleted` and `Errors` lists. An empty page deletes
    /// nothing and returns empty lists.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn delete_prefix(
        &self,
        prefix: &str,
        options: Option<&BulkOptions>,
    ) -> Result<DeletePrefixPage> {
        let page = self.list(prefix, options).await?;
        let outcome = json::delete_documents(&self.store, &self.bucket, page.keys()).await?;

        let page = {
            let confirmed: HashSet<&str> = outcome.deleted.iter().map(|d| d.key.as_str()).collect();
            let failed: HashMap<&str, &DeleteError> =
                outcome.errors.iter().map(|e| (e.key.as_str(), e)).collect();

            page.map_contents(|summary| {
                let status = match failed.get(summary.key.as_str()) {
                    Some(error) => DeleteStatus::Failed {
                        code: error.code.clone(),
                        message: error.message.clone(),
                    },
                    None if confirmed.contains(summary.key.as_str()) => DeleteStatus::Deleted,
                    None => DeleteStatus::Unconfirmed,
                };
                DeletedEntry { summary, status }
            })
        };

        Ok(DeletePrefixPage {
            page,
            deleted: outcome.deleted,
            errors: outcome.errors,
        })
    }

    // ==================== Pagination ====================

    /// Every listing page under `prefix`, following continuation tokens.
    ///
    /// Each item is one listing call; the stream ends after the first page
    /// that is not truncated.
    pub fn list_pages<'a>(
        &'a self,
        prefix: &str,
        options: Option<&BulkOptions>,
    ) -> impl Stream<Item = Result<ListObjectsOutput>> + 'a {
        let prefix = prefix.to_string();
        stream::try_unfold(Some(self.resolve(options)), move |state| {
            let prefix = prefix.clone();
            async move {
                let Some(options) = state else {
                    return Ok(None);
                };
                let page = json::list_page(&self.store, &self.bucket, &prefix, &options).await?;
                let next = page.next_page_token().map(|token| options.next_page(token));
                Ok::<_, Error>(Some((page, next)))
            }
        })
    }

    /// Like [`get_prefix`](Self::get_prefix), repeated over every page under `prefix`
    pub fn get_prefix_pages<'a, T>(
        &'a self,
        prefix: &str,
        options: Option<&BulkOptions>,
    ) -> impl Stream<Item = Result<PrefixPage<T>>> + 'a
    where
        T: DeserializeOwned + 'a,
    {
        let prefix = prefix.to_string();
        stream::try_unfold(Some(self.resolve(options)), move |state| {
            let prefix = prefix.clone();
            async move {
                let Some(options) = state else {
                    return Ok(None);
                };
                let page = self.get_prefix_resolved::<T>(&prefix, &options).await?;
                let next = page.next_page_token().map(|token| options.next_page(token));
                Ok::<_, Error>(Some((page, next)))
            }
        })
    }
}

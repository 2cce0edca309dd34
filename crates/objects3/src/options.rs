//! Layered listing options

use objects3_store::ListObjectsRequest;
use serde::{Deserialize, Serialize};

/// Page size used when neither the call nor the instance sets one
pub const DEFAULT_MAX_KEYS: usize = 100;

/// Listing controls, set per instance and overridden per call.
///
/// Unset fields fall through to the layer below; see [`BulkOptions::overlay`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BulkOptions {
    /// Page size; zero counts as unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_keys: Option<usize>,
    /// Resume a listing from a previous page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
    /// Group keys into common prefixes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
}

impl BulkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = Some(max_keys);
        self
    }

    pub fn with_continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Lay `call` over `self`: fields set in `call` win, the rest come from `self`
    pub fn overlay(&self, call: &BulkOptions) -> BulkOptions {
        BulkOptions {
            max_keys: call.max_keys.filter(|&n| n > 0).or(self.max_keys),
            continuation_token: call
                .continuation_token
                .clone()
                .or_else(|| self.continuation_token.clone()),
            delimiter: call.delimiter.clone().or_else(|| self.delimiter.clone()),
        }
    }

    /// Fill the remaining gaps with hardcoded defaults
    pub fn resolve(&self) -> ResolvedOptions {
        ResolvedOptions {
            max_keys: self
                .max_keys
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_MAX_KEYS),
            continuation_token: self.continuation_token.clone(),
            delimiter: self.delimiter.clone(),
        }
    }
}

/// Options of one call after layering, with every required field set
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub max_keys: usize,
    pub continuation_token: Option<String>,
    pub delimiter: Option<String>,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        BulkOptions::default().resolve()
    }
}

impl ResolvedOptions {
    /// The listing request these options describe for `prefix`
    pub fn list_request(&self, prefix: &str) -> ListObjectsRequest {
        ListObjectsRequest {
            prefix: prefix.to_string(),
            max_keys: self.max_keys,
            continuation_token: self.continuation_token.clone(),
            delimiter: self.delimiter.clone(),
        }
    }

    /// The same options pointed at the page after the current one
    pub fn next_page(&self, token: &str) -> Self {
        Self {
            continuation_token: Some(token.to_string()),
            ..self.clone()
        }
    }
}

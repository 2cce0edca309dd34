//! Store error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by an object store
#[derive(Error, Debug)]
pub enum StoreError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error reported by the storage service
    #[error("S3 error ({code}): {message}")]
    S3Error {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Object not found
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Invalid response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    /// Build a service error with the given code
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::S3Error {
            code: code.into(),
            message: message.into(),
            request_id: None,
        }
    }

    /// Parse a service error from an XML error document
    pub fn from_s3_xml(xml: &str, status: u16) -> Self {
        match crate::xml::parse_error(xml) {
            Some(body) => Self::S3Error {
                code: body.code.unwrap_or_else(|| fallback_code(status)),
                message: body.message.unwrap_or_else(|| "Unknown error".to_string()),
                request_id: body.request_id,
            },
            None => Self::S3Error {
                code: fallback_code(status),
                message: "Unknown error".to_string(),
                request_id: None,
            },
        }
    }

    /// The service error code, if the service reported one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::S3Error { code, .. } => Some(code),
            Self::NotFound { .. } => Some("NoSuchKey"),
            _ => None,
        }
    }

    /// Check if this is the "key does not exist" condition
    pub fn is_no_such_key(&self) -> bool {
        matches!(self, Self::NotFound { .. })
            || matches!(self, Self::S3Error { code, .. } if code == "NoSuchKey")
    }

    /// Check if this is an access denied error
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::S3Error { code, .. } if code == "AccessDenied")
    }
}

// Only a service-reported NoSuchKey marks a key as missing; a bodyless 404
// may come from a wrong path or a proxy.
fn fallback_code(status: u16) -> String {
    match status {
        403 => "AccessDenied".to_string(),
        _ => format!("HTTP{}", status),
    }
}

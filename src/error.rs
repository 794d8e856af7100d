//! Error taxonomy for document generation.
//!
//! `GenerateError` is fatal and aborts the call. `AssetError` is recoverable:
//! callers log it and omit the visual element it belongs to.

use thiserror::Error;

/// Failures that abort a generation run. No partial output is returned.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("failed to allocate document: {0}")]
    Document(String),

    #[error("failed to serialize output: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for GenerateError {
    fn from(e: serde_json::Error) -> Self {
        GenerateError::Serialize(e.to_string())
    }
}

/// Failures while loading an image or logo.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {0}")]
    Fetch(String),

    #[error("invalid data URL")]
    InvalidDataUrl,

    #[error("failed to decode image: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(e: &GenerateError) -> &'static str {
        match e {
            GenerateError::Document(_) => "document",
            GenerateError::Serialize(_) => "serialize",
        }
    }

    #[test]
    fn json_failures_become_serialize_errors() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = GenerateError::from(bad);
        assert_eq!(kind(&err), "serialize");
        assert!(err.to_string().starts_with("failed to serialize output: "));
    }

    #[test]
    fn document_errors_carry_their_message() {
        let err = GenerateError::Document("no fonts".into());
        assert_eq!(kind(&err), "document");
        assert_eq!(err.to_string(), "failed to allocate document: no fonts");
    }
}

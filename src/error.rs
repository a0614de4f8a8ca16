//! Error types for postfeed.
//!
//! Rendering failures are typed so that callers can decide on a fallback
//! (the presenter renders the post as plain text). Fetch and config failures
//! belong to the collaborators and never reach the renderer.

use crate::post::{AnnotationKind, Span};
use std::path::PathBuf;
use thiserror::Error;

/// Why an annotation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationIssue {
    #[error("span is empty or reversed")]
    EmptySpan,

    #[error("span ends past the end of the text ({len} code units)")]
    OutOfBounds { len: usize },

    #[error("span starts before the previous annotation ends at {previous_end}")]
    Overlapping { previous_end: usize },

    #[error("offset {offset} splits a character")]
    NotCharBoundary { offset: usize },

    #[error("unknown annotation kind `{0}`")]
    UnknownKind(String),

    #[error("indices must be a [start, end] pair")]
    MalformedIndices,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A malformed annotation. Rendering stops and no markup is produced.
    #[error("invalid {} annotation at {span}: {reason}", kind_label(.kind))]
    InvalidAnnotation {
        /// `None` when the kind itself could not be determined.
        kind: Option<AnnotationKind>,
        span: Span,
        reason: AnnotationIssue,
    },
}

fn kind_label(kind: &Option<AnnotationKind>) -> &'static str {
    kind.map(AnnotationKind::as_str).unwrap_or("unclassified")
}

impl RenderError {
    pub fn invalid(kind: Option<AnnotationKind>, span: Span, reason: AnnotationIssue) -> Self {
        Self::InvalidAnnotation { kind, span, reason }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Classification of parse failures, string-taggable for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No registered parser was willing to handle the input.
    UnsupportedFormat,
    /// A required magic number or header shape check failed.
    InvalidHeader,
    /// A read came up short, or a declared size extends past the source.
    TruncatedData,
    /// Internal offsets or sizes contradict the container's own layout.
    InconsistentContainer,
    /// A tag-vocabulary decode failed where the outer format is valid.
    InvalidTagPayload,
    /// The underlying source raised, or a request violated reader bounds.
    IoFailure,
    /// A condition that should never occur at runtime.
    InternalInvariant,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::InvalidHeader => "invalid_header",
            ErrorKind::TruncatedData => "truncated_data",
            ErrorKind::InconsistentContainer => "inconsistent_container",
            ErrorKind::InvalidTagPayload => "invalid_tag_payload",
            ErrorKind::IoFailure => "io_failure",
            ErrorKind::InternalInvariant => "internal_invariant",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type shared by every parsing layer.
///
/// Carries a human message, the byte offset the failure was detected at when
/// one is known, and a free-form context map for machine consumption.
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub offset: Option<u64>,
    pub context: HashMap<String, String>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            offset: None,
            context: HashMap::new(),
        }
    }

    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedFormat, message)
    }

    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidHeader, message)
    }

    pub fn truncated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TruncatedData, message)
    }

    pub fn invalid_tag(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidTagPayload, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IoFailure, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalInvariant, message)
    }

    pub fn at_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::io(err.to_string())
    }
}

//! Content error taxonomy.
//!
//! Every accessor reports failures as a [`ContentError`]. The `kind` tells the
//! caller how to react; `detail` is the text to show or log.

use core_cache::FetchError;
use thiserror::Error;

/// How a content failure should be handled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentErrorKind {
    /// A cached resource could not be produced; an empty value is a safe default.
    Empty,
    /// The resource was fetched but the requested item is not in it.
    NotFound,
    /// An uncached host failed; the detail carries its message verbatim.
    TransientFailure,
}

/// Failure of a domain accessor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{detail}")]
pub struct ContentError {
    pub kind: ContentErrorKind,
    pub detail: String,
}

impl ContentError {
    pub fn empty(detail: impl Into<String>) -> Self {
        Self {
            kind: ContentErrorKind::Empty,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            kind: ContentErrorKind::NotFound,
            detail: detail.into(),
        }
    }

    pub fn transient(detail: impl Into<String>) -> Self {
        Self {
            kind: ContentErrorKind::TransientFailure,
            detail: detail.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == ContentErrorKind::Empty
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ContentErrorKind::NotFound
    }

    /// A failed fetch of a cached resource.
    ///
    /// A 404 means the item does not exist; anything else leaves the caller
    /// with nothing to show.
    pub(crate) fn from_cached_fetch(err: &FetchError) -> Self {
        match err {
            FetchError::Status { status: 404, .. } => Self::not_found(err.reason()),
            _ => Self::empty(err.reason()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;

/// Recover the safe default of a cached resource.
pub trait ContentResultExt<T> {
    /// Turn an [`ContentErrorKind::Empty`] failure into `T::default()`.
    ///
    /// `NotFound` and `TransientFailure` pass through untouched.
    fn or_empty(self) -> Result<T>;
}

impl<T: Default> ContentResultExt<T> for Result<T> {
    fn or_empty(self) -> Result<T> {
        match self {
            Err(err) if err.is_empty() => {
                tracing::debug!(detail = %err.detail, "Falling back to empty value");
                Ok(T::default())
            }
            other => other,
        }
    }
}

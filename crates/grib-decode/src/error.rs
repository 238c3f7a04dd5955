//! Error types for GRIB2 decoding.

use thiserror::Error;

/// Result type alias for decoder operations.
pub type GribResult<T> = Result<T, GribError>;

/// Errors raised while decoding a GRIB2 payload.
#[derive(Debug, Error)]
pub enum GribError {
    #[error("not a GRIB file: bad magic bytes")]
    BadMagic,

    #[error("unsupported GRIB edition {0}, only edition 2 is supported")]
    UnsupportedEdition(u8),

    #[error("message truncated: need {expected} bytes, have {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("invalid section {section}: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("unsupported template {template} in section {section}")]
    UnsupportedTemplate { section: u8, template: u16 },

    #[error("failed to unpack field values: {0}")]
    Unpack(String),
}

impl GribError {
    pub(crate) fn section(section: u8, reason: impl Into<String>) -> Self {
        GribError::InvalidSection {
            section,
            reason: reason.into(),
        }
    }
}

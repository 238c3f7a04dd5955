//! File id grammar.
//!
//! Manifest file ids look like `{parameter-set}_{variable}_{marker}` with an
//! optional trailing `_{index}` segment, e.g. `agl_temperature_00` or
//! `atmosphere_total-cloud-cover_+06_0`. The marker distinguishes the
//! canonical entry for a run from the run-relative duplicates the API lists
//! again under `+HH` offsets; the variable segment drives aggregation
//! grouping downstream.

use crate::error::{ClientError, ClientResult};

/// A parsed manifest file id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileId {
    raw: String,
    variable: String,
    marker: String,
}

impl FileId {
    /// Parse a manifest file id.
    ///
    /// The marker is the penultimate segment when a trailing all-digit index
    /// follows a `+`-offset or an absolute (8+ digit) timestamp marker, and
    /// the last segment otherwise. Ids need at least three segments.
    pub fn parse(raw: &str) -> ClientResult<Self> {
        let segments: Vec<&str> = raw.split('_').collect();
        if segments.len() < 3 {
            return Err(ClientError::InvalidFileId {
                id: raw.to_string(),
                reason: "expected at least three underscore-separated segments",
            });
        }

        let last = segments[segments.len() - 1];
        let penultimate = segments[segments.len() - 2];
        let marker_index = if is_index(last) && is_marker(penultimate) {
            segments.len() - 2
        } else {
            segments.len() - 1
        };

        let variable = segments[1..marker_index].join("_");
        if variable.is_empty() {
            return Err(ClientError::InvalidFileId {
                id: raw.to_string(),
                reason: "no variable segment between parameter set and marker",
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            variable,
            marker: segments[marker_index].to_string(),
        })
    }

    /// The full id as the API spells it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The variable segment, used to group files downstream.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// `+HH` markers are repeats of data already listed under the canonical
    /// entry for the run.
    pub fn is_duplicate(&self) -> bool {
        self.marker.starts_with('+')
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn is_marker(segment: &str) -> bool {
    segment.starts_with('+') || (segment.len() >= 8 && is_index(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_id_keeps_last_segment_as_marker() {
        let id = FileId::parse("agl_temperature_00").unwrap();
        assert_eq!(id.variable(), "temperature");
        assert!(!id.is_duplicate());
    }

    #[test]
    fn offset_marker_before_index_is_a_duplicate() {
        let id =
            FileId::parse("atmosphere_high-cloud-cover+low-cloud-cover+medium-cloud-cover_+06_0")
                .unwrap();
        assert_eq!(
            id.variable(),
            "high-cloud-cover+low-cloud-cover+medium-cloud-cover"
        );
        assert!(id.is_duplicate());
    }

    #[test]
    fn absolute_timestamp_marker_before_index() {
        let id = FileId::parse("agl_temperature_20240101060000_0").unwrap();
        assert_eq!(id.variable(), "temperature");
        assert!(!id.is_duplicate());
    }

    #[test]
    fn multi_segment_variable_is_joined() {
        let id = FileId::parse("agl_wind_speed_00").unwrap();
        assert_eq!(id.variable(), "wind_speed");
        assert!(!id.is_duplicate());
    }

    #[test]
    fn short_ids_are_rejected() {
        assert!(FileId::parse("agl_temperature").is_err());
        assert!(FileId::parse("temperature").is_err());
    }
}

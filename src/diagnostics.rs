//! # Diagnostics Module
//!
//! Row-level failures raised while building and linking project records, and the
//! sink interface through which they are reported. Diagnostics are advisory:
//! the offending record is dropped (or left unenriched) and the run continues.

use crate::model::Origin;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use time::Date;
use tracing::warn;

/// Why a single input record could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    /// A date string did not match the expected format.
    #[error("unparseable date {raw:?}")]
    ParseFailure { raw: String },
    /// The link text carried no video id, or the id is unknown to the catalog.
    #[error("unresolved video link {link:?}")]
    UnresolvedLink { link: String },
    /// The end date precedes the start date.
    #[error("invalid interval: end {end} is before start {start}")]
    InvalidInterval { start: Date, end: Date },
}

/// A report emitted during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "diagnostic", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A record was dropped.
    Rejected {
        origin: Origin,
        /// Position of the record in its source document
        row: usize,
        title: String,
        error: RowError,
    },
    /// An API project without a release link found no sheet counterpart.
    UnmatchedRelease {
        title: String,
        organizer: String,
        key: String,
    },
    /// A sheet project repeats a video that is already linked elsewhere.
    DuplicateVideo {
        title: String,
        video_id: String,
        /// Whether the earlier claim came from the API source
        claimed_by: Origin,
    },
    /// A catalog entry was skipped because its publish time is unreadable.
    BadVideo { video_id: String, raw: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Rejected {
                origin,
                row,
                title,
                error,
            } => write!(f, "{origin} row {row} ({title:?}) dropped: {error}"),
            Diagnostic::UnmatchedRelease {
                title,
                organizer,
                key,
            } => write!(
                f,
                "no release video for {title:?} by {organizer} (key {key})"
            ),
            Diagnostic::DuplicateVideo {
                title,
                video_id,
                claimed_by,
            } => write!(
                f,
                "{title:?} duplicates video {video_id} already linked from {claimed_by}"
            ),
            Diagnostic::BadVideo { video_id, raw } => {
                write!(f, "video {video_id} skipped: bad publish time {raw:?}")
            }
        }
    }
}

/// Receiver for diagnostics.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to `tracing` at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        warn!(%diagnostic, "reconciliation diagnostic");
    }
}

/// Keeps diagnostics in memory.
impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _diagnostic: Diagnostic) {}
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

/// Count rejections per error kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticCounts {
    pub parse_failures: usize,
    pub unresolved_links: usize,
    pub invalid_intervals: usize,
    pub unmatched_releases: usize,
    pub duplicate_videos: usize,
    pub bad_videos: usize,
}

impl DiagnosticCounts {
    pub fn tally(diagnostics: &[Diagnostic]) -> Self {
        let mut counts = Self::default();
        for diagnostic in diagnostics {
            match diagnostic {
                Diagnostic::Rejected { error, .. } => match error {
                    RowError::ParseFailure { .. } => counts.parse_failures += 1,
                    RowError::UnresolvedLink { .. } => counts.unresolved_links += 1,
                    RowError::InvalidInterval { .. } => counts.invalid_intervals += 1,
                },
                Diagnostic::UnmatchedRelease { .. } => counts.unmatched_releases += 1,
                Diagnostic::DuplicateVideo { .. } => counts.duplicate_videos += 1,
                Diagnostic::BadVideo { .. } => counts.bad_videos += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.parse_failures
            + self.unresolved_links
            + self.invalid_intervals
            + self.unmatched_releases
            + self.duplicate_videos
            + self.bad_videos
    }
}

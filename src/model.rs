//! # Data Model
//!
//! Core data structures for catalog reconciliation: merged projects, release
//! video references, the read-only video catalog, and the raw input documents
//! of both sources.

use crate::temporal::{self, DateSpan};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use time::{Date, OffsetDateTime};

/// Provenance of a project record. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// Built from the machine-exported API document
    ApiSourced,
    /// Built from a row of the human-maintained spreadsheet
    SheetSourced,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::ApiSourced => write!(f, "api"),
            Origin::SheetSourced => write!(f, "sheet"),
        }
    }
}

/// Link from a project to its release video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoRef {
    pub video_id: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
}

/// A community project with an inclusive active interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub organizer: String,
    #[serde(with = "temporal::iso_date")]
    pub start_date: Date,
    #[serde(with = "temporal::iso_date")]
    pub end_date: Date,
    pub origin: Origin,
    pub released_video: Option<VideoRef>,
    pub source_url: Option<String>,
}

impl Project {
    /// The active interval of this project.
    pub fn span(&self) -> DateSpan {
        DateSpan {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// Inclusive on both ends.
    pub fn is_active_on(&self, date: Date) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn video_id(&self) -> Option<&str> {
        self.released_video.as_ref().map(|v| v.video_id.as_str())
    }

    pub fn release_time(&self) -> Option<OffsetDateTime> {
        self.released_video.as_ref().map(|v| v.published_at)
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} .. {}, {})",
            self.title, self.organizer, self.start_date, self.end_date, self.origin
        )
    }
}

/// Metadata stored for each catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMeta {
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
}

/// Read-only lookup from video id to video metadata.
///
/// Entries are kept in publish order so the newest release is the last one.
#[derive(Debug, Clone, Default)]
pub struct VideoCatalog {
    by_id: HashMap<String, usize>,
    ordered: Vec<(String, VideoMeta)>,
}

impl VideoCatalog {
    /// Build the catalog from the exported video list.
    ///
    /// Videos with an unparseable publish time are skipped and returned
    /// alongside the catalog so the caller can report them. A repeated id
    /// keeps its first entry.
    pub fn from_videos(videos: &[ApiVideo]) -> (Self, Vec<(String, String)>) {
        let mut entries = Vec::with_capacity(videos.len());
        let mut rejected = Vec::new();
        for video in videos {
            let id = video.content_details.video_id.trim();
            let raw = &video.content_details.video_published_at;
            match temporal::parse_timestamp(raw) {
                Ok(published_at) => entries.push((
                    id.to_string(),
                    VideoMeta {
                        title: video.snippet.title.clone(),
                        published_at,
                    },
                )),
                Err(_) => rejected.push((id.to_string(), raw.clone())),
            }
        }
        // Stable, so equal publish times keep export order.
        entries.sort_by_key(|(_, meta)| meta.published_at);

        let mut catalog = Self::default();
        for (id, meta) in entries {
            if id.is_empty() || catalog.by_id.contains_key(&id) {
                continue;
            }
            catalog.by_id.insert(id.clone(), catalog.ordered.len());
            catalog.ordered.push((id, meta));
        }
        (catalog, rejected)
    }

    pub fn get(&self, video_id: &str) -> Option<&VideoMeta> {
        self.by_id.get(video_id).map(|&idx| &self.ordered[idx].1)
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.by_id.contains_key(video_id)
    }

    /// Resolve an id into a [`VideoRef`].
    pub fn video_ref(&self, video_id: &str) -> Option<VideoRef> {
        self.get(video_id).map(|meta| VideoRef {
            video_id: video_id.to_string(),
            title: meta.title.clone(),
            published_at: meta.published_at,
        })
    }

    /// The most recently published video.
    pub fn latest(&self) -> Option<VideoRef> {
        self.ordered.last().map(|(id, meta)| VideoRef {
            video_id: id.clone(),
            title: meta.title.clone(),
            published_at: meta.published_at,
        })
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Iterate in publish order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VideoMeta)> {
        self.ordered.iter().map(|(id, meta)| (id.as_str(), meta))
    }
}

// =============================================================================
// Raw input documents
// =============================================================================

/// The machine-exported document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiExport {
    #[serde(rename = "Projects", default)]
    pub projects: Vec<ApiProject>,
    #[serde(rename = "Videos", default)]
    pub videos: Vec<ApiVideo>,
}

/// A project entry of the API export. Dates are ISO 8601.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiProject {
    pub title: String,
    pub organizer: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(default)]
    pub released_video: Option<ApiReleasedVideo>,
}

/// Release video already attached by the exporter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiReleasedVideo {
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Date", default)]
    pub date: String,
}

/// A playlist item of the API export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVideo {
    pub content_details: ContentDetails,
    pub snippet: Snippet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetails {
    pub video_id: String,
    pub video_published_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub title: String,
}

/// One row of the spreadsheet export, keyed by its column headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    #[serde(rename = "Project Name", default)]
    pub project_name: String,
    #[serde(rename = "Creator", default)]
    pub creator: String,
    #[serde(rename = "Start Date", default)]
    pub start_date: String,
    #[serde(rename = "Deadline", default)]
    pub deadline: String,
    #[serde(rename = "Links to Active Project Page OR Finished Result", default)]
    pub link: String,
}

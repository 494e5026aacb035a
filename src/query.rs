//! # Query Module
//!
//! Read-only views over a reconciled project set: active counts per date, the
//! sampled active-count series, and stable re-orderings for presentation.

use crate::model::Project;
use crate::temporal::{iso_date, DateSpan};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use time::{Date, OffsetDateTime};

/// Count projects whose inclusive interval contains `date`.
///
/// Linear scan; [`ActiveCounter`] must agree with it for every date.
pub fn active_count(projects: &[Project], date: Date) -> usize {
    projects.iter().filter(|p| p.is_active_on(date)).count()
}

/// Answers active-count queries by binary search over sorted boundaries.
///
/// Projects whose end precedes their start are never active and are left out,
/// which keeps every end matched by an earlier start.
#[derive(Debug, Clone, Default)]
pub struct ActiveCounter {
    starts: Vec<Date>,
    ends: Vec<Date>,
}

impl ActiveCounter {
    pub fn new(projects: &[Project]) -> Self {
        let (mut starts, mut ends): (Vec<Date>, Vec<Date>) = projects
            .iter()
            .filter(|p| p.start_date <= p.end_date)
            .map(|p| (p.start_date, p.end_date))
            .unzip();
        starts.sort_unstable();
        ends.sort_unstable();
        Self { starts, ends }
    }

    /// Projects started on or before `date` minus those that ended before it.
    pub fn count(&self, date: Date) -> usize {
        let started = self.starts.partition_point(|&start| start <= date);
        let ended = self.ends.partition_point(|&end| end < date);
        started - ended
    }

    /// Span from the earliest start to the latest end, if any project exists.
    pub fn extent(&self) -> Option<DateSpan> {
        Some(DateSpan {
            start: *self.starts.first()?,
            end: *self.ends.last()?,
        })
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

/// One sample of the active-count series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub count: usize,
}

/// Earliest start to latest end across `projects`.
pub fn extent(projects: &[Project]) -> Option<DateSpan> {
    let start = projects.iter().map(|p| p.start_date).min()?;
    let end = projects.iter().map(|p| p.end_date).max()?;
    Some(DateSpan { start, end })
}

/// Active counts sampled every `step_days` from the earliest start through the
/// latest end. Empty when there are no projects.
pub fn series(projects: &[Project], step_days: u32) -> Vec<SeriesPoint> {
    let counter = ActiveCounter::new(projects);
    let Some(span) = counter.extent() else {
        return Vec::new();
    };
    span.sample_dates(step_days)
        .into_iter()
        .map(|date| SeriesPoint {
            date,
            count: counter.count(date),
        })
        .collect()
}

/// Presentation orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// End date ascending
    #[default]
    Deadline,
    /// Release time ascending; unreleased projects last, by end date
    Video,
    /// Organizer name ascending, ignoring case
    Organizer,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Deadline => "deadline",
            SortKey::Video => "video",
            SortKey::Organizer => "organizer",
        };
        f.write_str(name)
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deadline" => Ok(SortKey::Deadline),
            "video" => Ok(SortKey::Video),
            "organizer" => Ok(SortKey::Organizer),
            other => anyhow::bail!(
                "unknown sort key {other:?} (expected deadline, video or organizer)"
            ),
        }
    }
}

/// Release ordering: every released project precedes every unreleased one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ReleaseKey {
    Released(OffsetDateTime),
    Unreleased(Date),
}

fn release_key(project: &Project) -> ReleaseKey {
    match project.release_time() {
        Some(at) => ReleaseKey::Released(at),
        None => ReleaseKey::Unreleased(project.end_date),
    }
}

/// Compare two projects under `key`.
pub fn compare(key: SortKey, a: &Project, b: &Project) -> Ordering {
    match key {
        SortKey::Deadline => a.end_date.cmp(&b.end_date),
        SortKey::Video => release_key(a).cmp(&release_key(b)),
        SortKey::Organizer => a
            .organizer
            .to_lowercase()
            .cmp(&b.organizer.to_lowercase()),
    }
}

/// Sort in place, ascending and stable.
pub fn sort_projects(projects: &mut [Project], key: SortKey) {
    match key {
        SortKey::Organizer => projects.sort_by_cached_key(|p| p.organizer.to_lowercase()),
        _ => projects.sort_by(|a, b| compare(key, a, b)),
    }
}

/// A sorted copy of `projects`.
pub fn sort_by(projects: &[Project], key: SortKey) -> Vec<Project> {
    let mut sorted = projects.to_vec();
    sort_projects(&mut sorted, key);
    sorted
}

/// Projects whose deadline is on or after `as_of`, by deadline.
pub fn open_projects(projects: &[Project], as_of: Date) -> Vec<Project> {
    let mut open: Vec<Project> = projects
        .iter()
        .filter(|p| p.end_date >= as_of)
        .cloned()
        .collect();
    sort_projects(&mut open, SortKey::Deadline);
    open
}

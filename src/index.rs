//! # Indexing Module
//!
//! Lookup structures used while linking the two sources: the organizer/start-date
//! key index over sheet projects, and the set of video ids already claimed.

use crate::model::{Origin, Project};
use rustc_hash::FxHashMap;
use std::fmt;
use time::Date;

/// Composite match key: `lowercase(organizer) + "|" + start_date`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnrichmentKey(String);

impl EnrichmentKey {
    pub fn new(organizer: &str, start_date: Date) -> Self {
        Self(format!("{}|{}", organizer.trim().to_lowercase(), start_date))
    }

    /// Key for the same organizer one calendar day earlier.
    ///
    /// Spreadsheet start dates are sometimes recorded a day early because of a
    /// timezone conversion on entry.
    pub fn day_before(organizer: &str, start_date: Date) -> Option<Self> {
        start_date
            .previous_day()
            .map(|previous| Self::new(organizer, previous))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnrichmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a lookup was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch {
    Exact,
    DayBefore,
}

/// Maps enrichment keys to positions in a slice of sheet projects.
///
/// When several projects share a key the last one inserted wins.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentIndex {
    entries: FxHashMap<EnrichmentKey, usize>,
    overwritten: usize,
}

impl EnrichmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every project of `projects` by its key.
    pub fn build(projects: &[Project]) -> Self {
        let mut index = Self::new();
        for (position, project) in projects.iter().enumerate() {
            index.insert(EnrichmentKey::new(&project.organizer, project.start_date), position);
        }
        index
    }

    pub fn insert(&mut self, key: EnrichmentKey, position: usize) {
        if self.entries.insert(key, position).is_some() {
            self.overwritten += 1;
        }
    }

    pub fn get(&self, key: &EnrichmentKey) -> Option<usize> {
        self.entries.get(key).copied()
    }

    /// Exact key first, then the day-before fallback.
    pub fn find(&self, organizer: &str, start_date: Date) -> Option<(usize, KeyMatch)> {
        if let Some(position) = self.get(&EnrichmentKey::new(organizer, start_date)) {
            return Some((position, KeyMatch::Exact));
        }
        EnrichmentKey::day_before(organizer, start_date)
            .and_then(|key| self.get(&key))
            .map(|position| (position, KeyMatch::DayBefore))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of inserts that replaced an existing entry.
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }
}

/// Tracks which source first claimed each video id.
#[derive(Debug, Clone, Default)]
pub struct VideoClaims {
    claimed: FxHashMap<String, Origin>,
}

impl VideoClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a claim. Returns the earlier claimant if the id was taken.
    pub fn claim(&mut self, video_id: &str, origin: Origin) -> Option<Origin> {
        if let Some(existing) = self.claimed.get(video_id) {
            return Some(*existing);
        }
        self.claimed.insert(video_id.to_string(), origin);
        None
    }

    pub fn claimant(&self, video_id: &str) -> Option<Origin> {
        self.claimed.get(video_id).copied()
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

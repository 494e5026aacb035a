//! # Projline
//!
//! Reconciles two independently produced catalogs of community projects, an
//! API export and a hand-maintained spreadsheet, into one deduplicated set, and
//! derives the views a timeline presentation needs: stable orderings, the
//! active-project count per day, and a collision-free layout for release markers.

pub mod beeswarm;
pub mod config;
pub mod diagnostics;
pub mod index;
pub mod linker;
pub mod model;
pub mod query;
pub mod source;
pub mod temporal;
pub mod test_support;
pub mod utils;

// Re-export main types for convenience
pub use beeswarm::{Beeswarm, PackedPoint};
pub use config::{ConfigOverrides, TimelineConfig};
pub use diagnostics::{Diagnostic, DiagnosticSink, RowError, TracingSink};
pub use linker::{LinkReport, RecordLinker};
pub use model::{ApiExport, Origin, Project, SheetRow, VideoCatalog, VideoRef};
pub use query::{ActiveCounter, SeriesPoint, SortKey};
pub use temporal::DateSpan;

use serde::Serialize;
use time::{Date, OffsetDateTime};
use tracing::debug;

/// A release marker placed by the beeswarm layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwarmMarker {
    pub title: String,
    pub video_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub position: f64,
    pub offset: f64,
}

/// Main API: the reconciled project set of one run.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    projects: Vec<Project>,
    catalog: VideoCatalog,
    counter: ActiveCounter,
    report: LinkReport,
}

impl Timeline {
    /// Reconcile an API export with spreadsheet rows.
    pub fn reconcile(export: &ApiExport, rows: &[SheetRow], sink: &mut dyn DiagnosticSink) -> Self {
        let (catalog, rejected) = VideoCatalog::from_videos(&export.videos);
        for (video_id, raw) in rejected {
            sink.emit(Diagnostic::BadVideo { video_id, raw });
        }
        let result = RecordLinker::new(&catalog).reconcile(&export.projects, rows, sink);
        debug!(
            merged = result.projects.len(),
            videos = catalog.len(),
            "timeline built"
        );
        Self {
            counter: ActiveCounter::new(&result.projects),
            projects: result.projects,
            catalog,
            report: result.report,
        }
    }

    /// Wrap projects that were reconciled elsewhere.
    pub fn from_projects(projects: Vec<Project>, catalog: VideoCatalog) -> Self {
        Self {
            counter: ActiveCounter::new(&projects),
            projects,
            catalog,
            report: LinkReport::default(),
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn catalog(&self) -> &VideoCatalog {
        &self.catalog
    }

    pub fn report(&self) -> &LinkReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Reorder the held projects. Stable, so successive sorts compose.
    pub fn sort(&mut self, key: SortKey) {
        query::sort_projects(&mut self.projects, key);
    }

    /// A sorted copy, leaving the held order alone.
    pub fn sorted(&self, key: SortKey) -> Vec<Project> {
        query::sort_by(&self.projects, key)
    }

    pub fn active_count(&self, date: Date) -> usize {
        self.counter.count(date)
    }

    pub fn extent(&self) -> Option<DateSpan> {
        self.counter.extent()
    }

    pub fn series(&self, step_days: u32) -> Vec<SeriesPoint> {
        query::series(&self.projects, step_days)
    }

    /// Projects still open at `as_of`, by deadline.
    pub fn open_projects(&self, as_of: Date) -> Vec<Project> {
        query::open_projects(&self.projects, as_of)
    }

    /// Lay out one marker per released project along the publish-time axis.
    ///
    /// Positions are publish times in units of `unit_seconds`; `radius` is in
    /// the same units.
    pub fn release_swarm(&self, radius: f64, unit_seconds: u32) -> anyhow::Result<Vec<SwarmMarker>> {
        if unit_seconds == 0 {
            anyhow::bail!("unit_seconds must be positive");
        }
        let swarm = Beeswarm::new(radius)?;
        let unit = f64::from(unit_seconds);
        let position = |video: &VideoRef| video.published_at.unix_timestamp() as f64 / unit;
        let released: Vec<(&str, &VideoRef)> = self
            .projects
            .iter()
            .filter_map(|p| p.released_video.as_ref().map(|v| (p.title.as_str(), v)))
            .collect();

        Ok(swarm
            .pack_items(released, |(_, video)| position(video))?
            .into_iter()
            .map(|((title, video), offset)| SwarmMarker {
                title: title.to_string(),
                video_id: video.video_id.clone(),
                published_at: video.published_at,
                position: position(video),
                offset,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{generate_api_export, generate_sheet_rows};
    use time::macros::date;

    #[test]
    fn test_timeline_counts_match_linear_scan() {
        let export = generate_api_export(40, 11);
        let rows = generate_sheet_rows(&export, 60, 11);
        let timeline = Timeline::reconcile(&export, &rows, &mut diagnostics::NullSink);
        let span = timeline.extent().expect("non-empty timeline");
        for day in span.sample_dates(1) {
            assert_eq!(
                timeline.active_count(day),
                query::active_count(timeline.projects(), day)
            );
        }
    }

    #[test]
    fn test_release_swarm_respects_radius() {
        let export = generate_api_export(30, 5);
        let rows = generate_sheet_rows(&export, 50, 5);
        let timeline = Timeline::reconcile(&export, &rows, &mut diagnostics::NullSink);
        let markers = timeline.release_swarm(4.0, 86_400).unwrap();
        let floor = Beeswarm::new(4.0).unwrap().min_distance();
        let released = timeline
            .projects()
            .iter()
            .filter(|p| p.released_video.is_some())
            .count();
        assert_eq!(markers.len(), released);
        for (i, a) in markers.iter().enumerate() {
            for b in &markers[i + 1..] {
                let d = (a.position - b.position).hypot(a.offset - b.offset);
                assert!(d >= floor, "{} and {} overlap", a.video_id, b.video_id);
            }
        }
        assert!(timeline.release_swarm(4.0, 0).is_err());
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = Timeline::reconcile(&ApiExport::default(), &[], &mut diagnostics::NullSink);
        assert!(timeline.is_empty());
        assert!(timeline.series(1).is_empty());
        assert_eq!(timeline.active_count(date!(2020 - 01 - 01)), 0);
        assert!(timeline.release_swarm(1.0, 60).unwrap().is_empty());
    }
}

//! # Utilities Module
//!
//! Export of a reconciled timeline: the JSON presentation document and a plain
//! text summary.

use crate::config::TimelineConfig;
use crate::diagnostics::DiagnosticCounts;
use crate::linker::LinkReport;
use crate::model::{Project, VideoRef};
use crate::query::SeriesPoint;
use crate::{SwarmMarker, Timeline};
use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
pub struct PresentationDocument {
    pub projects: Vec<Project>,
    pub series: Vec<SeriesPoint>,
    pub swarm: Vec<SwarmMarker>,
    pub latest_video: Option<VideoRef>,
    pub video_count: usize,
    pub report: LinkReport,
    pub diagnostics: DiagnosticCounts,
}

/// Assemble the document for `timeline` using the ordering, sampling and
/// layout settings of `config`.
pub fn build_document(
    timeline: &Timeline,
    config: &TimelineConfig,
    diagnostics: DiagnosticCounts,
) -> Result<PresentationDocument> {
    Ok(PresentationDocument {
        projects: timeline.sorted(config.timeline.sort),
        series: timeline.series(config.timeline.sample_step_days),
        swarm: timeline.release_swarm(config.swarm.radius, config.swarm.unit_seconds)?,
        latest_video: timeline.catalog().latest(),
        video_count: timeline.catalog().len(),
        report: *timeline.report(),
        diagnostics,
    })
}

pub fn export_to_json(document: &PresentationDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Export the timeline to a short human-readable summary
pub fn export_to_text_summary(timeline: &Timeline, diagnostics: &DiagnosticCounts) -> Result<String> {
    let mut summary = String::new();
    let report = timeline.report();

    summary.push_str("Project Timeline Summary\n");
    summary.push_str("========================\n\n");

    writeln!(summary, "Total Projects: {}", timeline.len())?;
    writeln!(summary, "  from API: {}", report.api_projects)?;
    writeln!(
        summary,
        "  from sheet: {} of {} rows",
        report.merged.saturating_sub(report.api_projects),
        report.sheet_rows
    )?;
    writeln!(summary, "Catalog Videos: {}", timeline.catalog().len())?;
    if let Some(extent) = timeline.extent() {
        writeln!(summary, "Extent: {extent}")?;
    }
    if let Some(latest) = timeline.catalog().latest() {
        writeln!(summary, "Latest Video: {} ({})", latest.title, latest.video_id)?;
    }
    summary.push('\n');

    summary.push_str("Linking:\n");
    writeln!(summary, "  enriched (exact date): {}", report.enriched_exact)?;
    writeln!(summary, "  enriched (day before): {}", report.enriched_day_before)?;
    writeln!(summary, "  duplicate videos dropped: {}", report.duplicates_dropped)?;
    summary.push('\n');

    summary.push_str("Diagnostics:\n");
    writeln!(summary, "  unparseable dates: {}", diagnostics.parse_failures)?;
    writeln!(summary, "  unresolved links: {}", diagnostics.unresolved_links)?;
    writeln!(summary, "  inverted intervals: {}", diagnostics.invalid_intervals)?;
    writeln!(summary, "  unmatched releases: {}", diagnostics.unmatched_releases)?;
    writeln!(summary, "  duplicate videos: {}", diagnostics.duplicate_videos)?;
    writeln!(summary, "  bad catalog videos: {}", diagnostics.bad_videos)?;

    Ok(summary)
}

/// Write `content` to `path`, or to stdout when no path is given.
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)?;
            tracing::info!(path = %path.display(), bytes = content.len(), "output written");
        }
        None => println!("{content}"),
    }
    Ok(())
}

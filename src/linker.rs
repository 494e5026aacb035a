//! # Record Linker Module
//!
//! Reconciles API-exported projects with spreadsheet rows. Sheet rows become
//! projects only when their dates parse and their link resolves to a catalog
//! video; API projects without a release link are enriched from sheet projects
//! by organizer/start-date key; sheet projects whose video is already linked are
//! dropped as duplicates.

use crate::diagnostics::{Diagnostic, DiagnosticSink, RowError};
use crate::index::{EnrichmentIndex, EnrichmentKey, KeyMatch, VideoClaims};
use crate::model::{ApiProject, Origin, Project, SheetRow, VideoCatalog, VideoRef};
use crate::temporal::{self, DateSpan};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::{debug, instrument};

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:watch\?(?:\S*?&)?v=|youtu\.be/)([A-Za-z0-9_-]+)").expect("valid regex")
});

static ORGANIZER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*/?(?:u/)?([A-Za-z0-9_-]+)").expect("valid regex"));

/// Pull a video id out of free text. Recognizes `.../watch?v=ID` and
/// `youtu.be/ID`; the first occurrence wins.
pub fn extract_video_id(text: &str) -> Option<&str> {
    VIDEO_ID_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The user name at the start of a `Creator` cell, without a `u/` prefix.
///
/// Falls back to the trimmed cell when it does not start with a name.
pub fn extract_organizer(creator: &str) -> String {
    ORGANIZER_RE
        .captures(creator)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| creator.trim().to_string())
}

/// Counters describing one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    pub api_projects: usize,
    pub sheet_rows: usize,
    pub sheet_projects: usize,
    pub enriched_exact: usize,
    pub enriched_day_before: usize,
    pub duplicates_dropped: usize,
    pub merged: usize,
}

/// Output of [`RecordLinker::reconcile`].
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// API projects first, then the surviving sheet projects
    pub projects: Vec<Project>,
    pub report: LinkReport,
}

/// Links both sources against a shared video catalog.
#[derive(Debug, Clone, Copy)]
pub struct RecordLinker<'a> {
    catalog: &'a VideoCatalog,
}

/// Reconcile both sources and return only the merged projects.
pub fn reconcile(
    api_projects: &[ApiProject],
    sheet_rows: &[SheetRow],
    catalog: &VideoCatalog,
    sink: &mut dyn DiagnosticSink,
) -> Vec<Project> {
    RecordLinker::new(catalog)
        .reconcile(api_projects, sheet_rows, sink)
        .projects
}

impl<'a> RecordLinker<'a> {
    pub fn new(catalog: &'a VideoCatalog) -> Self {
        Self { catalog }
    }

    /// Run the full pass: build both sides, enrich, drop duplicates, merge.
    #[instrument(skip_all, fields(api = api_projects.len(), sheet = sheet_rows.len()))]
    pub fn reconcile(
        &self,
        api_projects: &[ApiProject],
        sheet_rows: &[SheetRow],
        sink: &mut dyn DiagnosticSink,
    ) -> Reconciliation {
        let mut report = LinkReport {
            sheet_rows: sheet_rows.len(),
            ..LinkReport::default()
        };

        let mut api = self.api_projects(api_projects, sink);
        let sheet = self.sheet_projects(sheet_rows, sink);
        report.api_projects = api.len();
        report.sheet_projects = sheet.len();

        let mut claims = claim_api_videos(&mut api, sink);
        let (exact, day_before) = enrich(&mut api, &sheet, &mut claims, sink);
        report.enriched_exact = exact;
        report.enriched_day_before = day_before;

        let mut projects = api;
        for project in sheet {
            let Some(video_id) = project.video_id() else {
                continue;
            };
            if let Some(claimed_by) = claims.claim(video_id, Origin::SheetSourced) {
                report.duplicates_dropped += 1;
                sink.emit(Diagnostic::DuplicateVideo {
                    title: project.title.clone(),
                    video_id: video_id.to_string(),
                    claimed_by,
                });
                continue;
            }
            projects.push(project);
        }
        report.merged = projects.len();

        debug!(?report, "reconciliation finished");
        Reconciliation { projects, report }
    }

    /// Convert API entries into projects. Entries with unparseable or inverted
    /// dates are dropped.
    pub fn api_projects(
        &self,
        entries: &[ApiProject],
        sink: &mut dyn DiagnosticSink,
    ) -> Vec<Project> {
        let mut projects = Vec::with_capacity(entries.len());
        for (row, entry) in entries.iter().enumerate() {
            let span = match api_span(entry) {
                Ok(span) => span,
                Err(error) => {
                    sink.emit(Diagnostic::Rejected {
                        origin: Origin::ApiSourced,
                        row,
                        title: entry.title.clone(),
                        error,
                    });
                    continue;
                }
            };
            let released_video = entry
                .released_video
                .as_ref()
                .filter(|video| !video.id.trim().is_empty())
                .and_then(|video| {
                    let video_id = video.id.trim();
                    let meta = self.catalog.get(video_id);
                    let published_at = temporal::parse_timestamp(&video.date)
                        .ok()
                        .or_else(|| meta.map(|m| m.published_at));
                    let Some(published_at) = published_at else {
                        sink.emit(Diagnostic::BadVideo {
                            video_id: video_id.to_string(),
                            raw: video.date.clone(),
                        });
                        return None;
                    };
                    let title = if video.title.is_empty() {
                        meta.map(|m| m.title.clone()).unwrap_or_default()
                    } else {
                        video.title.clone()
                    };
                    Some(VideoRef {
                        video_id: video_id.to_string(),
                        title,
                        published_at,
                    })
                });
            let url = entry.url.trim();
            projects.push(Project {
                title: entry.title.trim().to_string(),
                organizer: entry.organizer.trim().to_string(),
                start_date: span.start,
                end_date: span.end,
                origin: Origin::ApiSourced,
                released_video,
                source_url: (!url.is_empty()).then(|| url.to_string()),
            });
        }
        projects
    }

    /// Convert sheet rows into projects. Only rows with valid dates and a link
    /// to a catalog video survive.
    pub fn sheet_projects(&self, rows: &[SheetRow], sink: &mut dyn DiagnosticSink) -> Vec<Project> {
        let mut projects = Vec::with_capacity(rows.len());
        for (row, raw) in rows.iter().enumerate() {
            match self.sheet_project(raw) {
                Ok(project) => projects.push(project),
                Err(error) => sink.emit(Diagnostic::Rejected {
                    origin: Origin::SheetSourced,
                    row,
                    title: raw.project_name.trim().to_string(),
                    error,
                }),
            }
        }
        projects
    }

    fn sheet_project(&self, row: &SheetRow) -> Result<Project, RowError> {
        let start = temporal::normalize(&row.start_date)?;
        let end = temporal::normalize(&row.deadline)?;
        let span = DateSpan::new(start, end)?;
        let released_video = extract_video_id(&row.link)
            .and_then(|video_id| self.catalog.video_ref(video_id))
            .ok_or_else(|| RowError::UnresolvedLink {
                link: row.link.clone(),
            })?;
        Ok(Project {
            title: row.project_name.trim().to_string(),
            organizer: extract_organizer(&row.creator),
            start_date: span.start,
            end_date: span.end,
            origin: Origin::SheetSourced,
            released_video: Some(released_video),
            source_url: None,
        })
    }
}

fn api_span(entry: &ApiProject) -> Result<DateSpan, RowError> {
    let start = temporal::parse_iso_date(&entry.start_date)?;
    let end = temporal::parse_iso_date(&entry.end_date)?;
    DateSpan::new(start, end)
}

/// Claim the videos API projects arrived with. A repeated video is unlinked
/// from the later project.
fn claim_api_videos(api: &mut [Project], sink: &mut dyn DiagnosticSink) -> VideoClaims {
    let mut claims = VideoClaims::new();
    for project in api.iter_mut() {
        let Some(video_id) = project.video_id() else {
            continue;
        };
        if let Some(claimed_by) = claims.claim(video_id, Origin::ApiSourced) {
            sink.emit(Diagnostic::DuplicateVideo {
                title: project.title.clone(),
                video_id: video_id.to_string(),
                claimed_by,
            });
            project.released_video = None;
        }
    }
    claims
}

/// Attach sheet release links to unlinked API projects. Returns the number of
/// exact and day-before matches.
fn enrich(
    api: &mut [Project],
    sheet: &[Project],
    claims: &mut VideoClaims,
    sink: &mut dyn DiagnosticSink,
) -> (usize, usize) {
    let index = EnrichmentIndex::build(sheet);
    if index.overwritten() > 0 {
        debug!(
            overwritten = index.overwritten(),
            "duplicate sheet keys, later rows replaced earlier ones"
        );
    }

    let (mut exact, mut day_before) = (0, 0);
    for project in api.iter_mut().filter(|p| p.released_video.is_none()) {
        let found = index
            .find(&project.organizer, project.start_date)
            .and_then(|(position, how)| {
                sheet[position]
                    .released_video
                    .as_ref()
                    .map(|video| (video, how))
            });
        let Some((video, how)) = found else {
            sink.emit(Diagnostic::UnmatchedRelease {
                title: project.title.clone(),
                organizer: project.organizer.clone(),
                key: EnrichmentKey::new(&project.organizer, project.start_date).to_string(),
            });
            continue;
        };
        if let Some(claimed_by) = claims.claim(&video.video_id, Origin::ApiSourced) {
            sink.emit(Diagnostic::DuplicateVideo {
                title: project.title.clone(),
                video_id: video.video_id.clone(),
                claimed_by,
            });
            continue;
        }
        match how {
            KeyMatch::Exact => exact += 1,
            KeyMatch::DayBefore => day_before += 1,
        }
        project.released_video = Some(video.clone());
    }
    (exact, day_before)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApiReleasedVideo, ApiVideo, ContentDetails, Snippet};
    use time::macros::date;

    fn catalog(ids: &[(&str, &str)]) -> VideoCatalog {
        let videos: Vec<ApiVideo> = ids
            .iter()
            .map(|(id, at)| ApiVideo {
                content_details: ContentDetails {
                    video_id: id.to_string(),
                    video_published_at: at.to_string(),
                },
                snippet: Snippet {
                    title: format!("Release {id}"),
                },
            })
            .collect();
        VideoCatalog::from_videos(&videos).0
    }

    fn row(creator: &str, start: &str, deadline: &str, link: &str) -> SheetRow {
        SheetRow {
            project_name: format!("{creator} project"),
            creator: creator.to_string(),
            start_date: start.to_string(),
            deadline: deadline.to_string(),
            link: link.to_string(),
        }
    }

    fn api(organizer: &str, start: &str, end: &str) -> ApiProject {
        ApiProject {
            title: format!("{organizer} api project"),
            organizer: organizer.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            url: format!("https://example.org/{organizer}"),
            released_video: None,
        }
    }

    #[test]
    fn test_extract_video_id_shapes() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abc123"),
            Some("abc123")
        );
        assert_eq!(
            extract_video_id("see https://youtube.com/watch?feature=share&v=x_Y-9 now"),
            Some("x_Y-9")
        );
        assert_eq!(extract_video_id("https://youtu.be/QwErTy?t=4"), Some("QwErTy"));
        assert_eq!(extract_video_id("https://reddit.com/r/x/comments/1"), None);
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_extract_organizer() {
        assert_eq!(extract_organizer("u/Alice extra text"), "Alice");
        assert_eq!(extract_organizer("/u/bob_the-builder"), "bob_the-builder");
        assert_eq!(extract_organizer("Carol"), "Carol");
        assert_eq!(extract_organizer("  ?? "), "??");
    }

    #[test]
    fn test_sheet_row_becomes_project() {
        let catalog = catalog(&[("abc123", "2020-11-02T10:00:00Z")]);
        let mut sink: Vec<Diagnostic> = Vec::new();
        let projects = RecordLinker::new(&catalog).sheet_projects(
            &[row(
                "u/Alice extra text",
                "October 9th, 2020",
                "November 1, 2020",
                "https://www.youtube.com/watch?v=abc123",
            )],
            &mut sink,
        );
        assert!(sink.is_empty());
        let project = &projects[0];
        assert_eq!(project.organizer, "Alice");
        assert_eq!(project.start_date, date!(2020 - 10 - 09));
        assert_eq!(project.end_date, date!(2020 - 11 - 01));
        assert_eq!(project.video_id(), Some("abc123"));
        assert_eq!(project.origin, Origin::SheetSourced);
        assert_eq!(project.source_url, None);
    }

    #[test]
    fn test_sheet_rejections() {
        let catalog = catalog(&[("known", "2020-11-02T10:00:00Z")]);
        let rows = vec![
            row("a", "sometime in fall", "November 1, 2020", "youtu.be/known"),
            row("b", "October 1, 2020", "November 1, 2020", "no link here"),
            row("c", "October 1, 2020", "November 1, 2020", "youtu.be/unknown"),
            row("d", "November 2, 2020", "November 1, 2020", "youtu.be/known"),
        ];
        let mut sink: Vec<Diagnostic> = Vec::new();
        let projects = RecordLinker::new(&catalog).sheet_projects(&rows, &mut sink);
        assert!(projects.is_empty());
        let errors: Vec<_> = sink
            .iter()
            .map(|d| match d {
                Diagnostic::Rejected { row, error, .. } => (*row, error.clone()),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert!(matches!(errors[0], (0, RowError::ParseFailure { .. })));
        assert!(matches!(errors[1], (1, RowError::UnresolvedLink { .. })));
        assert!(matches!(errors[2], (2, RowError::UnresolvedLink { .. })));
        assert!(matches!(errors[3], (3, RowError::InvalidInterval { .. })));
    }

    #[test]
    fn test_enrichment_uses_day_before_fallback() {
        let catalog = catalog(&[("vid", "2020-12-01T00:00:00Z")]);
        let mut sink: Vec<Diagnostic> = Vec::new();
        let result = RecordLinker::new(&catalog).reconcile(
            &[api("Bob", "2020-10-10", "2020-11-20")],
            &[row("u/bob", "October 9, 2020", "November 20, 2020", "youtu.be/vid")],
            &mut sink,
        );
        assert_eq!(result.projects.len(), 1);
        let merged = &result.projects[0];
        assert_eq!(merged.origin, Origin::ApiSourced);
        assert_eq!(merged.video_id(), Some("vid"));
        assert_eq!(result.report.enriched_day_before, 1);
        assert_eq!(result.report.duplicates_dropped, 1);
    }

    #[test]
    fn test_unmatched_api_project_keeps_no_link() {
        let catalog = catalog(&[("vid", "2020-12-01T00:00:00Z")]);
        let mut sink: Vec<Diagnostic> = Vec::new();
        let result = RecordLinker::new(&catalog).reconcile(
            &[api("Bob", "2020-10-12", "2020-11-20")],
            &[row("u/bob", "October 9, 2020", "November 20, 2020", "youtu.be/vid")],
            &mut sink,
        );
        assert_eq!(result.projects.len(), 2);
        assert_eq!(result.projects[0].released_video, None);
        assert_eq!(result.projects[1].video_id(), Some("vid"));
        assert!(sink.iter().any(|d| matches!(
            d,
            Diagnostic::UnmatchedRelease { key, .. } if key == "bob|2020-10-12"
        )));
    }

    #[test]
    fn test_api_embedded_video_suppresses_sheet_duplicate() {
        let catalog = catalog(&[("vid", "2020-12-01T00:00:00Z")]);
        let mut entry = api("Dan", "2020-01-01", "2020-02-01");
        entry.released_video = Some(ApiReleasedVideo {
            title: String::new(),
            id: "vid".to_string(),
            date: "not a date".to_string(),
        });
        let mut sink: Vec<Diagnostic> = Vec::new();
        let result = RecordLinker::new(&catalog).reconcile(
            &[entry],
            &[row("u/someone", "March 1, 2020", "March 9, 2020", "youtu.be/vid")],
            &mut sink,
        );
        assert_eq!(result.projects.len(), 1);
        let video = result.projects[0].released_video.as_ref().unwrap();
        // Publish time and title fall back to the catalog.
        assert_eq!(video.title, "Release vid");
        assert_eq!(video.published_at.year(), 2020);
        assert!(sink.iter().any(|d| matches!(
            d,
            Diagnostic::DuplicateVideo { claimed_by: Origin::ApiSourced, .. }
        )));
    }

    #[test]
    fn test_sheet_rows_sharing_a_video_keep_the_first() {
        let catalog = catalog(&[("vid", "2020-12-01T00:00:00Z")]);
        let rows = vec![
            row("u/a", "March 1, 2020", "March 9, 2020", "youtu.be/vid"),
            row("u/b", "April 1, 2020", "April 9, 2020", "https://youtube.com/watch?v=vid"),
        ];
        let merged = reconcile(&[], &rows, &catalog, &mut crate::diagnostics::NullSink);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].organizer, "a");
    }

    #[test]
    fn test_api_projects_with_bad_dates_are_dropped() {
        let catalog = VideoCatalog::default();
        let mut sink: Vec<Diagnostic> = Vec::new();
        let projects = RecordLinker::new(&catalog).api_projects(
            &[
                api("a", "2020-01-01", "2020-01-02"),
                api("b", "January 1, 2020", "2020-01-02"),
                api("c", "2020-03-01", "2020-02-01"),
            ],
            &mut sink,
        );
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].source_url.as_deref(), Some("https://example.org/a"));
        assert_eq!(sink.len(), 2);
    }
}

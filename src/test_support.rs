use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::format_description::well_known::Rfc3339;
use time::macros::date;
use time::{Date, Duration, OffsetDateTime, Time};

use crate::model::{
    ApiExport, ApiProject, ApiReleasedVideo, ApiVideo, ContentDetails, Origin, Project, SheetRow,
    Snippet, VideoRef,
};

const ORGANIZERS: [&str; 8] = [
    "alice", "Bob", "carol_k", "dave-j", "Erin", "frank99", "grace", "heidi",
];

const EPOCH: Date = date!(2020 - 01 - 01);

fn day(offset: i64) -> Date {
    EPOCH + Duration::days(offset)
}

fn published(offset: i64, rng: &mut StdRng) -> OffsetDateTime {
    let time = Time::from_hms(rng.random_range(0..24), rng.random_range(0..60), 0)
        .expect("valid time of day");
    day(offset).with_time(time).assume_utc()
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).expect("rfc3339 formatting")
}

/// Spreadsheet-style date text, sometimes with an ordinal suffix or a
/// trailing qualifier.
pub fn sheet_date_text(date: Date, rng: &mut impl Rng) -> String {
    let day = date.day();
    let day_text = if (4..=20).contains(&day) && rng.random_bool(0.3) {
        format!("{day}th")
    } else {
        day.to_string()
    };
    let mut text = format!("{} {}, {}", date.month(), day_text, date.year());
    if rng.random_bool(0.1) {
        text.push_str(" (tentative)");
    }
    text
}

/// An API export with `count` projects and twice as many playlist videos.
/// Roughly half the projects arrive with a released video attached.
pub fn generate_api_export(count: usize, seed: u64) -> ApiExport {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut videos = Vec::with_capacity(count * 2);
    let mut published_at = Vec::with_capacity(count * 2);

    for i in 0..count * 2 {
        let at = published(rng.random_range(30..900), &mut rng);
        published_at.push(at);
        videos.push(ApiVideo {
            content_details: ContentDetails {
                video_id: format!("vid{i:05}"),
                video_published_at: rfc3339(at),
            },
            snippet: Snippet {
                title: format!("Collab Video {i}"),
            },
        });
    }

    let mut projects = Vec::with_capacity(count);
    for i in 0..count {
        let start = rng.random_range(0..800);
        let end = start + rng.random_range(0..90);
        let released_video = rng.random_bool(0.5).then(|| ApiReleasedVideo {
            title: format!("Collab Video {i}"),
            id: format!("vid{i:05}"),
            date: rfc3339(published_at[i]),
        });
        projects.push(ApiProject {
            title: format!("Project {i}"),
            organizer: ORGANIZERS[rng.random_range(0..ORGANIZERS.len())].to_string(),
            start_date: crate::temporal::iso(day(start)),
            end_date: crate::temporal::iso(day(end)),
            url: format!("https://example.org/projects/{i}"),
            released_video,
        });
    }

    ApiExport { projects, videos }
}

/// Sheet rows against `export`: some describe an API project (same organizer,
/// start date exact or a day early), some are independent, a few are broken.
pub fn generate_sheet_rows(export: &ApiExport, count: usize, seed: u64) -> Vec<SheetRow> {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_mul(31).wrapping_add(7));
    let mut rows = Vec::with_capacity(count);

    for i in 0..count {
        let link = if export.videos.is_empty() || rng.random_bool(0.1) {
            String::new()
        } else {
            let video = &export.videos[rng.random_range(0..export.videos.len())];
            let id = &video.content_details.video_id;
            if rng.random_bool(0.5) {
                format!("https://youtu.be/{id}")
            } else {
                format!("https://www.youtube.com/watch?v={id}&t=10")
            }
        };

        let describes_api = !export.projects.is_empty() && rng.random_bool(0.4);
        let (organizer, start) = if describes_api {
            let project = &export.projects[rng.random_range(0..export.projects.len())];
            let start = crate::temporal::parse_iso_date(&project.start_date)
                .expect("generated ISO date");
            let shift = if rng.random_bool(0.3) { 1 } else { 0 };
            (project.organizer.clone(), start - Duration::days(shift))
        } else {
            (
                ORGANIZERS[rng.random_range(0..ORGANIZERS.len())].to_string(),
                day(rng.random_range(0..800)),
            )
        };
        let end = start + Duration::days(rng.random_range(0..60));

        let start_text = if rng.random_bool(0.05) {
            "sometime in fall".to_string()
        } else {
            sheet_date_text(start, &mut rng)
        };

        rows.push(SheetRow {
            project_name: format!("Sheet Project {i}"),
            creator: format!("u/{organizer} and friends"),
            start_date: start_text,
            deadline: sheet_date_text(end, &mut rng),
            link,
        });
    }

    rows
}

/// Already-reconciled projects with unique video ids, for query and layout
/// tests.
pub fn generate_projects(count: usize, seed: u64) -> Vec<Project> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let start = rng.random_range(0..500);
            let end = start + rng.random_range(0..120);
            let released_video = rng.random_bool(0.6).then(|| VideoRef {
                video_id: format!("vid{i:05}"),
                title: format!("Video {i}"),
                published_at: published(end + rng.random_range(0..60), &mut rng),
            });
            Project {
                title: format!("Project {i}"),
                organizer: ORGANIZERS[rng.random_range(0..ORGANIZERS.len())].to_string(),
                start_date: day(start),
                end_date: day(end),
                origin: if rng.random_bool(0.5) {
                    Origin::ApiSourced
                } else {
                    Origin::SheetSourced
                },
                released_video,
                source_url: None,
            }
        })
        .collect()
}

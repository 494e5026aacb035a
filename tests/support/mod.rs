use projline::model::{ApiProject, ApiVideo, ContentDetails, SheetRow, Snippet};

#[allow(dead_code)]
pub fn video(id: &str, published_at: &str) -> ApiVideo {
    ApiVideo {
        content_details: ContentDetails {
            video_id: id.to_string(),
            video_published_at: published_at.to_string(),
        },
        snippet: Snippet {
            title: format!("Release {id}"),
        },
    }
}

#[allow(dead_code)]
pub fn api_project(title: &str, organizer: &str, start: &str, end: &str) -> ApiProject {
    ApiProject {
        title: title.to_string(),
        organizer: organizer.to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        url: String::new(),
        released_video: None,
    }
}

#[allow(dead_code)]
pub fn sheet_row(name: &str, creator: &str, start: &str, deadline: &str, link: &str) -> SheetRow {
    SheetRow {
        project_name: name.to_string(),
        creator: creator.to_string(),
        start_date: start.to_string(),
        deadline: deadline.to_string(),
        link: link.to_string(),
    }
}

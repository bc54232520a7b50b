//! Presentation helpers shared by front-ends: row labels, confirmation and
//! toast wording, timestamps.

use crate::app::{Build, BuildStatus, Project};
use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const NO_BUILDS: &str = "No builds";
pub const NO_PROJECTS: &str = "No projects";

pub fn format_date_time(dt: &DateTime<Utc>) -> String {
    dt.format("%d.%m.%Y %H:%M").to_string()
}

/// Build number with the id as fallback, as shown in titles and dialogs.
pub fn build_number_or_id(build: &Build) -> String {
    build
        .number
        .map_or_else(|| build.id.clone(), |n| n.to_string())
}

/// Row title: `#<number> <ci build id>`.
pub fn build_title(build: &Build) -> String {
    match &build.ci_build_id {
        Some(ci) => format!("#{} {}", build_number_or_id(build), ci),
        None => format!("#{}", build_number_or_id(build)),
    }
}

pub fn build_confirm_message(build: &Build) -> String {
    format!(
        "Are you sure you want to delete build: #{}?",
        build_number_or_id(build)
    )
}

pub fn project_confirm_message(project: &Project) -> String {
    format!("Are you sure you want to delete: {}?", project.name)
}

pub fn build_deleted_message(build: &Build) -> String {
    format!("Build #{} deleted", build_number_or_id(build))
}

pub fn status_label(status: BuildStatus) -> &'static str {
    match status {
        BuildStatus::New => "New",
        BuildStatus::Running => "Running",
        BuildStatus::Unresolved => "Unresolved",
        BuildStatus::Passed => "Passed",
        BuildStatus::Failed => "Failed",
        BuildStatus::Unknown => "Unknown",
    }
}

/// Truncates to `max_width` display columns, appending `…` when cut.
/// Width-aware so CJK and emoji do not overflow narrow panes.
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_width.saturating_sub(1) {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

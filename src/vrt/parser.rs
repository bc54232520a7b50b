use crate::app::{Build, Project};
use color_eyre::eyre::Result;

pub fn parse_builds(json: &str) -> Result<Vec<Build>> {
    let builds: Vec<Build> = serde_json::from_str(json)?;
    Ok(builds)
}

pub fn parse_projects(json: &str) -> Result<Vec<Project>> {
    let projects: Vec<Project> = serde_json::from_str(json)?;
    Ok(projects)
}

pub fn parse_project(json: &str) -> Result<Project> {
    let project: Project = serde_json::from_str(json)?;
    Ok(project)
}

//! Shareable locations. The selected build is a deep-linkable function of
//! the path, so a pasted link restores the same view.

pub const PROJECT_LIST_PAGE: &str = "/projects";
pub const VARIATION_LIST_PAGE: &str = "/variations";

const BUILD_ID_PARAM: &str = "buildId";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub project_id: String,
    pub build_id: Option<String>,
}

impl Location {
    pub fn project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            build_id: None,
        }
    }

    /// Renders the location as a path, e.g. `/projects/p1?buildId=b2`.
    pub fn to_path(&self) -> String {
        match &self.build_id {
            Some(build_id) => {
                format!("{PROJECT_LIST_PAGE}/{}?{BUILD_ID_PARAM}={build_id}", self.project_id)
            }
            None => format!("{PROJECT_LIST_PAGE}/{}", self.project_id),
        }
    }

    /// Absolute URL under the dashboard base, for sharing and browser opens.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.to_path())
    }

    /// Parses a path produced by [`Location::to_path`]. Returns `None` for
    /// paths outside the project pages or with an empty project id.
    pub fn parse(path: &str) -> Option<Self> {
        let rest = path.strip_prefix(PROJECT_LIST_PAGE)?.strip_prefix('/')?;
        let (project_id, query) = match rest.split_once('?') {
            Some((id, query)) => (id, Some(query)),
            None => (rest, None),
        };
        if project_id.is_empty() {
            return None;
        }
        let build_id = query.and_then(|q| {
            q.split('&').find_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                (key == BUILD_ID_PARAM && !value.is_empty()).then(|| value.to_string())
            })
        });
        Some(Self {
            project_id: project_id.to_string(),
            build_id,
        })
    }
}

/// Path of the variation list page for a project.
pub fn variation_list_path(project_id: &str) -> String {
    format!("{VARIATION_LIST_PAGE}/{project_id}")
}

use crate::link::Location;
use crate::store::{Keyed, Store};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

// UI constants
pub const TOAST_TTL_SECS: u64 = 5;
pub const DEFAULT_PAGE_LIMIT: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildStatus {
    New,
    Running,
    Unresolved,
    Passed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageComparison {
    Pixelmatch,
    LooksSame,
    Odiff,
}

impl Default for ImageComparison {
    fn default() -> Self {
        Self::Pixelmatch
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: String,
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub ci_build_id: Option<String>,
    pub branch_name: String,
    pub status: BuildStatus,
    #[serde(default)]
    pub is_running: bool,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub main_branch_name: String,
    #[serde(default)]
    pub ignore_antialiasing: bool,
    #[serde(default)]
    pub auto_approve_feature: bool,
    #[serde(default)]
    pub diff_dimensions_feature: bool,
    pub threshold: f32,
    #[serde(default)]
    pub image_comparison: ImageComparison,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create/update payload for a project. `id` is empty on create.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub id: String,
    pub name: String,
    pub main_branch_name: String,
    pub ignore_antialiasing: bool,
    pub auto_approve_feature: bool,
    pub diff_dimensions_feature: bool,
    pub threshold: f32,
    pub image_comparison: ImageComparison,
}

impl Default for ProjectDraft {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            main_branch_name: String::new(),
            ignore_antialiasing: true,
            auto_approve_feature: true,
            diff_dimensions_feature: true,
            threshold: 0.1,
            image_comparison: ImageComparison::Pixelmatch,
        }
    }
}

impl From<&Project> for ProjectDraft {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            main_branch_name: project.main_branch_name.clone(),
            ignore_antialiasing: project.ignore_antialiasing,
            auto_approve_feature: project.auto_approve_feature,
            diff_dimensions_feature: project.diff_dimensions_feature,
            threshold: project.threshold,
            image_comparison: project.image_comparison,
        }
    }
}

impl Keyed for Build {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Keyed for Project {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub timestamp: std::time::Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuTarget {
    Build(String),
    Project(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    Stop,
    Edit,
    Delete,
}

pub struct MenuOverlay {
    pub target: MenuTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteBuild(String),
    DeleteProject(String),
}

pub struct ConfirmOverlay {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update,
}

pub struct FormOverlay {
    pub mode: FormMode,
    pub draft: ProjectDraft,
}

pub enum ActiveOverlay {
    None,
    Menu(MenuOverlay),
    Confirm(ConfirmOverlay),
    Form(FormOverlay),
}

/// Immutable configuration set at startup.
pub struct AppConfig {
    /// Base URL of the dashboard, used to build shareable links.
    pub base_url: String,
    /// Incoming location, e.g. from a shared link. Restored once data loads.
    pub start_path: Option<String>,
    pub limit: usize,
    pub desktop_notify: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            start_path: None,
            limit: DEFAULT_PAGE_LIMIT,
            desktop_notify: true,
        }
    }
}

pub struct AppState {
    pub config: AppConfig,

    // Collections
    pub builds: Store<Build>,
    pub projects: Store<Project>,

    // Deep link awaiting data (set from config.start_path, consumed on load)
    pub deep_link: Option<Location>,

    // Refresh change detection
    pub status_snapshot: HashMap<String, (BuildStatus, u64)>,
    pub refresh_count: u64,

    // Outstanding mutations, one token per item id
    pending: HashSet<String>,

    // Transient UI
    pub toasts: Vec<Toast>,
    pub should_quit: bool,

    // Active overlay (mutually exclusive)
    pub overlay: ActiveOverlay,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let deep_link = config.start_path.as_deref().and_then(Location::parse);
        Self {
            config,
            builds: Store::new(),
            projects: Store::new(),
            deep_link,
            status_snapshot: HashMap::new(),
            refresh_count: 0,
            pending: HashSet::new(),
            toasts: Vec::new(),
            should_quit: false,
            overlay: ActiveOverlay::None,
        }
    }

    pub fn find_build(&self, id: &str) -> Option<&Build> {
        self.builds.items().iter().find(|b| b.id == id)
    }

    pub fn find_project(&self, id: &str) -> Option<&Project> {
        self.projects.items().iter().find(|p| p.id == id)
    }

    /// The shareable location for the current selection, if a project is selected.
    pub fn current_location(&self) -> Option<Location> {
        let project_id = self.projects.selected_id()?;
        Some(Location {
            project_id: project_id.to_string(),
            build_id: self.builds.selected_id().map(str::to_string),
        })
    }

    // --- Pending mutation tokens ---

    /// Claims the mutation token for `id`. Returns false if one is already
    /// outstanding, in which case the caller must not issue the request.
    pub fn begin_mutation(&mut self, id: &str) -> bool {
        self.pending.insert(id.to_string())
    }

    /// Releases the token once the remote call settled, success or failure.
    pub fn settle_mutation(&mut self, id: &str) {
        if !self.pending.remove(id) {
            tracing::debug!("settle without token: {id}");
        }
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains(id)
    }

    // --- Toast tray ---

    pub fn push_toast(&mut self, message: impl Into<String>, level: ToastLevel) {
        self.toasts.push(Toast {
            message: message.into(),
            level,
            timestamp: std::time::Instant::now(),
        });
    }

    pub fn prune_toasts(&mut self) {
        let now = std::time::Instant::now();
        self.toasts
            .retain(|t| now.duration_since(t.timestamp).as_secs() < TOAST_TTL_SECS);
    }

    pub fn dismiss_toasts(&mut self) {
        self.toasts.clear();
    }

    /// Closes whatever overlay is active.
    pub fn close_overlay(&mut self) {
        self.overlay = ActiveOverlay::None;
    }

    // --- Menu overlay methods ---

    pub fn has_menu_overlay(&self) -> bool {
        matches!(self.overlay, ActiveOverlay::Menu(_))
    }

    pub fn open_menu(&mut self, target: MenuTarget) {
        self.overlay = ActiveOverlay::Menu(MenuOverlay { target });
    }

    pub fn close_menu(&mut self) {
        if matches!(self.overlay, ActiveOverlay::Menu(_)) {
            self.overlay = ActiveOverlay::None;
        }
    }

    pub fn menu_target(&self) -> Option<&MenuTarget> {
        if let ActiveOverlay::Menu(ref overlay) = self.overlay {
            Some(&overlay.target)
        } else {
            None
        }
    }

    /// Entries the open menu offers. Stop appears only for a running build.
    pub fn menu_entries(&self) -> Vec<MenuEntry> {
        match self.menu_target() {
            Some(MenuTarget::Build(id)) => {
                let running = self.find_build(id).is_some_and(|b| b.is_running);
                if running {
                    vec![MenuEntry::Stop, MenuEntry::Delete]
                } else {
                    vec![MenuEntry::Delete]
                }
            }
            Some(MenuTarget::Project(_)) => vec![MenuEntry::Edit, MenuEntry::Delete],
            None => Vec::new(),
        }
    }

    // --- Confirm overlay methods ---

    pub fn has_confirm_overlay(&self) -> bool {
        matches!(self.overlay, ActiveOverlay::Confirm(_))
    }

    pub fn confirm_action(&self) -> Option<ConfirmAction> {
        if let ActiveOverlay::Confirm(ref overlay) = self.overlay {
            Some(overlay.action.clone())
        } else {
            None
        }
    }

    pub fn open_confirm_overlay(&mut self, title: String, message: String, action: ConfirmAction) {
        self.overlay = ActiveOverlay::Confirm(ConfirmOverlay {
            title,
            message,
            action,
        });
    }

    pub fn close_confirm_overlay(&mut self) {
        if matches!(self.overlay, ActiveOverlay::Confirm(_)) {
            self.overlay = ActiveOverlay::None;
        }
    }

    // --- Project form overlay methods ---

    pub fn has_form_overlay(&self) -> bool {
        matches!(self.overlay, ActiveOverlay::Form(_))
    }

    pub fn open_form_overlay(&mut self, mode: FormMode, draft: ProjectDraft) {
        self.overlay = ActiveOverlay::Form(FormOverlay { mode, draft });
    }

    pub fn close_form_overlay(&mut self) {
        if matches!(self.overlay, ActiveOverlay::Form(_)) {
            self.overlay = ActiveOverlay::None;
        }
    }

    pub fn form(&self) -> Option<&FormOverlay> {
        if let ActiveOverlay::Form(ref overlay) = self.overlay {
            Some(overlay)
        } else {
            None
        }
    }

    pub fn form_draft_mut(&mut self) -> Option<&mut ProjectDraft> {
        if let ActiveOverlay::Form(ref mut overlay) = self.overlay {
            Some(&mut overlay.draft)
        } else {
            None
        }
    }
}

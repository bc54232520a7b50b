use crate::app::{Build, Project, ProjectDraft, ToastLevel};
use async_trait::async_trait;
use color_eyre::eyre::Result;

/// Remote CRUD operations against the visual-regression backend. Errors
/// carry a human-readable message; the dashboard converts every failure into
/// a toast and never propagates it further.
#[async_trait]
pub trait VrtService: Send + Sync {
    async fn create_project(&self, draft: &ProjectDraft) -> Result<Project>;
    async fn update_project(&self, draft: &ProjectDraft) -> Result<Project>;
    async fn delete_project(&self, id: &str) -> Result<Project>;
    async fn delete_build(&self, id: &str) -> Result<Build>;
    async fn stop_build(&self, id: &str) -> Result<Build>;
}

/// External sink for transient messages, mirrored alongside the in-state
/// toast tray (e.g. the desktop notification adapter).
pub trait Notifier: Send {
    fn notify(&self, message: &str, level: ToastLevel);
}

//! Application event channel. All state transitions happen on the single
//! consumer of this channel, so mutation completions apply in arrival order.

use crate::app::{Build, MenuTarget, Project, ProjectDraft};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Completion and housekeeping events consumed by the dashboard loop.
#[derive(Debug)]
pub enum AppEvent {
    Tick,
    ProjectsLoaded(Vec<Project>),
    BuildsLoaded(Vec<Build>),
    ProjectCreated(Project),
    ProjectUpdated(Project),
    ProjectDeleted(Project),
    BuildDeleted(Build),
    BuildStopped(Build),
    /// A remote mutation rejected. `target` carries the item id whose pending
    /// token must settle; `None` for creates, which are not tokened.
    MutationFailed {
        target: Option<String>,
        message: String,
    },
    ClipboardResult(Result<(), String>),
    /// Global failure outside any single mutation (fetch, parse, channel).
    Error(String),
}

/// Front-end intents. Synchronous state transitions except where they spawn
/// a remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectBuild(Option<String>),
    SelectProject(String),
    OpenMenu(MenuTarget),
    RequestStop,
    RequestDelete,
    Confirm,
    Cancel,
    OpenCreateForm,
    OpenEditForm(String),
    EditDraft(ProjectDraft),
    SubmitForm,
    OpenDiff,
    CopyLink,
    DismissToasts,
    Quit,
}

pub struct EventBus {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
    ticker: Option<JoinHandle<()>>,
}

impl EventBus {
    /// Must be called from within a tokio runtime; spawns the ticker task
    /// that drives toast pruning.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tick_tx = tx.clone();

        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_rate);
            loop {
                interval.tick().await;
                if tick_tx.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self {
            rx,
            tx,
            ticker: Some(ticker),
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

//! The mutation sequencer. Owns the application state and the service
//! handle; applies front-end intents, spawns remote calls, and folds their
//! completions back into the state in arrival order.

use crate::app::{AppConfig, AppState, ConfirmAction, FormMode, MenuTarget, ProjectDraft, ToastLevel};
use crate::changes;
use crate::events::{Action, AppEvent};
use crate::selection;
use crate::store::StoreAction;
use crate::view;
use crate::vrt::nav;
use crate::vrt::service::{Notifier, VrtService};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

pub struct Dashboard {
    pub state: AppState,
    service: Arc<dyn VrtService>,
    tx: UnboundedSender<AppEvent>,
    notifier: Option<Box<dyn Notifier>>,
}

impl Dashboard {
    pub fn new(config: AppConfig, service: Arc<dyn VrtService>, tx: UnboundedSender<AppEvent>) -> Self {
        Self {
            state: AppState::new(config),
            service,
            tx,
            notifier: None,
        }
    }

    /// Mirrors toasts to an external sink, e.g. the desktop adapter.
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    fn toast(&mut self, message: impl Into<String>, level: ToastLevel) {
        let message = message.into();
        if let Some(notifier) = &self.notifier {
            notifier.notify(&message, level);
        }
        self.state.push_toast(message, level);
    }

    fn spawn(&self, label: &'static str, fut: impl Future<Output = AppEvent> + Send + 'static) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if tx.send(fut.await).is_err() {
                tracing::warn!("{label}: channel closed");
            }
        });
    }

    /// Applies a front-end intent. Synchronous except where it spawns a
    /// remote call; the call's completion arrives later as an [`AppEvent`].
    pub fn handle(&mut self, action: Action) {
        match action {
            Action::SelectBuild(id) => {
                self.state.builds.dispatch(StoreAction::Select(id));
            }
            Action::SelectProject(id) => {
                self.state.projects.dispatch(StoreAction::Select(Some(id)));
            }
            Action::OpenMenu(target) => self.state.open_menu(target),
            Action::RequestStop => self.request_stop(),
            Action::RequestDelete => self.request_delete(),
            Action::Confirm => self.confirm(),
            Action::Cancel => self.state.close_overlay(),
            Action::OpenCreateForm => {
                self.state
                    .open_form_overlay(FormMode::Create, ProjectDraft::default());
            }
            Action::OpenEditForm(id) => {
                if let Some(project) = self.state.find_project(&id) {
                    let draft = ProjectDraft::from(project);
                    self.state.open_form_overlay(FormMode::Update, draft);
                } else {
                    tracing::debug!("edit rejected: unknown project {id}");
                }
            }
            Action::EditDraft(draft) => {
                if let Some(current) = self.state.form_draft_mut() {
                    *current = draft;
                }
            }
            Action::SubmitForm => self.submit_form(),
            Action::OpenDiff => {
                if let Some(location) = self.state.current_location() {
                    let url = location.url(&self.state.config.base_url);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = nav::open_in_browser(&url).await {
                            if tx.send(AppEvent::Error(format!("{e}"))).is_err() {
                                tracing::warn!("open_diff: channel closed");
                            }
                        }
                    });
                }
            }
            Action::CopyLink => {
                if let Some(location) = self.state.current_location() {
                    let url = location.url(&self.state.config.base_url);
                    self.spawn("copy_link", async move {
                        let result = nav::copy_to_clipboard(&url)
                            .await
                            .map_err(|e| format!("{e}"));
                        AppEvent::ClipboardResult(result)
                    });
                }
            }
            Action::DismissToasts => self.state.dismiss_toasts(),
            Action::Quit => self.state.should_quit = true,
        }
    }

    fn request_stop(&mut self) {
        let Some(MenuTarget::Build(id)) = self.state.menu_target().cloned() else {
            return;
        };
        self.state.close_menu();
        if !self.state.find_build(&id).is_some_and(|b| b.is_running) {
            tracing::debug!("stop rejected: build {id} is not running");
            return;
        }
        if !self.state.begin_mutation(&id) {
            tracing::debug!("stop rejected: mutation pending for {id}");
            return;
        }
        let service = self.service.clone();
        self.spawn("stop_build", async move {
            match service.stop_build(&id).await {
                Ok(build) => AppEvent::BuildStopped(build),
                Err(e) => AppEvent::MutationFailed {
                    target: Some(id),
                    message: format!("{e}"),
                },
            }
        });
    }

    fn request_delete(&mut self) {
        match self.state.menu_target().cloned() {
            Some(MenuTarget::Build(id)) => {
                let Some(build) = self.state.find_build(&id) else {
                    self.state.close_menu();
                    return;
                };
                let message = view::build_confirm_message(build);
                self.state.open_confirm_overlay(
                    "Delete Build".to_string(),
                    message,
                    ConfirmAction::DeleteBuild(id),
                );
            }
            Some(MenuTarget::Project(id)) => {
                let Some(project) = self.state.find_project(&id) else {
                    self.state.close_menu();
                    return;
                };
                let message = view::project_confirm_message(project);
                self.state.open_confirm_overlay(
                    "Delete Project".to_string(),
                    message,
                    ConfirmAction::DeleteProject(id),
                );
            }
            None => {}
        }
    }

    fn confirm(&mut self) {
        let Some(action) = self.state.confirm_action() else {
            return;
        };
        // The dialog closes on submit, before the request settles; the
        // pending token keeps a duplicate from being issued meanwhile.
        self.state.close_confirm_overlay();
        match action {
            ConfirmAction::DeleteBuild(id) => {
                if !self.state.begin_mutation(&id) {
                    tracing::debug!("delete rejected: mutation pending for {id}");
                    return;
                }
                let service = self.service.clone();
                self.spawn("delete_build", async move {
                    match service.delete_build(&id).await {
                        Ok(build) => AppEvent::BuildDeleted(build),
                        Err(e) => AppEvent::MutationFailed {
                            target: Some(id),
                            message: format!("{e}"),
                        },
                    }
                });
            }
            ConfirmAction::DeleteProject(id) => {
                if !self.state.begin_mutation(&id) {
                    tracing::debug!("delete rejected: mutation pending for {id}");
                    return;
                }
                let service = self.service.clone();
                self.spawn("delete_project", async move {
                    match service.delete_project(&id).await {
                        Ok(project) => AppEvent::ProjectDeleted(project),
                        Err(e) => AppEvent::MutationFailed {
                            target: Some(id),
                            message: format!("{e}"),
                        },
                    }
                });
            }
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = self.state.form() else {
            return;
        };
        let mode = form.mode;
        let draft = form.draft.clone();
        match mode {
            FormMode::Create => {
                // Creates are not tokened: there is no id yet.
                let service = self.service.clone();
                self.spawn("create_project", async move {
                    match service.create_project(&draft).await {
                        Ok(project) => AppEvent::ProjectCreated(project),
                        Err(e) => AppEvent::MutationFailed {
                            target: None,
                            message: format!("{e}"),
                        },
                    }
                });
            }
            FormMode::Update => {
                if !self.state.begin_mutation(&draft.id) {
                    tracing::debug!("update rejected: mutation pending for {}", draft.id);
                    return;
                }
                let service = self.service.clone();
                self.spawn("update_project", async move {
                    match service.update_project(&draft).await {
                        Ok(project) => AppEvent::ProjectUpdated(project),
                        Err(e) => AppEvent::MutationFailed {
                            target: Some(draft.id),
                            message: format!("{e}"),
                        },
                    }
                });
            }
        }
    }

    /// Folds a completion event into the state. Events apply in the order
    /// they arrive; overlapping mutations are last-writer-wins.
    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tick => self.state.prune_toasts(),
            AppEvent::ProjectsLoaded(projects) => {
                self.state.projects.dispatch(StoreAction::Loaded(projects));
                self.restore_project_link();
            }
            AppEvent::BuildsLoaded(builds) => {
                let finished = changes::detect_changes(&mut self.state, &builds);
                #[cfg(feature = "desktop-notify")]
                if self.state.config.desktop_notify {
                    for build in &finished {
                        crate::notify::send_build_finished(build);
                    }
                }
                #[cfg(not(feature = "desktop-notify"))]
                let _ = finished;
                self.state.builds.dispatch(StoreAction::Loaded(builds));
                self.restore_build_link();
            }
            AppEvent::ProjectCreated(project) => {
                self.state.close_form_overlay();
                self.toast(format!("{} created", project.name), ToastLevel::Success);
                self.state.projects.dispatch(StoreAction::Upserted(project));
            }
            AppEvent::ProjectUpdated(project) => {
                self.state.settle_mutation(&project.id);
                self.state.close_form_overlay();
                self.toast(format!("{} updated", project.name), ToastLevel::Success);
                self.state.projects.dispatch(StoreAction::Upserted(project));
            }
            AppEvent::ProjectDeleted(project) => {
                self.state.settle_mutation(&project.id);
                let next = selection::selection_after_delete(
                    self.state.projects.items(),
                    self.state.projects.selected_id(),
                    &project.id,
                );
                self.state
                    .projects
                    .dispatch(StoreAction::Removed(project.id.clone()));
                self.state.projects.dispatch(StoreAction::Select(next));
                self.toast(format!("{} deleted", project.name), ToastLevel::Success);
            }
            AppEvent::BuildDeleted(build) => {
                self.state.settle_mutation(&build.id);
                let next = selection::selection_after_delete(
                    self.state.builds.items(),
                    self.state.builds.selected_id(),
                    &build.id,
                );
                self.state
                    .builds
                    .dispatch(StoreAction::Removed(build.id.clone()));
                self.state.builds.dispatch(StoreAction::Select(next));
                self.toast(view::build_deleted_message(&build), ToastLevel::Success);
            }
            AppEvent::BuildStopped(build) => {
                self.state.settle_mutation(&build.id);
                self.toast(format!("{} finished", build.id), ToastLevel::Success);
                self.state.builds.dispatch(StoreAction::Upserted(build));
            }
            AppEvent::MutationFailed { target, message } => {
                if let Some(id) = target {
                    self.state.settle_mutation(&id);
                }
                // Failed mutations leave collections and selection untouched;
                // a failed form submit keeps the form open for a retry.
                self.toast(message, ToastLevel::Error);
            }
            AppEvent::ClipboardResult(result) => match result {
                Ok(()) => self.toast("Link copied to clipboard", ToastLevel::Success),
                Err(e) => self.toast(e, ToastLevel::Error),
            },
            AppEvent::Error(e) => {
                self.state.builds.end_loading();
                self.state.projects.end_loading();
                self.toast(e, ToastLevel::Error);
            }
        }
    }

    fn restore_project_link(&mut self) {
        let Some(link) = &self.state.deep_link else {
            return;
        };
        if self.state.find_project(&link.project_id).is_none() {
            return;
        }
        let project_id = link.project_id.clone();
        let consumed = link.build_id.is_none();
        self.state
            .projects
            .dispatch(StoreAction::Select(Some(project_id)));
        if consumed {
            self.state.deep_link = None;
        }
    }

    fn restore_build_link(&mut self) {
        let Some(link) = self.state.deep_link.take() else {
            return;
        };
        if let Some(build_id) = link.build_id {
            if self.state.find_build(&build_id).is_some() {
                self.state
                    .builds
                    .dispatch(StoreAction::Select(Some(build_id)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Build, BuildStatus, ImageComparison, Project};
    use async_trait::async_trait;
    use chrono::Utc;
    use color_eyre::eyre::{eyre, Result};
    use std::sync::Mutex;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn make_build(id: &str, running: bool) -> Build {
        Build {
            id: id.to_string(),
            number: Some(1),
            ci_build_id: None,
            branch_name: "main".to_string(),
            status: if running {
                BuildStatus::Running
            } else {
                BuildStatus::Passed
            },
            is_running: running,
            project_id: "p1".to_string(),
            created_at: Utc::now(),
        }
    }

    fn make_project(id: &str, name: &str) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
            main_branch_name: "master".to_string(),
            ignore_antialiasing: true,
            auto_approve_feature: true,
            diff_dimensions_feature: true,
            threshold: 0.1,
            image_comparison: ImageComparison::Pixelmatch,
            created_at: None,
        }
    }

    /// Service that succeeds by echoing the requested item, or fails with the
    /// scripted message on its next call.
    #[derive(Default)]
    struct ScriptedService {
        fail_next: Mutex<Option<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedService {
        fn fail_next(&self, message: &str) {
            *self.fail_next.lock().unwrap() = Some(message.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn check(&self, call: String) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            match self.fail_next.lock().unwrap().take() {
                Some(msg) => Err(eyre!(msg)),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl VrtService for ScriptedService {
        async fn create_project(&self, draft: &ProjectDraft) -> Result<Project> {
            self.check(format!("create_project {}", draft.name))?;
            Ok(make_project("p-new", &draft.name))
        }

        async fn update_project(&self, draft: &ProjectDraft) -> Result<Project> {
            self.check(format!("update_project {}", draft.id))?;
            Ok(make_project(&draft.id, &draft.name))
        }

        async fn delete_project(&self, id: &str) -> Result<Project> {
            self.check(format!("delete_project {id}"))?;
            Ok(make_project(id, "gone"))
        }

        async fn delete_build(&self, id: &str) -> Result<Build> {
            self.check(format!("delete_build {id}"))?;
            Ok(make_build(id, false))
        }

        async fn stop_build(&self, id: &str) -> Result<Build> {
            self.check(format!("stop_build {id}"))?;
            Ok(make_build(id, false))
        }
    }

    fn setup() -> (Dashboard, Arc<ScriptedService>, UnboundedReceiver<AppEvent>) {
        let service = Arc::new(ScriptedService::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let dashboard = Dashboard::new(AppConfig::default(), service.clone(), tx);
        (dashboard, service, rx)
    }

    fn load_builds(dashboard: &mut Dashboard, ids: &[&str]) {
        let builds = ids.iter().map(|id| make_build(id, false)).collect();
        dashboard.apply(AppEvent::BuildsLoaded(builds));
    }

    // --- Delete flow ---

    #[tokio::test]
    async fn delete_selected_build_reselects_neighbor() {
        let (mut dashboard, _service, mut rx) = setup();
        load_builds(&mut dashboard, &["a", "b", "c"]);
        dashboard.handle(Action::SelectBuild(Some("b".to_string())));
        dashboard.handle(Action::OpenMenu(MenuTarget::Build("b".to_string())));
        dashboard.handle(Action::RequestDelete);
        assert!(dashboard.state.has_confirm_overlay());

        dashboard.handle(Action::Confirm);
        // Dialog already closed, request in flight
        assert!(!dashboard.state.has_confirm_overlay());
        assert!(dashboard.state.is_pending("b"));

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, AppEvent::BuildDeleted(_)));
        dashboard.apply(event);

        assert_eq!(dashboard.state.builds.selected_id(), Some("a"));
        assert_eq!(dashboard.state.builds.len(), 2);
        assert!(!dashboard.state.is_pending("b"));
        assert_eq!(dashboard.state.toasts.len(), 1);
        assert_eq!(dashboard.state.toasts[0].level, ToastLevel::Success);
    }

    #[tokio::test]
    async fn failed_delete_is_a_no_op_with_error_toast() {
        let (mut dashboard, service, mut rx) = setup();
        load_builds(&mut dashboard, &["a", "b", "c"]);
        dashboard.handle(Action::SelectBuild(Some("b".to_string())));
        service.fail_next("network down");

        dashboard.handle(Action::OpenMenu(MenuTarget::Build("b".to_string())));
        dashboard.handle(Action::RequestDelete);
        dashboard.handle(Action::Confirm);

        let event = rx.recv().await.unwrap();
        dashboard.apply(event);

        assert_eq!(dashboard.state.builds.len(), 3);
        assert_eq!(dashboard.state.builds.selected_id(), Some("b"));
        assert!(!dashboard.state.is_pending("b"));
        assert_eq!(dashboard.state.toasts[0].level, ToastLevel::Error);
        assert!(dashboard.state.toasts[0].message.contains("network down"));
    }

    #[tokio::test]
    async fn pending_token_blocks_duplicate_delete() {
        let (mut dashboard, service, mut rx) = setup();
        load_builds(&mut dashboard, &["a", "b"]);

        dashboard.handle(Action::OpenMenu(MenuTarget::Build("a".to_string())));
        dashboard.handle(Action::RequestDelete);
        dashboard.handle(Action::Confirm);

        // Same item again before the first call settles
        dashboard.handle(Action::OpenMenu(MenuTarget::Build("a".to_string())));
        dashboard.handle(Action::RequestDelete);
        dashboard.handle(Action::Confirm);

        let event = rx.recv().await.unwrap();
        dashboard.apply(event);

        assert_eq!(service.calls(), vec!["delete_build a".to_string()]);
        assert!(rx.try_recv().is_err());
    }

    // --- Stop flow ---

    #[tokio::test]
    async fn stop_running_build_upserts_and_toasts() {
        let (mut dashboard, _service, mut rx) = setup();
        dashboard.apply(AppEvent::BuildsLoaded(vec![make_build("a", true)]));

        dashboard.handle(Action::OpenMenu(MenuTarget::Build("a".to_string())));
        dashboard.handle(Action::RequestStop);
        assert!(!dashboard.state.has_menu_overlay());

        let event = rx.recv().await.unwrap();
        dashboard.apply(event);

        assert!(!dashboard.state.builds.items()[0].is_running);
        assert_eq!(dashboard.state.toasts[0].message, "a finished");
    }

    #[tokio::test]
    async fn stop_is_guarded_by_is_running() {
        let (mut dashboard, service, mut rx) = setup();
        load_builds(&mut dashboard, &["a"]);

        dashboard.handle(Action::OpenMenu(MenuTarget::Build("a".to_string())));
        dashboard.handle(Action::RequestStop);

        assert!(service.calls().is_empty());
        assert!(rx.try_recv().is_err());
        assert!(!dashboard.state.is_pending("a"));
    }

    #[tokio::test]
    async fn failed_stop_leaves_build_running() {
        let (mut dashboard, service, mut rx) = setup();
        dashboard.apply(AppEvent::BuildsLoaded(vec![make_build("a", true)]));
        service.fail_next("stop failed");

        dashboard.handle(Action::OpenMenu(MenuTarget::Build("a".to_string())));
        dashboard.handle(Action::RequestStop);

        let event = rx.recv().await.unwrap();
        dashboard.apply(event);

        assert!(dashboard.state.builds.items()[0].is_running);
        assert_eq!(dashboard.state.toasts[0].level, ToastLevel::Error);
    }

    // --- Project form flow ---

    #[tokio::test]
    async fn create_project_closes_form_on_success() {
        let (mut dashboard, _service, mut rx) = setup();
        dashboard.handle(Action::OpenCreateForm);
        let mut draft = dashboard.state.form().unwrap().draft.clone();
        draft.name = "Storefront".to_string();
        dashboard.handle(Action::EditDraft(draft));
        dashboard.handle(Action::SubmitForm);
        // The form stays up until the create settles
        assert!(dashboard.state.has_form_overlay());

        let event = rx.recv().await.unwrap();
        dashboard.apply(event);

        assert!(!dashboard.state.has_form_overlay());
        assert_eq!(dashboard.state.projects.len(), 1);
        assert_eq!(dashboard.state.toasts[0].message, "Storefront created");
    }

    #[tokio::test]
    async fn failed_create_keeps_form_open() {
        let (mut dashboard, service, mut rx) = setup();
        service.fail_next("name taken");
        dashboard.handle(Action::OpenCreateForm);
        dashboard.handle(Action::SubmitForm);

        let event = rx.recv().await.unwrap();
        dashboard.apply(event);

        assert!(dashboard.state.has_form_overlay());
        assert!(dashboard.state.projects.is_empty());
        assert_eq!(dashboard.state.toasts[0].level, ToastLevel::Error);
    }

    #[tokio::test]
    async fn update_project_upserts_in_place() {
        let (mut dashboard, _service, mut rx) = setup();
        dashboard.apply(AppEvent::ProjectsLoaded(vec![make_project("p1", "Old")]));
        dashboard.handle(Action::OpenEditForm("p1".to_string()));
        let mut draft = dashboard.state.form().unwrap().draft.clone();
        draft.name = "New".to_string();
        dashboard.handle(Action::EditDraft(draft));
        dashboard.handle(Action::SubmitForm);

        let event = rx.recv().await.unwrap();
        dashboard.apply(event);

        assert_eq!(dashboard.state.projects.len(), 1);
        assert_eq!(dashboard.state.projects.items()[0].name, "New");
        assert_eq!(dashboard.state.toasts[0].message, "New updated");
    }

    // --- Project delete ---

    #[tokio::test]
    async fn delete_project_reselects_neighbor() {
        let (mut dashboard, _service, mut rx) = setup();
        dashboard.apply(AppEvent::ProjectsLoaded(vec![
            make_project("p1", "A"),
            make_project("p2", "B"),
        ]));
        dashboard.handle(Action::SelectProject("p1".to_string()));
        dashboard.handle(Action::OpenMenu(MenuTarget::Project("p1".to_string())));
        dashboard.handle(Action::RequestDelete);
        dashboard.handle(Action::Confirm);

        let event = rx.recv().await.unwrap();
        dashboard.apply(event);

        assert_eq!(dashboard.state.projects.selected_id(), Some("p2"));
        assert_eq!(dashboard.state.projects.len(), 1);
    }

    // --- Deep links ---

    #[tokio::test]
    async fn deep_link_restores_selection_once_loaded() {
        let service = Arc::new(ScriptedService::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = AppConfig {
            start_path: Some("/projects/p2?buildId=b".to_string()),
            ..AppConfig::default()
        };
        let mut dashboard = Dashboard::new(config, service, tx);

        dashboard.apply(AppEvent::ProjectsLoaded(vec![
            make_project("p1", "A"),
            make_project("p2", "B"),
        ]));
        assert_eq!(dashboard.state.projects.selected_id(), Some("p2"));

        load_builds(&mut dashboard, &["a", "b"]);
        assert_eq!(dashboard.state.builds.selected_id(), Some("b"));

        // The link is consumed; later refreshes follow normal selection rules
        load_builds(&mut dashboard, &["a"]);
        assert_eq!(dashboard.state.builds.selected_id(), Some("a"));
    }

    // --- Error path ---

    #[tokio::test]
    async fn global_error_ends_loading_and_toasts() {
        let (mut dashboard, _service, _rx) = setup();
        dashboard.state.builds.dispatch(StoreAction::LoadStarted);
        dashboard.apply(AppEvent::Error("fetch failed".to_string()));
        assert!(!dashboard.state.builds.is_loading());
        assert_eq!(dashboard.state.toasts[0].level, ToastLevel::Error);
    }
}

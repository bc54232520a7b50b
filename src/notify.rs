use crate::app::{Build, BuildStatus, ToastLevel};
use crate::view;
use crate::vrt::service::Notifier;
use notify_rust::{Notification, Urgency};

/// Desktop adapter for the toast stream.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, message: &str, level: ToastLevel) {
        let (summary, icon, urgency) = match level {
            ToastLevel::Success => ("VRT", "dialog-information", Urgency::Normal),
            ToastLevel::Error => ("VRT Error", "dialog-error", Urgency::Critical),
        };
        let _ = Notification::new()
            .summary(summary)
            .body(message)
            .icon(icon)
            .urgency(urgency)
            .show();
    }
}

/// Raises a desktop notification for a build that left `Running` on refresh.
pub fn send_build_finished(build: &Build) {
    let (summary, icon, urgency) = match build.status {
        BuildStatus::Passed => ("Build Passed", "dialog-information", Urgency::Normal),
        BuildStatus::Failed => ("Build Failed", "dialog-error", Urgency::Critical),
        _ => ("Build Finished", "dialog-information", Urgency::Normal),
    };

    let _ = Notification::new()
        .summary(summary)
        .body(&view::build_title(build))
        .icon(icon)
        .urgency(urgency)
        .show();
}

use crate::app::{AppState, Build, BuildStatus, ToastLevel};
use crate::view;

/// Maximum number of refreshes a build can be absent before being evicted
/// from the snapshot. Builds scrolled out of the page limit would otherwise
/// raise stale notifications when they reappear.
const SNAPSHOT_EVICTION_REFRESHES: u64 = 10;

/// Compares incoming builds against the retained status snapshot, pushing a
/// toast per status transition. Returns the builds that left `Running` this
/// refresh, for the desktop-notification adapter.
pub fn detect_changes(state: &mut AppState, incoming: &[Build]) -> Vec<Build> {
    state.refresh_count += 1;
    let current_refresh = state.refresh_count;
    let mut finished = Vec::new();

    for build in incoming {
        if let Some(&(old_status, _)) = state.status_snapshot.get(&build.id) {
            if old_status != build.status {
                let n = view::build_number_or_id(build);
                let (msg, level) = match build.status {
                    BuildStatus::Passed => (format!("Build #{n} passed"), ToastLevel::Success),
                    BuildStatus::Failed => (format!("Build #{n} failed"), ToastLevel::Error),
                    BuildStatus::Unresolved => {
                        (format!("Build #{n} finished (unresolved)"), ToastLevel::Success)
                    }
                    BuildStatus::Running => (format!("Build #{n} started"), ToastLevel::Success),
                    status => (
                        format!("Build #{n} changed to {}", view::status_label(status)),
                        ToastLevel::Success,
                    ),
                };
                state.push_toast(msg, level);

                if old_status == BuildStatus::Running && build.status != BuildStatus::Running {
                    finished.push(build.clone());
                }
            }
        }
    }

    // Merge new builds into the existing snapshot (instead of replacing)
    for build in incoming {
        state
            .status_snapshot
            .insert(build.id.clone(), (build.status, current_refresh));
    }

    // Evict entries not seen in the last SNAPSHOT_EVICTION_REFRESHES refreshes
    state.status_snapshot.retain(|_, (_, last_seen)| {
        current_refresh.saturating_sub(*last_seen) <= SNAPSHOT_EVICTION_REFRESHES
    });

    finished
}

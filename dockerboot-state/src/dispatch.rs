use tracing::instrument;

use crate::reconcile::{Action, Report, reconcile};
use crate::runtime::Runtime;

use super::models::Services;

/// User commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start all services and process configuration updates
    Start,
    /// Stop all services
    Stop,
    /// Stop all services, then start them again processing configuration updates
    Restart,
}

/// Run `command` against the engine, returning one report per reconciliation pass.
///
/// A restart always runs the start pass, even if some services failed to stop.
#[instrument(skip_all, fields(command = ?command))]
pub async fn dispatch<R: Runtime>(
    command: Command,
    desired: &Services,
    observed: &Services,
    runtime: &R,
) -> Vec<Report> {
    let actions: &[Action] = match command {
        Command::Start => &[Action::EnsureRunning],
        Command::Stop => &[Action::StopOnly],
        Command::Restart => &[Action::StopOnly, Action::EnsureRunning],
    };

    let mut reports = Vec::with_capacity(actions.len());
    for action in actions {
        reports.push(reconcile(*action, desired, observed, runtime).await);
    }
    reports
}

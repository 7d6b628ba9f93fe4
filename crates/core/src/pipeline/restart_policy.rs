//! Supervisor reactions to tracker exits and training results.

use crate::shared::constants::{EXIT_RETRAIN, EXIT_STOPPED};

use super::train_model_use_case::{TrainingError, TrainingOutcome};

/// What the supervisor does next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SupervisorAction {
    /// Retrain the recognition model, then decide again.
    Train,
    /// Start the tracker again after the restart delay.
    Restart,
    /// Stop the restart loop cleanly.
    Stop,
    /// Stop the restart loop and report failure.
    Fail(String),
}

/// Reaction to a finished tracker process.
///
/// `None` means the child ended without an exit code (killed by a signal).
pub fn next_action(exit_code: Option<i32>) -> SupervisorAction {
    match exit_code {
        Some(EXIT_RETRAIN) => SupervisorAction::Train,
        Some(EXIT_STOPPED) => SupervisorAction::Stop,
        Some(code) => SupervisorAction::Fail(format!("tracker exited with status {code}")),
        None => SupervisorAction::Fail("tracker was terminated by a signal".into()),
    }
}

/// Reaction to a training run.
///
/// An empty corpus is recoverable; any training error stops the loop since
/// retrying the same corpus would fail the same way.
pub fn after_training(result: &Result<TrainingOutcome, TrainingError>) -> SupervisorAction {
    match result {
        Ok(TrainingOutcome::Trained { .. }) => SupervisorAction::Restart,
        Ok(TrainingOutcome::NoSamples) => {
            log::warn!("Training found no samples, restarting with the previous model");
            SupervisorAction::Restart
        }
        Err(e) => SupervisorAction::Fail(format!("training failed: {e}")),
    }
}

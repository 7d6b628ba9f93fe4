use std::thread;
use std::time::Duration;

use crate::shared::constants::{EXIT_FAILURE, EXIT_STOPPED};

use super::restart_policy::{after_training, next_action, SupervisorAction};
use super::train_model_use_case::{TrainModelUseCase, TrainingError, TrainingOutcome};

/// Runs the tracker to completion once.
pub trait ChildRunner: Send {
    /// Returns the child's exit code, or `None` if it was killed by a signal.
    fn run(&mut self) -> Result<Option<i32>, Box<dyn std::error::Error>>;
}

/// Rebuilds the recognition model between tracker runs.
pub trait Trainer: Send {
    fn train(&mut self) -> Result<TrainingOutcome, TrainingError>;
}

impl Trainer for TrainModelUseCase {
    fn train(&mut self) -> Result<TrainingOutcome, TrainingError> {
        self.execute()
    }
}

/// How the supervisor's restart loop ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SupervisorOutcome {
    /// The tracker stopped on request after `runs` runs.
    Stopped { runs: usize },
    Failed { runs: usize, reason: String },
}

impl SupervisorOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            SupervisorOutcome::Stopped { .. } => EXIT_STOPPED,
            SupervisorOutcome::Failed { .. } => EXIT_FAILURE,
        }
    }
}

/// Keeps the tracker running, retraining whenever it enrolls a face.
pub struct SuperviseUseCase {
    runner: Box<dyn ChildRunner>,
    trainer: Box<dyn Trainer>,
    restart_delay: Duration,
}

impl SuperviseUseCase {
    pub fn new(
        runner: Box<dyn ChildRunner>,
        trainer: Box<dyn Trainer>,
        restart_delay: Duration,
    ) -> Self {
        Self {
            runner,
            trainer,
            restart_delay,
        }
    }

    /// Loops until the tracker stops on request or something fails.
    ///
    /// Only a failure to spawn the tracker is returned as `Err`.
    pub fn execute(&mut self) -> Result<SupervisorOutcome, Box<dyn std::error::Error>> {
        let mut runs = 0;
        loop {
            runs += 1;
            log::info!("Starting tracker (run {runs})");
            let exit_code = self.runner.run()?;

            let action = match next_action(exit_code) {
                SupervisorAction::Train => {
                    log::info!("Tracker enrolled a face, retraining");
                    after_training(&self.trainer.train())
                }
                other => other,
            };

            match action {
                // after_training never asks to train again
                SupervisorAction::Restart | SupervisorAction::Train => {
                    log::info!("Restarting tracker in {:?}", self.restart_delay);
                    thread::sleep(self.restart_delay);
                }
                SupervisorAction::Stop => {
                    log::info!("Tracker stopped by user, supervisor finished");
                    return Ok(SupervisorOutcome::Stopped { runs });
                }
                SupervisorAction::Fail(reason) => {
                    log::error!("Supervisor stopping: {reason}");
                    return Ok(SupervisorOutcome::Failed { runs, reason });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::identity_catalog::CatalogError;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    // ── Stubs ──────────────────────────────────────────────────────────

    struct ScriptedRunner {
        exits: VecDeque<Option<i32>>,
    }

    impl ChildRunner for ScriptedRunner {
        fn run(&mut self) -> Result<Option<i32>, Box<dyn std::error::Error>> {
            self.exits.pop_front().ok_or_else(|| "script exhausted".into())
        }
    }

    struct ScriptedTrainer {
        results: VecDeque<Result<TrainingOutcome, TrainingError>>,
        calls: Arc<Mutex<usize>>,
    }

    impl Trainer for ScriptedTrainer {
        fn train(&mut self) -> Result<TrainingOutcome, TrainingError> {
            *self.calls.lock().unwrap() += 1;
            self.results
                .pop_front()
                .unwrap_or(Ok(TrainingOutcome::NoSamples))
        }
    }

    fn trained() -> Result<TrainingOutcome, TrainingError> {
        Ok(TrainingOutcome::Trained {
            samples: 1,
            identities: 1,
        })
    }

    fn supervise(
        exits: Vec<Option<i32>>,
        results: Vec<Result<TrainingOutcome, TrainingError>>,
    ) -> (Result<SupervisorOutcome, Box<dyn std::error::Error>>, usize) {
        let calls = Arc::new(Mutex::new(0));
        let mut use_case = SuperviseUseCase::new(
            Box::new(ScriptedRunner {
                exits: exits.into(),
            }),
            Box::new(ScriptedTrainer {
                results: results.into(),
                calls: calls.clone(),
            }),
            Duration::ZERO,
        );
        let outcome = use_case.execute();
        let calls = *calls.lock().unwrap();
        (outcome, calls)
    }

    // ── Tests ──────────────────────────────────────────────────────────

    #[test]
    fn test_user_stop_ends_without_training() {
        let (outcome, trainings) = supervise(vec![Some(0)], vec![]);
        let outcome = outcome.unwrap();
        assert_eq!(outcome, SupervisorOutcome::Stopped { runs: 1 });
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(trainings, 0);
    }

    #[test]
    fn test_retrain_then_restart_until_stop() {
        let (outcome, trainings) =
            supervise(vec![Some(10), Some(10), Some(0)], vec![trained(), trained()]);
        assert_eq!(outcome.unwrap(), SupervisorOutcome::Stopped { runs: 3 });
        assert_eq!(trainings, 2);
    }

    #[test]
    fn test_no_samples_restarts() {
        let (outcome, trainings) = supervise(
            vec![Some(10), Some(0)],
            vec![Ok(TrainingOutcome::NoSamples)],
        );
        assert_eq!(outcome.unwrap(), SupervisorOutcome::Stopped { runs: 2 });
        assert_eq!(trainings, 1);
    }

    #[test]
    fn test_training_error_stops_with_failure() {
        let error = TrainingError::Catalog(CatalogError::MissingRoot(PathBuf::from("faces")));
        let (outcome, _) = supervise(vec![Some(10), Some(0)], vec![Err(error)]);
        let outcome = outcome.unwrap();
        assert!(matches!(outcome, SupervisorOutcome::Failed { runs: 1, .. }));
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn test_crash_stops_with_failure() {
        let (outcome, trainings) = supervise(vec![Some(1)], vec![]);
        let SupervisorOutcome::Failed { reason, .. } = outcome.unwrap() else {
            panic!("expected failure");
        };
        assert!(reason.contains("status 1"));
        assert_eq!(trainings, 0);
    }

    #[test]
    fn test_spawn_error_propagates() {
        let (outcome, _) = supervise(vec![], vec![]);
        assert!(outcome.is_err());
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// The stages of a launch, in the order a successful run visits them.
///
/// CHECK_RUNTIME → CHECK_DEPS → START_SERVER → AWAIT_READY → OPEN_BROWSER →
/// STREAM_OUTPUT → SHUTDOWN
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    CheckRuntime,
    CheckDeps,
    StartServer,
    AwaitReady,
    OpenBrowser,
    StreamOutput,
    Shutdown,
}

impl Stage {
    /// The stage a success leads to. `Shutdown` has none.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::CheckRuntime => Some(Stage::CheckDeps),
            Stage::CheckDeps => Some(Stage::StartServer),
            Stage::StartServer => Some(Stage::AwaitReady),
            Stage::AwaitReady => Some(Stage::OpenBrowser),
            Stage::OpenBrowser => Some(Stage::StreamOutput),
            Stage::StreamOutput => Some(Stage::Shutdown),
            Stage::Shutdown => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::CheckRuntime => write!(f, "CHECK_RUNTIME"),
            Stage::CheckDeps => write!(f, "CHECK_DEPS"),
            Stage::StartServer => write!(f, "START_SERVER"),
            Stage::AwaitReady => write!(f, "AWAIT_READY"),
            Stage::OpenBrowser => write!(f, "OPEN_BROWSER"),
            Stage::StreamOutput => write!(f, "STREAM_OUTPUT"),
            Stage::Shutdown => write!(f, "SHUTDOWN"),
        }
    }
}

/// Result of running one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Success,
    Failure,
}

/// The result of evaluating a stage outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Advance to the next stage.
    Next(Stage),
    /// A child exists, so the run unwinds to `Shutdown`.
    Cleanup,
    /// The run ends without a child to clean up.
    Abort,
    /// `Shutdown` finished; the run is over.
    Complete,
}

/// Tracks where a launch is and where it has been.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    stage: Stage,
    history: Vec<Stage>,
    child_spawned: bool,
    finished: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            stage: Stage::CheckRuntime,
            history: Vec::new(),
            child_spawned: false,
            finished: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Every stage that has been completed, failed or interrupted, in order.
    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    pub fn child_spawned(&self) -> bool {
        self.child_spawned
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Records that a server process now exists and must be shut down.
    pub fn mark_child_spawned(&mut self) {
        self.child_spawned = true;
    }

    /// Computes and applies the transition for the current stage's outcome.
    ///
    /// - Success moves to the next stage; success in `Shutdown` completes.
    /// - Failure before a child exists aborts; after, it routes to `Shutdown`.
    /// - A finished lifecycle stays finished.
    pub fn advance(&mut self, outcome: StageOutcome) -> Transition {
        if self.finished {
            return if self.child_spawned {
                Transition::Complete
            } else {
                Transition::Abort
            };
        }

        self.history.push(self.stage);
        let transition = match (self.stage, outcome) {
            (Stage::Shutdown, _) => Transition::Complete,
            (stage, StageOutcome::Success) => match stage.next() {
                Some(next) => Transition::Next(next),
                None => Transition::Complete,
            },
            (_, StageOutcome::Failure) => self.unwind(),
        };

        self.apply(transition);
        tracing::debug!(stage = %self.stage, ?transition, "lifecycle transition");
        transition
    }

    /// Handles a user interrupt in the current stage.
    pub fn interrupt(&mut self) -> Transition {
        if self.finished {
            return Transition::Abort;
        }
        if self.stage == Stage::Shutdown {
            // Already cleaning up; let shutdown finish.
            return Transition::Cleanup;
        }
        self.history.push(self.stage);
        let transition = self.unwind();
        self.apply(transition);
        tracing::debug!(stage = %self.stage, ?transition, "lifecycle interrupted");
        transition
    }

    fn unwind(&self) -> Transition {
        if self.child_spawned {
            Transition::Cleanup
        } else {
            Transition::Abort
        }
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Next(next) => self.stage = next,
            Transition::Cleanup => self.stage = Stage::Shutdown,
            Transition::Abort | Transition::Complete => self.finished = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_to(lifecycle: &mut Lifecycle, target: Stage) {
        while lifecycle.stage() != target {
            if lifecycle.stage() == Stage::StartServer {
                lifecycle.mark_child_spawned();
            }
            lifecycle.advance(StageOutcome::Success);
        }
    }

    #[test]
    fn happy_path_walks_all_stages() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.stage(), Stage::CheckRuntime);

        assert_eq!(lc.advance(StageOutcome::Success), Transition::Next(Stage::CheckDeps));
        assert_eq!(lc.advance(StageOutcome::Success), Transition::Next(Stage::StartServer));
        lc.mark_child_spawned();
        assert_eq!(lc.advance(StageOutcome::Success), Transition::Next(Stage::AwaitReady));
        assert_eq!(lc.advance(StageOutcome::Success), Transition::Next(Stage::OpenBrowser));
        assert_eq!(lc.advance(StageOutcome::Success), Transition::Next(Stage::StreamOutput));
        assert_eq!(lc.advance(StageOutcome::Success), Transition::Next(Stage::Shutdown));
        assert_eq!(lc.advance(StageOutcome::Success), Transition::Complete);
        assert!(lc.is_finished());

        assert_eq!(
            lc.history(),
            &[
                Stage::CheckRuntime,
                Stage::CheckDeps,
                Stage::StartServer,
                Stage::AwaitReady,
                Stage::OpenBrowser,
                Stage::StreamOutput,
                Stage::Shutdown,
            ]
        );
    }

    #[test]
    fn failure_before_child_aborts() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.advance(StageOutcome::Failure), Transition::Abort);
        assert!(lc.is_finished());
        assert!(!lc.child_spawned());
        assert_eq!(lc.history(), &[Stage::CheckRuntime]);
    }

    #[test]
    fn failure_after_child_routes_to_shutdown() {
        let mut lc = Lifecycle::new();
        walk_to(&mut lc, Stage::AwaitReady);

        assert_eq!(lc.advance(StageOutcome::Failure), Transition::Cleanup);
        assert_eq!(lc.stage(), Stage::Shutdown);
        assert!(!lc.is_finished());

        assert_eq!(lc.advance(StageOutcome::Success), Transition::Complete);
        assert_eq!(lc.history().last(), Some(&Stage::Shutdown));
        assert!(!lc.history().contains(&Stage::OpenBrowser));
    }

    #[test]
    fn startup_crash_skips_readiness() {
        let mut lc = Lifecycle::new();
        walk_to(&mut lc, Stage::StartServer);
        lc.mark_child_spawned();

        assert_eq!(lc.advance(StageOutcome::Failure), Transition::Cleanup);
        lc.advance(StageOutcome::Success);
        assert!(!lc.history().contains(&Stage::AwaitReady));
    }

    #[test]
    fn interrupt_without_child_aborts() {
        let mut lc = Lifecycle::new();
        lc.advance(StageOutcome::Success);
        assert_eq!(lc.interrupt(), Transition::Abort);
        assert_eq!(lc.history(), &[Stage::CheckRuntime, Stage::CheckDeps]);
    }

    #[test]
    fn interrupt_while_streaming_unwinds_to_shutdown() {
        let mut lc = Lifecycle::new();
        walk_to(&mut lc, Stage::StreamOutput);

        assert_eq!(lc.interrupt(), Transition::Cleanup);
        assert_eq!(lc.stage(), Stage::Shutdown);
        // A second Ctrl-C during shutdown changes nothing.
        assert_eq!(lc.interrupt(), Transition::Cleanup);
        assert_eq!(lc.advance(StageOutcome::Success), Transition::Complete);
    }

    #[test]
    fn finished_lifecycle_is_inert() {
        let mut lc = Lifecycle::new();
        lc.advance(StageOutcome::Failure);
        let len = lc.history().len();
        assert_eq!(lc.advance(StageOutcome::Success), Transition::Abort);
        assert_eq!(lc.history().len(), len);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::CheckRuntime.to_string(), "CHECK_RUNTIME");
        assert_eq!(Stage::CheckDeps.to_string(), "CHECK_DEPS");
        assert_eq!(Stage::StartServer.to_string(), "START_SERVER");
        assert_eq!(Stage::AwaitReady.to_string(), "AWAIT_READY");
        assert_eq!(Stage::OpenBrowser.to_string(), "OPEN_BROWSER");
        assert_eq!(Stage::StreamOutput.to_string(), "STREAM_OUTPUT");
        assert_eq!(Stage::Shutdown.to_string(), "SHUTDOWN");
    }
}

//! Pipeline executor.
//!
//! Runs an assembled step sequence through its phases breadth-first: every
//! step's setup in construction order, then every execute, then every
//! teardown. Later steps' setup may depend on outputs published by an
//! earlier step's setup, but no execute starts before the whole chain's
//! preconditions have been validated.
//!
//! The first failure in any phase is fatal to the operation: remaining
//! steps in that phase are skipped and the failure is reported unchanged.
//! Teardown is still invoked for every step whose setup succeeded, in
//! construction order, so resources acquired before the failure are
//! released; a teardown failure during that cleanup is logged and does not
//! displace the original failure.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::bus::ParameterBus;
use crate::error::Error;
use crate::workflow::{OperationContext, Phase, WorkflowStep};

/// Executor state, advanced by [`Pipeline::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    SettingUp,
    Executing,
    TearingDown,
    Completed,
    Failed,
}

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    pub state: PipelineState,
    pub elapsed: Duration,
    /// The first failure observed, if any.
    pub failure: Option<Error>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Completed
    }

    /// Wall-clock elapsed time as `HH:MM:SS`, for the completion log line.
    pub fn elapsed_display(&self) -> String {
        let total = self.elapsed.as_secs();
        format!(
            "{:02}:{:02}:{:02}",
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    }
}

/// Owns a step sequence for exactly one run.
///
/// The steps and both buses are released on every exit path by ordinary
/// ownership; there is no separate cleanup routine to keep in sync across
/// success and error branches.
pub struct Pipeline {
    steps: Vec<Box<dyn WorkflowStep>>,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(steps: Vec<Box<dyn WorkflowStep>>) -> Self {
        Self {
            steps,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run all phases over the step sequence. Consumes the sequence's
    /// usefulness: a pipeline is run exactly once per operation.
    pub fn run(
        &mut self,
        ctx: &OperationContext,
        input: &ParameterBus,
        output: &mut ParameterBus,
    ) -> PipelineReport {
        let started = Instant::now();
        let mut failure: Option<Error> = None;

        // Number of steps whose setup completed; only those are torn down.
        let mut ready = 0;

        self.state = PipelineState::SettingUp;
        for step in self.steps.iter_mut() {
            debug!("{} ({}): {}", step.kind(), Phase::Setup, ctx.label);
            match step.setup(ctx, input, output) {
                Ok(()) => ready += 1,
                Err(e) => {
                    failure = Some(Error::stage(Phase::Setup, step.kind(), e));
                    break;
                }
            }
        }

        if failure.is_none() {
            self.state = PipelineState::Executing;
            for step in self.steps.iter_mut() {
                debug!("{} ({}): {}", step.kind(), Phase::Execute, ctx.label);
                if let Err(e) = step.execute(ctx, input, output) {
                    failure = Some(Error::stage(Phase::Execute, step.kind(), e));
                    break;
                }
            }
        }

        self.state = PipelineState::TearingDown;
        for step in self.steps.iter_mut().take(ready) {
            debug!("{} ({}): {}", step.kind(), Phase::Teardown, ctx.label);
            if let Err(e) = step.teardown(ctx, input, output) {
                let e = Error::stage(Phase::Teardown, step.kind(), e);
                if failure.is_none() {
                    failure = Some(e);
                } else {
                    // Cleanup after an earlier failure is best-effort.
                    warn!("teardown failure during cleanup: {e}");
                }
            }
        }

        self.state = if failure.is_none() {
            PipelineState::Completed
        } else {
            PipelineState::Failed
        };

        PipelineReport {
            state: self.state,
            elapsed: started.elapsed(),
            failure,
        }
    }
}

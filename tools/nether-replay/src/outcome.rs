//! Command outcomes and process exit codes

use std::process::ExitCode;

use nethercore_replay::ReportStatus;

/// Result of one command over one or more scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every assertion passed (exit 0)
    Passed,
    /// At least one assertion failed or the run aborted (exit 1)
    Failed,
    /// A script could not be parsed or validated (exit 2)
    InvalidScript,
    /// The wall-clock timeout fired (exit 3)
    TimedOut,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Passed => 0,
            Outcome::Failed => 1,
            Outcome::InvalidScript => 2,
            Outcome::TimedOut => 3,
        }
    }

    /// Batch priority: invalid script, then timeout, then failure
    fn severity(self) -> u8 {
        match self {
            Outcome::Passed => 0,
            Outcome::Failed => 1,
            Outcome::TimedOut => 2,
            Outcome::InvalidScript => 3,
        }
    }

    /// The more severe of two outcomes
    pub fn combine(self, other: Outcome) -> Outcome {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

impl From<ReportStatus> for Outcome {
    fn from(status: ReportStatus) -> Self {
        match status {
            ReportStatus::Passed => Outcome::Passed,
            ReportStatus::Failed => Outcome::Failed,
            ReportStatus::Timeout => Outcome::TimedOut,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome.exit_code())
    }
}

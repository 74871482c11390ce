//! Change phase definition
//!
//! The next phase is a function of the current phase and the outcome of
//! the step that just ran.

use super::events::StepOutcome;
use crate::traits::MotionError;

/// Phases of a tool change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChangePhase {
    /// Check preconditions (pending tool, homing)
    Validate,
    /// Stop spindle and coolant, capture program position
    RecordState,
    /// Open the magazine dust cover
    OpenCover,
    /// Return the current tool to its pocket
    Unload,
    /// Pick up the requested tool
    Load,
    /// Measure tool length on the tool setter
    Measure,
    /// Close the magazine dust cover
    CloseCover,
    /// Return to the program position and modal state
    Restore,
    /// Change finished
    Done,
    /// Change failed; machine left where the failing step stopped it
    Error(ErrorKind),
}

/// Why a tool change failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// No tool has been selected
    NoPendingTool,
    /// X, Y and Z must be homed first
    HomingRequired,
    /// The planner refused a move
    MotionRejected,
    /// The machine was halted or reset during the change
    Aborted,
    /// The tool setter was not touched within the configured travel
    ProbeNotFound,
}

impl ErrorKind {
    /// Operator message for this failure
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::NoPendingTool => "Tool change failed: no tool selected",
            ErrorKind::HomingRequired => "Tool change failed: homing required",
            ErrorKind::MotionRejected => "Tool change failed: motion rejected",
            ErrorKind::Aborted => "Tool change aborted: check machine state",
            ErrorKind::ProbeNotFound => "Tool setter not found: tool length not measured",
        }
    }

    /// Check if the failure happened before any motion
    pub fn is_precondition(&self) -> bool {
        matches!(self, ErrorKind::NoPendingTool | ErrorKind::HomingRequired)
    }
}

impl From<MotionError> for ErrorKind {
    fn from(e: MotionError) -> Self {
        match e {
            MotionError::Rejected => ErrorKind::MotionRejected,
            MotionError::Aborted => ErrorKind::Aborted,
        }
    }
}

impl ChangePhase {
    /// First phase of every change
    pub const START: Self = ChangePhase::Validate;

    /// Check if the change has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChangePhase::Done | ChangePhase::Error(_))
    }

    /// Linear successor
    pub fn next(self) -> Self {
        use ChangePhase::*;

        match self {
            Validate => RecordState,
            RecordState => OpenCover,
            OpenCover => Unload,
            Unload => Load,
            Load => Measure,
            Measure => CloseCover,
            CloseCover => Restore,
            Restore => Done,
            Done => Done,
            Error(kind) => Error(kind),
        }
    }

    /// Process a step outcome and return the next phase
    ///
    /// A pause has already been resolved by the time its outcome arrives
    /// here, so it advances like `Continue`.
    pub fn transition(self, outcome: StepOutcome) -> Self {
        if self.is_terminal() {
            return self;
        }

        match outcome {
            StepOutcome::Continue | StepOutcome::Pause(_) => self.next(),
            StepOutcome::Finish => ChangePhase::Done,
            StepOutcome::Fail(kind) => ChangePhase::Error(kind),
        }
    }
}

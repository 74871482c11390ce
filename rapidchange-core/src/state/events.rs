//! Step outcomes that drive phase transitions

use super::machine::ErrorKind;

/// Why the change is waiting for the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PauseReason {
    /// Current tool has no pocket; operator removes it
    ManualUnload,
    /// Tool still detected after the unload retry
    ToolStillPresent,
    /// Requested tool has no pocket; operator installs it
    ManualLoad,
    /// No tool detected after loading
    ToolNotDetected,
    /// Tool detected too high up: nut cross-threaded or not seated
    ToolNotSeated,
}

impl PauseReason {
    /// Operator message for this pause
    pub fn message(&self) -> &'static str {
        match self {
            PauseReason::ManualUnload => {
                "Manual tool change: remove the tool from the spindle, then resume"
            }
            PauseReason::ToolStillPresent => {
                "Tool still in spindle after unload: remove it by hand, then resume"
            }
            PauseReason::ManualLoad => {
                "Manual tool change: install the requested tool, then resume"
            }
            PauseReason::ToolNotDetected => {
                "Tool not detected after load: install it by hand, then resume"
            }
            PauseReason::ToolNotSeated => {
                "Tool not seated: check the clamping nut, then resume"
            }
        }
    }
}

/// Result of running one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    /// Phase completed; go on to the next one
    Continue,
    /// Nothing left to do (e.g. requested tool already loaded)
    Finish,
    /// Phase stopped for manual intervention
    Pause(PauseReason),
    /// Phase failed
    Fail(ErrorKind),
}

impl From<Result<(), ErrorKind>> for StepOutcome {
    fn from(result: Result<(), ErrorKind>) -> Self {
        match result {
            Ok(()) => StepOutcome::Continue,
            Err(kind) => StepOutcome::Fail(kind),
        }
    }
}

impl From<Result<Option<PauseReason>, ErrorKind>> for StepOutcome {
    fn from(result: Result<Option<PauseReason>, ErrorKind>) -> Self {
        match result {
            Ok(None) => StepOutcome::Continue,
            Ok(Some(reason)) => StepOutcome::Pause(reason),
            Err(kind) => StepOutcome::Fail(kind),
        }
    }
}

//! Tool-change state machine
//!
//! A change runs through a fixed, linear sequence of phases. Any phase
//! may fail into the absorbing error state; nothing ever moves backwards.

pub mod events;
pub mod machine;

pub use events::{PauseReason, StepOutcome};
pub use machine::{ChangePhase, ErrorKind};

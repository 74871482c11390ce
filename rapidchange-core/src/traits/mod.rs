//! Collaborator traits
//!
//! These traits define the interface between the tool-change sequencer
//! and the host motion controller. The host implements them; the
//! sequencer never reaches past them.

pub mod host;
pub mod motion;
pub mod spindle;

pub use host::{FeedHold, HostReporter, Report, ResetHandler, TloCommand, ToolOffsets};
pub use motion::{FeedMode, MotionError, MotionQueue, Probe, ProbeResult};
pub use rapidchange_hal::DigitalPorts;
pub use spindle::{CoolantDriver, CoolantState, Direction, SpindleCommand, SpindleDriver};

/// Everything the tool changer needs from the host machine
///
/// Blanket-implemented for any type providing all collaborator traits,
/// so hosts implement the pieces and get `Machine` for free.
pub trait Machine:
    MotionQueue
    + Probe
    + SpindleDriver
    + CoolantDriver
    + DigitalPorts
    + ToolOffsets
    + HostReporter
    + FeedHold
{
}

impl<T> Machine for T where
    T: MotionQueue
        + Probe
        + SpindleDriver
        + CoolantDriver
        + DigitalPorts
        + ToolOffsets
        + HostReporter
        + FeedHold
{
}

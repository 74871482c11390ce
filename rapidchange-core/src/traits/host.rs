//! Host integration traits
//!
//! Tool-length offsets, operator-visible reports, the cooperative feed
//! hold used for manual intervention, and the reset handler chain.

use crate::state::PauseReason;
use crate::tool::ToolId;

/// Tool-length offset command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TloCommand {
    /// Remove any active tool-length offset
    Cancel,
    /// Apply a measured Z offset to the active tool
    Dynamic(f32),
}

/// Host tool-length offset state
pub trait ToolOffsets {
    /// Active Z tool-length offset (0 when cancelled)
    fn tool_length_offset(&self) -> f32;

    /// Change the active tool-length offset
    fn set_tool_length_offset(&mut self, command: TloCommand);
}

/// Operator-visible report
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report<'a> {
    /// Informational line (plugin banner)
    Message(&'a str),
    /// Something needs the operator's attention
    Warning(&'a str),
    /// First successful probe after power-up latched the reference height
    TloReferenceEstablished(f32),
    /// The reference height was discarded
    TloReferenceCleared,
    /// A measured tool-length offset was applied
    ToolLengthOffset(f32),
    /// A tool change completed
    ToolChanged(ToolId),
}

/// Host console / realtime report sink
pub trait HostReporter {
    fn report(&mut self, report: Report<'_>);
}

/// Host feed-hold control
pub trait FeedHold {
    /// Enter feed hold so the operator can intervene
    ///
    /// The host keeps the machine held until the operator resumes, then
    /// releases the tool changer's manual hold (see
    /// [`ManualHold`](crate::atc::ManualHold)).
    fn request_feed_hold(&mut self, reason: PauseReason);
}

/// Participant in the host's reset chain
///
/// Called from the stop/reset path, which may preempt a running tool
/// change at any suspension point.
pub trait ResetHandler {
    fn reset(&self);
}

/// End of the chain
impl ResetHandler for () {
    fn reset(&self) {}
}

impl<R: ResetHandler + ?Sized> ResetHandler for &R {
    fn reset(&self) {
        (**self).reset();
    }
}

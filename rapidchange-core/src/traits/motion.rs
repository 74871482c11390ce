//! Motion queue and probe traits
//!
//! Moves are enqueued to the host planner and execute in the background.
//! `synchronize` is the barrier that waits for the queue to drain.

use crate::motion::{AxisMask, Position};

/// How a line is executed
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FeedMode {
    /// Rapid traverse at the machine's rapid rate
    Rapid,
    /// Controlled feed (mm/min)
    Feed(f32),
}

/// Errors reported by the motion queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// The planner refused the line (typically already halted)
    Rejected,
    /// An abort or stop happened while waiting for motion to finish
    Aborted,
}

/// Result of a probe cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeResult {
    /// Contact made; machine position at the trigger point
    Found(Position),
    /// Travel exhausted without contact
    NotFound,
}

/// Host motion queue
pub trait MotionQueue {
    /// Current machine position
    fn machine_position(&self) -> Position;

    /// Queue a straight line to `target`
    ///
    /// Returns immediately once the planner has accepted the line.
    fn enqueue_line(&mut self, target: &Position, mode: FeedMode) -> Result<(), MotionError>;

    /// Wait until every queued line has executed
    ///
    /// Fails with [`MotionError::Aborted`] if the machine was halted while
    /// draining.
    fn synchronize(&mut self) -> impl core::future::Future<Output = Result<(), MotionError>>;

    /// Resynchronize the program's logical position with the machine
    fn sync_position(&mut self);

    /// Axes that have been homed since power-up
    fn homed_axes(&self) -> AxisMask;
}

/// Host probe cycle
pub trait Probe {
    /// Move toward `target` at `feed_rate` until the probe input triggers
    ///
    /// The motion stops at contact. Errors mean the cycle itself could not
    /// run; a cycle that ran out of travel is [`ProbeResult::NotFound`].
    fn probe_cycle(
        &mut self,
        target: &Position,
        feed_rate: f32,
    ) -> impl core::future::Future<Output = Result<ProbeResult, MotionError>>;
}

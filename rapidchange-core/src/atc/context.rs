//! Per-change context and move helpers
//!
//! Every helper enqueues one line and then waits for the queue to drain,
//! so spindle, probe and sensor actions that follow see the machine at
//! rest at the commanded position.

use crate::motion::Position;
use crate::state::ErrorKind;
use crate::traits::{CoolantState, FeedMode, MotionQueue, SpindleCommand};

/// State captured for the duration of one tool change
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChangeContext {
    /// Program position to return to, Z without tool-length offset
    pub previous: Position,
    /// Last commanded machine position
    pub target: Position,
    /// Modal spindle state to restore
    pub spindle: SpindleCommand,
    /// Modal coolant state to restore
    pub coolant: CoolantState,
    /// The change ran to completion
    pub completed: bool,
}

impl ChangeContext {
    /// Context starting at the given machine position
    pub fn new(position: Position) -> Self {
        Self {
            previous: position,
            target: position,
            spindle: SpindleCommand::off(),
            coolant: CoolantState::OFF,
            completed: false,
        }
    }

    /// Move to `target`, waiting for the move to finish
    pub async fn move_to<Q: MotionQueue>(
        &mut self,
        queue: &mut Q,
        target: Position,
        mode: FeedMode,
    ) -> Result<(), ErrorKind> {
        debug!(
            "Move to X{} Y{} Z{} ({})",
            target.x(),
            target.y(),
            target.z(),
            mode
        );

        self.target = target;
        queue.enqueue_line(&target, mode)?;
        queue.synchronize().await?;
        Ok(())
    }

    /// Rapid Z move at the current XY
    pub async fn rapid_to_z<Q: MotionQueue>(&mut self, queue: &mut Q, z: f32) -> Result<(), ErrorKind> {
        let target = self.target.with_z(z);
        self.move_to(queue, target, FeedMode::Rapid).await
    }

    /// Feed Z move at the current XY
    pub async fn linear_to_z<Q: MotionQueue>(
        &mut self,
        queue: &mut Q,
        z: f32,
        feed_rate: f32,
    ) -> Result<(), ErrorKind> {
        let target = self.target.with_z(z);
        self.move_to(queue, target, FeedMode::Feed(feed_rate)).await
    }

    /// Rapid XY move at the current Z
    pub async fn rapid_to_xy<Q: MotionQueue>(
        &mut self,
        queue: &mut Q,
        x: f32,
        y: f32,
    ) -> Result<(), ErrorKind> {
        let target = self.target.with_xy(x, y);
        self.move_to(queue, target, FeedMode::Rapid).await
    }
}

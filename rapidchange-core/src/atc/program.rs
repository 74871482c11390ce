//! Program state around a change
//!
//! The change starts by stopping the spindle and coolant and noting where
//! the program was; it ends by putting all of that back.

use embedded_hal_async::delay::DelayNs;

use super::context::ChangeContext;
use super::spindle::SpindleSequencer;
use crate::config::MotionConfig;
use crate::state::ErrorKind;
use crate::traits::{CoolantDriver, CoolantState, MotionQueue, SpindleCommand, SpindleDriver, ToolOffsets};

/// Stop spindle and coolant and capture the program position
///
/// The recorded Z excludes the active tool-length offset so the return
/// move can apply the offset of the new tool.
pub async fn record<H, D>(machine: &mut H, delay: &mut D, spindle: &SpindleSequencer) -> ChangeContext
where
    H: MotionQueue + SpindleDriver + CoolantDriver + ToolOffsets,
    D: DelayNs,
{
    let spindle_state = machine.spindle_state();
    let coolant_state = machine.coolant_state();

    if spindle_state.on {
        spindle.stop(machine, delay).await;
    } else {
        machine.set_spindle(SpindleCommand::off());
    }
    machine.set_coolant(CoolantState::OFF);

    let position = machine.machine_position();
    let mut ctx = ChangeContext::new(position);
    ctx.previous = position.with_z(position.z() - machine.tool_length_offset());
    ctx.spindle = spindle_state;
    ctx.coolant = coolant_state;

    debug!(
        "Recorded program position X{} Y{} Z{}",
        ctx.previous.x(),
        ctx.previous.y(),
        ctx.previous.z()
    );

    ctx
}

/// Return to the recorded position and modal state
pub async fn restore<H, D>(
    ctx: &mut ChangeContext,
    machine: &mut H,
    delay: &mut D,
    spindle: &SpindleSequencer,
    config: &MotionConfig,
) -> Result<(), ErrorKind>
where
    H: MotionQueue + SpindleDriver + CoolantDriver + ToolOffsets,
    D: DelayNs,
{
    ctx.rapid_to_z(machine, config.z_safe_clearance).await?;

    if !config.skip_return {
        let previous = ctx.previous;
        ctx.rapid_to_xy(machine, previous.x(), previous.y()).await?;
    }

    machine.sync_position();
    machine.sync_coolant(ctx.coolant);
    spindle.apply(machine, delay, ctx.spindle).await;

    if !config.skip_return {
        let z = ctx.previous.z() + machine.tool_length_offset();
        ctx.rapid_to_z(machine, z).await?;
    }

    Ok(())
}

//! Tool length measurement on the fixed tool setter
//!
//! The first successful measurement after power-up latches the reference
//! height. Every later measurement applies the difference to that
//! reference as a dynamic tool-length offset.

use super::context::ChangeContext;
use crate::config::ToolSetterConfig;
use crate::motion::Position;
use crate::state::ErrorKind;
use crate::tool::ToolId;
use crate::traits::{HostReporter, MotionQueue, Probe, ProbeResult, Report, TloCommand, ToolOffsets};

/// Distance the set probe travels past the retreat height (mm)
pub const SET_PROBE_OVERTRAVEL: f32 = 2.0;

/// Outcome of resolving a probed height against the reference
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Measurement {
    /// No reference existed; the probed height became the reference
    ReferenceEstablished(f32),
    /// Offset of the probed height from the reference
    Offset(f32),
}

/// Latched tool setter reference height
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TloReference {
    z: Option<f32>,
}

impl TloReference {
    pub const fn new() -> Self {
        Self { z: None }
    }

    pub fn get(&self) -> Option<f32> {
        self.z
    }

    pub fn is_set(&self) -> bool {
        self.z.is_some()
    }

    /// Forget the reference; returns whether one was set
    pub fn clear(&mut self) -> bool {
        self.z.take().is_some()
    }

    /// Latch `probe_z` as reference, or return its offset from the latched one
    pub fn resolve(&mut self, probe_z: f32) -> Measurement {
        match self.z {
            Some(reference) => Measurement::Offset(probe_z - reference),
            None => {
                self.z = Some(probe_z);
                Measurement::ReferenceEstablished(probe_z)
            }
        }
    }
}

/// Tool setter probe sequencer
#[derive(Debug, Clone, Copy)]
pub struct ToolSetter<'a> {
    config: &'a ToolSetterConfig,
    z_clearance: f32,
}

impl<'a> ToolSetter<'a> {
    pub fn new(config: &'a ToolSetterConfig, z_clearance: f32) -> Self {
        Self { config, z_clearance }
    }

    /// Measure `tool` and apply its length offset
    ///
    /// Without a setter, or with an empty spindle, this only retracts to
    /// clearance. A probe miss leaves the active offset untouched.
    pub async fn measure<H>(
        &self,
        machine: &mut H,
        ctx: &mut ChangeContext,
        reference: &mut TloReference,
        tool: ToolId,
    ) -> Result<(), ErrorKind>
    where
        H: MotionQueue + Probe + ToolOffsets + HostReporter,
    {
        if !self.config.enabled || tool.is_none() {
            debug!("Skipping tool measurement");
            return ctx.rapid_to_z(machine, self.z_clearance).await;
        }

        info!("Measuring tool {}", tool.0);

        ctx.rapid_to_z(machine, self.z_clearance).await?;
        ctx.rapid_to_xy(machine, self.config.x, self.config.y).await?;
        ctx.rapid_to_z(machine, self.config.z_seek_start).await?;

        // Fast seek
        let seek_end = ctx.target.with_z(self.config.z_seek_start - self.config.max_travel);
        let contact = self
            .probe(machine, ctx, seek_end, self.config.seek_feed_rate)
            .await?;

        ctx.rapid_to_z(machine, contact.z() + self.config.seek_retreat)
            .await?;

        // Slow set
        let set_end = ctx
            .target
            .with_z(ctx.target.z() - (self.config.seek_retreat + SET_PROBE_OVERTRAVEL));
        let contact = self
            .probe(machine, ctx, set_end, self.config.set_feed_rate)
            .await?;

        match reference.resolve(contact.z()) {
            Measurement::ReferenceEstablished(z) => {
                info!("Tool length reference set at {}", z);
                machine.report(Report::TloReferenceEstablished(z));
            }
            Measurement::Offset(offset) => {
                info!("Tool length offset {}", offset);
                machine.set_tool_length_offset(TloCommand::Dynamic(offset));
                machine.report(Report::ToolLengthOffset(offset));
            }
        }

        ctx.rapid_to_z(machine, self.z_clearance).await
    }

    async fn probe<H: MotionQueue + Probe>(
        &self,
        machine: &mut H,
        ctx: &mut ChangeContext,
        target: Position,
        feed_rate: f32,
    ) -> Result<Position, ErrorKind> {
        match machine.probe_cycle(&target, feed_rate).await? {
            ProbeResult::Found(contact) => {
                ctx.target = contact;
                Ok(contact)
            }
            ProbeResult::NotFound => {
                warn!("Tool setter not found");
                ctx.target = machine.machine_position();
                Err(ErrorKind::ProbeNotFound)
            }
        }
    }
}

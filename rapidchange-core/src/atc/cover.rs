//! Magazine dust cover

use embedded_hal_async::delay::DelayNs;

use super::context::ChangeContext;
use crate::config::{CoverMode, DustCoverConfig};
use crate::state::ErrorKind;
use crate::traits::{DigitalPorts, FeedMode, MotionQueue};

/// Dust cover actuator
#[derive(Debug, Clone, Copy)]
pub struct DustCover<'a> {
    config: &'a DustCoverConfig,
}

impl<'a> DustCover<'a> {
    pub fn new(config: &'a DustCoverConfig) -> Self {
        Self { config }
    }

    /// Open or close the cover
    ///
    /// Port mode waits for the cover to settle; axis mode waits for the
    /// axis move to finish.
    pub async fn set<H, D>(
        &self,
        machine: &mut H,
        delay: &mut D,
        ctx: &mut ChangeContext,
        open: bool,
    ) -> Result<(), ErrorKind>
    where
        H: MotionQueue + DigitalPorts,
        D: DelayNs,
    {
        match self.config.mode {
            CoverMode::Disabled => Ok(()),
            CoverMode::Port => {
                debug!("Dust cover {} via port {}", open, self.config.output_port);
                machine.write_output(self.config.output_port, open);
                delay.delay_ms(self.config.settle_ms).await;
                Ok(())
            }
            CoverMode::Axis => {
                let position = if open {
                    self.config.open_position
                } else {
                    self.config.closed_position
                };
                debug!("Dust cover {} via axis to {}", open, position);

                let target = machine.machine_position().with(self.config.axis, position);
                ctx.move_to(machine, target, FeedMode::Rapid).await
            }
        }
    }
}

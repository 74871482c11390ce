//! Spindle sequencing with ramp waits

use embedded_hal_async::delay::DelayNs;

use crate::config::MotionConfig;
use crate::traits::{Direction, SpindleCommand, SpindleDriver};

/// Spindle commands that wait for the drive to reach speed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpindleSequencer {
    ramp_ms: u32,
}

impl SpindleSequencer {
    pub fn new(config: &MotionConfig) -> Self {
        Self {
            ramp_ms: config.spindle_ramp_ms,
        }
    }

    /// Start the spindle and wait for it to reach `rpm`
    pub async fn spin<S: SpindleDriver, D: DelayNs>(
        &self,
        spindle: &mut S,
        delay: &mut D,
        direction: Direction,
        rpm: f32,
    ) {
        debug!("Spindle {} at {} RPM", direction, rpm);
        spindle.set_spindle(SpindleCommand::running(direction, rpm));
        delay.delay_ms(self.ramp_ms).await;
    }

    /// Stop the spindle and wait for it to spin down
    pub async fn stop<S: SpindleDriver, D: DelayNs>(&self, spindle: &mut S, delay: &mut D) {
        debug!("Spindle stop");
        spindle.set_spindle(SpindleCommand::off());
        delay.delay_ms(self.ramp_ms).await;
    }

    /// Re-apply a recorded spindle state
    ///
    /// Only waits when the spindle has to come up to speed.
    pub async fn apply<S: SpindleDriver, D: DelayNs>(
        &self,
        spindle: &mut S,
        delay: &mut D,
        command: SpindleCommand,
    ) {
        spindle.set_spindle(command);
        if command.on {
            delay.delay_ms(self.ramp_ms).await;
        }
    }
}

//! Unload and load procedures
//!
//! Tools sit in nut pockets. Unloading spins the spindle backwards while
//! plunging into the pocket so the clamping nut unscrews; loading spins it
//! forwards to screw the nut on. With tool recognition enabled, the sensor
//! is sampled at fixed heights above the pocket to confirm each step.

use embedded_hal_async::delay::DelayNs;

use super::context::ChangeContext;
use super::presence::PresenceSensor;
use super::spindle::SpindleSequencer;
use crate::config::AtcSettings;
use crate::motion::ToolSlot;
use crate::state::{ErrorKind, PauseReason};
use crate::tool::ToolRecord;
use crate::traits::{DigitalPorts, Direction, MotionQueue, SpindleDriver};

/// Result of an exchange procedure: `Some` when the operator must step in
pub type ExchangeResult = Result<Option<PauseReason>, ErrorKind>;

/// Tool exchange with the magazine
#[derive(Debug, Clone, Copy)]
pub struct Exchange<'a> {
    settings: &'a AtcSettings,
    spindle: SpindleSequencer,
}

impl<'a> Exchange<'a> {
    pub fn new(settings: &'a AtcSettings) -> Self {
        Self {
            settings,
            spindle: SpindleSequencer::new(&settings.motion),
        }
    }

    fn sensor(&self) -> PresenceSensor<'a> {
        PresenceSensor::new(&self.settings.recognition)
    }

    /// Put `tool` back in its pocket
    pub async fn unload<H, D>(
        &self,
        machine: &mut H,
        delay: &mut D,
        ctx: &mut ChangeContext,
        tool: ToolRecord,
    ) -> ExchangeResult
    where
        H: MotionQueue + SpindleDriver + DigitalPorts,
        D: DelayNs,
    {
        if tool.is_none() {
            debug!("No tool to unload");
            return Ok(None);
        }

        let pocket = match self.settings.layout.slot_for(tool.id) {
            ToolSlot::Pocket(n) => n,
            ToolSlot::Manual => {
                info!("Tool {} has no pocket, manual unload", tool.id.0);
                self.go_to_manual(machine, ctx).await?;
                return Ok(Some(PauseReason::ManualUnload));
            }
        };

        let motion = &self.settings.motion;
        let sensor = self.sensor();
        let xy = self.settings.layout.position_for(tool.id);
        info!("Unloading tool {} into pocket {}", tool.id.0, pocket);

        ctx.rapid_to_z(machine, motion.z_safe_clearance).await?;
        ctx.rapid_to_xy(machine, xy.x, xy.y).await?;
        ctx.rapid_to_z(machine, motion.z_spin_start()).await?;

        self.spindle
            .spin(machine, delay, Direction::CounterClockwise, motion.unload_rpm)
            .await;
        ctx.linear_to_z(machine, motion.z_engage, motion.engage_feed_rate)
            .await?;

        if !sensor.enabled() {
            ctx.rapid_to_z(machine, motion.z_traverse).await?;
            self.spindle.stop(machine, delay).await;
            return Ok(None);
        }

        let zone_1 = self.settings.recognition.z_zone_1;
        ctx.rapid_to_z(machine, zone_1).await?;

        if sensor.has_tool(machine) {
            // Nut did not release: plunge once more
            warn!("Tool still in spindle, retrying unload");
            ctx.linear_to_z(machine, motion.z_engage, motion.engage_feed_rate)
                .await?;
            ctx.rapid_to_z(machine, zone_1).await?;
            self.spindle.stop(machine, delay).await;

            if sensor.has_tool(machine) {
                warn!("Tool {} still in spindle after retry", tool.id.0);
                ctx.rapid_to_z(machine, motion.z_safe_clearance).await?;
                return Ok(Some(PauseReason::ToolStillPresent));
            }
        } else {
            self.spindle.stop(machine, delay).await;
        }

        ctx.rapid_to_z(machine, motion.z_traverse).await?;
        Ok(None)
    }

    /// Pick `tool` up from its pocket
    pub async fn load<H, D>(
        &self,
        machine: &mut H,
        delay: &mut D,
        ctx: &mut ChangeContext,
        tool: ToolRecord,
    ) -> ExchangeResult
    where
        H: MotionQueue + SpindleDriver + DigitalPorts,
        D: DelayNs,
    {
        if tool.is_none() {
            debug!("Empty spindle requested");
            return Ok(None);
        }

        let pocket = match self.settings.layout.slot_for(tool.id) {
            ToolSlot::Pocket(n) => n,
            ToolSlot::Manual => {
                info!("Tool {} has no pocket, manual load", tool.id.0);
                self.go_to_manual(machine, ctx).await?;
                return Ok(Some(PauseReason::ManualLoad));
            }
        };

        let motion = &self.settings.motion;
        let sensor = self.sensor();
        let xy = self.settings.layout.position_for(tool.id);
        info!("Loading tool {} from pocket {}", tool.id.0, pocket);

        // Unload leaves the spindle at traverse height over the magazine;
        // from anywhere else go up first.
        if ctx.target.z() != motion.z_traverse {
            ctx.rapid_to_z(machine, motion.z_safe_clearance).await?;
        }
        ctx.rapid_to_xy(machine, xy.x, xy.y).await?;
        ctx.rapid_to_z(machine, motion.z_spin_start()).await?;

        self.spindle
            .spin(machine, delay, Direction::Clockwise, motion.load_rpm)
            .await;

        // Seat, lift, re-seat
        ctx.linear_to_z(machine, motion.z_engage, motion.engage_feed_rate)
            .await?;
        ctx.rapid_to_z(machine, motion.z_reseat()).await?;
        ctx.linear_to_z(machine, motion.z_engage, motion.engage_feed_rate)
            .await?;

        if !sensor.enabled() {
            ctx.rapid_to_z(machine, motion.z_traverse).await?;
            self.spindle.stop(machine, delay).await;
            return Ok(None);
        }

        ctx.rapid_to_z(machine, self.settings.recognition.z_zone_1)
            .await?;
        self.spindle.stop(machine, delay).await;

        if !sensor.has_tool(machine) {
            warn!("Tool {} not detected after load", tool.id.0);
            ctx.rapid_to_z(machine, motion.z_safe_clearance).await?;
            return Ok(Some(PauseReason::ToolNotDetected));
        }

        ctx.rapid_to_z(machine, self.settings.recognition.z_zone_2)
            .await?;

        if sensor.has_tool(machine) {
            // Seen at zone 2 means the nut is sitting too low on the tool
            warn!("Tool {} not seated", tool.id.0);
            ctx.rapid_to_z(machine, motion.z_safe_clearance).await?;
            return Ok(Some(PauseReason::ToolNotSeated));
        }

        ctx.rapid_to_z(machine, motion.z_traverse).await?;
        Ok(None)
    }

    async fn go_to_manual<Q: MotionQueue>(&self, queue: &mut Q, ctx: &mut ChangeContext) -> Result<(), ErrorKind> {
        let manual = self.settings.layout.manual_position();
        ctx.rapid_to_z(queue, self.settings.motion.z_safe_clearance)
            .await?;
        ctx.rapid_to_xy(queue, manual.x, manual.y).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::Position;
    use crate::sim::{Op, SimDelay, SimMachine};
    use crate::traits::{FeedMode, MotionError, SpindleCommand};
    use embassy_futures::block_on;

    fn settings(recognition: bool) -> AtcSettings {
        let mut settings = AtcSettings::default();
        settings.layout.pocket1_x = 0.0;
        settings.layout.pocket1_y = 25.0;
        settings.layout.pocket_pitch = 45.0;
        settings.layout.manual_x = 500.0;
        settings.layout.manual_y = 10.0;
        settings.recognition.enabled = recognition;
        settings.recognition.input_port = 1;
        settings
    }

    fn unload(settings: &AtcSettings, machine: &mut SimMachine<'_>, tool: u32) -> (ExchangeResult, ChangeContext) {
        let mut delay = SimDelay::default();
        let mut ctx = ChangeContext::new(machine.position);
        let result = block_on(Exchange::new(settings).unload(machine, &mut delay, &mut ctx, ToolRecord::new(tool)));
        (result, ctx)
    }

    fn load(settings: &AtcSettings, machine: &mut SimMachine<'_>, tool: u32) -> (ExchangeResult, ChangeContext) {
        let mut delay = SimDelay::default();
        let mut ctx = ChangeContext::new(machine.position);
        let result = block_on(Exchange::new(settings).load(machine, &mut delay, &mut ctx, ToolRecord::new(tool)));
        (result, ctx)
    }

    fn engage_plunges(machine: &SimMachine<'_>) -> usize {
        machine
            .lines()
            .iter()
            .filter(|(target, mode)| target.z() == -80.0 && matches!(mode, FeedMode::Feed(_)))
            .count()
    }

    #[test]
    fn test_unload_empty_spindle_is_noop() {
        let settings = settings(false);
        let mut machine = SimMachine::new();

        let (result, _) = unload(&settings, &mut machine, 0);

        assert_eq!(result, Ok(None));
        assert!(machine.ops.is_empty());
    }

    #[test]
    fn test_unload_into_pocket() {
        let settings = settings(false);
        let mut machine = SimMachine::new();
        machine.position = Position::xyz(200.0, 200.0, -10.0);

        let (result, ctx) = unload(&settings, &mut machine, 3);

        assert_eq!(result, Ok(None));
        assert_eq!(
            machine.lines(),
            vec![
                (Position::xyz(200.0, 200.0, 0.0), FeedMode::Rapid),
                (Position::xyz(90.0, 25.0, 0.0), FeedMode::Rapid),
                (Position::xyz(90.0, 25.0, -57.0), FeedMode::Rapid),
                (Position::xyz(90.0, 25.0, -80.0), FeedMode::Feed(1800.0)),
                (Position::xyz(90.0, 25.0, -30.0), FeedMode::Rapid),
            ]
        );
        assert_eq!(
            machine.spindle_commands(),
            vec![
                SpindleCommand::running(Direction::CounterClockwise, 1200.0),
                SpindleCommand::off(),
            ]
        );
        assert_eq!(ctx.target.z(), -30.0);
    }

    #[test]
    fn test_unload_manual_tool_pauses() {
        let settings = settings(false);
        let mut machine = SimMachine::new();

        let (result, _) = unload(&settings, &mut machine, 7);

        assert_eq!(result, Ok(Some(PauseReason::ManualUnload)));
        assert_eq!(machine.lines().last(), Some(&(Position::xyz(500.0, 10.0, 0.0), FeedMode::Rapid)));
        assert!(machine.spindle_commands().is_empty());
    }

    #[test]
    fn test_unload_released_first_time() {
        let settings = settings(true);
        let mut machine = SimMachine::new();
        machine.presence.extend([false, false]);

        let (result, ctx) = unload(&settings, &mut machine, 2);

        assert_eq!(result, Ok(None));
        assert_eq!(engage_plunges(&machine), 1);
        assert_eq!(ctx.target.z(), -30.0);
    }

    #[test]
    fn test_unload_released_is_not_checked_again() {
        let settings = settings(true);
        let mut machine = SimMachine::new();
        machine.presence.extend([false, true]);

        let (result, ctx) = unload(&settings, &mut machine, 2);

        assert_eq!(result, Ok(None));
        assert_eq!(engage_plunges(&machine), 1);
        assert_eq!(ctx.target.z(), -30.0);
        // Second sample left unread
        assert_eq!(machine.presence.len(), 1);
    }

    #[test]
    fn test_unload_retries_exactly_once() {
        let settings = settings(true);
        let mut machine = SimMachine::new();
        machine.presence.extend([true, true]);

        let (result, ctx) = unload(&settings, &mut machine, 2);

        assert_eq!(result, Ok(Some(PauseReason::ToolStillPresent)));
        assert_eq!(engage_plunges(&machine), 2);
        assert_eq!(ctx.target.z(), 0.0);
    }

    #[test]
    fn test_unload_retry_succeeds() {
        let settings = settings(true);
        let mut machine = SimMachine::new();
        machine.presence.extend([true, false]);

        let (result, ctx) = unload(&settings, &mut machine, 2);

        assert_eq!(result, Ok(None));
        assert_eq!(engage_plunges(&machine), 2);
        assert_eq!(ctx.target.z(), -30.0);
        assert!(!machine.ops.iter().any(|op| matches!(op, Op::FeedHold(_))));
    }

    #[test]
    fn test_load_from_pocket() {
        let settings = settings(false);
        let mut machine = SimMachine::new();
        machine.position = Position::xyz(90.0, 25.0, -30.0);

        let mut delay = SimDelay::default();
        let mut ctx = ChangeContext::new(machine.position);
        ctx.target = Position::xyz(90.0, 25.0, -30.0);
        let result = block_on(Exchange::new(&settings).load(&mut machine, &mut delay, &mut ctx, ToolRecord::new(1)));

        assert_eq!(result, Ok(None));
        assert_eq!(
            machine.lines(),
            vec![
                (Position::xyz(0.0, 25.0, -30.0), FeedMode::Rapid),
                (Position::xyz(0.0, 25.0, -57.0), FeedMode::Rapid),
                (Position::xyz(0.0, 25.0, -80.0), FeedMode::Feed(1800.0)),
                (Position::xyz(0.0, 25.0, -73.0), FeedMode::Rapid),
                (Position::xyz(0.0, 25.0, -80.0), FeedMode::Feed(1800.0)),
                (Position::xyz(0.0, 25.0, -30.0), FeedMode::Rapid),
            ]
        );
        assert_eq!(
            machine.spindle_commands(),
            vec![SpindleCommand::running(Direction::Clockwise, 1200.0), SpindleCommand::off()]
        );
    }

    #[test]
    fn test_load_from_program_height_rises_first() {
        let settings = settings(false);
        let mut machine = SimMachine::new();
        machine.position = Position::xyz(200.0, 200.0, -10.0);

        let (result, _) = load(&settings, &mut machine, 1);

        assert_eq!(result, Ok(None));
        assert_eq!(machine.lines()[0], (Position::xyz(200.0, 200.0, 0.0), FeedMode::Rapid));
        assert_eq!(machine.lines()[1], (Position::xyz(0.0, 25.0, 0.0), FeedMode::Rapid));
    }

    #[test]
    fn test_load_tool_beyond_pockets_pauses() {
        let settings = settings(false);
        let mut machine = SimMachine::new();

        let (result, _) = load(&settings, &mut machine, 15);

        assert_eq!(result, Ok(Some(PauseReason::ManualLoad)));
        assert!(machine.spindle_commands().is_empty());
    }

    #[test]
    fn test_load_not_detected() {
        let settings = settings(true);
        let mut machine = SimMachine::new();
        machine.presence.extend([false]);

        let (result, ctx) = load(&settings, &mut machine, 1);

        assert_eq!(result, Ok(Some(PauseReason::ToolNotDetected)));
        assert_eq!(ctx.target.z(), 0.0);
        assert!(!machine.spindle.on);
    }

    #[test]
    fn test_load_not_seated() {
        let settings = settings(true);
        let mut machine = SimMachine::new();
        machine.presence.extend([true, true]);

        let (result, ctx) = load(&settings, &mut machine, 1);

        assert_eq!(result, Ok(Some(PauseReason::ToolNotSeated)));
        assert_eq!(ctx.target.z(), 0.0);
    }

    #[test]
    fn test_load_checked_at_both_zones() {
        let settings = settings(true);
        let mut machine = SimMachine::new();
        machine.presence.extend([true, false]);

        let (result, ctx) = load(&settings, &mut machine, 1);

        assert_eq!(result, Ok(None));
        assert_eq!(ctx.target.z(), -30.0);
        let zones: Vec<f32> = machine
            .lines()
            .iter()
            .map(|(target, _)| target.z())
            .filter(|z| *z == -70.0 || *z == -60.0)
            .collect();
        assert_eq!(zones, vec![-70.0, -60.0]);
    }

    #[test]
    fn test_load_abort_mid_sequence() {
        let settings = settings(false);
        let mut machine = SimMachine::new();
        machine.fail_sync_at = Some((3, MotionError::Aborted));

        let (result, _) = load(&settings, &mut machine, 1);

        assert_eq!(result, Err(ErrorKind::Aborted));
        assert!(machine.spindle_commands().is_empty());
    }
}

//! Simulated host machine for tests
//!
//! Moves complete instantly. Every call that reaches the machine is
//! appended to `ops` so tests can assert on the exact command stream.

use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::string::{String, ToString};
use std::vec::Vec;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal_async::delay::DelayNs;
use rapidchange_hal::{DigitalPorts, FlashError, FlashStorage, PortNumber, StorageKey};

use crate::atc::ManualHold;
use crate::motion::{AxisMask, Position};
use crate::state::PauseReason;
use crate::tool::ToolId;
use crate::traits::{
    CoolantDriver, CoolantState, FeedHold, FeedMode, HostReporter, MotionError, MotionQueue, Probe,
    ProbeResult, Report, ResetHandler, SpindleCommand, SpindleDriver, TloCommand, ToolOffsets,
};

pub type TestMutex = CriticalSectionRawMutex;

/// Command seen by the machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Line(Position, FeedMode),
    Synchronize,
    SyncPosition,
    Probe(Position, f32),
    Spindle(SpindleCommand),
    Coolant(CoolantState),
    SyncCoolant(CoolantState),
    Input(PortNumber),
    Output(PortNumber, bool),
    Tlo(TloCommand),
    FeedHold(PauseReason),
}

/// Owned copy of a host report
#[derive(Debug, Clone, PartialEq)]
pub enum Reported {
    Message(String),
    Warning(String),
    TloReferenceEstablished(f32),
    TloReferenceCleared,
    ToolLengthOffset(f32),
    ToolChanged(ToolId),
}

impl From<Report<'_>> for Reported {
    fn from(report: Report<'_>) -> Self {
        match report {
            Report::Message(s) => Reported::Message(s.to_string()),
            Report::Warning(s) => Reported::Warning(s.to_string()),
            Report::TloReferenceEstablished(z) => Reported::TloReferenceEstablished(z),
            Report::TloReferenceCleared => Reported::TloReferenceCleared,
            Report::ToolLengthOffset(z) => Reported::ToolLengthOffset(z),
            Report::ToolChanged(id) => Reported::ToolChanged(id),
        }
    }
}

/// What the operator does when the machine enters feed hold
#[derive(Clone, Copy, Default)]
pub enum HoldAction<'a> {
    /// No hold expected; entering one fails the test
    #[default]
    Unexpected,
    /// Press cycle start
    Release(&'a ManualHold<TestMutex>),
    /// Hit reset
    Reset(&'a dyn ResetHandler),
}

pub struct SimMachine<'a> {
    pub position: Position,
    pub homed: AxisMask,
    pub spindle: SpindleCommand,
    pub coolant: CoolantState,
    pub tlo: f32,
    pub ops: Vec<Op>,
    pub reports: Vec<Reported>,
    /// Successive tool sensor reads; empty reads as no tool
    pub presence: VecDeque<bool>,
    /// Z height of the tool setter surface, `None` when out of reach
    pub probe_surface: Option<f32>,
    pub reject_lines: bool,
    /// Fail the n-th (1-based) synchronize
    pub fail_sync_at: Option<(usize, MotionError)>,
    /// Run the reset chain during the n-th synchronize, which then aborts
    pub reset_at_sync: Option<(usize, &'a dyn ResetHandler)>,
    /// Run the reset chain when a warning is reported
    pub reset_on_warning: Option<&'a dyn ResetHandler>,
    pub on_hold: HoldAction<'a>,
    pub sync_count: usize,
}

impl<'a> SimMachine<'a> {
    /// Homed machine at the origin, everything off
    pub fn new() -> Self {
        Self {
            position: Position::ZERO,
            homed: AxisMask::XYZ,
            spindle: SpindleCommand::off(),
            coolant: CoolantState::OFF,
            tlo: 0.0,
            ops: Vec::new(),
            reports: Vec::new(),
            presence: VecDeque::new(),
            probe_surface: None,
            reject_lines: false,
            fail_sync_at: None,
            reset_at_sync: None,
            reset_on_warning: None,
            on_hold: HoldAction::Unexpected,
            sync_count: 0,
        }
    }

    pub fn lines(&self) -> Vec<(Position, FeedMode)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Line(target, mode) => Some((*target, *mode)),
                _ => None,
            })
            .collect()
    }

    pub fn probes(&self) -> Vec<(Position, f32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Probe(target, feed) => Some((*target, *feed)),
                _ => None,
            })
            .collect()
    }

    pub fn spindle_commands(&self) -> Vec<SpindleCommand> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Spindle(command) => Some(*command),
                _ => None,
            })
            .collect()
    }

    pub fn holds(&self) -> Vec<PauseReason> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::FeedHold(reason) => Some(*reason),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.reports
            .iter()
            .filter_map(|report| match report {
                Reported::Warning(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Default for SimMachine<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionQueue for SimMachine<'_> {
    fn machine_position(&self) -> Position {
        self.position
    }

    fn enqueue_line(&mut self, target: &Position, mode: FeedMode) -> Result<(), MotionError> {
        if self.reject_lines {
            return Err(MotionError::Rejected);
        }
        self.ops.push(Op::Line(*target, mode));
        self.position = *target;
        Ok(())
    }

    async fn synchronize(&mut self) -> Result<(), MotionError> {
        self.sync_count += 1;
        self.ops.push(Op::Synchronize);

        if let Some((n, handler)) = self.reset_at_sync {
            if n == self.sync_count {
                handler.reset();
                return Err(MotionError::Aborted);
            }
        }
        match self.fail_sync_at {
            Some((n, error)) if n == self.sync_count => Err(error),
            _ => Ok(()),
        }
    }

    fn sync_position(&mut self) {
        self.ops.push(Op::SyncPosition);
    }

    fn homed_axes(&self) -> AxisMask {
        self.homed
    }
}

impl Probe for SimMachine<'_> {
    async fn probe_cycle(&mut self, target: &Position, feed_rate: f32) -> Result<ProbeResult, MotionError> {
        self.ops.push(Op::Probe(*target, feed_rate));

        let start = self.position.z();
        match self.probe_surface {
            Some(surface) if target.z() <= surface && surface <= start => {
                self.position = target.with_z(surface);
                Ok(ProbeResult::Found(self.position))
            }
            _ => {
                self.position = *target;
                Ok(ProbeResult::NotFound)
            }
        }
    }
}

impl SpindleDriver for SimMachine<'_> {
    fn spindle_state(&self) -> SpindleCommand {
        self.spindle
    }

    fn set_spindle(&mut self, command: SpindleCommand) {
        self.ops.push(Op::Spindle(command));
        self.spindle = command;
    }
}

impl CoolantDriver for SimMachine<'_> {
    fn coolant_state(&self) -> CoolantState {
        self.coolant
    }

    fn set_coolant(&mut self, state: CoolantState) {
        self.ops.push(Op::Coolant(state));
        self.coolant = state;
    }

    fn sync_coolant(&mut self, state: CoolantState) {
        self.ops.push(Op::SyncCoolant(state));
        self.coolant = state;
    }
}

impl DigitalPorts for SimMachine<'_> {
    fn read_input(&mut self, port: PortNumber) -> bool {
        self.ops.push(Op::Input(port));
        self.presence.pop_front().unwrap_or(false)
    }

    fn write_output(&mut self, port: PortNumber, active: bool) {
        self.ops.push(Op::Output(port, active));
    }
}

impl ToolOffsets for SimMachine<'_> {
    fn tool_length_offset(&self) -> f32 {
        self.tlo
    }

    fn set_tool_length_offset(&mut self, command: TloCommand) {
        self.ops.push(Op::Tlo(command));
        self.tlo = match command {
            TloCommand::Cancel => 0.0,
            TloCommand::Dynamic(offset) => offset,
        };
    }
}

impl HostReporter for SimMachine<'_> {
    fn report(&mut self, report: Report<'_>) {
        let warning = matches!(report, Report::Warning(_));
        self.reports.push(report.into());
        if let (true, Some(handler)) = (warning, self.reset_on_warning) {
            handler.reset();
        }
    }
}

impl FeedHold for SimMachine<'_> {
    fn request_feed_hold(&mut self, reason: PauseReason) {
        self.ops.push(Op::FeedHold(reason));
        match self.on_hold {
            HoldAction::Unexpected => panic!("unexpected feed hold: {:?}", reason),
            HoldAction::Release(hold) => hold.release(),
            HoldAction::Reset(handler) => handler.reset(),
        }
    }
}

/// Delay that returns immediately and records what was asked
#[derive(Debug, Default)]
pub struct SimDelay {
    pub waits_ms: Vec<u32>,
    pub total_ns: u64,
}

impl DelayNs for SimDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.push(ms);
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}

/// Reset handler that counts invocations
#[derive(Debug, Default)]
pub struct CountingReset {
    pub count: Cell<u32>,
}

impl ResetHandler for CountingReset {
    fn reset(&self) {
        self.count.set(self.count.get() + 1);
    }
}

/// In-memory flash
#[derive(Debug, Default)]
pub struct SimFlash {
    entries: BTreeMap<u8, Vec<u8>>,
    pub erase_count: usize,
}

impl SimFlash {
    pub fn insert(&mut self, key: StorageKey, data: &[u8]) {
        self.entries.insert(key.as_u8(), data.to_vec());
    }

    pub fn contains(&self, key: StorageKey) -> bool {
        self.entries.contains_key(&key.as_u8())
    }
}

impl FlashStorage for SimFlash {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let data = self.entries.get(&key.as_u8()).ok_or(FlashError::NotFound)?;
        if data.len() > buffer.len() {
            return Err(FlashError::BufferTooSmall);
        }
        buffer[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        self.insert(key, data);
        Ok(())
    }

    async fn erase_all(&mut self) -> Result<(), FlashError> {
        self.erase_count += 1;
        self.entries.clear();
        Ok(())
    }
}

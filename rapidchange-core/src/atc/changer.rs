//! Tool change orchestration
//!
//! [`ToolChanger`] drives [`ChangePhase`] from `Validate` to `Done`. Each
//! phase runs one procedure and yields a [`StepOutcome`]. A pause holds
//! the machine until the operator resumes; the phase's completion action
//! then runs and the sequence moves on. Failures end the change where they
//! happen: nothing is rolled back.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use super::context::ChangeContext;
use super::cover::DustCover;
use super::exchange::Exchange;
use super::hold::{ManualHold, Resume};
use super::program;
use super::setter::{TloReference, ToolSetter};
use super::spindle::SpindleSequencer;
use crate::config::AtcSettings;
use crate::motion::{AxisMask, Position};
use crate::state::{ChangePhase, ErrorKind, PauseReason, StepOutcome};
use crate::tool::{ToolId, ToolRecord, ToolState};
use crate::traits::{FeedHold, HostReporter, Machine, MotionQueue, Report, TloCommand, ToolOffsets};

/// Phases a single change can visit
pub const MAX_TRACE: usize = 10;

/// Pauses recorded per change
pub const MAX_PAUSES: usize = 4;

/// Axes that must be homed before a change
pub const REQUIRED_HOMED: AxisMask = AxisMask::XYZ;

/// Status returned to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChangeStatus {
    Ok,
    NoPendingTool,
    HomingRequired,
    ToolChangeError,
}

/// What happened during the last change
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChangeReport {
    /// Requested tool (none if validation failed before reading it)
    pub tool: ToolId,
    /// Final phase, `Done` or `Error`
    pub phase: ChangePhase,
    /// Phases entered, in order
    pub trace: Vec<ChangePhase, MAX_TRACE>,
    /// Manual holds taken, in order
    pub pauses: Vec<PauseReason, MAX_PAUSES>,
    /// Context as the change left it
    pub context: ChangeContext,
}

impl Default for ChangeReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeReport {
    pub fn new() -> Self {
        Self {
            tool: ToolId::NONE,
            phase: ChangePhase::START,
            trace: Vec::new(),
            pauses: Vec::new(),
            context: ChangeContext::new(Position::ZERO),
        }
    }

    fn enter(&mut self, phase: ChangePhase) {
        let _ = self.trace.push(phase);
    }

    fn paused(&mut self, reason: PauseReason) {
        let _ = self.pauses.push(reason);
    }

    /// Failure cause, if the change failed
    pub fn error(&self) -> Option<ErrorKind> {
        match self.phase {
            ChangePhase::Error(kind) => Some(kind),
            _ => None,
        }
    }

    /// Check if `phase` was entered
    pub fn visited(&self, phase: ChangePhase) -> bool {
        self.trace.contains(&phase)
    }

    /// Coarse status for the host
    pub fn status(&self) -> ChangeStatus {
        match self.phase {
            ChangePhase::Error(ErrorKind::NoPendingTool) => ChangeStatus::NoPendingTool,
            ChangePhase::Error(ErrorKind::HomingRequired) => ChangeStatus::HomingRequired,
            ChangePhase::Error(_) => ChangeStatus::ToolChangeError,
            _ => ChangeStatus::Ok,
        }
    }
}

/// Host tool hooks
///
/// `select` handles `Tn` and `M61`, `change` handles `M6`.
pub trait ToolChangeHooks {
    /// Record a tool selection; `next` is false when no change is wanted
    fn select(&mut self, tool: ToolRecord, next: bool);

    /// Run a tool change to the selected tool
    fn change<H: Machine>(&mut self, machine: &mut H) -> impl core::future::Future<Output = ChangeStatus>;
}

/// Automatic tool changer
pub struct ToolChanger<'a, M: RawMutex, D: DelayNs> {
    settings: AtcSettings,
    tools: &'a ToolState<M>,
    hold: &'a ManualHold<M>,
    reference: TloReference,
    delay: D,
    last_report: Option<ChangeReport>,
}

impl<'a, M: RawMutex, D: DelayNs> ToolChanger<'a, M, D> {
    pub fn new(settings: AtcSettings, tools: &'a ToolState<M>, hold: &'a ManualHold<M>, delay: D) -> Self {
        Self {
            settings,
            tools,
            hold,
            reference: TloReference::new(),
            delay,
            last_report: None,
        }
    }

    pub fn settings(&self) -> &AtcSettings {
        &self.settings
    }

    /// Replace the settings (after a reload or restore)
    pub fn set_settings(&mut self, settings: AtcSettings) {
        self.settings = settings;
    }

    pub fn tools(&self) -> &'a ToolState<M> {
        self.tools
    }

    pub fn hold(&self) -> &'a ManualHold<M> {
        self.hold
    }

    pub fn reference(&self) -> &TloReference {
        &self.reference
    }

    /// Report of the most recent change
    pub fn last_report(&self) -> Option<&ChangeReport> {
        self.last_report.as_ref()
    }

    /// Drop the tool length reference and any active offset
    pub fn reinit<H: ToolOffsets + HostReporter>(&mut self, host: &mut H) {
        if self.reference.clear() {
            info!("Tool length reference cleared");
            host.report(Report::TloReferenceCleared);
        }
        host.set_tool_length_offset(TloCommand::Cancel);
    }

    /// Run a change to the pending tool
    pub async fn run<H: Machine>(&mut self, machine: &mut H) -> ChangeReport {
        let mut report = ChangeReport::new();
        let mut ctx = ChangeContext::new(machine.machine_position());
        let mut requested = ToolRecord::NONE;
        let mut phase = ChangePhase::START;

        while !phase.is_terminal() {
            debug!("Tool change phase {}", phase);
            report.enter(phase);

            let mut outcome = self.step(phase, machine, &mut ctx, &mut requested).await;

            if let StepOutcome::Pause(reason) = outcome {
                report.paused(reason);
                if self.wait_for_operator(machine, reason).await == Resume::Cancelled {
                    warn!("Manual hold cancelled");
                    outcome = StepOutcome::Fail(ErrorKind::Aborted);
                }
            }

            if matches!(outcome, StepOutcome::Continue | StepOutcome::Pause(_)) {
                if let Err(kind) = self.complete(phase, machine, requested).await {
                    outcome = StepOutcome::Fail(kind);
                }
            }

            phase = phase.transition(outcome);
        }

        report.tool = requested.id;
        report.phase = phase;

        match phase {
            ChangePhase::Error(kind) => {
                error!("Tool change failed: {}", kind);
                if !kind.is_precondition() {
                    machine.report(Report::Warning(kind.message()));
                }
            }
            _ => {
                ctx.completed = true;
                if report.visited(ChangePhase::Restore) {
                    info!("Tool change to {} complete", requested.id.0);
                    machine.report(Report::ToolChanged(requested.id));
                }
            }
        }

        report.context = ctx;
        self.last_report = Some(report.clone());
        report
    }

    async fn step<H: Machine>(
        &mut self,
        phase: ChangePhase,
        machine: &mut H,
        ctx: &mut ChangeContext,
        requested: &mut ToolRecord,
    ) -> StepOutcome {
        let settings = &self.settings;
        let spindle = SpindleSequencer::new(&settings.motion);
        let cover = DustCover::new(&settings.dust_cover);

        match phase {
            ChangePhase::Validate => {
                let slots = self.tools.snapshot();
                let Some(pending) = slots.pending else {
                    return StepOutcome::Fail(ErrorKind::NoPendingTool);
                };
                if pending.id == slots.current.id {
                    debug!("Tool {} already loaded", pending.id.0);
                    return StepOutcome::Finish;
                }
                if !machine.homed_axes().contains(REQUIRED_HOMED) {
                    return StepOutcome::Fail(ErrorKind::HomingRequired);
                }
                *requested = pending;
                self.tools.begin_change();
                StepOutcome::Continue
            }
            ChangePhase::RecordState => {
                *ctx = program::record(machine, &mut self.delay, &spindle).await;
                StepOutcome::Continue
            }
            ChangePhase::OpenCover => cover.set(machine, &mut self.delay, ctx, true).await.into(),
            ChangePhase::Unload => {
                let current = self.tools.current();
                Exchange::new(settings)
                    .unload(machine, &mut self.delay, ctx, current)
                    .await
                    .into()
            }
            ChangePhase::Load => Exchange::new(settings)
                .load(machine, &mut self.delay, ctx, *requested)
                .await
                .into(),
            ChangePhase::Measure => {
                let tool = self.tools.current().id;
                ToolSetter::new(&settings.tool_setter, settings.motion.z_safe_clearance)
                    .measure(machine, ctx, &mut self.reference, tool)
                    .await
                    .into()
            }
            ChangePhase::CloseCover => cover.set(machine, &mut self.delay, ctx, false).await.into(),
            ChangePhase::Restore => {
                program::restore(ctx, machine, &mut self.delay, &spindle, &settings.motion)
                    .await
                    .into()
            }
            ChangePhase::Done | ChangePhase::Error(_) => StepOutcome::Continue,
        }
    }

    /// Bookkeeping once a phase (and any manual hold) has finished
    async fn complete<H: Machine>(
        &mut self,
        phase: ChangePhase,
        machine: &mut H,
        requested: ToolRecord,
    ) -> Result<(), ErrorKind> {
        match phase {
            ChangePhase::Unload => {
                self.tools.clear_current();
                machine.set_tool_length_offset(TloCommand::Cancel);
                Ok(())
            }
            ChangePhase::Load => {
                machine.synchronize().await?;
                match self.tools.commit_pending(requested.id) {
                    Some(tool) => {
                        debug!("Tool {} is now current", tool.id.0);
                        Ok(())
                    }
                    None => {
                        warn!("Pending tool withdrawn, not committing {}", requested.id.0);
                        Err(ErrorKind::Aborted)
                    }
                }
            }
            _ => Ok(()),
        }
    }

    async fn wait_for_operator<H: Machine>(&self, machine: &mut H, reason: PauseReason) -> Resume {
        warn!("Waiting for operator: {}", reason);
        machine.report(Report::Warning(reason.message()));

        self.hold.arm();
        if self.tools.pending().is_none() {
            // Reset already withdrew the change
            return Resume::Cancelled;
        }
        machine.request_feed_hold(reason);
        self.hold.wait().await
    }
}

impl<'a, M: RawMutex, D: DelayNs> ToolChangeHooks for ToolChanger<'a, M, D> {
    fn select(&mut self, tool: ToolRecord, next: bool) {
        debug!("Select tool {} (next: {})", tool.id.0, next);
        self.tools.select(tool, next);
    }

    async fn change<H: Machine>(&mut self, machine: &mut H) -> ChangeStatus {
        self.run(machine).await.status()
    }
}

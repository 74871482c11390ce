//! Reset recovery and host registration

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

use super::changer::ToolChanger;
use super::hold::ManualHold;
use crate::tool::ToolState;
use crate::traits::{HostReporter, Report, ResetHandler, ToolOffsets};
use crate::PLUGIN_BANNER;

/// Reset handler installed in front of the host's previous one
///
/// On reset it reconciles tool identity, cancels any manual hold and then
/// hands over to the previous handler.
pub struct ResetChain<'a, M: RawMutex, R: ResetHandler> {
    tools: &'a ToolState<M>,
    hold: &'a ManualHold<M>,
    previous: R,
}

impl<'a, M: RawMutex, R: ResetHandler> ResetChain<'a, M, R> {
    pub fn new(tools: &'a ToolState<M>, hold: &'a ManualHold<M>, previous: R) -> Self {
        Self {
            tools,
            hold,
            previous,
        }
    }

    /// Handler that runs after this one
    pub fn previous(&self) -> &R {
        &self.previous
    }
}

impl<M: RawMutex, R: ResetHandler> ResetHandler for ResetChain<'_, M, R> {
    fn reset(&self) {
        if let Some(tool) = self.tools.reconcile() {
            warn!("Reset during tool change, spindle holds tool {}", tool.id.0);
        }
        self.hold.cancel();
        self.previous.reset();
    }
}

/// Hook the tool changer into the host
///
/// Clears any tool length reference and offset left from before, reports
/// the banner and returns the reset handler the host must call in place
/// of `previous`.
pub fn register<'a, M, D, H, R>(
    changer: &mut ToolChanger<'a, M, D>,
    host: &mut H,
    previous: R,
) -> ResetChain<'a, M, R>
where
    M: RawMutex,
    D: DelayNs,
    H: ToolOffsets + HostReporter,
    R: ResetHandler,
{
    changer.reinit(host);
    host.report(Report::Message(PLUGIN_BANNER));
    info!("RapidChange ATC registered");

    ResetChain::new(changer.tools(), changer.hold(), previous)
}

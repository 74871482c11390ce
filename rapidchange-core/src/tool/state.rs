//! Tool identity shared with the reset path
//!
//! The reset handler runs from the stop/reset path and may preempt the
//! change sequence between any two steps. Every access therefore goes
//! through a blocking mutex holding a plain `Copy` value: reads take a
//! snapshot, writes replace it whole.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::record::{ToolId, ToolRecord};

/// Current and pending tool
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ToolSlots {
    /// Tool physically in the spindle, as far as the changer knows
    pub current: ToolRecord,
    /// Tool requested by the program, while a selection is in effect
    pub pending: Option<ToolRecord>,
    /// Spindle tool when the running change started
    pub origin: Option<ToolRecord>,
    /// The host should re-report the selected tool
    pub report_tool: bool,
}

impl ToolSlots {
    /// Empty spindle, nothing selected
    pub const EMPTY: Self = Self {
        current: ToolRecord::NONE,
        pending: None,
        origin: None,
        report_tool: false,
    };

    /// A change is in flight: one has started and not committed, or a
    /// tool is pending that differs from the spindle
    pub fn change_in_flight(&self) -> bool {
        self.origin.is_some() || matches!(self.pending, Some(pending) if pending.id != self.current.id)
    }
}

impl Default for ToolSlots {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Tool identity state with a single owner, shared by reference
pub struct ToolState<M: RawMutex> {
    slots: Mutex<M, Cell<ToolSlots>>,
}

impl<M: RawMutex> Default for ToolState<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> ToolState<M> {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(Cell::new(ToolSlots::EMPTY)),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut ToolSlots) -> R) -> R {
        self.slots.lock(|cell| {
            let mut slots = cell.get();
            let result = f(&mut slots);
            cell.set(slots);
            result
        })
    }

    /// Copy of both slots
    pub fn snapshot(&self) -> ToolSlots {
        self.slots.lock(|cell| cell.get())
    }

    /// Tool in the spindle
    pub fn current(&self) -> ToolRecord {
        self.snapshot().current
    }

    /// Tool being installed, if any
    pub fn pending(&self) -> Option<ToolRecord> {
        self.snapshot().pending
    }

    /// Record a tool selection (`Tn`, or `M61` when `next` is false)
    ///
    /// A selection that does not request a change is committed as the
    /// current tool immediately.
    pub fn select(&self, tool: ToolRecord, next: bool) {
        self.update(|slots| {
            slots.pending = Some(tool);
            if !next {
                slots.current = tool;
                slots.origin = None;
            }
        });
    }

    /// Remember the spindle tool as the one a reset returns to
    pub fn begin_change(&self) {
        self.update(|slots| slots.origin = Some(slots.current));
    }

    /// Forget the tool in the spindle after it has been unloaded
    pub fn clear_current(&self) {
        self.update(|slots| slots.current = ToolRecord::NONE);
    }

    /// Commit the pending tool as current
    ///
    /// Succeeds only if the pending slot still holds `expected`. The reset
    /// path withdraws the pending tool, in which case nothing changes and
    /// `None` is returned.
    pub fn commit_pending(&self, expected: ToolId) -> Option<ToolRecord> {
        self.update(|slots| match slots.pending {
            Some(pending) if pending.id == expected => {
                slots.current = pending;
                slots.origin = None;
                Some(pending)
            }
            _ => None,
        })
    }

    /// Reconcile identity after a reset
    ///
    /// If a change was in flight the spindle tool is rewritten to the one
    /// held when the change started and a tool report is flagged. The
    /// pending selection is cleared either way. Returns the rewritten
    /// record when a rewrite happened.
    pub fn reconcile(&self) -> Option<ToolRecord> {
        self.update(|slots| {
            let rewritten = if slots.change_in_flight() {
                if let Some(origin) = slots.origin {
                    slots.current = origin;
                }
                slots.report_tool = true;
                Some(slots.current)
            } else {
                None
            };
            slots.pending = None;
            slots.origin = None;
            rewritten
        })
    }

    /// Take the pending tool report, if one was flagged
    ///
    /// Returns the tool the host should now report as selected.
    pub fn take_tool_report(&self) -> Option<ToolRecord> {
        self.update(|slots| {
            if slots.report_tool {
                slots.report_tool = false;
                Some(slots.current)
            } else {
                None
            }
        })
    }
}

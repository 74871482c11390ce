//! Pocket position calculator
//!
//! Pocket *n* sits at pocket 1 offset by `(n - 1) * pitch * direction`
//! along the alignment axis; the other axis stays at pocket 1's value.
//! Tools without a pocket (tool 0, or numbered past the magazine) are
//! handed over by the operator at the fixed manual position.

use crate::config::{AlignmentAxis, LayoutConfig};
use crate::tool::ToolId;

/// XY target in machine coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlanarPosition {
    pub x: f32,
    pub y: f32,
}

impl PlanarPosition {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Where a tool lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ToolSlot {
    /// Magazine pocket, 1-based
    Pocket(u32),
    /// No pocket assigned; changed by hand
    Manual,
}

impl LayoutConfig {
    /// Slot assigned to a tool
    pub fn slot_for(&self, tool: ToolId) -> ToolSlot {
        if tool.is_none() || tool.0 > u32::from(self.pocket_count) {
            ToolSlot::Manual
        } else {
            ToolSlot::Pocket(tool.0)
        }
    }

    /// Check if a tool has a magazine pocket
    pub fn has_pocket(&self, tool: ToolId) -> bool {
        matches!(self.slot_for(tool), ToolSlot::Pocket(_))
    }

    /// Fixed position for tools changed by hand
    pub fn manual_position(&self) -> PlanarPosition {
        PlanarPosition::new(self.manual_x, self.manual_y)
    }

    /// XY position of a tool's pocket, or the manual position
    pub fn position_for(&self, tool: ToolId) -> PlanarPosition {
        match self.slot_for(tool) {
            ToolSlot::Manual => self.manual_position(),
            ToolSlot::Pocket(n) => {
                let offset = (n - 1) as f32 * self.pocket_pitch * self.direction.sign();
                match self.alignment {
                    AlignmentAxis::X => {
                        PlanarPosition::new(self.pocket1_x + offset, self.pocket1_y)
                    }
                    AlignmentAxis::Y => {
                        PlanarPosition::new(self.pocket1_x, self.pocket1_y + offset)
                    }
                }
            }
        }
    }
}

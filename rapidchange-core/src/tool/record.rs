//! Tool records as copied from the host tool table

use crate::motion::Position;

/// Tool number, 0 meaning "no tool"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ToolId(pub u32);

impl ToolId {
    /// Empty spindle
    pub const NONE: Self = Self(0);

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for ToolId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Copy of a host tool table entry
///
/// The offsets are carried through untouched; the tool changer measures
/// length offsets itself and applies them through the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ToolRecord {
    pub id: ToolId,
    /// Tool table offsets per axis
    pub offset: Position,
    /// Tool radius (mm)
    pub radius: f32,
}

impl ToolRecord {
    /// Record for an empty spindle
    pub const NONE: Self = Self {
        id: ToolId::NONE,
        offset: Position::ZERO,
        radius: 0.0,
    };

    /// Record with no table offsets
    pub const fn new(id: u32) -> Self {
        Self {
            id: ToolId(id),
            offset: Position::ZERO,
            radius: 0.0,
        }
    }

    pub const fn is_none(&self) -> bool {
        self.id.is_none()
    }
}

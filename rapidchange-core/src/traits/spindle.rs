//! Spindle and coolant driver traits

/// Spindle rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Clockwise (M3), tightens the clamping nut
    Clockwise,
    /// Counter-clockwise (M4), loosens the clamping nut
    CounterClockwise,
}

/// Spindle state as commanded
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpindleCommand {
    pub on: bool,
    pub direction: Direction,
    pub rpm: f32,
}

impl SpindleCommand {
    /// Spindle stopped
    pub const fn off() -> Self {
        Self {
            on: false,
            direction: Direction::Clockwise,
            rpm: 0.0,
        }
    }

    /// Spindle running
    pub const fn running(direction: Direction, rpm: f32) -> Self {
        Self {
            on: true,
            direction,
            rpm,
        }
    }
}

impl Default for SpindleCommand {
    fn default() -> Self {
        Self::off()
    }
}

/// Spindle driver
///
/// Commands are assumed to be accepted; the caller only issues known-safe
/// combinations.
pub trait SpindleDriver {
    /// Current commanded spindle state
    fn spindle_state(&self) -> SpindleCommand;

    /// Command a new spindle state
    fn set_spindle(&mut self, command: SpindleCommand);
}

/// Coolant outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoolantState {
    pub flood: bool,
    pub mist: bool,
}

impl CoolantState {
    pub const OFF: Self = Self {
        flood: false,
        mist: false,
    };

    pub fn is_off(&self) -> bool {
        !self.flood && !self.mist
    }
}

/// Coolant driver
pub trait CoolantDriver {
    /// Current coolant output state
    fn coolant_state(&self) -> CoolantState;

    /// Switch coolant outputs directly
    fn set_coolant(&mut self, state: CoolantState);

    /// Restore a modal coolant state once motion has synchronized
    fn sync_coolant(&mut self, state: CoolantState);
}

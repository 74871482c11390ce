//! Machine position types
//!
//! These types carry targets between the sequencer and the host motion
//! queue. All values are machine coordinates in millimeters.

use serde::{Deserialize, Serialize};

/// Number of axes carried in a [`Position`]
pub const N_AXES: usize = 6;

/// Axis identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
    Z,
    A,
    B,
    C,
}

impl Axis {
    /// Index of this axis in [`Position::values`]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bit for this axis in an [`AxisMask`]
    pub const fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// Set of axes, used for homing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMask(pub u8);

impl AxisMask {
    /// No axes
    pub const NONE: Self = Self(0);
    /// The three linear axes that must be homed before a tool change
    pub const XYZ: Self = Self(Axis::X.bit() | Axis::Y.bit() | Axis::Z.bit());

    /// Mask containing a single axis
    pub const fn of(axis: Axis) -> Self {
        Self(axis.bit())
    }

    /// Add an axis to the mask
    pub const fn with(self, axis: Axis) -> Self {
        Self(self.0 | axis.bit())
    }

    /// Check whether every axis in `other` is also in this mask
    pub const fn contains(self, other: AxisMask) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Machine position in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub values: [f32; N_AXES],
}

impl Position {
    /// Origin (all axes at zero)
    pub const ZERO: Self = Self {
        values: [0.0; N_AXES],
    };

    /// Position with the given linear axes and rotary axes at zero
    pub const fn xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            values: [x, y, z, 0.0, 0.0, 0.0],
        }
    }

    pub fn x(&self) -> f32 {
        self.values[Axis::X.index()]
    }

    pub fn y(&self) -> f32 {
        self.values[Axis::Y.index()]
    }

    pub fn z(&self) -> f32 {
        self.values[Axis::Z.index()]
    }

    /// Value of one axis
    pub fn get(&self, axis: Axis) -> f32 {
        self.values[axis.index()]
    }

    /// Set one axis in place
    pub fn set(&mut self, axis: Axis, value: f32) {
        self.values[axis.index()] = value;
    }

    /// Copy of this position with one axis replaced
    pub fn with(mut self, axis: Axis, value: f32) -> Self {
        self.set(axis, value);
        self
    }

    /// Copy of this position with X and Y replaced
    pub fn with_xy(self, x: f32, y: f32) -> Self {
        self.with(Axis::X, x).with(Axis::Y, y)
    }

    /// Copy of this position with Z replaced
    pub fn with_z(self, z: f32) -> Self {
        self.with(Axis::Z, z)
    }
}

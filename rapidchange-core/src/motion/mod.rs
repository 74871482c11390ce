//! Machine coordinates and pocket geometry
//!
//! Positions are machine coordinates in millimeters. Pocket positions are
//! always computed from the magazine layout, never stored per pocket.

pub mod pocket;
pub mod position;

pub use pocket::{PlanarPosition, ToolSlot};
pub use position::{Axis, AxisMask, Position, N_AXES};

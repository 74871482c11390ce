//! Configuration type definitions
//!
//! All heights are Z machine coordinates in millimeters, feed rates are
//! mm/min and spindle speeds are RPM. Nothing here is validated against the
//! machine envelope at runtime: safe clearance must be collision free from
//! every pocket and from the tool setter.

use rapidchange_hal::PortNumber;
use serde::{Deserialize, Serialize};

use crate::motion::Axis;

/// Default spindle ramp/settle time after a speed change
pub const DEFAULT_SPINDLE_RAMP_MS: u32 = 3000;

/// Default settle time after toggling a port-driven dust cover
pub const DEFAULT_COVER_SETTLE_MS: u32 = 1000;

/// Axis along which the magazine pockets are aligned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlignmentAxis {
    #[default]
    X,
    Y,
}

impl AlignmentAxis {
    /// Machine axis for this alignment
    pub const fn axis(self) -> Axis {
        match self {
            AlignmentAxis::X => Axis::X,
            AlignmentAxis::Y => Axis::Y,
        }
    }
}

/// Direction of travel from pocket 1 to pocket 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PocketDirection {
    #[default]
    Positive,
    Negative,
}

impl PocketDirection {
    /// Sign applied to the pocket pitch
    pub const fn sign(self) -> f32 {
        match self {
            PocketDirection::Positive => 1.0,
            PocketDirection::Negative => -1.0,
        }
    }
}

/// Magazine layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayoutConfig {
    /// Axis the pockets are aligned along
    pub alignment: AlignmentAxis,
    /// Direction from pocket 1 to pocket 2
    pub direction: PocketDirection,
    /// Number of pockets that may hold a tool
    pub pocket_count: u8,
    /// Center-to-center pocket distance (mm)
    pub pocket_pitch: f32,
    /// X machine coordinate of pocket 1
    pub pocket1_x: f32,
    /// Y machine coordinate of pocket 1
    pub pocket1_y: f32,
    /// X machine coordinate where tools without a pocket are handed over
    pub manual_x: f32,
    /// Y machine coordinate where tools without a pocket are handed over
    pub manual_y: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            alignment: AlignmentAxis::X,
            direction: PocketDirection::Positive,
            pocket_count: 6,
            pocket_pitch: 45.0,
            pocket1_x: 0.0,
            pocket1_y: 0.0,
            manual_x: 0.0,
            manual_y: 0.0,
        }
    }
}

/// Z heights, feeds and speeds used while engaging the clamping nut
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionConfig {
    /// Height clear of every obstacle
    pub z_safe_clearance: f32,
    /// Height for moving over the magazine between unload and load
    pub z_traverse: f32,
    /// Height the spindle plunges to when engaging the nut
    pub z_engage: f32,
    /// Offset above engage height where the spindle is started
    pub z_start_offset: f32,
    /// Offset above engage height the spindle lifts to when re-seating
    pub z_retract_offset: f32,
    /// Feed rate while (dis)engaging the nut (mm/min)
    pub engage_feed_rate: f32,
    /// Spindle speed while loading (RPM)
    pub load_rpm: f32,
    /// Spindle speed while unloading (RPM)
    pub unload_rpm: f32,
    /// Time for the spindle to reach a commanded speed (ms)
    pub spindle_ramp_ms: u32,
    /// Stay at safe clearance after the change instead of returning to
    /// the recorded program position
    pub skip_return: bool,
}

impl MotionConfig {
    /// Height at which the spindle is started above a pocket
    pub fn z_spin_start(&self) -> f32 {
        self.z_engage + self.z_start_offset
    }

    /// Height the spindle lifts to between the two load plunges
    pub fn z_reseat(&self) -> f32 {
        self.z_engage + self.z_retract_offset
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            z_safe_clearance: 0.0,
            z_traverse: -30.0,
            z_engage: -80.0,
            z_start_offset: 23.0,
            z_retract_offset: 7.0,
            engage_feed_rate: 1800.0,
            load_rpm: 1200.0,
            unload_rpm: 1200.0,
            spindle_ramp_ms: DEFAULT_SPINDLE_RAMP_MS,
            skip_return: false,
        }
    }
}

/// Fixed tool setter used for tool length measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ToolSetterConfig {
    /// Measure tool length after every load
    pub enabled: bool,
    /// X machine coordinate of the setter
    pub x: f32,
    /// Y machine coordinate of the setter
    pub y: f32,
    /// Height the seek probe starts from
    pub z_seek_start: f32,
    /// Feed rate of the fast seek probe (mm/min)
    pub seek_feed_rate: f32,
    /// Feed rate of the slow set probe (mm/min)
    pub set_feed_rate: f32,
    /// Maximum seek travel below the start height (mm)
    pub max_travel: f32,
    /// Distance to back off after the seek contact (mm)
    pub seek_retreat: f32,
}

impl Default for ToolSetterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            x: 0.0,
            y: 0.0,
            z_seek_start: -20.0,
            seek_feed_rate: 200.0,
            set_feed_rate: 50.0,
            max_travel: 60.0,
            seek_retreat: 1.0,
        }
    }
}

/// Infrared tool recognition sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RecognitionConfig {
    /// Check tool presence while unloading and loading
    pub enabled: bool,
    /// Auxiliary input wired to the sensor
    pub input_port: PortNumber,
    /// First sampling height (nut engaged / released)
    pub z_zone_1: f32,
    /// Second sampling height (nut fully seated), above zone 1
    pub z_zone_2: f32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            input_port: 0,
            z_zone_1: -70.0,
            z_zone_2: -60.0,
        }
    }
}

/// How the dust cover is actuated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoverMode {
    /// No dust cover fitted
    #[default]
    Disabled,
    /// Cover driven by a dedicated machine axis
    Axis,
    /// Cover driven by an auxiliary output (e.g. pneumatic valve)
    Port,
}

/// Dust cover over the magazine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DustCoverConfig {
    /// Actuation mode
    pub mode: CoverMode,
    /// Axis driving the cover (axis mode)
    pub axis: Axis,
    /// Axis position with the cover open (axis mode)
    pub open_position: f32,
    /// Axis position with the cover closed (axis mode)
    pub closed_position: f32,
    /// Output driving the cover, active = open (port mode)
    pub output_port: PortNumber,
    /// Time for the cover to finish moving (port mode, ms)
    pub settle_ms: u32,
}

impl Default for DustCoverConfig {
    fn default() -> Self {
        Self {
            mode: CoverMode::Disabled,
            axis: Axis::A,
            open_position: 0.0,
            closed_position: 0.0,
            output_port: 0,
            settle_ms: DEFAULT_COVER_SETTLE_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_start_and_reseat_heights() {
        let motion = MotionConfig {
            z_engage: -80.0,
            z_start_offset: 23.0,
            z_retract_offset: 7.0,
            ..Default::default()
        };

        assert_eq!(motion.z_spin_start(), -57.0);
        assert_eq!(motion.z_reseat(), -73.0);
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(PocketDirection::Positive.sign(), 1.0);
        assert_eq!(PocketDirection::Negative.sign(), -1.0);
    }

    #[test]
    fn test_alignment_axis() {
        assert_eq!(AlignmentAxis::X.axis(), Axis::X);
        assert_eq!(AlignmentAxis::Y.axis(), Axis::Y);
    }

    #[test]
    fn test_defaults_are_disabled_features() {
        assert!(!ToolSetterConfig::default().enabled);
        assert!(!RecognitionConfig::default().enabled);
        assert_eq!(DustCoverConfig::default().mode, CoverMode::Disabled);
        assert_eq!(MotionConfig::default().spindle_ramp_ms, DEFAULT_SPINDLE_RAMP_MS);
    }
}

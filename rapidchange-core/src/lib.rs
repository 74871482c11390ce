//! Board-agnostic tool-change sequencer for the RapidChange ATC
//!
//! This crate contains the tool-change logic that does not depend on a
//! specific motion controller:
//!
//! - Collaborator traits (motion queue, probe, spindle, coolant, host)
//! - Settings record and its persistence
//! - Pocket position math
//! - Tool identity shared with the reset path
//! - Tool-change state machine and its sub-procedures
//! - Reset recovery

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod atc;
pub mod config;
pub mod motion;
pub mod state;
pub mod tool;
pub mod traits;

#[cfg(test)]
pub(crate) mod sim;

/// Banner reported to the host when the tool changer registers
pub const PLUGIN_BANNER: &str = concat!("[PLUGIN: RapidChange ATC v", env!("CARGO_PKG_VERSION"), "]");

//! Auxiliary digital I/O abstractions
//!
//! grbl-class controllers expose their spare inputs and outputs as numbered
//! ports rather than typed pins. The tool changer addresses the tool
//! recognition sensor and the dust cover actuator by port number.

/// Auxiliary port number as configured on the host controller
pub type PortNumber = u8;

/// Port-indexed digital I/O
///
/// Reads are immediate samples of the current input level; no debouncing
/// or waiting is implied.
pub trait DigitalPorts {
    /// Sample an auxiliary digital input
    ///
    /// Returns true when the input is active. Ports that do not exist read
    /// as inactive; the port number is validated at configuration time.
    fn read_input(&mut self, port: PortNumber) -> bool;

    /// Drive an auxiliary digital output
    fn write_output(&mut self, port: PortNumber, active: bool);
}

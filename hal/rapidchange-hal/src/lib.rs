//! RapidChange ATC Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the tool-change core consumes
//! from the host controller. Board support packages (or a grbl-class host
//! firmware) implement them; the sequencing logic never touches registers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  rapidchange-core (sequencer)           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  rapidchange-hal (this crate - traits)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  host controller / board support        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::DigitalPorts`] - Port-indexed auxiliary digital I/O
//! - [`flash::FlashStorage`] - Persistent settings storage

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod gpio;

// Re-export key traits at crate root for convenience
pub use flash::{FlashError, FlashStorage, StorageKey};
pub use gpio::{DigitalPorts, PortNumber};

//! Automatic tool changer
//!
//! The orchestrator ([`ToolChanger`]) and the procedures it is built from.
//! Procedures take the host machine as a generic argument bounded by the
//! collaborator traits they actually use.

pub mod changer;
pub mod context;
pub mod cover;
pub mod exchange;
pub mod hold;
pub mod presence;
pub mod program;
pub mod recovery;
pub mod setter;
pub mod spindle;

pub use changer::{ChangeReport, ChangeStatus, ToolChangeHooks, ToolChanger, REQUIRED_HOMED};
pub use context::ChangeContext;
pub use cover::DustCover;
pub use exchange::Exchange;
pub use hold::{ManualHold, Resume};
pub use presence::PresenceSensor;
pub use recovery::{register, ResetChain};
pub use setter::{Measurement, TloReference, ToolSetter};
pub use spindle::SpindleSequencer;

//! Tool identity
//!
//! The host tool table owns the authoritative tool records. The tool
//! changer keeps copies of the tool in the spindle and the tool being
//! installed, shared between the change sequence and the reset path.

pub mod record;
pub mod state;

pub use record::{ToolId, ToolRecord};
pub use state::{ToolSlots, ToolState};

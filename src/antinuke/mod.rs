//! Anti-nuke intrusion response: audit trail, sliding-window detection,
//! and the guild lockdown state machine.

pub mod detector;
pub mod state;

pub use detector::{AntiNukeDetector, CheckOutcome};
pub use state::{AdminAction, AuditEvent, LockdownState};

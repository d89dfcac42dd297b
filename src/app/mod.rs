//! Application core: pure lamp logic, zero platform I/O.
//!
//! The [`session::Session`] facade owns the pattern scheduler, the
//! auto-off timer and the timeline.  All interaction with the platform
//! happens through the **port traits** in [`ports`], so this layer runs
//! unchanged against mock adapters.

pub mod commands;
pub mod events;
pub mod ports;
pub mod quick_toggle;
pub mod session;

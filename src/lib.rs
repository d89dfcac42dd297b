//! BrightFlashlight lamp-control core.
//!
//! Torch, strobe and SOS on a single lamp, with an auto-off deadline and
//! a screen-light mode.  The [`app::session::Session`] facade is the
//! entry point; platforms plug in through the port traits in
//! [`app::ports`].  Everything runs on the caller's thread off one
//! cooperative [`timeline::Timeline`].

#![deny(unused_must_use)]

pub mod app;
pub mod auto_off;
pub mod config;
pub mod error;
pub mod lamp;
pub mod patterns;
pub mod scheduler;
pub mod screen_light;
pub mod timeline;

pub mod adapters;
pub mod drivers;

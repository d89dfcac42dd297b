//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements    | Connects to                  |
//! |-------------|---------------|------------------------------|
//! | `log_panel` | ScreenPanel   | `log` output                 |
//! | `log_sink`  | EventSink     | `log` output                 |
//! | `sim_lamp`  | LampHardware  | Logged, fault-injectable lamp|
//! | `time`      | Clock         | `std::time` / manual clock   |
//!
//! Embedded lamp backends live in [`crate::drivers`].

pub mod log_panel;
pub mod log_sink;
pub mod sim_lamp;
pub mod time;

//! Embedded lamp backends over `embedded-hal` 1.0 traits.

pub mod gpio_lamp;
pub mod pwm_lamp;

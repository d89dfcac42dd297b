//! Dimmable lamp on a PWM channel.
//!
//! Strength levels `1..=levels` map linearly onto the duty cycle,
//! `level / levels`.  Plain on is full duty.

use embedded_hal::pwm::SetDutyCycle;
use heapless::Vec;

use crate::app::ports::{Facing, LampHardware, MAX_UNITS, UnitId, UnitInfo};
use crate::error::{AccessFault, LampError, Result};

pub struct PwmLamp<P: SetDutyCycle> {
    channel: P,
    levels: u8,
}

impl<P: SetDutyCycle> PwmLamp<P> {
    /// `levels` is the number of strength steps; `1` gives an on/off lamp.
    pub fn new(channel: P, levels: u8) -> Self {
        Self {
            channel,
            levels: levels.max(1),
        }
    }

    pub fn release(self) -> P {
        self.channel
    }

    fn io<T, E>(res: core::result::Result<T, E>) -> Result<T> {
        res.map_err(|_| LampError::TransientAccess(AccessFault::Io))
    }
}

impl<P: SetDutyCycle> LampHardware for PwmLamp<P> {
    fn units(&mut self) -> Result<Vec<UnitInfo, MAX_UNITS>> {
        let mut units = Vec::new();
        units
            .push(UnitInfo {
                id: UnitId(0),
                facing: Facing::Rear,
                has_flash: true,
                max_level: self.levels,
            })
            .map_err(|_| LampError::HardwareUnavailable)?;
        Ok(units)
    }

    fn set_torch(&mut self, _unit: UnitId, on: bool) -> Result<()> {
        if on {
            Self::io(self.channel.set_duty_cycle_fully_on())
        } else {
            Self::io(self.channel.set_duty_cycle_fully_off())
        }
    }

    fn set_strength(&mut self, _unit: UnitId, level: u8) -> Result<()> {
        if self.levels <= 1 {
            return Err(LampError::UnsupportedCapability);
        }
        let level = level.min(self.levels);
        Self::io(
            self.channel
                .set_duty_cycle_fraction(u16::from(level), u16::from(self.levels)),
        )
    }
}

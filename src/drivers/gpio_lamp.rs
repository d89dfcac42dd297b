//! Single on/off lamp on a GPIO output.
//!
//! Exposes one rear unit without strength control; the driver degrades
//! every level request to plain on/off.

use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::app::ports::{Facing, LampHardware, MAX_UNITS, UnitId, UnitInfo};
use crate::error::{AccessFault, LampError, Result};

pub struct GpioLamp<P: OutputPin> {
    pin: P,
    active_low: bool,
}

impl<P: OutputPin> GpioLamp<P> {
    /// `active_low` for a lamp that lights when the pin is driven low.
    pub fn new(pin: P, active_low: bool) -> Self {
        Self { pin, active_low }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> LampHardware for GpioLamp<P> {
    fn units(&mut self) -> Result<Vec<UnitInfo, MAX_UNITS>> {
        let mut units = Vec::new();
        units
            .push(UnitInfo {
                id: UnitId(0),
                facing: Facing::Rear,
                has_flash: true,
                max_level: 1,
            })
            .map_err(|_| LampError::HardwareUnavailable)?;
        Ok(units)
    }

    fn set_torch(&mut self, _unit: UnitId, on: bool) -> Result<()> {
        let high = on != self.active_low;
        let res = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        res.map_err(|_| LampError::TransientAccess(AccessFault::Io))
    }
}

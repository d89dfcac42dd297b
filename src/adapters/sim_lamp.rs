//! Host-side simulated lamp.
//!
//! Logs every write instead of driving hardware.  Faults can be injected
//! to exercise the driver's failure paths from the simulator.

use heapless::Vec;
use log::info;

use crate::app::ports::{Facing, LampHardware, MAX_UNITS, UnitId, UnitInfo};
use crate::error::{AccessFault, LampError, Result};

/// Simulated rear lamp with `max_level` strength steps.
#[derive(Debug)]
pub struct SimLamp {
    max_level: u8,
    lit: bool,
    level: u8,
    writes: u64,
    fail_next: u32,
    fault: AccessFault,
    permission: bool,
}

impl SimLamp {
    pub fn new(max_level: u8) -> Self {
        Self {
            max_level: max_level.max(1),
            lit: false,
            level: 0,
            writes: 0,
            fail_next: 0,
            fault: AccessFault::Busy,
            permission: true,
        }
    }

    /// Fail the next `count` writes with `fault`.
    pub fn fail_next(&mut self, count: u32, fault: AccessFault) {
        self.fail_next = count;
        self.fault = fault;
    }

    pub fn set_permission(&mut self, granted: bool) {
        self.permission = granted;
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Last strength level written (`0` when driven with plain on/off).
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Total successful writes.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    fn check_fault(&mut self) -> Result<()> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(LampError::TransientAccess(self.fault));
        }
        Ok(())
    }
}

impl LampHardware for SimLamp {
    fn units(&mut self) -> Result<Vec<UnitInfo, MAX_UNITS>> {
        let mut units = Vec::new();
        units
            .push(UnitInfo {
                id: UnitId(0),
                facing: Facing::Rear,
                has_flash: true,
                max_level: self.max_level,
            })
            .map_err(|_| LampError::HardwareUnavailable)?;
        Ok(units)
    }

    fn set_torch(&mut self, _unit: UnitId, on: bool) -> Result<()> {
        self.check_fault()?;
        self.lit = on;
        self.level = 0;
        self.writes += 1;
        info!("SIM   | lamp {}", if on { "ON" } else { "off" });
        Ok(())
    }

    fn set_strength(&mut self, _unit: UnitId, level: u8) -> Result<()> {
        if self.max_level <= 1 {
            return Err(LampError::UnsupportedCapability);
        }
        self.check_fault()?;
        self.lit = true;
        self.level = level;
        self.writes += 1;
        info!("SIM   | lamp ON at {}/{}", level, self.max_level);
        Ok(())
    }

    fn has_permission(&self) -> bool {
        self.permission
    }
}

//! Register transport abstraction
//!
//! The driver only ever needs two primitives: read one 16-bit register and
//! write one 16-bit register. Everything else (MMIO, a software model, a
//! recording wrapper for tests) is a transport behind this trait.

use pme_chip::Register;
use std::fmt::Debug;

/// Register transport for one PME instance.
///
/// Reads take `&mut self`: several registers (CAT above all) advance hardware
/// state when read. Accesses are blocking and infallible at this layer;
/// timeouts or retries, if any, belong to the transport itself.
pub trait RegisterBus: Debug {
    /// Read the low 16 bits of `reg`.
    fn read16(&mut self, reg: Register) -> u16;

    /// Write `value` to `reg`.
    fn write16(&mut self, reg: Register, value: u16);
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read16(&mut self, reg: Register) -> u16 {
        (**self).read16(reg)
    }

    fn write16(&mut self, reg: Register, value: u16) {
        (**self).write16(reg, value);
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn read16(&mut self, reg: Register) -> u16 {
        (**self).read16(reg)
    }

    fn write16(&mut self, reg: Register, value: u16) {
        (**self).write16(reg, value);
    }
}

/// Transport kind, for logging and CLI selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    /// Volatile accesses to the physical register window
    Mmio,

    /// Behavioural software model, no hardware required
    Software,
}

impl std::fmt::Display for BusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mmio => write!(f, "MMIO"),
            Self::Software => write!(f, "Software (model)"),
        }
    }
}

//! Recording transport wrapper
//!
//! Wraps any [`RegisterBus`] and keeps an ordered log of every access. Used
//! to assert exact register sequences (clamping before writes, chain advance
//! counts, NSR restoration) and to trace a session at `TRACE` level.

use crate::bus::RegisterBus;
use pme_chip::Register;
use tracing::trace;

/// Direction of one register access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// Register read
    Read,
    /// Register write
    Write,
}

/// One logged register access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    /// Read or write
    pub kind: AccessKind,
    /// Register accessed
    pub register: Register,
    /// Value read or written
    pub value: u16,
}

impl Access {
    /// A read of `register` that returned `value`.
    pub const fn read(register: Register, value: u16) -> Self {
        Self {
            kind: AccessKind::Read,
            register,
            value,
        }
    }

    /// A write of `value` to `register`.
    pub const fn write(register: Register, value: u16) -> Self {
        Self {
            kind: AccessKind::Write,
            register,
            value,
        }
    }

    /// True for writes.
    pub fn is_write(&self) -> bool {
        self.kind == AccessKind::Write
    }

    /// True for reads.
    pub fn is_read(&self) -> bool {
        self.kind == AccessKind::Read
    }
}

/// Transport wrapper that records every access before forwarding it.
#[derive(Debug, Clone, Default)]
pub struct RecordingBus<B> {
    inner: B,
    log: Vec<Access>,
}

impl<B: RegisterBus> RecordingBus<B> {
    /// Wrap `inner` with an empty log.
    pub const fn new(inner: B) -> Self {
        Self {
            inner,
            log: Vec::new(),
        }
    }

    /// Accesses recorded so far, oldest first.
    pub fn log(&self) -> &[Access] {
        &self.log
    }

    /// Drain the log.
    pub fn take_log(&mut self) -> Vec<Access> {
        std::mem::take(&mut self.log)
    }

    /// Discard the log.
    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Number of reads of `register` in the log.
    pub fn reads_of(&self, register: Register) -> usize {
        self.log
            .iter()
            .filter(|a| a.is_read() && a.register == register)
            .count()
    }

    /// Number of writes to `register` in the log.
    pub fn writes_to(&self, register: Register) -> usize {
        self.log
            .iter()
            .filter(|a| a.is_write() && a.register == register)
            .count()
    }

    /// Borrow the wrapped transport.
    pub const fn inner(&self) -> &B {
        &self.inner
    }

    /// Release the wrapped transport, discarding the log.
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: RegisterBus> RegisterBus for RecordingBus<B> {
    fn read16(&mut self, reg: Register) -> u16 {
        let value = self.inner.read16(reg);
        trace!("rd {reg:<13} -> {value:#06x}");
        self.log.push(Access::read(reg, value));
        value
    }

    fn write16(&mut self, reg: Register, value: u16) {
        trace!("wr {reg:<13} <- {value:#06x}");
        self.log.push(Access::write(reg, value));
        self.inner.write16(reg, value);
    }
}

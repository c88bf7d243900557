//! Save / restore sessions
//!
//! Switching the network into save/restore mode is a scoped acquisition of
//! the engine's neuron chain. A session captures NSR on entry, sets the
//! network-mode bit and rewinds the chain; NSR is written back when the
//! session is ended or dropped, including on early return or unwinding.
//!
//! Sessions hold the driver's exclusive borrow, so normal-mode operations
//! (and a second session) cannot be interleaved with one.

use crate::bus::RegisterBus;
use crate::driver::Pme;
use crate::neuron::NeuronRecord;
use pme_chip::regs::nsr;
use pme_chip::Register;
use tracing::debug;

/// Common acquisition and release of the chain.
#[derive(Debug)]
struct ChainMode<'a, B: RegisterBus> {
    pme: &'a mut Pme<B>,
    saved_nsr: u16,
}

impl<'a, B: RegisterBus> ChainMode<'a, B> {
    fn enter(pme: &'a mut Pme<B>, forget: bool) -> Self {
        let saved_nsr = pme.read(Register::Nsr);
        if forget {
            pme.forget();
        }

        let nsr_value = pme.read(Register::Nsr) | nsr::NET_MODE;
        pme.write(Register::Nsr, nsr_value);
        pme.write(Register::RstChain, 0);

        debug!("Entered save/restore mode (saved NSR {saved_nsr:#06x})");
        Self { pme, saved_nsr }
    }
}

impl<B: RegisterBus> Drop for ChainMode<'_, B> {
    fn drop(&mut self) {
        self.pme.write(Register::Nsr, self.saved_nsr);
        debug!("Left save/restore mode (NSR {:#06x})", self.saved_nsr);
    }
}

/// Active save mode. Created by [`Pme::begin_save_mode`].
#[derive(Debug)]
pub struct SaveSession<'a, B: RegisterBus> {
    chain: ChainMode<'a, B>,
}

impl<'a, B: RegisterBus> SaveSession<'a, B> {
    pub(crate) fn acquire(pme: &'a mut Pme<B>) -> Self {
        Self {
            chain: ChainMode::enter(pme, false),
        }
    }

    /// NSR as it was before the session started.
    pub const fn saved_nsr(&self) -> u16 {
        self.chain.saved_nsr
    }

    /// Move the chain past `count` neurons without capturing them.
    ///
    /// Each CAT read in save mode advances the chain by one neuron.
    pub fn skip(&mut self, count: usize) {
        for _ in 0..count {
            let _ = self.chain.pme.read(Register::Cat);
        }
    }

    /// Capture the neuron at the current chain position into `out`.
    ///
    /// The closing CAT read moves the chain to the next neuron. Returns the
    /// raw category read.
    pub fn iterate_neurons_to_save(&mut self, out: &mut NeuronRecord) -> u16 {
        let pme = &mut *self.chain.pme;
        out.context = pme.read(Register::Ncr);
        for component in &mut out.vector {
            *component = pme.read(Register::Comp);
        }
        out.influence = pme.read(Register::Aif);
        out.min_influence = pme.read(Register::Minif);
        out.category = pme.read(Register::Cat);
        out.category
    }

    /// Leave save mode and restore NSR. Dropping the session does the same.
    pub fn end(self) {}
}

/// Active restore mode. Created by [`Pme::begin_restore_mode`].
///
/// Entering restore mode forgets the network: restored neurons are
/// committed from the start of the chain.
#[derive(Debug)]
pub struct RestoreSession<'a, B: RegisterBus> {
    chain: ChainMode<'a, B>,
}

impl<'a, B: RegisterBus> RestoreSession<'a, B> {
    pub(crate) fn acquire(pme: &'a mut Pme<B>) -> Self {
        Self {
            chain: ChainMode::enter(pme, true),
        }
    }

    /// NSR as it was before the session started.
    pub const fn saved_nsr(&self) -> u16 {
        self.chain.saved_nsr
    }

    /// Commit `record` at the current chain position. Always returns 0.
    ///
    /// The closing CAT write commits the neuron and moves the chain on.
    pub fn iterate_neurons_to_restore(&mut self, record: &NeuronRecord) -> u16 {
        let pme = &mut *self.chain.pme;
        pme.write(Register::Ncr, record.context);
        for &component in &record.vector {
            pme.write(Register::Comp, component);
        }
        pme.write(Register::Aif, record.influence);
        pme.write(Register::Minif, record.min_influence);
        pme.write(Register::Cat, record.category);
        0
    }

    /// Leave restore mode and restore NSR. Dropping the session does the same.
    pub fn end(self) {}
}

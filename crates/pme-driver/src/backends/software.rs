// SPDX-License-Identifier: MIT

//! Software (virtual PME) transport
//!
//! Implements [`RegisterBus`] with a behavioural model of the engine's
//! register file, so the driver can be exercised without silicon:
//!
//! 1. **CI without hardware**: every driver test runs against this model.
//! 2. **Protocol checks**: the model keeps the same save/restore chain, firing
//!    list and commit counter the silicon exposes, so register sequences that
//!    work here exercise the same state transitions.
//! 3. **CLI dry runs**: `pme --backend software` trains and classifies
//!    in-process.
//!
//! ## Model
//!
//! ```text
//! normal mode
//!   COMP   → append component             LCOMP → append, run recognition
//!   IDX_DIST / NID / AIF → current firing neuron (0xFFFF when exhausted)
//!   CAT read  → current firing category, advance to next firing neuron
//!   CAT write → learn: shrink other-category firing neurons, commit if new
//!   FORGET_NCOUNT write → erase neurons; read → committed count
//!
//! save/restore mode (NSR.NET_MODE)
//!   RSTCHAIN → rewind chain
//!   NCR/COMP/AIF/MINIF read  → chain neuron fields, CAT read advances
//!   NCR/COMP/AIF/MINIF write → staged neuron, CAT write commits + advances
//! ```
//!
//! Distances are L1 (sum) or LSup (max) of absolute component differences
//! over the full 128-component width; unwritten components count as zero.
//! The model is not bit-exact with the silicon's learning rules: it commits
//! a neuron whenever no firing neuron already holds the taught category, with
//! an influence field of `min(MAXIF, nearest other-category distance)`
//! floored at MINIF.
//!
//! Teaching a vector that is already committed under another category leaves
//! both neurons degenerate at distance 0. Classifying that vector then
//! returns the lower category, since ties in the firing list are broken by
//! category.
//!
//! In restore mode a CAT write of category 0 advances the chain but commits
//! nothing, so such records are dropped and later records commit
//! contiguously.

use crate::bus::RegisterBus;
use pme_chip::network::{
    DistanceMode, DEFAULT_CONTEXT, DEFAULT_MAXIF, DEFAULT_MINIF, EXHAUSTED, MAX_NEURONS,
    MAX_VECTOR_SIZE, SAVE_RESTORE_SIZE,
};
use pme_chip::regs::{cat, gcr, ncr, nsr};
use pme_chip::{ClassificationMode, Register};
use tracing::{debug, trace};

/// One committed neuron in the model.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Neuron {
    /// Raw NCR value
    context: u16,
    /// Reference pattern (one byte per component, like the silicon)
    vector: [u8; SAVE_RESTORE_SIZE],
    /// Active influence field
    aif: u16,
    /// Minimum influence field
    minif: u16,
    /// Raw CAT value
    category: u16,
}

impl Neuron {
    const fn empty() -> Self {
        Self {
            context: 0,
            vector: [0; SAVE_RESTORE_SIZE],
            aif: 0,
            minif: 0,
            category: 0,
        }
    }
}

/// Entry of the firing list produced by recognition.
#[derive(Debug, Clone, Copy)]
struct Firing {
    /// Index into `neurons`
    index: usize,
    distance: u16,
}

/// Low byte of a register value: components are 8 bits wide.
const fn component(value: u16) -> u8 {
    value.to_le_bytes()[0]
}

/// Distance between two full-width patterns under `mode`.
fn distance(mode: DistanceMode, a: &[u8; SAVE_RESTORE_SIZE], b: &[u8; SAVE_RESTORE_SIZE]) -> u16 {
    let diffs = a.iter().zip(b).map(|(x, y)| u32::from(x.abs_diff(*y)));
    let d = match mode {
        DistanceMode::L1 => diffs.sum::<u32>(),
        DistanceMode::LSup => diffs.max().unwrap_or(0),
    };
    u16::try_from(d).unwrap_or(EXHAUSTED - 1)
}

/// Software (virtual PME) register transport.
#[derive(Debug, Clone)]
pub struct SoftwarePme {
    /// Committed neurons, in commit order
    neurons: Vec<Neuron>,

    // Global registers (normal mode)
    ncr: u16,
    gcr: u16,
    nsr: u16,
    minif: u16,
    maxif: u16,
    lcomp: u16,

    /// Components written since the last LCOMP
    input: [u8; MAX_VECTOR_SIZE],
    input_len: usize,
    /// Pattern closed by the last LCOMP (learn target)
    last_vector: [u8; SAVE_RESTORE_SIZE],

    /// Firing list from the last recognition, closest first
    firing: Vec<Firing>,
    cursor: usize,

    /// Save/restore chain position
    chain: usize,
    chain_comp: usize,
    staged: Neuron,

    /// Broadcast TESTCOMP writes seen
    test_writes: usize,
}

impl Default for SoftwarePme {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwarePme {
    /// Create a model in its power-on state: no neurons, context 1, L1,
    /// RBF, MINIF 2, MAXIF 0x4000.
    pub fn new() -> Self {
        Self {
            neurons: Vec::with_capacity(MAX_NEURONS),
            ncr: 0,
            gcr: DEFAULT_CONTEXT,
            nsr: 0,
            minif: DEFAULT_MINIF,
            maxif: DEFAULT_MAXIF,
            lcomp: 0,
            input: [0; MAX_VECTOR_SIZE],
            input_len: 0,
            last_vector: [0; SAVE_RESTORE_SIZE],
            firing: Vec::new(),
            cursor: 0,
            chain: 0,
            chain_comp: 0,
            staged: Neuron::empty(),
            test_writes: 0,
        }
    }

    /// Number of committed neurons.
    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    /// Number of TESTCOMP broadcast writes received.
    pub const fn test_writes(&self) -> usize {
        self.test_writes
    }

    /// True while NSR selects save/restore mode.
    pub const fn in_save_restore_mode(&self) -> bool {
        self.nsr & nsr::NET_MODE != 0
    }

    fn global_context(&self) -> u16 {
        self.gcr & gcr::GLOBAL
    }

    fn in_context(&self, neuron: &Neuron) -> bool {
        let context = self.global_context();
        context == 0 || neuron.context & ncr::CONTEXT == context
    }

    fn current(&self) -> Option<(&Firing, &Neuron)> {
        self.firing
            .get(self.cursor)
            .map(|f| (f, &self.neurons[f.index]))
    }

    fn chain_neuron(&self) -> Option<&Neuron> {
        self.neurons.get(self.chain)
    }

    // ── Normal mode ─────────────────────────────────────────────────────────

    fn push_component(&mut self, value: u16) {
        if self.input_len < MAX_VECTOR_SIZE {
            self.input[self.input_len] = component(value);
            self.input_len += 1;
        }
    }

    /// Close the streamed vector and build the firing list.
    fn recognize(&mut self) {
        self.last_vector = [0; SAVE_RESTORE_SIZE];
        self.last_vector[..self.input_len].copy_from_slice(&self.input[..self.input_len]);
        self.input_len = 0;

        let mode = DistanceMode::from_gcr(self.gcr);
        let knn = ClassificationMode::from_nsr(self.nsr) == ClassificationMode::Knn;

        let mut firing: Vec<Firing> = self
            .neurons
            .iter()
            .enumerate()
            .filter(|(_, n)| self.in_context(n))
            .map(|(index, n)| Firing {
                index,
                distance: distance(mode, &self.last_vector, &n.vector),
            })
            .filter(|f| knn || f.distance < self.neurons[f.index].aif)
            .collect();
        firing.sort_by_key(|f| (f.distance, self.neurons[f.index].category & cat::CATEGORY));

        trace!("SoftwarePme: {} neurons fired", firing.len());
        self.firing = firing;
        self.cursor = 0;
    }

    /// CAT write in normal mode.
    fn learn(&mut self, category: u16) {
        let category = category & cat::CATEGORY;
        let mode = DistanceMode::from_gcr(self.gcr);

        let mut recognized = false;
        for f in &self.firing {
            let n = &mut self.neurons[f.index];
            if f.distance >= n.aif {
                continue;
            }
            if category != 0 && n.category & cat::CATEGORY == category {
                recognized = true;
            } else {
                n.aif = f.distance;
                if n.aif < n.minif {
                    n.aif = n.minif;
                    n.category |= cat::DEGEN;
                }
            }
        }

        if category != 0 && !recognized && self.neurons.len() < MAX_NEURONS {
            let nearest_other = self
                .neurons
                .iter()
                .filter(|n| self.in_context(n) && n.category & cat::CATEGORY != category)
                .map(|n| distance(mode, &self.last_vector, &n.vector))
                .min();

            let mut aif = nearest_other.map_or(self.maxif, |d| d.min(self.maxif));
            let mut stored = category;
            if aif < self.minif {
                aif = self.minif;
                stored |= cat::DEGEN;
            }

            self.neurons.push(Neuron {
                context: self.global_context(),
                vector: self.last_vector,
                aif,
                minif: self.minif,
                category: stored,
            });
            debug!(
                "SoftwarePme: committed neuron {} category {category} aif {aif}",
                self.neurons.len()
            );
        }

        self.firing.clear();
        self.cursor = 0;
    }

    fn forget(&mut self) {
        self.neurons.clear();
        self.firing.clear();
        self.cursor = 0;
        debug!("SoftwarePme: network forgotten");
    }

    // ── Save / restore mode ─────────────────────────────────────────────────

    fn rewind_chain(&mut self) {
        self.chain = 0;
        self.chain_comp = 0;
        self.staged = Neuron::empty();
    }

    fn advance_chain(&mut self) {
        if self.chain < MAX_NEURONS {
            self.chain += 1;
        }
        self.chain_comp = 0;
    }

    /// Category 0 records are dropped; the chain still advances.
    fn commit_staged(&mut self, category: u16) {
        let mut neuron = std::mem::replace(&mut self.staged, Neuron::empty());
        neuron.category = category;

        if category & cat::CATEGORY != 0 {
            if self.chain < self.neurons.len() {
                self.neurons[self.chain] = neuron;
            } else if self.neurons.len() < MAX_NEURONS {
                self.neurons.push(neuron);
            }
        }
        self.advance_chain();
    }

    fn read_chain(&mut self, reg: Register) -> u16 {
        match reg {
            Register::Ncr => self.chain_neuron().map_or(0, |n| n.context),
            Register::Comp => {
                let value = self
                    .chain_neuron()
                    .and_then(|n| n.vector.get(self.chain_comp))
                    .map_or(0, |&c| u16::from(c));
                self.chain_comp += 1;
                value
            }
            Register::Aif => self.chain_neuron().map_or(0, |n| n.aif),
            Register::Minif => self.chain_neuron().map_or(0, |n| n.minif),
            Register::Cat => {
                let value = self.chain_neuron().map_or(0, |n| n.category);
                self.advance_chain();
                value
            }
            Register::Nid => u16::try_from(self.chain + 1).unwrap_or(EXHAUSTED),
            _ => self.read_global(reg),
        }
    }

    fn write_chain(&mut self, reg: Register, value: u16) {
        match reg {
            Register::Ncr => self.staged.context = value,
            Register::Comp => {
                if let Some(slot) = self.staged.vector.get_mut(self.chain_comp) {
                    *slot = component(value);
                }
                self.chain_comp += 1;
            }
            Register::Aif => self.staged.aif = value,
            Register::Minif => self.staged.minif = value,
            Register::Cat => self.commit_staged(value),
            _ => self.write_global(reg, value),
        }
    }

    // ── Registers that behave the same in both modes ────────────────────────

    fn read_global(&mut self, reg: Register) -> u16 {
        match reg {
            Register::Ncr => self.ncr,
            Register::Lcomp => self.lcomp,
            Register::Minif => self.minif,
            Register::Maxif => self.maxif,
            Register::Gcr => self.gcr,
            Register::Nsr => self.nsr,
            Register::ForgetNcount => u16::try_from(self.neurons.len()).unwrap_or(EXHAUSTED),
            Register::IdxDist if !self.in_save_restore_mode() => {
                self.current().map_or(EXHAUSTED, |(f, _)| f.distance)
            }
            Register::Aif if !self.in_save_restore_mode() => {
                self.current().map_or(EXHAUSTED, |(_, n)| n.aif)
            }
            Register::Nid if !self.in_save_restore_mode() => self
                .current()
                .map_or(EXHAUSTED, |(f, _)| u16::try_from(f.index + 1).unwrap_or(EXHAUSTED)),
            Register::Cat if !self.in_save_restore_mode() => {
                let value = self.current().map_or(EXHAUSTED, |(_, n)| n.category);
                if self.cursor < self.firing.len() {
                    self.cursor += 1;
                }
                value
            }
            _ => 0,
        }
    }

    fn write_global(&mut self, reg: Register, value: u16) {
        match reg {
            Register::Ncr => self.ncr = value,
            Register::Minif => self.minif = value,
            Register::Maxif => self.maxif = value,
            Register::Gcr => self.gcr = value,
            Register::Nsr => self.nsr = value,
            Register::RstChain => self.rewind_chain(),
            Register::ForgetNcount => self.forget(),
            Register::TestComp => self.test_writes += 1,
            Register::Comp if !self.in_save_restore_mode() => self.push_component(value),
            Register::Lcomp if !self.in_save_restore_mode() => {
                self.push_component(value);
                self.lcomp = value;
                self.recognize();
            }
            Register::Cat if !self.in_save_restore_mode() => self.learn(value),
            _ => {}
        }
    }
}

impl RegisterBus for SoftwarePme {
    fn read16(&mut self, reg: Register) -> u16 {
        if self.in_save_restore_mode() {
            self.read_chain(reg)
        } else {
            self.read_global(reg)
        }
    }

    fn write16(&mut self, reg: Register, value: u16) {
        if self.in_save_restore_mode() {
            self.write_chain(reg, value);
        } else {
            self.write_global(reg, value);
        }
    }
}

//! Register Interface Driver
//!
//! [`Pme`] owns one register transport and turns register reads and writes
//! into network operations: reset, configuration, learning, classification
//! and per-neuron state transfer.
//!
//! # Failure signalling
//!
//! The engine has no error registers, so the driver keeps its historical
//! conventions:
//!
//! - `learn` silently clamps over-long vectors to [`MAX_VECTOR_SIZE`]
//! - `read_neuron` silently clamps ids into `[1, 128]`
//! - `classify` and `write_vector` return [`VECTOR_OVERFLOW`] for over-long
//!   vectors without touching the device
//!
//! [`Pme::try_classify`] offers a checked alternative.
//!
//! # Concurrency
//!
//! Every operation takes `&mut self`. Learn, classify and save/restore are
//! multi-register sequences that the engine treats as atomic; share a driver
//! between threads only behind a `Mutex` held across the whole sequence.

use crate::bus::RegisterBus;
use crate::config::PmeConfig;
use crate::error::{PmeError, Result};
use crate::fields::{field, with_field, with_flag};
use crate::neuron::NeuronRecord;
use crate::session::{RestoreSession, SaveSession};
use pme_chip::network::{clamp_neuron_id, EXHAUSTED, MAX_NEURONS, MAX_VECTOR_SIZE};
use pme_chip::regs::{cat, gcr, ncount, ncr, nsr};
use pme_chip::{ClassificationMode, DistanceMode, Register};
use tracing::{debug, info};

/// Returned by `classify` / `write_vector` when the vector is too long.
///
/// This is `-1` as an unsigned 16-bit value. Its low 15 bits equal the
/// engine's "no match" category, so callers can only tell the two apart by
/// knowing what they submitted.
pub const VECTOR_OVERFLOW: u16 = u16::MAX;

/// One entry of the firing list read back after [`Pme::write_vector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    /// Distance between the submitted vector and the neuron
    pub distance: u16,
    /// Neuron category (degenerate flag stripped)
    pub category: u16,
}

/// Driver for one Pattern Matching Engine.
#[derive(Debug)]
pub struct Pme<B: RegisterBus> {
    bus: B,
}

impl<B: RegisterBus> Pme<B> {
    /// Wrap a register transport. No register is touched until
    /// [`begin`](Self::begin) or another operation is called.
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Release the transport.
    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Borrow the transport.
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Borrow the transport mutably.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub(crate) fn read(&mut self, reg: Register) -> u16 {
        self.bus.read16(reg)
    }

    pub(crate) fn write(&mut self, reg: Register, value: u16) {
        self.bus.write16(reg, value);
    }

    // ── Initialisation ──────────────────────────────────────────────────────

    /// Reset the network to a known state.
    ///
    /// Forgets every committed neuron, clears the per-neuron test registers
    /// and puts NSR back the way it was found.
    pub fn begin(&mut self) {
        let saved_nsr = self.read(Register::Nsr);
        self.forget();

        self.write(Register::Nsr, nsr::NET_MODE);
        for _ in 0..MAX_NEURONS {
            self.write(Register::TestComp, 0);
        }
        self.write(Register::TestCat, 0);
        self.write(Register::Nsr, saved_nsr);

        debug!("PME reset (NSR restored to {saved_nsr:#06x})");
    }

    /// Reset the network, then apply `config`.
    pub fn begin_with(&mut self, config: &PmeConfig) {
        self.begin();
        self.configure(config);
    }

    /// Write context, distance mode, classifier mode and influence bounds.
    ///
    /// The classifier mode is OR'd into NSR, so a bit already set stays set.
    /// Use [`set_classifier_mode`](Self::set_classifier_mode) to clear it.
    pub fn configure(&mut self, config: &PmeConfig) {
        self.write(Register::Gcr, config.gcr_value());
        let nsr_value = self.read(Register::Nsr) | config.classification_mode.nsr_bits();
        self.write(Register::Nsr, nsr_value);
        self.write(Register::Minif, config.min_aif);
        self.write(Register::Maxif, config.max_aif);

        info!(
            "PME configured: context={} distance={:?} mode={:?} aif=[{}, {}]",
            config.global_context,
            config.distance_mode,
            config.classification_mode,
            config.min_aif,
            config.max_aif
        );
    }

    /// Erase every committed neuron. Configuration is left intact.
    pub fn forget(&mut self) {
        self.write(Register::ForgetNcount, 0);
    }

    // ── Learn and classify ──────────────────────────────────────────────────

    /// Stream `pattern` into COMP/LCOMP. The LCOMP write starts recognition.
    fn stream(&mut self, pattern: &[u8]) {
        if let Some((last, head)) = pattern.split_last() {
            for &component in head {
                self.write(Register::Comp, u16::from(component));
            }
            self.write(Register::Lcomp, u16::from(*last));
        }
    }

    /// Teach `pattern` as an example of `category`.
    ///
    /// Vectors longer than [`MAX_VECTOR_SIZE`] are truncated before anything
    /// is written. Only the low 15 bits of `category` are used; the
    /// degenerate flag already in CAT is written back unchanged.
    ///
    /// Returns the raw FORGET_NCOUNT value after the commit.
    pub fn learn(&mut self, pattern: &[u8], category: u16) -> u16 {
        if pattern.len() > MAX_VECTOR_SIZE {
            debug!(
                "learn: clamping {} components to {MAX_VECTOR_SIZE}",
                pattern.len()
            );
        }
        let pattern = &pattern[..pattern.len().min(MAX_VECTOR_SIZE)];

        if pattern.is_empty() {
            return self.read(Register::ForgetNcount);
        }

        self.stream(pattern);
        let current = self.read(Register::Cat);
        self.write(Register::Cat, with_field(current, cat::CATEGORY, category));

        let count = self.read(Register::ForgetNcount);
        debug!(
            "learn: {} components as category {}, {count} committed",
            pattern.len(),
            category & cat::CATEGORY
        );
        count
    }

    /// Classify `pattern` and return the winning category.
    ///
    /// Returns [`VECTOR_OVERFLOW`] without touching the device when the
    /// vector is longer than [`MAX_VECTOR_SIZE`] or empty. When no neuron
    /// fires the engine reports `0x7FFF`.
    pub fn classify(&mut self, pattern: &[u8]) -> u16 {
        if pattern.len() > MAX_VECTOR_SIZE || pattern.is_empty() {
            return VECTOR_OVERFLOW;
        }

        self.stream(pattern);
        let category = self.read(Register::Cat) & cat::CATEGORY;
        debug!("classify: {} components -> {category}", pattern.len());
        category
    }

    /// Checked [`classify`](Self::classify).
    ///
    /// # Errors
    ///
    /// Returns [`PmeError::VectorTooLong`] if `pattern` is longer than
    /// [`MAX_VECTOR_SIZE`], or [`PmeError::EmptyVector`] if it is empty.
    pub fn try_classify(&mut self, pattern: &[u8]) -> Result<u16> {
        Self::check_length(pattern)?;
        Ok(self.classify(pattern))
    }

    fn check_length(pattern: &[u8]) -> Result<()> {
        if pattern.is_empty() || pattern.len() > MAX_VECTOR_SIZE {
            return Err(PmeError::vector_length(pattern.len(), MAX_VECTOR_SIZE));
        }
        Ok(())
    }

    /// Submit `pattern` for comparison without reading CAT.
    ///
    /// The firing list stays at its first entry so the caller can inspect
    /// IDX_DIST, CAT and NID itself (kNN-style decisions). Returns 0, or
    /// [`VECTOR_OVERFLOW`] for an over-long or empty vector.
    pub fn write_vector(&mut self, pattern: &[u8]) -> u16 {
        if pattern.len() > MAX_VECTOR_SIZE || pattern.is_empty() {
            return VECTOR_OVERFLOW;
        }

        self.stream(pattern);
        0
    }

    /// Submit `pattern` and read back up to `k` firing neurons, closest first.
    ///
    /// Each CAT read moves the engine to the next firing neuron; the walk
    /// stops early when IDX_DIST reports the list is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`PmeError::VectorTooLong`] if `pattern` is longer than
    /// [`MAX_VECTOR_SIZE`], or [`PmeError::EmptyVector`] if it is empty.
    pub fn nearest_neighbors(&mut self, pattern: &[u8], k: usize) -> Result<Vec<Neighbor>> {
        Self::check_length(pattern)?;

        self.write_vector(pattern);
        let mut neighbors = Vec::with_capacity(k.min(MAX_NEURONS));
        for _ in 0..k {
            let distance = self.read(Register::IdxDist);
            if distance == EXHAUSTED {
                break;
            }
            let category = self.read(Register::Cat) & cat::CATEGORY;
            neighbors.push(Neighbor { distance, category });
        }
        Ok(neighbors)
    }

    // ── Neuron state ────────────────────────────────────────────────────────

    /// Copy the state of neuron `neuron_id` (1-based) into `out`.
    ///
    /// Ids outside `[1, 128]` are clamped to the nearest bound before any
    /// chain access. Always returns 0.
    pub fn read_neuron(&mut self, neuron_id: usize, out: &mut NeuronRecord) -> u16 {
        let id = clamp_neuron_id(neuron_id);

        let mut session = self.begin_save_mode();
        session.skip(id - 1);
        session.iterate_neurons_to_save(out);
        session.end();

        debug!("read_neuron: id {id} category {}", out.category_id());
        0
    }

    /// Enter save mode: the chain is rewound and each CAT read walks it.
    ///
    /// NSR is restored when the returned session is ended or dropped.
    pub fn begin_save_mode(&mut self) -> SaveSession<'_, B> {
        SaveSession::acquire(self)
    }

    /// Forget the network and enter restore mode.
    ///
    /// NSR is restored when the returned session is ended or dropped.
    pub fn begin_restore_mode(&mut self) -> RestoreSession<'_, B> {
        RestoreSession::acquire(self)
    }

    /// Read every committed neuron, in commit order.
    pub fn save_knowledge(&mut self) -> Vec<NeuronRecord> {
        let count = usize::from(self.committed_count()).min(MAX_NEURONS);

        let mut session = self.begin_save_mode();
        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            let mut record = NeuronRecord::default();
            session.iterate_neurons_to_save(&mut record);
            records.push(record);
        }
        session.end();

        info!("Saved {} neurons", records.len());
        records
    }

    /// Replace the network with `records`. Returns the number restored.
    ///
    /// # Errors
    ///
    /// Returns [`PmeError::TooManyNeurons`] if `records` exceeds the neuron
    /// count of the engine. The device is not touched in that case.
    pub fn restore_knowledge(&mut self, records: &[NeuronRecord]) -> Result<usize> {
        if records.len() > MAX_NEURONS {
            return Err(PmeError::TooManyNeurons {
                count: records.len(),
                max: MAX_NEURONS,
            });
        }

        let mut session = self.begin_restore_mode();
        for record in records {
            session.iterate_neurons_to_restore(record);
        }
        session.end();

        info!("Restored {} neurons", records.len());
        Ok(records.len())
    }

    // ── Mode accessors ──────────────────────────────────────────────────────

    /// Distance norm selected in GCR.
    pub fn distance_mode(&mut self) -> DistanceMode {
        DistanceMode::from_gcr(self.read(Register::Gcr))
    }

    /// Select the distance norm, preserving the rest of GCR.
    pub fn set_distance_mode(&mut self, mode: DistanceMode) {
        let value = self.read(Register::Gcr);
        self.write(
            Register::Gcr,
            with_flag(value, gcr::DIST, mode == DistanceMode::LSup),
        );
    }

    /// Global context (GCR bits 0–6).
    pub fn global_context(&mut self) -> u16 {
        field(self.read(Register::Gcr), gcr::GLOBAL)
    }

    /// Set the global context (valid range 1–127, not checked).
    pub fn set_global_context(&mut self, context: u16) {
        let value = self.read(Register::Gcr);
        self.write(Register::Gcr, with_field(value, gcr::GLOBAL, context));
    }

    /// Neuron context (NCR bits 0–6).
    pub fn neuron_context(&mut self) -> u16 {
        field(self.read(Register::Ncr), ncr::CONTEXT)
    }

    /// Set the neuron context (valid range 1–127, not checked).
    pub fn set_neuron_context(&mut self, context: u16) {
        let value = self.read(Register::Ncr);
        self.write(Register::Ncr, with_field(value, ncr::CONTEXT, context));
    }

    /// Classifier strategy selected in NSR.
    pub fn classifier_mode(&mut self) -> ClassificationMode {
        ClassificationMode::from_nsr(self.read(Register::Nsr))
    }

    /// Select the classifier strategy, preserving the rest of NSR.
    pub fn set_classifier_mode(&mut self, mode: ClassificationMode) {
        let value = self.read(Register::Nsr);
        self.write(
            Register::Nsr,
            with_flag(value, nsr::CLASS_MODE, mode == ClassificationMode::Knn),
        );
    }

    /// Number of committed neurons (low 8 bits of FORGET_NCOUNT).
    ///
    /// Only meaningful in normal mode. A save or restore session holds the
    /// driver's exclusive borrow, so it cannot be called from inside one.
    pub fn committed_count(&mut self) -> u16 {
        self.read(Register::ForgetNcount) & ncount::COUNT
    }

    // ── Raw registers ───────────────────────────────────────────────────────

    /// Raw NCR.
    pub fn ncr(&mut self) -> u16 {
        self.read(Register::Ncr)
    }

    /// Raw COMP.
    pub fn comp(&mut self) -> u16 {
        self.read(Register::Comp)
    }

    /// Raw LCOMP.
    pub fn lcomp(&mut self) -> u16 {
        self.read(Register::Lcomp)
    }

    /// Raw IDX_DIST.
    pub fn idx_dist(&mut self) -> u16 {
        self.read(Register::IdxDist)
    }

    /// Raw CAT. In normal mode this advances the firing list.
    pub fn cat(&mut self) -> u16 {
        self.read(Register::Cat)
    }

    /// Raw AIF.
    pub fn aif(&mut self) -> u16 {
        self.read(Register::Aif)
    }

    /// Raw MINIF.
    pub fn minif(&mut self) -> u16 {
        self.read(Register::Minif)
    }

    /// Raw MAXIF.
    pub fn maxif(&mut self) -> u16 {
        self.read(Register::Maxif)
    }

    /// Raw NID.
    pub fn nid(&mut self) -> u16 {
        self.read(Register::Nid)
    }

    /// Raw GCR.
    pub fn gcr(&mut self) -> u16 {
        self.read(Register::Gcr)
    }

    /// Raw RSTCHAIN.
    pub fn rstchain(&mut self) -> u16 {
        self.read(Register::RstChain)
    }

    /// Raw NSR.
    pub fn nsr(&mut self) -> u16 {
        self.read(Register::Nsr)
    }

    /// Raw FORGET_NCOUNT.
    pub fn forget_ncount(&mut self) -> u16 {
        self.read(Register::ForgetNcount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{Access, RecordingBus, SoftwarePme};

    fn recorded() -> Pme<RecordingBus<SoftwarePme>> {
        Pme::new(RecordingBus::new(SoftwarePme::new()))
    }

    #[test]
    fn begin_sequence() {
        let mut pme = recorded();
        pme.bus_mut().write16(Register::Nsr, nsr::CLASS_MODE);
        pme.bus_mut().clear();

        pme.begin();

        let log = pme.bus().log();
        assert_eq!(log[0], Access::read(Register::Nsr, nsr::CLASS_MODE));
        assert_eq!(log[1], Access::write(Register::ForgetNcount, 0));
        assert_eq!(log[2], Access::write(Register::Nsr, nsr::NET_MODE));
        assert_eq!(pme.bus().writes_to(Register::TestComp), MAX_NEURONS);
        assert_eq!(pme.bus().writes_to(Register::TestCat), 1);
        assert_eq!(log[log.len() - 2], Access::write(Register::TestCat, 0));
        assert_eq!(
            log.last(),
            Some(&Access::write(Register::Nsr, nsr::CLASS_MODE))
        );
        assert_eq!(pme.bus().inner().test_writes(), MAX_NEURONS);
    }

    #[test]
    fn configure_ors_classifier_mode() {
        let mut pme = recorded();
        pme.bus_mut().write16(Register::Nsr, 0x0004);
        let config = PmeConfig::default()
            .with_context(3)
            .with_distance_mode(DistanceMode::LSup)
            .with_classification_mode(ClassificationMode::Knn)
            .with_influence(5, 900);
        pme.configure(&config);

        assert_eq!(pme.gcr(), 0x0083);
        assert_eq!(pme.nsr(), 0x0024);
        assert_eq!(pme.minif(), 5);
        assert_eq!(pme.maxif(), 900);
    }

    #[test]
    fn learn_writes_components_then_category() {
        let mut pme = recorded();
        pme.begin();
        pme.bus_mut().clear();

        let count = pme.learn(&[10, 20, 30], 7);
        assert_eq!(count, 1);

        let writes: Vec<_> = pme.bus().log().iter().filter(|a| a.is_write()).copied().collect();
        assert_eq!(writes[0], Access::write(Register::Comp, 10));
        assert_eq!(writes[1], Access::write(Register::Comp, 20));
        assert_eq!(writes[2], Access::write(Register::Lcomp, 30));
        assert_eq!(writes[3].register, Register::Cat);
        assert_eq!(writes[3].value & cat::CATEGORY, 7);
    }

    #[test]
    fn learn_masks_category_to_fifteen_bits() {
        let mut pme = Pme::new(SoftwarePme::new());
        pme.begin();
        pme.learn(&[1, 2, 3], 0x8005);
        assert_eq!(pme.classify(&[1, 2, 3]), 5);
    }

    #[test]
    fn classify_overflow_is_sentinel_and_silent() {
        let mut pme = recorded();
        pme.bus_mut().clear();
        let long = vec![1u8; MAX_VECTOR_SIZE + 1];

        assert_eq!(pme.classify(&long), VECTOR_OVERFLOW);
        assert_eq!(pme.write_vector(&long), VECTOR_OVERFLOW);
        assert!(pme.bus().log().is_empty());
        assert!(matches!(
            pme.try_classify(&long),
            Err(PmeError::VectorTooLong { len: 129, max: 128 })
        ));
    }

    #[test]
    fn empty_patterns() {
        let mut pme = recorded();
        pme.begin();
        pme.bus_mut().clear();

        assert_eq!(pme.learn(&[], 3), 0);
        assert_eq!(pme.bus().writes_to(Register::Cat), 0);
        assert_eq!(pme.classify(&[]), VECTOR_OVERFLOW);
        assert_eq!(pme.write_vector(&[]), VECTOR_OVERFLOW);
        assert!(pme.bus().log().iter().all(|a| a.register == Register::ForgetNcount));
    }

    #[test]
    fn checked_apis_reject_empty_pattern() {
        let mut pme = recorded();
        pme.begin();
        pme.learn(&[1, 2], 3);
        pme.bus_mut().clear();

        let err = pme.try_classify(&[]).unwrap_err();
        assert!(matches!(err, PmeError::EmptyVector));
        assert_eq!(err.to_string(), "Vector has no components");
        assert!(matches!(
            pme.nearest_neighbors(&[], 3),
            Err(PmeError::EmptyVector)
        ));
        assert!(pme.bus().log().is_empty());
    }

    #[test]
    fn write_vector_never_reads_cat() {
        let mut pme = recorded();
        pme.begin();
        pme.learn(&[4, 4, 4], 2);
        pme.bus_mut().clear();

        assert_eq!(pme.write_vector(&[4, 4, 4]), 0);
        assert_eq!(pme.bus().reads_of(Register::Cat), 0);
        assert_eq!(pme.bus().writes_to(Register::Lcomp), 1);
    }

    #[test]
    fn read_neuron_clamps_low_id() {
        let mut pme = recorded();
        pme.begin();
        pme.learn(&[9, 9], 4);
        pme.bus_mut().clear();

        let mut record = NeuronRecord::default();
        assert_eq!(pme.read_neuron(0, &mut record), 0);
        // Only the CAT read inside the record capture, no chain advance.
        assert_eq!(pme.bus().reads_of(Register::Cat), 1);
        assert_eq!(record.category_id(), 4);
    }

    #[test]
    fn mode_accessors_preserve_other_bits() {
        let mut pme = Pme::new(SoftwarePme::new());
        pme.set_global_context(0x15);
        pme.set_distance_mode(DistanceMode::LSup);
        assert_eq!(pme.global_context(), 0x15);
        assert_eq!(pme.distance_mode(), DistanceMode::LSup);

        pme.set_distance_mode(DistanceMode::L1);
        assert_eq!(pme.global_context(), 0x15);

        pme.set_classifier_mode(ClassificationMode::Knn);
        assert_eq!(pme.classifier_mode(), ClassificationMode::Knn);
        pme.set_classifier_mode(ClassificationMode::Rbf);
        assert_eq!(pme.classifier_mode(), ClassificationMode::Rbf);

        pme.set_neuron_context(0x1FF);
        assert_eq!(pme.neuron_context(), 0x7F);
    }

    #[test]
    fn committed_count_masks_low_byte() {
        let mut pme = Pme::new(SoftwarePme::new());
        pme.begin();
        pme.learn(&[1], 1);
        pme.learn(&[200], 2);
        assert_eq!(pme.committed_count(), 2);
    }
}

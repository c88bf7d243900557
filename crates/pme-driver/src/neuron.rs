//! Neuron state as transferred over the save/restore chain

use pme_chip::network::SAVE_RESTORE_SIZE;
use pme_chip::regs::{cat, ncr};

/// One committed neuron's learned state.
///
/// Filled in place by [`SaveSession::iterate_neurons_to_save`] and consumed
/// by [`RestoreSession::iterate_neurons_to_restore`].
///
/// [`SaveSession::iterate_neurons_to_save`]: crate::SaveSession::iterate_neurons_to_save
/// [`RestoreSession::iterate_neurons_to_restore`]: crate::RestoreSession::iterate_neurons_to_restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeuronRecord {
    /// Raw NCR value (context in the low 7 bits)
    pub context: u16,
    /// Reference pattern, one register value per component
    pub vector: [u16; SAVE_RESTORE_SIZE],
    /// Active influence field
    pub influence: u16,
    /// Minimum influence field
    pub min_influence: u16,
    /// Raw CAT value (category id + degenerate flag)
    pub category: u16,
}

impl Default for NeuronRecord {
    fn default() -> Self {
        Self {
            context: 0,
            vector: [0; SAVE_RESTORE_SIZE],
            influence: 0,
            min_influence: 0,
            category: 0,
        }
    }
}

impl NeuronRecord {
    /// Category id without the degenerate flag.
    #[must_use]
    pub const fn category_id(&self) -> u16 {
        self.category & cat::CATEGORY
    }

    /// True when the neuron's influence field was clamped at its minimum.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.category & cat::DEGEN != 0
    }

    /// Context id without the id / substitute bits.
    #[must_use]
    pub const fn context_id(&self) -> u16 {
        self.context & ncr::CONTEXT
    }

    /// True when the record holds a committed neuron.
    ///
    /// An uncommitted slot reads back category 0; a read past the end of the
    /// firing logic reads back `0x7FFF`.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        let id = self.category_id();
        id != 0 && id != cat::CATEGORY
    }

    /// Build a record from a byte pattern, zero-padding to the full width.
    #[must_use]
    pub fn from_pattern(
        context: u16,
        pattern: &[u8],
        influence: u16,
        min_influence: u16,
        category: u16,
    ) -> Self {
        let mut vector = [0u16; SAVE_RESTORE_SIZE];
        for (slot, &c) in vector.iter_mut().zip(pattern) {
            *slot = u16::from(c);
        }
        Self {
            context,
            vector,
            influence,
            min_influence,
            category,
        }
    }
}

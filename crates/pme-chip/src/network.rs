//! Neuron network geometry and mode encodings.
//!
//! The engine holds 128 neurons of 128 one-byte components each. Neurons are
//! committed in order and addressed 1-based; the save/restore chain walks
//! them in commit order.

use crate::regs::{cat, gcr, nsr};

/// Longest vector accepted by learn / classify.
pub const MAX_VECTOR_SIZE: usize = 128;

/// Components transferred per neuron during save/restore.
pub const SAVE_RESTORE_SIZE: usize = 128;

/// Number of neurons on the die.
pub const MAX_NEURONS: usize = 128;

/// First valid neuron id.
pub const FIRST_NEURON_ID: usize = 1;

/// Last valid neuron id.
pub const LAST_NEURON_ID: usize = 128;

/// Smallest valid category.
pub const MIN_CATEGORY: u16 = 1;

/// Largest valid category. `0x7FFF` is the "no match" value of CAT.
pub const MAX_CATEGORY: u16 = 32766;

/// Category field value read back when no neuron fired.
pub const NO_MATCH: u16 = cat::CATEGORY;

/// Raw value of IDX_DIST / CAT / NID once the firing list is exhausted.
pub const EXHAUSTED: u16 = 0xFFFF;

/// Power-on minimum influence field.
pub const DEFAULT_MINIF: u16 = 2;

/// Power-on maximum influence field.
pub const DEFAULT_MAXIF: u16 = 0x4000;

/// Power-on global context.
pub const DEFAULT_CONTEXT: u16 = 1;

/// Distance norm used when comparing a vector against neurons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum DistanceMode {
    /// Sum of absolute component differences.
    #[default]
    L1 = 0,
    /// Largest absolute component difference.
    LSup = 1,
}

impl DistanceMode {
    /// Encoded value before shifting into GCR.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// Value of this mode positioned in GCR.
    #[must_use]
    pub const fn gcr_bits(self) -> u16 {
        self.bits() << gcr::DIST_SHIFT
    }

    /// Decode from a raw GCR value.
    #[must_use]
    pub const fn from_gcr(gcr_value: u16) -> Self {
        if gcr_value & gcr::DIST != 0 {
            Self::LSup
        } else {
            Self::L1
        }
    }
}

/// Classifier strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum ClassificationMode {
    /// Radial basis function: a neuron fires only inside its influence field.
    #[default]
    Rbf = 0,
    /// K-nearest neighbour: every neuron in context fires.
    Knn = 1,
}

impl ClassificationMode {
    /// Encoded value before shifting into NSR.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// Value of this mode positioned in NSR.
    #[must_use]
    pub const fn nsr_bits(self) -> u16 {
        self.bits() << nsr::CLASS_MODE_SHIFT
    }

    /// Decode from a raw NSR value.
    #[must_use]
    pub const fn from_nsr(nsr_value: u16) -> Self {
        if nsr_value & nsr::CLASS_MODE != 0 {
            Self::Knn
        } else {
            Self::Rbf
        }
    }
}

/// Clamp a neuron id into `[FIRST_NEURON_ID, LAST_NEURON_ID]`.
#[must_use]
pub const fn clamp_neuron_id(id: usize) -> usize {
    if id < FIRST_NEURON_ID {
        FIRST_NEURON_ID
    } else if id > LAST_NEURON_ID {
        LAST_NEURON_ID
    } else {
        id
    }
}

/// True when `category` is a learnable category id.
#[must_use]
pub const fn is_valid_category(category: u16) -> bool {
    category >= MIN_CATEGORY && category <= MAX_CATEGORY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_encodings_round_trip() {
        assert_eq!(DistanceMode::from_gcr(DistanceMode::LSup.gcr_bits()), DistanceMode::LSup);
        assert_eq!(DistanceMode::from_gcr(0x007F), DistanceMode::L1);
        assert_eq!(ClassificationMode::Knn.nsr_bits(), 0x0020);
        assert_eq!(ClassificationMode::from_nsr(0x0010), ClassificationMode::Rbf);
    }

    #[test]
    fn neuron_ids_clamp_to_range() {
        assert_eq!(clamp_neuron_id(0), 1);
        assert_eq!(clamp_neuron_id(64), 64);
        assert_eq!(clamp_neuron_id(500), 128);
    }

    #[test]
    fn category_bounds() {
        assert!(!is_valid_category(0));
        assert!(is_valid_category(1));
        assert!(is_valid_category(32766));
        assert!(!is_valid_category(NO_MATCH));
    }
}

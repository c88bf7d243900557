//! PME register map.
//!
//! All offsets are byte offsets from [`crate::map::BASE_ADDR`]. Every register
//! occupies a 32-bit slot on the bus, but only the low 16 bits carry data.
//!
//! ```text
//! 0x00 NCR            neuron context (+ neuron id in save/restore mode)
//! 0x04 COMP           component stream
//! 0x08 LCOMP          last component, starts recognition
//! 0x0C IDX_DIST       distance of the current firing neuron
//! 0x10 CAT            category of the current firing neuron / learn trigger
//! 0x14 AIF            active influence field
//! 0x18 MINIF          minimum influence field
//! 0x1C MAXIF          maximum influence field
//! 0x20 TESTCOMP       broadcast component write (test / reset)
//! 0x24 TESTCAT        broadcast category write (test / reset)
//! 0x28 NID            id of the current firing neuron
//! 0x2C GCR            global context + distance mode
//! 0x30 RSTCHAIN       rewind the save/restore chain
//! 0x34 NSR            network status: classifier mode, network mode
//! 0x3C FORGET_NCOUNT  write: forget; read: committed neuron count
//! ```

// ── Register offsets ─────────────────────────────────────────────────────────

/// Neuron Context Register.
pub const NCR: usize = 0x00;
/// Component register. Writes stream one vector component each.
pub const COMP: usize = 0x04;
/// Last Component register. Writing it closes the vector and runs recognition.
pub const LCOMP: usize = 0x08;
/// Index / distance of the current firing neuron.
pub const IDX_DIST: usize = 0x0C;
/// Category register.
pub const CAT: usize = 0x10;
/// Active Influence Field.
pub const AIF: usize = 0x14;
/// Minimum Influence Field.
pub const MINIF: usize = 0x18;
/// Maximum Influence Field.
pub const MAXIF: usize = 0x1C;
/// Test component register (broadcast to every neuron).
pub const TESTCOMP: usize = 0x20;
/// Test category register (broadcast to every neuron).
pub const TESTCAT: usize = 0x24;
/// Neuron ID register.
pub const NID: usize = 0x28;
/// Global Control Register.
pub const GCR: usize = 0x2C;
/// Reset Chain register. Any write rewinds the save/restore chain to neuron 0.
pub const RSTCHAIN: usize = 0x30;
/// Network Status Register.
pub const NSR: usize = 0x34;
/// Forget / neuron count register.
pub const FORGET_NCOUNT: usize = 0x3C;

/// Typed register name.
///
/// Transports take a `Register` rather than a bare offset so that only
/// addresses that exist on the silicon can be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Register {
    /// [`NCR`]
    Ncr,
    /// [`COMP`]
    Comp,
    /// [`LCOMP`]
    Lcomp,
    /// [`IDX_DIST`]
    IdxDist,
    /// [`CAT`]
    Cat,
    /// [`AIF`]
    Aif,
    /// [`MINIF`]
    Minif,
    /// [`MAXIF`]
    Maxif,
    /// [`TESTCOMP`]
    TestComp,
    /// [`TESTCAT`]
    TestCat,
    /// [`NID`]
    Nid,
    /// [`GCR`]
    Gcr,
    /// [`RSTCHAIN`]
    RstChain,
    /// [`NSR`]
    Nsr,
    /// [`FORGET_NCOUNT`]
    ForgetNcount,
}

impl Register {
    /// Every register, in address order.
    pub const ALL: [Self; 15] = [
        Self::Ncr,
        Self::Comp,
        Self::Lcomp,
        Self::IdxDist,
        Self::Cat,
        Self::Aif,
        Self::Minif,
        Self::Maxif,
        Self::TestComp,
        Self::TestCat,
        Self::Nid,
        Self::Gcr,
        Self::RstChain,
        Self::Nsr,
        Self::ForgetNcount,
    ];

    /// Byte offset from the PME base address.
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Self::Ncr => NCR,
            Self::Comp => COMP,
            Self::Lcomp => LCOMP,
            Self::IdxDist => IDX_DIST,
            Self::Cat => CAT,
            Self::Aif => AIF,
            Self::Minif => MINIF,
            Self::Maxif => MAXIF,
            Self::TestComp => TESTCOMP,
            Self::TestCat => TESTCAT,
            Self::Nid => NID,
            Self::Gcr => GCR,
            Self::RstChain => RSTCHAIN,
            Self::Nsr => NSR,
            Self::ForgetNcount => FORGET_NCOUNT,
        }
    }

    /// Register mnemonic as printed in register dumps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ncr => "NCR",
            Self::Comp => "COMP",
            Self::Lcomp => "LCOMP",
            Self::IdxDist => "IDX_DIST",
            Self::Cat => "CAT",
            Self::Aif => "AIF",
            Self::Minif => "MINIF",
            Self::Maxif => "MAXIF",
            Self::TestComp => "TESTCOMP",
            Self::TestCat => "TESTCAT",
            Self::Nid => "NID",
            Self::Gcr => "GCR",
            Self::RstChain => "RSTCHAIN",
            Self::Nsr => "NSR",
            Self::ForgetNcount => "FORGET_NCOUNT",
        }
    }

    /// Look a register up by its byte offset.
    #[must_use]
    pub fn from_offset(offset: usize) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.offset() == offset)
    }
}

impl core::fmt::Display for Register {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(self.name())
    }
}

// ── NCR bit definitions ──────────────────────────────────────────────────────

/// NCR fields.
pub mod ncr {
    /// Neuron context, valid range 1–127.
    pub const CONTEXT: u16 = 0x007F;
    /// Normal neuron.
    pub const NORMAL: u16 = 0x0000;
    /// Substitute neuron flag.
    pub const SUBSTITUTE: u16 = 0x0080;
    /// Neuron id (save/restore mode only).
    pub const ID: u16 = 0xFF00;
}

// ── GCR bit definitions ──────────────────────────────────────────────────────

/// GCR fields.
pub mod gcr {
    /// Global context, valid range 1–127. Context 0 addresses every neuron.
    pub const GLOBAL: u16 = 0x007F;
    /// Distance mode bit: 0 = L1, 1 = LSup.
    pub const DIST: u16 = 0x0080;
    /// Shift of the distance mode bit.
    pub const DIST_SHIFT: u16 = 7;
}

// ── NSR bit definitions ──────────────────────────────────────────────────────

/// NSR fields.
pub mod nsr {
    /// Classifier mode bit: 0 = RBF, 1 = KNN.
    pub const CLASS_MODE: u16 = 0x0020;
    /// Shift of the classifier mode bit.
    pub const CLASS_MODE_SHIFT: u16 = 5;
    /// Network mode bit: 1 = save/restore.
    pub const NET_MODE: u16 = 0x0010;
}

// ── CAT bit definitions ──────────────────────────────────────────────────────

/// CAT fields.
pub mod cat {
    /// Category id. Valid categories are 1–32766.
    pub const CATEGORY: u16 = 0x7FFF;
    /// Degenerate flag, set when a neuron's AIF was clamped at MINIF.
    pub const DEGEN: u16 = 0x8000;
}

// ── FORGET_NCOUNT bit definitions ────────────────────────────────────────────

/// FORGET_NCOUNT fields.
pub mod ncount {
    /// Committed neuron count field.
    pub const COUNT: u16 = 0x00FF;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_offsets_are_word_aligned_and_unique() {
        for (i, a) in Register::ALL.iter().enumerate() {
            assert_eq!(a.offset() % 4, 0, "{a} not word aligned");
            for b in &Register::ALL[i + 1..] {
                assert_ne!(a.offset(), b.offset(), "{a} overlaps {b}");
            }
        }
    }

    #[test]
    fn address_map_matches_silicon() {
        assert_eq!(NCR, 0x00);
        assert_eq!(CAT, 0x10);
        assert_eq!(GCR, 0x2C);
        assert_eq!(NSR, 0x34);
        // 0x38 is a hole in the map.
        assert_eq!(FORGET_NCOUNT, 0x3C);
        assert_eq!(Register::from_offset(0x38), None);
    }

    #[test]
    fn offset_lookup_is_inverse() {
        for r in Register::ALL {
            assert_eq!(Register::from_offset(r.offset()), Some(r));
        }
    }

    #[test]
    fn field_masks_do_not_overlap() {
        assert_eq!(gcr::GLOBAL & gcr::DIST, 0);
        assert_eq!(nsr::CLASS_MODE & nsr::NET_MODE, 0);
        assert_eq!(cat::CATEGORY & cat::DEGEN, 0);
        assert_eq!(cat::CATEGORY | cat::DEGEN, 0xFFFF);
        assert_eq!(gcr::DIST, 1 << gcr::DIST_SHIFT);
        assert_eq!(nsr::CLASS_MODE, 1 << nsr::CLASS_MODE_SHIFT);
    }
}

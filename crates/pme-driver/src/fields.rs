//! Pure bit-field helpers
//!
//! Every mode accessor on the driver is one bus read, one of these functions
//! on the in-memory copy, and (for setters) one bus write.

/// Extract the bits of `value` selected by `mask`.
#[must_use]
pub const fn field(value: u16, mask: u16) -> u16 {
    value & mask
}

/// Replace the bits of `value` selected by `mask` with the same bits of
/// `field`, leaving every other bit untouched.
#[must_use]
pub const fn with_field(value: u16, mask: u16, field: u16) -> u16 {
    (value & !mask) | (field & mask)
}

/// Set or clear the single-bit (or multi-bit) flag `mask` in `value`.
#[must_use]
pub const fn with_flag(value: u16, mask: u16, on: bool) -> u16 {
    if on {
        value | mask
    } else {
        value & !mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pme_chip::regs::{cat, gcr, nsr};

    #[test]
    fn with_field_preserves_other_bits() {
        let gcr_value = gcr::DIST | 0x05;
        assert_eq!(with_field(gcr_value, gcr::GLOBAL, 0x2A), gcr::DIST | 0x2A);
        // Bits of the new field outside the mask are dropped.
        assert_eq!(with_field(0, gcr::GLOBAL, 0x1FF), 0x7F);
    }

    #[test]
    fn category_write_keeps_degenerate_flag() {
        let current = cat::DEGEN | 3;
        assert_eq!(with_field(current, cat::CATEGORY, 9), cat::DEGEN | 9);
    }

    #[test]
    fn flags_toggle() {
        let v = with_flag(0x0004, nsr::NET_MODE, true);
        assert_eq!(v, 0x0014);
        assert_eq!(with_flag(v, nsr::NET_MODE, false), 0x0004);
        assert_eq!(field(v, nsr::NET_MODE), nsr::NET_MODE);
    }
}

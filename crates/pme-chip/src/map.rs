//! PME memory window.
//!
//! The engine sits on the SoC's internal peripheral bus at a fixed physical
//! address. The register block is 64 bytes; mappings are taken a whole page
//! at a time.
//!
//! ```text
//! Address      Size    Purpose
//! ──────────── ─────── ────────────────────────────────
//! 0xB0600000   0x40    PME register block (15 registers, 32-bit slots)
//! ```

/// Physical base address of the register block.
pub const BASE_ADDR: u64 = 0xB060_0000;

/// Bytes spanned by the register block (last register ends at 0x40).
pub const WINDOW_SIZE: usize = 0x40;

/// Width of one register slot on the bus, in bytes.
pub const SLOT_WIDTH: usize = 4;

/// Smallest page size the window is mapped with.
pub const PAGE_SIZE: u64 = 4096;

/// Page-aligned physical address containing the register block.
#[must_use]
pub const fn page_base() -> u64 {
    BASE_ADDR & !(PAGE_SIZE - 1)
}

/// Offset of the register block within its page.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn page_offset() -> usize {
    (BASE_ADDR - page_base()) as usize
}

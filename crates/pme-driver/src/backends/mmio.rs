//! Memory-mapped register transport
//!
//! Volatile 32-bit accesses to the PME register window. Only the low 16 bits
//! of each slot are meaningful; writes zero-extend.
//!
//! Two ways in:
//! - [`MmioBus::open`] maps the window from `/dev/mem` (Linux userspace,
//!   needs `CAP_SYS_RAWIO`). Unmapped on drop.
//! - [`MmioBus::from_raw`] wraps an address that is already accessible
//!   (bare metal, or a mapping owned elsewhere).

// Slots are u32 and the engine only drives the low half.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_ptr_alignment)]

use crate::bus::RegisterBus;
use crate::error::{PmeError, Result};
use pme_chip::map::{PAGE_SIZE, SLOT_WIDTH, WINDOW_SIZE};
use pme_chip::Register;
use rustix::fs::OFlags;
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsFd;
use std::path::Path;
use std::ptr::NonNull;

/// Default physical memory device.
pub const DEV_MEM: &str = "/dev/mem";

/// A mapping this bus owns and must unmap.
#[derive(Debug)]
struct Mapping {
    ptr: NonNull<u8>,
    size: usize,
    _file: File,
}

/// Volatile MMIO transport for one PME register window.
#[derive(Debug)]
pub struct MmioBus {
    /// First register (NCR)
    base: NonNull<u8>,
    mapping: Option<Mapping>,
}

// SAFETY: Send - the bus owns its mapping exclusively (or was handed an
// address the caller guaranteed exclusive). Moving it to another thread does
// not invalidate the mapping, which is process-wide. Not Sync: accesses
// mutate device state and need &mut self.
unsafe impl Send for MmioBus {}

impl MmioBus {
    /// Map the PME window from `/dev/mem` at the silicon's base address.
    ///
    /// # Errors
    ///
    /// Returns error if `/dev/mem` is missing, cannot be opened or mapped.
    pub fn open() -> Result<Self> {
        Self::open_at(DEV_MEM, pme_chip::map::BASE_ADDR)
    }

    /// Map the PME window found at physical address `phys_addr` through the
    /// memory device at `path`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `path` does not exist
    /// - the device cannot be opened read/write
    /// - mmap fails
    pub fn open_at(path: impl AsRef<Path>, phys_addr: u64) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PmeError::device_not_found(path));
        }

        #[allow(clippy::cast_possible_wrap)]
        let sync_flag = OFlags::SYNC.bits() as i32;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(sync_flag)
            .open(path)?;

        let page_base = phys_addr & !(PAGE_SIZE - 1);
        let page_offset = (phys_addr - page_base) as usize;
        let size = (page_offset + WINDOW_SIZE).next_multiple_of(PAGE_SIZE as usize);

        tracing::debug!(
            "Mapping PME window {phys_addr:#x} via {} ({size:#x} bytes at {page_base:#x})",
            path.display()
        );

        // SAFETY: mmap of device memory. Preconditions:
        // - file descriptor is valid (just opened) and kept alive in Mapping
        // - size is non-zero and page-aligned, offset page-aligned
        // - MAP_SHARED so accesses reach the device
        // - the mapping is released exactly once in Drop
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                page_base,
            )
            .map_err(|e| PmeError::map_failed(format!("mmap {}: {e}", path.display())))?
        };

        let ptr = NonNull::new(ptr.cast::<u8>())
            .ok_or_else(|| PmeError::map_failed("mmap returned a null mapping"))?;

        // SAFETY: page_offset + WINDOW_SIZE <= size, so base stays inside the mapping.
        let base = unsafe { NonNull::new_unchecked(ptr.as_ptr().add(page_offset)) };

        tracing::info!("Mapped PME registers at {:p}", base.as_ptr());

        Ok(Self {
            base,
            mapping: Some(Mapping {
                ptr,
                size,
                _file: file,
            }),
        })
    }

    /// Wrap an already accessible register window.
    ///
    /// # Safety
    ///
    /// `base` must point at the PME register block, be valid for volatile
    /// 32-bit reads and writes over [`WINDOW_SIZE`] bytes, be 4-byte aligned,
    /// and no other code may access the block while this bus exists.
    pub const unsafe fn from_raw(base: NonNull<u8>) -> Self {
        Self {
            base,
            mapping: None,
        }
    }

    fn slot(&self, reg: Register) -> *mut u32 {
        let offset = reg.offset();
        assert!(
            offset + SLOT_WIDTH <= WINDOW_SIZE,
            "Register offset out of bounds"
        );
        // SAFETY: offset is within the window checked above; base is valid
        // for WINDOW_SIZE bytes by construction.
        unsafe { self.base.as_ptr().add(offset).cast::<u32>() }
    }

    /// True when this bus owns a `/dev/mem` mapping.
    pub const fn is_mapped(&self) -> bool {
        self.mapping.is_some()
    }
}

impl RegisterBus for MmioBus {
    fn read16(&mut self, reg: Register) -> u16 {
        let slot = self.slot(reg);
        // SAFETY: read_volatile necessary for MMIO - hardware can change value.
        // slot is in bounds and u32 aligned (offsets are multiples of 4).
        let raw = unsafe { std::ptr::read_volatile(slot) };
        (raw & 0xFFFF) as u16
    }

    fn write16(&mut self, reg: Register, value: u16) {
        let slot = self.slot(reg);
        // SAFETY: write_volatile necessary for MMIO - triggers hardware side effects.
        // slot is in bounds and u32 aligned.
        unsafe { std::ptr::write_volatile(slot, u32::from(value)) };
    }
}

impl Drop for MmioBus {
    fn drop(&mut self) {
        if let Some(mapping) = self.mapping.take() {
            // SAFETY: ptr/size are exactly what mmap returned; Drop runs once
            // and no references into the mapping outlive the bus.
            if let Err(e) = unsafe { munmap(mapping.ptr.as_ptr().cast(), mapping.size) } {
                tracing::warn!("munmap of PME window failed: {e}");
            } else {
                tracing::debug!("Unmapped PME registers");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_window_round_trip() {
        let mut window = [0u32; WINDOW_SIZE / SLOT_WIDTH];
        let base = NonNull::new(window.as_mut_ptr().cast::<u8>()).unwrap();
        // SAFETY: window is a live, aligned, exclusively borrowed u32 array
        // covering WINDOW_SIZE bytes.
        let mut bus = unsafe { MmioBus::from_raw(base) };

        bus.write16(Register::Gcr, 0x0085);
        assert_eq!(bus.read16(Register::Gcr), 0x0085);
        assert!(!bus.is_mapped());
        drop(bus);

        assert_eq!(window[Register::Gcr.offset() / SLOT_WIDTH], 0x0085);
    }

    #[test]
    fn upper_half_is_ignored_on_read() {
        let mut window = [0u32; WINDOW_SIZE / SLOT_WIDTH];
        window[Register::Cat.offset() / SLOT_WIDTH] = 0xDEAD_0007;
        let base = NonNull::new(window.as_mut_ptr().cast::<u8>()).unwrap();
        // SAFETY: as above.
        let mut bus = unsafe { MmioBus::from_raw(base) };
        assert_eq!(bus.read16(Register::Cat), 0x0007);
    }

    #[test]
    fn missing_device_is_reported() {
        let err = MmioBus::open_at("/nonexistent/mem", pme_chip::map::BASE_ADDR).unwrap_err();
        assert!(matches!(err, PmeError::DeviceNotFound { .. }));
    }

    #[test]
    #[ignore] // Requires PME hardware and CAP_SYS_RAWIO
    fn map_dev_mem() {
        let mut bus = MmioBus::open().expect("map /dev/mem");
        let nsr = bus.read16(Register::Nsr);
        println!("NSR = {nsr:#06x}");
    }
}

//! # Register Window
//!
//! Bounds-checked, volatile access to the engine's memory-mapped register file.
//!
//! ## Overview
//!
//! A [`RegisterWindow`] owns a `memmap2` mapping of the UIO register region.
//! Every access goes through a named [`Register`], is checked against the
//! mapped length and is performed with a single volatile 32-bit load or store,
//! so the compiler can neither elide nor merge accesses the hardware relies on.
//!
//! ```text
//! ┌──────────────┐  read/write(Register)  ┌────────────────┐  volatile u32  ┌──────────┐
//! │  Programmer  │───────────────────────▶│ RegisterWindow │───────────────▶│ VEU regs │
//! └──────────────┘                        └────────────────┘                └──────────┘
//! ```
//!
//! The window can be backed by a UIO device node, by any other file (useful
//! for tests and captures) or by anonymous memory for dry runs.

use std::fs::File;
use std::ptr::{read_volatile, write_volatile};

use memmap2::{MmapMut, MmapOptions};
use tracing::trace;

use crate::error::{VeuError, VeuResult};
use crate::regs::Register;

/// Mapped register file of one engine.
#[derive(Debug)]
pub struct RegisterWindow {
    /// Mapped region, starting on a page boundary
    map: MmapMut,
    /// Byte offset of the register file within `map`
    base: usize,
    /// Physical address of the register file
    address: u64,
}

impl RegisterWindow {
    /// Map `size` bytes of `file` starting at `offset`.
    ///
    /// For a UIO device `offset` selects the map (`N * page_size` for map N) and
    /// `address` is the physical address reported in sysfs.
    pub fn map(file: &File, offset: u64, address: u64, size: usize) -> VeuResult<Self> {
        Self::map_at(file, offset, 0, address, size)
    }

    /// Map a register file that starts `base` bytes into the page mapped at
    /// `offset`, as UIO does for blocks that are not page aligned.
    ///
    /// `address` is the physical address of the register file itself.
    pub fn map_at(
        file: &File,
        offset: u64,
        base: usize,
        address: u64,
        size: usize,
    ) -> VeuResult<Self> {
        if size == 0 {
            return Err(VeuError::resource("register window", "mapping size is zero"));
        }
        if base % 4 != 0 {
            return Err(VeuError::resource(
                "register window",
                format!("register file offset 0x{base:x} is not word aligned"),
            ));
        }
        let len = base
            .checked_add(size)
            .ok_or_else(|| VeuError::resource("register window", "mapping length overflows"))?;

        // SAFETY: the mapping is owned by the window and only accessed through
        // volatile, bounds-checked, word-aligned loads and stores.
        let map = unsafe { MmapOptions::new().offset(offset).len(len).map_mut(file) }
            .map_err(|e| VeuError::io("map register window", e))?;

        Ok(Self { map, base, address })
    }

    /// Anonymous, zero-filled window of `size` bytes, not backed by hardware.
    pub fn anonymous(size: usize) -> VeuResult<Self> {
        if size == 0 {
            return Err(VeuError::resource("register window", "mapping size is zero"));
        }

        let map = MmapMut::map_anon(size).map_err(|e| VeuError::io("map anonymous window", e))?;
        Ok(Self {
            map,
            base: 0,
            address: 0,
        })
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    /// Size of the register window in bytes.
    pub fn size(&self) -> usize {
        self.map.len() - self.base
    }

    pub fn contains(&self, reg: Register) -> bool {
        reg.offset() + 4 <= self.size()
    }

    fn checked_offset(&self, reg: Register) -> VeuResult<usize> {
        if self.contains(reg) {
            Ok(self.base + reg.offset())
        } else {
            Err(VeuError::register_bounds(reg.offset(), self.size()))
        }
    }

    pub fn read(&self, reg: Register) -> VeuResult<u32> {
        let offset = self.checked_offset(reg)?;
        // SAFETY: offset + 4 is within the mapping, the mapping is page
        // aligned and `base` is a multiple of 4, so the word is aligned too.
        let value = unsafe { read_volatile(self.map.as_ptr().add(offset).cast::<u32>()) };
        Ok(value)
    }

    pub fn write(&mut self, reg: Register, value: u32) -> VeuResult<()> {
        let offset = self.checked_offset(reg)?;
        trace!(register = reg.name(), value = format_args!("0x{value:08x}"), "write");
        // SAFETY: see `read`.
        unsafe { write_volatile(self.map.as_mut_ptr().add(offset).cast::<u32>(), value) };
        Ok(())
    }

    /// Read-modify-write: clear `mask`, then OR in `bits & mask`.
    pub fn modify(&mut self, reg: Register, mask: u32, bits: u32) -> VeuResult<()> {
        let value = (self.read(reg)? & !mask) | (bits & mask);
        self.write(reg, value)
    }

    /// Current value of every register covered by the window.
    pub fn snapshot(&self) -> VeuResult<Vec<(Register, u32)>> {
        Register::ALL
            .into_iter()
            .filter(|reg| self.contains(*reg))
            .map(|reg| Ok((reg, self.read(reg)?)))
            .collect()
    }
}

//! Shared helpers for the integration tests.
//!
//! [`FileBackend`] stands in for a UIO device: the register window is a shared
//! mapping of a temporary file, so the test side can poke the status register
//! behind the driver's back the way the engine would.

#![allow(dead_code)]

use std::fs::File;
use std::os::unix::fs::FileExt;

use shveu::regs::{Register, VSTAR_BUSY};
use shveu::{
    BackendEvent, HardwareVariant, PixelFormat, Planes, RegisterWindow, Surface, UioBackend, Veu,
    VeuConfig, VeuResult,
};

pub const WINDOW_ADDRESS: u64 = 0xfe92_0000;

/// File-backed engine that reports busy from lock until the interrupt.
pub struct FileBackend {
    file: File,
    size: usize,
    events: Vec<BackendEvent>,
    /// Keep VSTAR busy after the interrupt fires
    stuck: bool,
}

impl FileBackend {
    pub fn new(variant: HardwareVariant) -> Self {
        let size = variant.window_size();
        let file = tempfile::tempfile().unwrap();
        file.set_len(size as u64).unwrap();
        Self {
            file,
            size,
            events: Vec::new(),
            stuck: false,
        }
    }

    /// An engine that never goes idle.
    pub fn stuck(variant: HardwareVariant) -> Self {
        Self {
            stuck: true,
            ..Self::new(variant)
        }
    }

    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    fn set_status(&self, value: u32) {
        self.file
            .write_at(&value.to_ne_bytes(), Register::Vstar.offset() as u64)
            .unwrap();
    }
}

impl UioBackend for FileBackend {
    fn register_window(&mut self) -> VeuResult<RegisterWindow> {
        RegisterWindow::map(&self.file, 0, WINDOW_ADDRESS, self.size)
    }

    fn lock(&mut self) -> VeuResult<()> {
        self.events.push(BackendEvent::Lock);
        // The engine is about to be started
        self.set_status(VSTAR_BUSY);
        Ok(())
    }

    fn unlock(&mut self) -> VeuResult<()> {
        self.events.push(BackendEvent::Unlock);
        Ok(())
    }

    fn sleep(&mut self) -> VeuResult<()> {
        self.events.push(BackendEvent::Sleep);
        if !self.stuck {
            self.set_status(0);
        }
        Ok(())
    }
}

pub fn open_file_backed(backend: FileBackend, config: &VeuConfig) -> Veu<FileBackend> {
    Veu::with_backend(backend, config).unwrap()
}

pub fn nv12(width: u32, height: u32) -> Surface {
    two_plane(PixelFormat::Nv12, width, height, 0x4000_0000)
}

pub fn nv16(width: u32, height: u32) -> Surface {
    two_plane(PixelFormat::Nv16, width, height, 0x4000_0000)
}

pub fn two_plane(format: PixelFormat, width: u32, height: u32, base: u32) -> Surface {
    Surface::new(
        format,
        width,
        height,
        Planes::two_plane(base, base + width * height),
    )
}

pub fn packed(format: PixelFormat, width: u32, height: u32, base: u32) -> Surface {
    Surface::new(format, width, height, Planes::packed(base))
}

/// Every register still zero: nothing has been programmed.
pub fn untouched<B: UioBackend>(veu: &Veu<B>) -> bool {
    veu.window()
        .snapshot()
        .unwrap()
        .into_iter()
        .all(|(_, value)| value == 0)
}

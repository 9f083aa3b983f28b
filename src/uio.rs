//! # UIO Backend
//!
//! The engine is reached through a user-space I/O device: a register window to
//! map, a lock shared by every process driving the same engine, and an
//! interrupt to sleep on. [`UioBackend`] is the seam the device handle talks
//! to; [`UioDevice`] implements it on the Linux UIO framework and
//! [`MemoryBackend`] implements it over anonymous memory for dry runs.
//!
//! ## Linux UIO
//!
//! ```text
//! /sys/class/uio/uioN/name              "VEU"
//! /sys/class/uio/uioN/maps/map0/addr    0xfe920000
//! /sys/class/uio/uioN/maps/map0/size    0x000000cc
//! /sys/class/uio/uioN/maps/map0/offset  0x0 (registers within the first page)
//! /dev/uioN                             mmap offset 0 -> map0, read() blocks on IRQ
//! ```
//!
//! UIO maps whole pages, so a register block that is not page aligned starts
//! `offset` bytes into the mapping. Kernels without the `offset` attribute are
//! treated as offset 0.
//!
//! The lock is an exclusive advisory lock on the opened device node, so it
//! serializes every process that drives the engine through this backend.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::config::VeuConfig;
use crate::error::{VeuError, VeuResult};
use crate::mmio::RegisterWindow;
use crate::regs::HardwareVariant;

/// Lock, wakeup and register-window provider for one engine.
pub trait UioBackend {
    /// Map the engine's register file. Called once, when the handle is opened.
    fn register_window(&mut self) -> VeuResult<RegisterWindow>;

    /// Block until this caller owns the engine.
    fn lock(&mut self) -> VeuResult<()>;

    /// Give the engine back.
    fn unlock(&mut self) -> VeuResult<()>;

    /// Block until the engine raises its interrupt.
    fn sleep(&mut self) -> VeuResult<()>;
}

/// Engine exposed by the Linux UIO framework.
#[derive(Debug)]
pub struct UioDevice {
    /// Opened `/dev/uioN`
    file: File,
    /// Device node path, for diagnostics
    path: PathBuf,
    /// Physical address of map0
    address: u64,
    /// Start of the register file within map0
    offset: usize,
    /// Size of map0 in bytes
    size: usize,
}

impl UioDevice {
    /// Find the UIO device named `config.uio_name` and open its device node.
    #[instrument(skip(config), fields(name = %config.uio_name))]
    pub fn open(config: &VeuConfig) -> VeuResult<Self> {
        config.validate()?;

        let uio = find_uio(&config.sysfs_root, config.uio_name.trim())?;
        let map_dir = config.sysfs_root.join(&uio).join("maps").join("map0");
        let address = read_hex(&map_dir.join("addr"))?;
        let size = usize::try_from(read_hex(&map_dir.join("size"))?)
            .map_err(|_| VeuError::resource("register window", "map0 size overflows usize"))?;
        let offset = read_map_offset(&map_dir.join("offset"))?;

        let path = config.dev_root.join(&uio);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| {
                VeuError::resource(path.display().to_string(), e.to_string())
                    .with_operation("open")
                    .with_hint("check permissions on the UIO device node")
            })?;

        debug!(
            path = %path.display(),
            address = format_args!("0x{address:x}"),
            offset,
            size,
            "opened uio device"
        );

        Ok(Self {
            file,
            path,
            address,
            offset,
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Engine generation implied by the published window size.
    pub fn variant(&self) -> HardwareVariant {
        HardwareVariant::from_window_size(self.size)
    }
}

impl UioBackend for UioDevice {
    fn register_window(&mut self) -> VeuResult<RegisterWindow> {
        let address = self.address + self.offset as u64;
        RegisterWindow::map_at(&self.file, 0, self.offset, address, self.size)
    }

    fn lock(&mut self) -> VeuResult<()> {
        self.file.lock().map_err(|e| VeuError::io("lock engine", e))
    }

    fn unlock(&mut self) -> VeuResult<()> {
        self.file.unlock().map_err(|e| VeuError::io("unlock engine", e))
    }

    fn sleep(&mut self) -> VeuResult<()> {
        // Re-arm the interrupt, then block until the event counter moves
        self.file
            .write_all(&1u32.to_ne_bytes())
            .map_err(|e| VeuError::io("enable interrupt", e))?;

        let mut count = [0u8; 4];
        self.file
            .read_exact(&mut count)
            .map_err(|e| VeuError::io("wait for interrupt", e))?;
        Ok(())
    }
}

/// Name of the first `uioN` entry under `sysfs_root` whose `name` matches.
fn find_uio(sysfs_root: &Path, name: &str) -> VeuResult<String> {
    let entries = fs::read_dir(sysfs_root).map_err(|e| {
        VeuError::resource(format!("uio device '{name}'"), e.to_string())
            .with_operation("open")
            .with_hint("is the UIO framework enabled in the kernel?")
    })?;

    let mut candidates: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|dir| dir.starts_with("uio"))
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .find(|dir| {
            fs::read_to_string(sysfs_root.join(dir).join("name"))
                .map(|found| found.trim() == name)
                .unwrap_or(false)
        })
        .ok_or_else(|| {
            VeuError::resource(format!("uio device '{name}'"), "no matching device")
                .with_operation("open")
                .with_hint("check that the VEU is registered with uio_pdrv_genirq")
        })
}

/// Parse a sysfs value like `0xfe920000`.
fn read_hex(path: &Path) -> VeuResult<u64> {
    let text = fs::read_to_string(path).map_err(|e| VeuError::io(path.display().to_string(), e))?;
    parse_hex(&text).ok_or_else(|| {
        VeuError::resource(path.display().to_string(), format!("not a hex value: {}", text.trim()))
    })
}

/// The `offset` attribute of a map, 0 when the kernel does not publish one.
fn read_map_offset(path: &Path) -> VeuResult<usize> {
    if !path.exists() {
        return Ok(0);
    }
    usize::try_from(read_hex(path)?)
        .map_err(|_| VeuError::resource("register window", "map0 offset overflows usize"))
}

fn parse_hex(text: &str) -> Option<u64> {
    let digits = text.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    u64::from_str_radix(digits, 16).ok()
}

/// Something the backend was asked to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendEvent {
    Lock,
    Sleep,
    Unlock,
}

/// In-memory stand-in for an engine.
///
/// The register window is anonymous memory of the size the chosen variant
/// publishes, the lock is a flag and `sleep` returns at once. Every request is
/// recorded, which makes it useful for dry runs and for checking lock
/// discipline.
#[derive(Debug)]
pub struct MemoryBackend {
    variant: HardwareVariant,
    locked: bool,
    events: Vec<BackendEvent>,
}

impl MemoryBackend {
    pub fn new(variant: HardwareVariant) -> Self {
        Self {
            variant,
            locked: false,
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl UioBackend for MemoryBackend {
    fn register_window(&mut self) -> VeuResult<RegisterWindow> {
        RegisterWindow::anonymous(self.variant.window_size())
    }

    fn lock(&mut self) -> VeuResult<()> {
        if self.locked {
            // A real lock would block forever here
            return Err(VeuError::resource("engine lock", "already held by this handle"));
        }
        self.locked = true;
        self.events.push(BackendEvent::Lock);
        Ok(())
    }

    fn unlock(&mut self) -> VeuResult<()> {
        self.locked = false;
        self.events.push(BackendEvent::Unlock);
        Ok(())
    }

    fn sleep(&mut self) -> VeuResult<()> {
        self.events.push(BackendEvent::Sleep);
        Ok(())
    }
}

//! # SH-Mobile VEU Driver
//!
//! User-space driver for the Video Engine Unit found on SH-Mobile SoCs. The VEU
//! scales, rotates and converts images between YCbCr and RGB layouts in
//! physical memory; this crate programs it through a UIO register window.
//!
//! ## Architecture
//!
//! - `veu_scale` (workspace crate): pixel formats, crop geometry and the
//!   fixed-point scale arithmetic, all hardware independent
//! - [`regs`]: register offsets, control values and hardware variants
//! - [`mmio`]: bounds-checked volatile access to the mapped register file
//! - [`uio`]: the lock/sleep/map backend seam and its Linux UIO implementation
//! - [`format`]: per-format register encodings
//! - [`transform`]: turns a request into a validated plan and replays it into
//!   the registers
//! - [`device`]: the device handle, crop state and completion protocol
//! - [`config`], [`error`]: configuration and the error taxonomy
//!
//! ## Example
//!
//! ```rust,no_run
//! use shveu::{Planes, PixelFormat, Surface, Veu, VeuConfig};
//!
//! # fn example() -> shveu::VeuResult<()> {
//! let mut veu = Veu::open(&VeuConfig::default())?;
//!
//! let src = Surface::new(
//!     PixelFormat::Nv12,
//!     720,
//!     480,
//!     Planes::two_plane(0x4000_0000, 0x4005_4600),
//! );
//! let dst = Surface::new(PixelFormat::Rgb565, 320, 240, Planes::packed(0x4100_0000));
//!
//! veu.rescale(&src, &dst)?;
//! veu.close();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod format;
pub mod mmio;
pub mod regs;
pub mod transform;
pub mod uio;

pub use config::VeuConfig;
pub use device::{CropTarget, InFlight, Veu};
pub use error::{ErrorContext, ErrorKind, ErrorSeverity, VeuError, VeuResult};
pub use mmio::RegisterWindow;
pub use regs::{HardwareVariant, Register};
pub use transform::{Planes, Rotation, Surface, TransformPlan};
pub use uio::{BackendEvent, MemoryBackend, UioBackend, UioDevice};
pub use veu_scale::format::PixelFormat;
pub use veu_scale::geometry::{Point, Rect};

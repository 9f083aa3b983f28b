//! # Device Handle
//!
//! [`Veu`] owns one engine: its backend, its mapped register window and the
//! crop state that the next transform will use.
//!
//! ## Lifecycle
//!
//! ```text
//! open ──▶ set_crop* ──▶ program_transform ──▶ InFlight ──▶ wait_for_completion
//!  │                        (lock)                              (unlock)
//!  └──────────────────────────────── close ◀────────────────────────┘
//! ```
//!
//! [`Veu::program_transform`] takes the engine lock and hands back an
//! [`InFlight`] guard that borrows the handle. The lock is released only by
//! awaiting the guard, or by dropping it, which waits first. A second transform
//! cannot be programmed on the same handle while one is in flight.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use veu_scale::format::PixelFormat;
use veu_scale::geometry::Rect;

use crate::config::VeuConfig;
use crate::error::{VeuError, VeuResult};
use crate::mmio::RegisterWindow;
use crate::regs::{HardwareVariant, Register, VEVTR_ACK, VSTAR_BUSY};
use crate::transform::{self, Planes, Rotation, Surface, TransformPlan};
use crate::uio::{UioBackend, UioDevice};

/// Which side of the transform a crop applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CropTarget {
    Source,
    Destination,
}

/// Crop selected for one side. `None` means the whole surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CropState {
    rect: Option<Rect>,
}

impl CropState {
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }
}

/// Handle to one VEU.
#[derive(Debug)]
pub struct Veu<B: UioBackend = UioDevice> {
    backend: B,
    window: RegisterWindow,
    variant: HardwareVariant,
    src_crop: CropState,
    dst_crop: CropState,
    hang_timeout: Option<Duration>,
}

impl Veu<UioDevice> {
    /// Open the engine registered under `config.uio_name`.
    pub fn open(config: &VeuConfig) -> VeuResult<Self> {
        let backend = UioDevice::open(config)?;
        Self::with_backend(backend, config)
    }
}

impl<B: UioBackend> Veu<B> {
    /// Build a handle over any backend.
    ///
    /// The hardware variant is detected from the size of the window the
    /// backend maps.
    pub fn with_backend(mut backend: B, config: &VeuConfig) -> VeuResult<Self> {
        config.validate()?;

        let window = backend.register_window()?;
        let variant = HardwareVariant::from_window_size(window.size());
        if window.size() < variant.required_window_size() {
            return Err(VeuError::resource(
                "register window",
                format!(
                    "0x{:x} bytes is too small, {} needs 0x{:x}",
                    window.size(),
                    variant.name(),
                    variant.required_window_size()
                ),
            )
            .with_operation("open"));
        }

        info!(
            variant = variant.name(),
            address = format_args!("0x{:x}", window.address()),
            size = window.size(),
            "VEU ready"
        );

        Ok(Self {
            backend,
            window,
            variant,
            src_crop: CropState::default(),
            dst_crop: CropState::default(),
            hang_timeout: config.hang_timeout,
        })
    }

    pub fn variant(&self) -> HardwareVariant {
        self.variant
    }

    pub fn window(&self) -> &RegisterWindow {
        &self.window
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn crop_state(&mut self, target: CropTarget) -> &mut CropState {
        match target {
            CropTarget::Source => &mut self.src_crop,
            CropTarget::Destination => &mut self.dst_crop,
        }
    }

    /// Select the crop the next transform uses on one side.
    ///
    /// The rectangle is stored as given; alignment and clipping happen when a
    /// transform is programmed. Crops persist across transforms.
    pub fn set_crop(&mut self, target: CropTarget, rect: Rect) {
        debug!(?target, ?rect, "set crop");
        self.crop_state(target).rect = Some(rect);
    }

    /// Go back to using the whole surface on one side.
    pub fn clear_crop(&mut self, target: CropTarget) {
        self.crop_state(target).rect = None;
    }

    pub fn crop(&self, target: CropTarget) -> Option<Rect> {
        match target {
            CropTarget::Source => self.src_crop.rect(),
            CropTarget::Destination => self.dst_crop.rect(),
        }
    }

    /// Resolve a transform against the current crops without touching the
    /// hardware.
    pub fn plan(&self, src: &Surface, dst: &Surface, rotation: Rotation) -> VeuResult<TransformPlan> {
        TransformPlan::resolve(
            self.variant,
            src,
            dst,
            self.src_crop.rect(),
            self.dst_crop.rect(),
            rotation,
        )
    }

    /// Validate, lock the engine, program it and start it.
    ///
    /// On a validation error nothing is written and the lock is not taken.
    pub fn program_transform(
        &mut self,
        src: &Surface,
        dst: &Surface,
        rotation: Rotation,
    ) -> VeuResult<InFlight<'_, B>> {
        let plan = self.plan(src, dst, rotation)?;

        self.backend.lock()?;
        if let Err(err) = transform::program(&mut self.window, &plan) {
            // The start bit was never written
            if let Err(unlock_err) = self.backend.unlock() {
                warn!(error = %unlock_err, "failed to release engine after programming error");
            }
            return Err(err);
        }

        debug!(
            src = format_args!("{}x{} {:?}", src.width, src.height, src.format),
            dst = format_args!("{}x{} {:?}", dst.width, dst.height, dst.format),
            ?rotation,
            "transform started"
        );

        Ok(InFlight {
            veu: self,
            awaited: false,
        })
    }

    /// Scale and/or convert between two tightly packed surfaces and wait for
    /// the result.
    pub fn rescale(&mut self, src: &Surface, dst: &Surface) -> VeuResult<()> {
        let src = src.with_pitch(src.width);
        let dst = dst.with_pitch(dst.width);
        self.program_transform(&src, &dst, Rotation::None)?
            .wait_for_completion()
    }

    /// Rotate a tightly packed surface into `dst` and wait for the result.
    ///
    /// The destination takes the source's dimensions swapped, with a pitch
    /// equal to the source height.
    pub fn rotate(
        &mut self,
        src: &Surface,
        dst: Planes,
        dst_format: PixelFormat,
        rotation: Rotation,
    ) -> VeuResult<()> {
        let src = src.with_pitch(src.width);
        let dst = Surface::new(dst_format, src.height, src.width, dst);
        self.program_transform(&src, &dst, rotation)?
            .wait_for_completion()
    }

    /// Release the handle. The register window is unmapped and the backend
    /// closed.
    pub fn close(self) {
        debug!(variant = self.variant.name(), "VEU closed");
    }

    /// Wait for the running transform, then always release the engine.
    fn complete(&mut self) -> VeuResult<()> {
        let waited = self.wait_idle();
        let released = self.backend.unlock();
        waited.and(released)
    }

    fn wait_idle(&mut self) -> VeuResult<()> {
        self.backend.sleep()?;
        self.window.write(Register::Vevtr, VEVTR_ACK)?;

        let started = Instant::now();
        while self.window.read(Register::Vstar)? & VSTAR_BUSY != 0 {
            if let Some(limit) = self.hang_timeout
                && started.elapsed() >= limit
            {
                let timeout_ms = limit.as_millis() as u64;
                warn!(timeout_ms, "engine still busy");
                return Err(VeuError::hang("wait_for_completion", timeout_ms));
            }
            std::hint::spin_loop();
        }
        Ok(())
    }
}

/// A started transform. Holds the engine lock.
#[must_use = "the engine stays locked until the transform is awaited"]
pub struct InFlight<'a, B: UioBackend> {
    veu: &'a mut Veu<B>,
    awaited: bool,
}

impl<B: UioBackend> InFlight<'_, B> {
    /// Block until the engine finishes, then release it.
    ///
    /// The lock is released even when waiting fails.
    pub fn wait_for_completion(mut self) -> VeuResult<()> {
        self.awaited = true;
        self.veu.complete()
    }
}

impl<B: UioBackend> Drop for InFlight<'_, B> {
    fn drop(&mut self) {
        if self.awaited {
            return;
        }
        warn!("transform dropped without waiting, waiting now");
        if let Err(err) = self.veu.complete() {
            warn!(error = %err, "wait on drop failed");
        }
    }
}

//! # Transform Programming
//!
//! Turns one scale/rotate/convert request into the VEU register sequence.
//!
//! ## Two Phases
//!
//! Programming is split so that nothing reaches the hardware unless the whole
//! request is valid:
//!
//! 1. [`TransformPlan::resolve`] is pure. It defaults and aligns the crops,
//!    derives the scale factors, clips to the surfaces, validates every engine
//!    restriction and precomputes every register value.
//! 2. [`program`] replays the plan into the register window in the order the
//!    engine expects: reset, source, destination, swap/control, colour matrix,
//!    resize filter, rotation, interrupt enable, start.
//!
//! The caller takes the engine lock between the two phases.
//!
//! ## Scale Factors
//!
//! The geometric scale used for the limit checks is computed in floating point
//! from the aligned crops *before* clipping. The fixed-point ratio programmed
//! into the resize filter maps the clipped source extent onto that unclipped
//! destination extent, and the clipped destination extent goes to the clip
//! field of the filter status register.

use tracing::debug;
use veu_scale::format::PixelFormat;
use veu_scale::geometry::{PlaneOffsets, Rect, crop_offset};
use veu_scale::scale::{AxisScale, FracRounding};

use crate::error::{VeuError, VeuResult};
use crate::format::{pitch_bytes, swap_control, transform_control};
use crate::mmio::RegisterWindow;
use crate::regs::*;

/// Smallest source extent the engine accepts on either axis.
pub const MIN_SOURCE_DIM: i64 = 16;
/// Largest source extent the engine accepts on either axis.
pub const MAX_SOURCE_DIM: i64 = 4092;
/// Pitches must be a multiple of this many pixels.
pub const PITCH_ALIGN: u32 = 4;

/// Plane base addresses of a surface, as seen by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Planes {
    pub luma: u32,
    /// Chroma plane of a two-plane format. Single-plane formats leave it unset.
    pub chroma: Option<u32>,
}

impl Planes {
    pub const fn packed(base: u32) -> Self {
        Self {
            luma: base,
            chroma: None,
        }
    }

    pub const fn two_plane(luma: u32, chroma: u32) -> Self {
        Self {
            luma,
            chroma: Some(chroma),
        }
    }
}

/// One memory surface taking part in a transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Surface {
    pub planes: Planes,
    pub width: u32,
    pub height: u32,
    /// Row stride in pixels
    pub pitch: u32,
    pub format: PixelFormat,
}

impl Surface {
    /// A tightly packed surface: pitch equals width.
    pub const fn new(format: PixelFormat, width: u32, height: u32, planes: Planes) -> Self {
        Self {
            planes,
            width,
            height,
            pitch: width,
            format,
        }
    }

    pub const fn with_pitch(mut self, pitch: u32) -> Self {
        self.pitch = pitch;
        self
    }

    /// Crop covering the whole surface.
    pub fn full_rect(&self) -> Rect {
        Rect::full(self.width, self.height)
    }
}

/// Rotation applied while copying.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    None,
    /// Quarter turn. The only rotation with a documented register encoding.
    Rotate90,
}

impl Rotation {
    pub const fn is_rotating(self) -> bool {
        !matches!(self, Rotation::None)
    }
}

/// Resize axis; selects the half of the filter registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Low 16 bits
    Horizontal,
    /// High 16 bits
    Vertical,
}

impl Axis {
    const fn shift(self) -> u32 {
        match self {
            Axis::Horizontal => 0,
            Axis::Vertical => 16,
        }
    }
}

/// Resize filter settings for one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisProgram {
    pub scale: AxisScale,
    /// Visible output extent
    pub clip: u32,
    /// Only on engines with a passband register
    pub passband: Option<u32>,
}

/// Luma and chroma address register values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaneAddresses {
    pub luma: u32,
    pub chroma: u32,
}

impl PlaneAddresses {
    fn of(planes: Planes) -> Self {
        Self {
            luma: planes.luma,
            chroma: planes.chroma.unwrap_or(0),
        }
    }

    fn offset_by(self, offsets: PlaneOffsets) -> Self {
        Self {
            luma: self.luma.wrapping_add(offsets.luma),
            chroma: self.chroma.wrapping_add(offsets.chroma),
        }
    }
}

/// Everything needed to program one transform, computed up front.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformPlan {
    pub variant: HardwareVariant,
    pub rotation: Rotation,
    /// Source crop after alignment and clipping
    pub src_crop: Rect,
    /// Destination crop after alignment, before clipping
    pub dst_crop: Rect,
    /// Destination crop after clipping
    pub dst_clip: Rect,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Destination area larger than the clipped source area
    pub zoom: bool,
    pub src_addr: PlaneAddresses,
    /// VESSR
    pub src_size: u32,
    /// VESWR, bytes
    pub src_pitch: u32,
    pub dst_addr: PlaneAddresses,
    /// VEDWR, bytes
    pub dst_pitch: u32,
    /// VSWPR
    pub swap: u32,
    /// VTRCR
    pub control: u32,
    pub horizontal: AxisProgram,
    pub vertical: AxisProgram,
}

impl TransformPlan {
    /// Resolve crops, validate and compute every register value.
    ///
    /// `src_crop` / `dst_crop` are explicit crops; `None` selects the whole
    /// surface. Crop offsets are only applied to the plane addresses for an
    /// explicit crop.
    pub fn resolve(
        variant: HardwareVariant,
        src: &Surface,
        dst: &Surface,
        src_crop: Option<Rect>,
        dst_crop: Option<Rect>,
        rotation: Rotation,
    ) -> VeuResult<Self> {
        let src_explicit = src_crop.is_some();
        let dst_explicit = dst_crop.is_some();

        // Snap crops to the alignment the formats need
        let src_crop = src_crop.unwrap_or_else(|| src.full_rect()).aligned(src.format);
        let dst_crop = dst_crop.unwrap_or_else(|| dst.full_rect()).aligned(dst.format);

        let scale_x = dst_crop.width() as f32 / src_crop.width() as f32;
        let scale_y = dst_crop.height() as f32 / src_crop.height() as f32;

        let src_clip = src_crop.limit(src.width, src.height);
        let dst_clip = dst_crop.limit(dst.width, dst.height);

        let (src_w, src_h) = (src_clip.width(), src_clip.height());
        let (dst_w, dst_h) = (dst_clip.width(), dst_clip.height());

        debug!(
            ?src_clip,
            ?dst_crop,
            ?dst_clip,
            scale_x,
            scale_y,
            ?rotation,
            "resolved crops"
        );

        // Rotation can't be combined with scaling
        if rotation.is_rotating() && (src_w != dst_h || dst_w != src_h) {
            return Err(VeuError::validation(
                "rotation",
                "rotating requires src_width == dst_height and dst_width == src_height",
                format!("src {src_w}x{src_h}, dst {dst_w}x{dst_h}"),
            ));
        }

        // VESWR/VEDWR restrictions
        for (field, pitch) in [("src_pitch", src.pitch), ("dst_pitch", dst.pitch)] {
            if pitch % PITCH_ALIGN != 0 {
                return Err(VeuError::validation(
                    field,
                    "must be a multiple of 4 pixels",
                    pitch,
                ));
            }
        }

        // VESSR restrictions
        for (field, extent) in [("src_width", src_w), ("src_height", src_h)] {
            if !(MIN_SOURCE_DIM..=MAX_SOURCE_DIM).contains(&extent) {
                return Err(VeuError::validation(
                    field,
                    "must be within [16, 4092] after cropping",
                    extent,
                ));
            }
        }

        for (field, scale) in [("scale_x", scale_x), ("scale_y", scale_y)] {
            check_scale(variant, field, scale)?;
        }

        // The fixed-point ratio needs two output samples per axis and the clip
        // field a visible output
        if dst_crop.width() < 2 || dst_crop.height() < 2 {
            return Err(VeuError::validation(
                "dst_crop",
                "must span at least 2 pixels on each axis",
                format!("{}x{}", dst_crop.width(), dst_crop.height()),
            ));
        }
        if dst_w < 1 || dst_h < 1 {
            return Err(VeuError::validation(
                "dst_crop",
                "must overlap the destination surface",
                format!("{dst_crop:?}"),
            ));
        }

        let mut src_addr = PlaneAddresses::of(src.planes);
        if src_explicit {
            src_addr = src_addr.offset_by(crop_offset(src.format, src.pitch, src_clip.tl));
        }

        let mut dst_addr = PlaneAddresses::of(dst.planes);
        if dst_explicit {
            dst_addr = dst_addr.offset_by(crop_offset(dst.format, dst.pitch, dst_clip.tl));
        }
        if rotation.is_rotating() {
            let offset = rotation_offset(src_h as u32, dst.format);
            dst_addr = dst_addr.offset_by(PlaneOffsets {
                luma: offset,
                chroma: offset,
            });
        }

        let zoom = dst_crop.area() > src_clip.area();
        let horizontal = axis_program(variant, src_w as u32, dst_crop.width() as u32, dst_w as u32)?;
        let vertical = axis_program(variant, src_h as u32, dst_crop.height() as u32, dst_h as u32)?;

        let swap = swap_control(src.format, dst.format);
        let control = transform_control(src.format, dst.format);
        debug!(
            vswpr = format_args!("0x{swap:x}"),
            vtrcr = format_args!("0x{control:x}"),
            zoom,
            ratio_x = horizontal.scale.ratio(),
            ratio_y = vertical.scale.ratio(),
            "control words"
        );

        Ok(Self {
            variant,
            rotation,
            src_crop: src_clip,
            dst_crop,
            dst_clip,
            scale_x,
            scale_y,
            zoom,
            src_addr,
            src_size: ((src_h as u32) << 16) | src_w as u32,
            src_pitch: pitch_bytes(src.format, src.pitch),
            dst_addr,
            dst_pitch: pitch_bytes(dst.format, dst.pitch),
            swap,
            control,
            horizontal,
            vertical,
        })
    }
}

fn check_scale(variant: HardwareVariant, field: &str, scale: f32) -> VeuResult<()> {
    let (min, max) = (variant.min_scale(), variant.max_upscale());
    // Written so that NaN from an empty source crop is rejected too
    if !(scale >= min && scale <= max) {
        return Err(VeuError::validation(
            field,
            format!("must be within [1/16, {max}] on {}", variant.name()),
            scale,
        ));
    }
    Ok(())
}

fn axis_program(
    variant: HardwareVariant,
    size_in: u32,
    size_out: u32,
    clip: u32,
) -> VeuResult<AxisProgram> {
    let rounding = if variant.rounds_fraction_to_8() {
        FracRounding::Multiple8
    } else {
        FracRounding::Exact
    };

    let scale = AxisScale::compute(size_in, size_out, rounding).ok_or_else(|| {
        VeuError::validation("scale", "no fixed-point ratio for this extent", format!("{size_in} -> {size_out}"))
    })?;

    let passband = variant
        .has_passband()
        .then(|| scale.passband(size_in, size_out));

    Ok(AxisProgram {
        scale,
        clip,
        passband,
    })
}

/// Extra destination offset needed when the engine writes rotated output.
///
/// The engine walks the source in 16-line blocks; the rotated write starts
/// from the last, possibly partial, block.
pub fn rotation_offset(src_height: u32, dst_format: PixelFormat) -> u32 {
    let vblk = src_height.div_ceil(16);
    // Lines in the last block, 1..=16
    let sidev = (src_height + 15) % 16 + 1;
    let density = if dst_format == PixelFormat::Nv12 { 1 } else { 2 };

    (vblk * 16 + sidev).saturating_sub(32) * density
}

fn program_axis(window: &mut RegisterWindow, axis: Axis, settings: &AxisProgram) -> VeuResult<()> {
    let shift = axis.shift();
    let mask = 0xffff << shift;

    window.modify(Register::Vrfcr, mask, settings.scale.packed() << shift)?;
    window.modify(Register::Vrfsr, mask, (settings.clip & 0xffff) << shift)?;
    if let Some(passband) = settings.passband {
        window.modify(Register::Vrpbr, mask, (passband & 0xffff) << shift)?;
    }
    Ok(())
}

/// Write a resolved plan to the engine and start it.
///
/// The engine lock must be held. Returns as soon as the start bit is written.
pub fn program(window: &mut RegisterWindow, plan: &TransformPlan) -> VeuResult<()> {
    window.write(Register::Vbsrr, VBSRR_RESET)?;

    // source
    window.write(Register::Vsayr, plan.src_addr.luma)?;
    window.write(Register::Vsacr, plan.src_addr.chroma)?;
    window.write(Register::Vessr, plan.src_size)?;
    window.write(Register::Veswr, plan.src_pitch)?;
    window.write(Register::Vbssr, 0)?; // not using bundle mode

    // dest
    window.write(Register::Vdayr, plan.dst_addr.luma)?;
    window.write(Register::Vdacr, plan.dst_addr.chroma)?;
    window.write(Register::Vedwr, plan.dst_pitch)?;

    window.write(Register::Vswpr, plan.swap)?;
    window.write(Register::Vtrcr, plan.control)?;

    if plan.variant.has_csc_matrix() {
        for (reg, value) in VEU2H_CSC_MATRIX {
            window.write(reg, value)?;
        }
        window.write(Register::Vcoffr, VEU2H_CSC_OFFSET)?;
    }

    window.write(Register::Vrfcr, 0)?;
    window.write(Register::Vrfsr, 0)?;
    program_axis(window, Axis::Horizontal, &plan.horizontal)?;
    program_axis(window, Axis::Vertical, &plan.vertical)?;

    if plan.rotation.is_rotating() {
        window.write(Register::Vfmcr, VFMCR_ROTATE)?;
        // No scaling while rotating
        window.write(Register::Vrfcr, 0)?;
    } else {
        window.write(Register::Vfmcr, 0)?;
    }

    window.write(Register::Veier, VEIER_END)?;
    window.write(Register::Vestr, VESTR_START)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nv12(width: u32, height: u32) -> Surface {
        Surface::new(
            PixelFormat::Nv12,
            width,
            height,
            Planes::two_plane(0x1000_0000, 0x1000_0000 + width * height),
        )
    }

    fn resolve(src: &Surface, dst: &Surface) -> VeuResult<TransformPlan> {
        TransformPlan::resolve(HardwareVariant::Veu3f, src, dst, None, None, Rotation::None)
    }

    #[test]
    fn test_rotation_offset() {
        // 480 lines: 30 full blocks, 16 lines in the last one
        assert_eq!(rotation_offset(480, PixelFormat::Nv16), (28 * 16 + 16) * 2);
        assert_eq!(rotation_offset(480, PixelFormat::Nv12), 28 * 16 + 16);
        // 100 lines: 7 blocks, 4 lines in the last one
        assert_eq!(rotation_offset(100, PixelFormat::Rgb565), (5 * 16 + 4) * 2);
        assert_eq!(rotation_offset(16, PixelFormat::Nv12), 0);
    }

    #[test]
    fn test_identity_plan() {
        let plan = resolve(&nv12(720, 480), &nv12(720, 480)).unwrap();
        assert_eq!((plan.scale_x, plan.scale_y), (1.0, 1.0));
        assert_eq!(plan.horizontal.scale, AxisScale::default());
        assert_eq!(plan.vertical.scale, AxisScale::default());
        assert_eq!(plan.horizontal.clip, 720);
        assert_eq!(plan.vertical.clip, 480);
        assert_eq!(plan.src_size, (480 << 16) | 720);
        assert!(!plan.zoom);
    }

    #[test]
    fn test_default_crop_ignores_plane_offsets() {
        let src = nv12(720, 480);
        let plan = resolve(&src, &nv12(360, 240)).unwrap();
        assert_eq!(plan.src_addr.luma, src.planes.luma);
        assert_eq!(plan.src_addr.chroma, src.planes.chroma.unwrap());
    }

    #[test]
    fn test_explicit_crop_offsets_addresses() {
        let src = nv12(720, 480);
        let dst = nv12(720, 480);
        let crop = Rect::from_coords(18, 9, 378, 249); // aligns to (16, 8)..(376, 248)
        let plan = TransformPlan::resolve(
            HardwareVariant::Veu3f,
            &src,
            &dst,
            Some(crop),
            None,
            Rotation::None,
        )
        .unwrap();

        let offset = 8 * 720 + 16;
        assert_eq!(plan.src_crop, Rect::from_coords(16, 8, 376, 248));
        assert_eq!(plan.src_addr.luma, src.planes.luma + offset);
        assert_eq!(plan.src_addr.chroma, src.planes.chroma.unwrap() + offset / 2);
        assert_eq!(plan.dst_addr.luma, dst.planes.luma);
        assert!(plan.zoom);
    }

    #[test]
    fn test_destination_crop_past_surface_clips() {
        let src = nv12(320, 240);
        let dst = nv12(640, 480);
        let crop = Rect::from_coords(320, 240, 960, 720);
        let plan = TransformPlan::resolve(
            HardwareVariant::Veu3f,
            &src,
            &dst,
            None,
            Some(crop),
            Rotation::None,
        )
        .unwrap();

        // Ratio targets the full crop, the clip field only the visible part
        assert_eq!(plan.dst_crop.width(), 640);
        assert_eq!(plan.horizontal.clip, 320);
        assert_eq!(plan.vertical.clip, 240);
        assert_eq!(
            plan.horizontal.scale,
            AxisScale::compute(320, 640, FracRounding::Exact).unwrap()
        );
    }

    #[test]
    fn test_validation_rules() {
        let ok_dst = nv12(720, 480);

        let narrow = nv12(12, 480);
        assert_eq!(resolve(&narrow, &ok_dst).unwrap_err().category(), "validation");

        let huge = nv12(4096, 480);
        assert!(resolve(&huge, &ok_dst).is_err());

        let odd_pitch = nv12(720, 480).with_pitch(722);
        assert!(resolve(&odd_pitch, &ok_dst).is_err());

        // 32 -> 720 is 22.5x
        let tiny = nv12(32, 32);
        assert!(resolve(&tiny, &ok_dst).is_err());

        // 720 -> 40 is 1/18x
        assert!(resolve(&nv12(720, 480), &nv12(40, 480)).is_err());
    }

    #[test]
    fn test_destination_crop_must_overlap() {
        let crop = Rect::from_coords(800, 0, 1160, 240);
        let err = TransformPlan::resolve(
            HardwareVariant::Veu,
            &nv12(720, 480),
            &nv12(720, 480),
            None,
            Some(crop),
            Rotation::None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("dst_crop"));
    }

    #[test]
    fn test_program_order_ends_with_start() {
        let plan = resolve(&nv12(720, 480), &nv12(360, 240)).unwrap();
        let mut window = RegisterWindow::anonymous(HardwareVariant::Veu3f.window_size()).unwrap();
        program(&mut window, &plan).unwrap();

        assert_eq!(window.read(Register::Vbsrr).unwrap(), VBSRR_RESET);
        assert_eq!(window.read(Register::Veier).unwrap(), VEIER_END);
        assert_eq!(window.read(Register::Vestr).unwrap(), VESTR_START);
        assert_eq!(window.read(Register::Vbssr).unwrap(), 0);
    }
}

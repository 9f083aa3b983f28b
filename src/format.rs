//! Per-format register encodings.
//!
//! [`PixelFormat`] itself is hardware independent and lives in `veu-scale`;
//! this module maps it onto the VSWPR and VTRCR bit patterns.

use veu_scale::format::{PixelFormat, different_colorspace};

use crate::error::{VeuError, VeuResult};
use crate::regs::*;

/// Resolve a V4L2 fourcc into a format the engine can handle.
pub fn format_from_fourcc(fourcc: u32) -> VeuResult<PixelFormat> {
    PixelFormat::from_fourcc(fourcc).ok_or_else(|| VeuError::unsupported_format(fourcc))
}

/// Byte/word swap control for a source/destination pair.
///
/// Source nibble: RGB32 `0x0`, RGB565 `0x6`, otherwise `0x7`.
/// Destination nibble: RGB565 `0x60`, every other format `0x70`, RGB32
/// included.
pub fn swap_control(src: PixelFormat, dst: PixelFormat) -> u32 {
    let src_bits = match src {
        PixelFormat::Rgb32 => 0x0,
        PixelFormat::Rgb565 => 0x6,
        PixelFormat::Nv12 | PixelFormat::Nv16 => 0x7,
    };

    let dst_bits = match dst {
        PixelFormat::Rgb565 => 0x60,
        PixelFormat::Rgb32 | PixelFormat::Nv12 | PixelFormat::Nv16 => 0x70,
    };

    src_bits | dst_bits
}

fn source_code(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Rgb565 => VTRCR_RY_SRC_RGB | VTRCR_SRC_FMT_RGB565,
        PixelFormat::Rgb32 => VTRCR_RY_SRC_RGB | VTRCR_SRC_FMT_RGBX888,
        PixelFormat::Nv12 => VTRCR_RY_SRC_YCBCR | VTRCR_SRC_FMT_YCBCR420,
        PixelFormat::Nv16 => VTRCR_RY_SRC_YCBCR | VTRCR_SRC_FMT_YCBCR422,
    }
}

fn destination_code(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Rgb565 => VTRCR_DST_FMT_RGB565,
        PixelFormat::Rgb32 => VTRCR_DST_FMT_RGBX888,
        PixelFormat::Nv12 => VTRCR_DST_FMT_YCBCR420,
        PixelFormat::Nv16 => VTRCR_DST_FMT_YCBCR422,
    }
}

/// Transform control word: source and destination format codes, plus the
/// colourspace conversion bit when the two sit in different families.
pub fn transform_control(src: PixelFormat, dst: PixelFormat) -> u32 {
    let mut vtrcr = source_code(src) | destination_code(dst);
    if different_colorspace(src, dst) {
        vtrcr |= VTRCR_TE_BIT_SET;
    }
    vtrcr
}

/// Pitch register value: pixels to bytes.
pub fn pitch_bytes(format: PixelFormat, pitch: u32) -> u32 {
    pitch.wrapping_mul(format.pitch_multiplier())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_control_table() {
        let table = [
            (PixelFormat::Nv12, PixelFormat::Nv12, 0x77),
            (PixelFormat::Nv12, PixelFormat::Rgb565, 0x67),
            (PixelFormat::Nv16, PixelFormat::Rgb32, 0x77),
            (PixelFormat::Rgb565, PixelFormat::Nv12, 0x76),
            (PixelFormat::Rgb565, PixelFormat::Rgb565, 0x66),
            (PixelFormat::Rgb32, PixelFormat::Nv16, 0x70),
            (PixelFormat::Rgb32, PixelFormat::Rgb32, 0x70),
        ];
        for (src, dst, expected) in table {
            assert_eq!(swap_control(src, dst), expected, "{src:?} -> {dst:?}");
        }
    }

    #[test]
    fn test_rgb32_destination_keeps_0x70_swap_bits() {
        // Pinned: RGB32 output is not exempt from the destination swap nibble
        assert_eq!(swap_control(PixelFormat::Rgb32, PixelFormat::Rgb32) & 0xf0, 0x70);
    }

    #[test]
    fn test_transform_control() {
        assert_eq!(transform_control(PixelFormat::Nv12, PixelFormat::Nv12), 0);
        assert_eq!(
            transform_control(PixelFormat::Nv12, PixelFormat::Rgb565),
            VTRCR_DST_FMT_RGB565 | VTRCR_TE_BIT_SET
        );
        assert_eq!(
            transform_control(PixelFormat::Rgb32, PixelFormat::Nv16),
            VTRCR_RY_SRC_RGB | VTRCR_SRC_FMT_RGBX888 | VTRCR_DST_FMT_YCBCR422 | VTRCR_TE_BIT_SET
        );
        assert_eq!(
            transform_control(PixelFormat::Rgb565, PixelFormat::Rgb32) & VTRCR_TE_BIT_SET,
            0
        );
    }

    #[test]
    fn test_fourcc_resolution() {
        assert_eq!(
            format_from_fourcc(PixelFormat::Nv16.fourcc()).unwrap(),
            PixelFormat::Nv16
        );
        let err = format_from_fourcc(u32::from_le_bytes(*b"YV12")).unwrap_err();
        assert_eq!(err.category(), "unsupported_format");
    }

    #[test]
    fn test_pitch_bytes() {
        assert_eq!(pitch_bytes(PixelFormat::Rgb565, 320), 640);
        assert_eq!(pitch_bytes(PixelFormat::Rgb32, 320), 1280);
        assert_eq!(pitch_bytes(PixelFormat::Nv12, 720), 720);
    }
}

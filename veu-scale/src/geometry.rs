// SPDX-License-Identifier: MIT
//! # Crop Geometry
//!
//! Crop rectangles select the part of a surface the engine reads from or
//! writes to. They are expressed in pixel coordinates with an inclusive top-left
//! corner and an exclusive bottom-right corner, and go through three steps
//! before a transform is programmed:
//!
//! 1. **Alignment**: corners are snapped down to a multiple of 4 for every
//!    format that needs it (see [`align`])
//! 2. **Clipping**: the rectangle is clamped to the surface bounds (see
//!    [`Rect::limit`]); clipping only ever shrinks a rectangle
//! 3. **Addressing**: the clipped top-left corner is turned into byte offsets
//!    for the luma and chroma planes (see [`crop_offset`])
//!
//! Coordinates are signed so that a caller-supplied crop hanging off the top or
//! left edge of a surface is representable until it is clipped.

use crate::format::PixelFormat;

/// A pixel position on a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Crop rectangle with an exclusive bottom-right corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Top left
    pub tl: Point,
    /// Bottom right
    pub br: Point,
}

impl Rect {
    pub const fn new(tl: Point, br: Point) -> Self {
        Self { tl, br }
    }

    /// Rectangle from corner coordinates `(x1, y1)`..`(x2, y2)`.
    pub const fn from_coords(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            tl: Point::new(x1, y1),
            br: Point::new(x2, y2),
        }
    }

    /// Rectangle covering a whole `width` x `height` surface.
    pub fn full(width: u32, height: u32) -> Self {
        Self::from_coords(0, 0, saturate(width), saturate(height))
    }

    /// Horizontal extent. Widened so any pair of `i32` corners fits.
    pub const fn width(&self) -> i64 {
        self.br.x as i64 - self.tl.x as i64
    }

    pub const fn height(&self) -> i64 {
        self.br.y as i64 - self.tl.y as i64
    }

    pub const fn area(&self) -> i64 {
        self.width().saturating_mul(self.height())
    }

    /// Both corners snapped with [`align`] for `format`.
    pub fn aligned(self, format: PixelFormat) -> Self {
        Self {
            tl: align(format, self.tl),
            br: align(format, self.br),
        }
    }

    /// Clamp into `[0, width] x [0, height]`.
    ///
    /// Only the top-left corner is raised and only the bottom-right corner is
    /// lowered, so a rectangle never grows. A crop lying entirely outside the
    /// surface therefore comes back with a negative extent, which the caller
    /// has to reject.
    pub fn limit(self, width: u32, height: u32) -> Self {
        let (w, h) = (saturate(width), saturate(height));
        Self {
            tl: Point::new(self.tl.x.max(0), self.tl.y.max(0)),
            br: Point::new(self.br.x.min(w), self.br.y.min(h)),
        }
    }
}

fn saturate(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Snap a point down to the 4-pixel grid the engine needs for `format`.
///
/// YCbCr coordinates must be a multiple of 4 because of chroma sub-sampling
/// and because the chroma plane address has to stay word aligned. RGB565 is
/// left untouched.
pub fn align(format: PixelFormat, p: Point) -> Point {
    if format.requires_alignment() {
        Point::new(p.x & !3, p.y & !3)
    } else {
        p
    }
}

/// Byte offsets to add to the plane base addresses for a crop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaneOffsets {
    pub luma: u32,
    /// Always zero for single-plane formats.
    pub chroma: u32,
}

/// Offsets of the crop origin `p` inside planes of pitch `stride` pixels.
///
/// With `offset = y * stride + x`:
///
/// | Format | Luma | Chroma |
/// |--------|------|--------|
/// | RGB565 | `2 * offset` | - |
/// | RGB32 | `4 * offset` | - |
/// | NV12 | `offset` | `offset / 2` |
/// | NV16 | `offset` | `offset` |
///
/// The arithmetic wraps like the 32-bit address registers it feeds.
/// `p` is expected to be already clipped, so negative coordinates count as 0.
pub fn crop_offset(format: PixelFormat, stride: u32, p: Point) -> PlaneOffsets {
    let x = p.x.max(0) as u32;
    let y = p.y.max(0) as u32;
    let offset = y.wrapping_mul(stride).wrapping_add(x);

    match format {
        PixelFormat::Rgb565 => PlaneOffsets {
            luma: offset.wrapping_mul(2),
            chroma: 0,
        },
        PixelFormat::Rgb32 => PlaneOffsets {
            luma: offset.wrapping_mul(4),
            chroma: 0,
        },
        PixelFormat::Nv12 => PlaneOffsets {
            luma: offset,
            chroma: offset / 2,
        },
        PixelFormat::Nv16 => PlaneOffsets {
            luma: offset,
            chroma: offset,
        },
    }
}

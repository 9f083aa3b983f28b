// SPDX-License-Identifier: MIT
//! # Pixel Formats
//!
//! The VEU reads and writes exactly four memory layouts. Two are packed RGB
//! (one plane), two are semi-planar YCbCr (a luma plane followed by an
//! interleaved CbCr plane). Everything that depends only on the layout, and not
//! on the register encoding of a particular engine, lives here.
//!
//! | Format | Family | Planes | Bytes per pixel (luma) | Aligned crop |
//! |--------|--------|--------|------------------------|--------------|
//! | `Rgb565` | RGB | 1 | 2 | no |
//! | `Rgb32` | RGB | 1 | 4 | yes |
//! | `Nv12` | YCbCr 4:2:0 | 2 | 1 | yes |
//! | `Nv16` | YCbCr 4:2:2 | 2 | 1 | yes |

/// Colour family of a pixel format.
///
/// Colourspace conversion is switched on whenever source and destination
/// belong to different families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorFamily {
    Rgb,
    YCbCr,
}

/// Pixel formats natively supported by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum PixelFormat {
    /// 16-bit packed RGB 5:6:5
    #[clap(name = "rgb565")]
    Rgb565,
    /// 32-bit packed RGB with an unused padding byte
    #[clap(name = "rgb32")]
    Rgb32,
    /// Two-plane YCbCr 4:2:0
    #[clap(name = "nv12")]
    Nv12,
    /// Two-plane YCbCr 4:2:2
    #[clap(name = "nv16")]
    Nv16,
}

/// Build a V4L2-style little-endian fourcc.
const fn fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | ((code[1] as u32) << 8) | ((code[2] as u32) << 16) | ((code[3] as u32) << 24)
}

impl PixelFormat {
    /// Every supported format, in fourcc-table order.
    pub const ALL: [PixelFormat; 4] = [
        PixelFormat::Rgb565,
        PixelFormat::Rgb32,
        PixelFormat::Nv12,
        PixelFormat::Nv16,
    ];

    /// The V4L2 fourcc identifying this format.
    pub const fn fourcc(self) -> u32 {
        match self {
            PixelFormat::Rgb565 => fourcc(b"RGBP"),
            PixelFormat::Rgb32 => fourcc(b"RGB4"),
            PixelFormat::Nv12 => fourcc(b"NV12"),
            PixelFormat::Nv16 => fourcc(b"NV16"),
        }
    }

    /// Look up a format by V4L2 fourcc. Returns `None` for any layout the
    /// engine cannot handle.
    pub fn from_fourcc(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.fourcc() == code)
    }

    pub const fn family(self) -> ColorFamily {
        match self {
            PixelFormat::Rgb565 | PixelFormat::Rgb32 => ColorFamily::Rgb,
            PixelFormat::Nv12 | PixelFormat::Nv16 => ColorFamily::YCbCr,
        }
    }

    /// Multiplier turning a pitch in pixels into the byte stride the pitch
    /// registers expect. Two-plane formats are already one byte per luma sample.
    pub const fn pitch_multiplier(self) -> u32 {
        match self {
            PixelFormat::Rgb565 => 2,
            PixelFormat::Rgb32 => 4,
            PixelFormat::Nv12 | PixelFormat::Nv16 => 1,
        }
    }

    pub const fn is_two_plane(self) -> bool {
        matches!(self, PixelFormat::Nv12 | PixelFormat::Nv16)
    }

    /// Whether crop corners must be snapped to a multiple of 4.
    ///
    /// Chroma sub-sampling and the word alignment of the chroma plane address
    /// require it for every format except RGB565.
    pub const fn requires_alignment(self) -> bool {
        !matches!(self, PixelFormat::Rgb565)
    }
}

/// True when the two formats sit in different colour families.
pub fn different_colorspace(a: PixelFormat, b: PixelFormat) -> bool {
    a.family() != b.family()
}

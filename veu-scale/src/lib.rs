// SPDX-License-Identifier: MIT
//! # veu-scale: Geometry and Fixed-Point Scaling for the SH-Mobile VEU
//!
//! This crate holds the hardware-independent arithmetic behind a VEU transform.
//! Nothing in here touches a register: every function is a pure computation over
//! crop rectangles, pixel formats and surface sizes, so it can be exercised on any
//! host.
//!
//! ## Key Components
//!
//! - [`format`]: the closed set of pixel formats the engine understands, their
//!   colour family and the pixel-to-byte pitch multiplier
//! - [`geometry`]: crop rectangles, the 4-pixel alignment rule, surface clipping
//!   and plane crop offsets
//! - [`scale`]: the 12.12 fixed-point resize ratio and the downscale passband
//!
//! ## Usage Example
//!
//! ```rust
//! use veu_scale::format::PixelFormat;
//! use veu_scale::geometry::{Point, Rect};
//! use veu_scale::scale::{AxisScale, FracRounding};
//!
//! // Crop the middle of a 720x480 NV12 frame
//! let crop = Rect::new(Point::new(181, 121), Point::new(541, 361)).aligned(PixelFormat::Nv12);
//! assert_eq!(crop.tl, Point::new(180, 120));
//!
//! // Scale 360 columns down to 320
//! let scale = AxisScale::compute(crop.width() as u32, 320, FracRounding::Exact).unwrap();
//! assert_eq!(scale.mant, 1);
//! ```

pub mod format;
pub mod geometry;
pub mod scale;

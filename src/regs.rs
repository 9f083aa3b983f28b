//! VEU register map and bit-field constants.
//!
//! Offsets are byte offsets from the start of the UIO register window and match
//! the SH-Mobile VEU hardware manual. All registers are 32 bits wide.

/// Registers touched by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Register {
    /// Start
    Vestr,
    /// Source memory width (pitch in bytes)
    Veswr,
    /// Source size, `(height << 16) | width`
    Vessr,
    /// Source luma address
    Vsayr,
    /// Source chroma address
    Vsacr,
    /// Bundle source size
    Vbssr,
    /// Destination memory width (pitch in bytes)
    Vedwr,
    /// Destination luma address
    Vdayr,
    /// Destination chroma address
    Vdacr,
    /// Transform control
    Vtrcr,
    /// Resize filter control: horizontal ratio low half, vertical high half
    Vrfcr,
    /// Resize filter status: horizontal clip low half, vertical high half
    Vrfsr,
    /// Filter mode control (rotation)
    Vfmcr,
    /// Byte/word swap control
    Vswpr,
    /// Interrupt enable
    Veier,
    /// Event (interrupt acknowledge)
    Vevtr,
    /// Status
    Vstar,
    /// Software reset
    Vbsrr,
    /// Resize passband (VEU3F)
    Vrpbr,
    /// Colour conversion matrix (VEU2H)
    Vmcr00,
    Vmcr01,
    Vmcr02,
    Vmcr10,
    Vmcr11,
    Vmcr12,
    Vmcr20,
    Vmcr21,
    Vmcr22,
    /// Colour conversion offset (VEU2H)
    Vcoffr,
}

impl Register {
    /// Every register, in offset order.
    pub const ALL: [Register; 29] = [
        Register::Vestr,
        Register::Veswr,
        Register::Vessr,
        Register::Vsayr,
        Register::Vsacr,
        Register::Vbssr,
        Register::Vedwr,
        Register::Vdayr,
        Register::Vdacr,
        Register::Vtrcr,
        Register::Vrfcr,
        Register::Vrfsr,
        Register::Vfmcr,
        Register::Vswpr,
        Register::Veier,
        Register::Vevtr,
        Register::Vstar,
        Register::Vbsrr,
        Register::Vrpbr,
        Register::Vmcr00,
        Register::Vmcr01,
        Register::Vmcr02,
        Register::Vmcr10,
        Register::Vmcr11,
        Register::Vmcr12,
        Register::Vmcr20,
        Register::Vmcr21,
        Register::Vmcr22,
        Register::Vcoffr,
    ];

    pub const fn offset(self) -> usize {
        match self {
            Register::Vestr => 0x00,
            Register::Veswr => 0x10,
            Register::Vessr => 0x14,
            Register::Vsayr => 0x18,
            Register::Vsacr => 0x1c,
            Register::Vbssr => 0x20,
            Register::Vedwr => 0x30,
            Register::Vdayr => 0x34,
            Register::Vdacr => 0x38,
            Register::Vtrcr => 0x50,
            Register::Vrfcr => 0x54,
            Register::Vrfsr => 0x58,
            Register::Vfmcr => 0x70,
            Register::Vswpr => 0x94,
            Register::Veier => 0xa0,
            Register::Vevtr => 0xa4,
            Register::Vstar => 0xb0,
            Register::Vbsrr => 0xb4,
            Register::Vrpbr => 0xc8,
            Register::Vmcr00 => 0x200,
            Register::Vmcr01 => 0x204,
            Register::Vmcr02 => 0x208,
            Register::Vmcr10 => 0x20c,
            Register::Vmcr11 => 0x210,
            Register::Vmcr12 => 0x214,
            Register::Vmcr20 => 0x218,
            Register::Vmcr21 => 0x21c,
            Register::Vmcr22 => 0x220,
            Register::Vcoffr => 0x224,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Register::Vestr => "VESTR",
            Register::Veswr => "VESWR",
            Register::Vessr => "VESSR",
            Register::Vsayr => "VSAYR",
            Register::Vsacr => "VSACR",
            Register::Vbssr => "VBSSR",
            Register::Vedwr => "VEDWR",
            Register::Vdayr => "VDAYR",
            Register::Vdacr => "VDACR",
            Register::Vtrcr => "VTRCR",
            Register::Vrfcr => "VRFCR",
            Register::Vrfsr => "VRFSR",
            Register::Vfmcr => "VFMCR",
            Register::Vswpr => "VSWPR",
            Register::Veier => "VEIER",
            Register::Vevtr => "VEVTR",
            Register::Vstar => "VSTAR",
            Register::Vbsrr => "VBSRR",
            Register::Vrpbr => "VRPBR",
            Register::Vmcr00 => "VMCR00",
            Register::Vmcr01 => "VMCR01",
            Register::Vmcr02 => "VMCR02",
            Register::Vmcr10 => "VMCR10",
            Register::Vmcr11 => "VMCR11",
            Register::Vmcr12 => "VMCR12",
            Register::Vmcr20 => "VMCR20",
            Register::Vmcr21 => "VMCR21",
            Register::Vmcr22 => "VMCR22",
            Register::Vcoffr => "VCOFFR",
        }
    }
}

// --- Control values ---

/// VBSRR: software reset.
pub const VBSRR_RESET: u32 = 0x100;
/// VEVTR: end-of-transform interrupt acknowledge.
pub const VEVTR_ACK: u32 = 0x100;
/// VSTAR: engine busy.
pub const VSTAR_BUSY: u32 = 0x1;
/// VEIER: end-of-transform interrupt enable.
pub const VEIER_END: u32 = 0x1;
/// VESTR: start trigger.
pub const VESTR_START: u32 = 0x1;
/// VFMCR: rotation mode.
pub const VFMCR_ROTATE: u32 = 0x1;

// --- VTRCR ---

pub const VTRCR_DST_FMT_YCBCR420: u32 = 0x0000_0000;
pub const VTRCR_DST_FMT_YCBCR422: u32 = 0x0040_0000;
pub const VTRCR_DST_FMT_RGB565: u32 = 0x0006_0000;
pub const VTRCR_DST_FMT_RGBX888: u32 = 0x0019_0000;
pub const VTRCR_SRC_FMT_YCBCR420: u32 = 0x0000_0000;
pub const VTRCR_SRC_FMT_YCBCR422: u32 = 0x0000_4000;
pub const VTRCR_SRC_FMT_RGB565: u32 = 0x0000_0300;
pub const VTRCR_SRC_FMT_RGBX888: u32 = 0x0000_1900;
/// Colourspace conversion enable.
pub const VTRCR_TE_BIT_SET: u32 = 0x0000_0002;
pub const VTRCR_RY_SRC_YCBCR: u32 = 0x0000_0000;
pub const VTRCR_RY_SRC_RGB: u32 = 0x0000_0001;

// --- VEU2H fixed colour conversion ---

/// YCbCr <-> RGB coefficients programmed on every VEU2H transform.
pub const VEU2H_CSC_MATRIX: [(Register, u32); 9] = [
    (Register::Vmcr00, 0x0cc5),
    (Register::Vmcr01, 0x0950),
    (Register::Vmcr02, 0x0000),
    (Register::Vmcr10, 0x397f),
    (Register::Vmcr11, 0x0950),
    (Register::Vmcr12, 0x3cdd),
    (Register::Vmcr20, 0x0000),
    (Register::Vmcr21, 0x0950),
    (Register::Vmcr22, 0x1023),
];

pub const VEU2H_CSC_OFFSET: u32 = 0x0080_0010;

// --- Hardware variants ---

/// Register window size published by a VEU2H (SH7723).
pub const VEU2H_WINDOW_SIZE: usize = 0x27c;
/// Register window size published by a VEU3F.
pub const VEU3F_WINDOW_SIZE: usize = 0xcc;

/// Engine generation, told apart by the size of its register window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HardwareVariant {
    /// Baseline VEU
    Veu,
    /// VEU2H: 8x zoom limit, 8-grid scale fractions, fixed CSC matrix
    Veu2h,
    /// VEU3F: resize passband register
    Veu3f,
}

impl HardwareVariant {
    pub fn from_window_size(size: usize) -> Self {
        match size {
            VEU2H_WINDOW_SIZE => HardwareVariant::Veu2h,
            VEU3F_WINDOW_SIZE => HardwareVariant::Veu3f,
            _ => HardwareVariant::Veu,
        }
    }

    /// Largest enlargement factor per axis.
    pub fn max_upscale(self) -> f32 {
        match self {
            HardwareVariant::Veu2h => 8.0,
            HardwareVariant::Veu | HardwareVariant::Veu3f => 16.0,
        }
    }

    /// Smallest scale factor per axis, shared by every generation.
    pub fn min_scale(self) -> f32 {
        1.0 / 16.0
    }

    pub fn rounds_fraction_to_8(self) -> bool {
        self == HardwareVariant::Veu2h
    }

    pub fn has_passband(self) -> bool {
        self == HardwareVariant::Veu3f
    }

    pub fn has_csc_matrix(self) -> bool {
        self == HardwareVariant::Veu2h
    }

    /// Smallest window that covers every register this variant is programmed
    /// through.
    pub fn required_window_size(self) -> usize {
        let last = match self {
            HardwareVariant::Veu => Register::Vbsrr,
            HardwareVariant::Veu2h => Register::Vcoffr,
            HardwareVariant::Veu3f => Register::Vrpbr,
        };
        last.offset() + 4
    }

    /// Window size a real engine of this variant publishes.
    pub fn window_size(self) -> usize {
        match self {
            HardwareVariant::Veu => self.required_window_size(),
            HardwareVariant::Veu2h => VEU2H_WINDOW_SIZE,
            HardwareVariant::Veu3f => VEU3F_WINDOW_SIZE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HardwareVariant::Veu => "veu",
            HardwareVariant::Veu2h => "veu2h",
            HardwareVariant::Veu3f => "veu3f",
        }
    }
}

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value, json};
use shveu::format::format_from_fourcc;
use shveu::{
    CropTarget, HardwareVariant, MemoryBackend, PixelFormat, Planes, Rect, Rotation, Surface,
    TransformPlan, UioBackend, Veu, VeuConfig,
};
use tracing::{Level, info};

/// Drive the SH-Mobile VEU: scale, rotate and colour-convert frames in
/// physical memory.
#[derive(Parser, Debug)]
#[command(name = "shveu")]
#[command(about = "Program the SH-Mobile VEU through UIO")]
#[command(long_about = "Program the SH-Mobile Video Engine Unit through its UIO register window.
`plan` resolves a transform against an in-memory engine and prints the register image;
`run` programs the real engine and waits for it to finish.")]
struct Cli {
    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a transform and print the registers it programs, without hardware
    Plan {
        #[command(flatten)]
        transform: TransformArgs,

        /// Engine generation to model
        #[arg(long, value_enum, default_value = "veu3f")]
        variant: VariantArg,
    },
    /// Program the engine and wait for completion
    Run {
        #[command(flatten)]
        transform: TransformArgs,

        /// UIO device name to look for
        #[arg(long, default_value = "VEU")]
        uio_name: String,

        /// Give up on a busy engine after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct TransformArgs {
    /// Source format, by name (nv12) or V4L2 fourcc (NV12)
    #[arg(long, value_parser = parse_format)]
    src_format: PixelFormat,

    /// Source size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size)]
    src_size: (u32, u32),

    /// Source pitch in pixels (defaults to the width)
    #[arg(long)]
    src_pitch: Option<u32>,

    /// Source luma (or packed) plane physical address
    #[arg(long, value_parser = parse_addr, default_value = "0")]
    src_addr: u32,

    /// Source chroma plane address (defaults to right after luma)
    #[arg(long, value_parser = parse_addr)]
    src_chroma: Option<u32>,

    #[arg(long, value_parser = parse_format)]
    dst_format: PixelFormat,

    /// Destination size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size)]
    dst_size: (u32, u32),

    #[arg(long)]
    dst_pitch: Option<u32>,

    #[arg(long, value_parser = parse_addr, default_value = "0")]
    dst_addr: u32,

    #[arg(long, value_parser = parse_addr)]
    dst_chroma: Option<u32>,

    /// Source crop as X1,Y1,X2,Y2
    #[arg(long, value_parser = parse_rect)]
    src_crop: Option<Rect>,

    /// Destination crop as X1,Y1,X2,Y2
    #[arg(long, value_parser = parse_rect)]
    dst_crop: Option<Rect>,

    /// Rotate by 90 degrees
    #[arg(long)]
    rotate: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantArg {
    Veu,
    Veu2h,
    Veu3f,
}

impl From<VariantArg> for HardwareVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Veu => HardwareVariant::Veu,
            VariantArg::Veu2h => HardwareVariant::Veu2h,
            VariantArg::Veu3f => HardwareVariant::Veu3f,
        }
    }
}

impl TransformArgs {
    fn surfaces(&self) -> (Surface, Surface) {
        let src = surface(
            self.src_format,
            self.src_size,
            self.src_pitch,
            self.src_addr,
            self.src_chroma,
        );
        let dst = surface(
            self.dst_format,
            self.dst_size,
            self.dst_pitch,
            self.dst_addr,
            self.dst_chroma,
        );
        (src, dst)
    }

    fn rotation(&self) -> Rotation {
        if self.rotate {
            Rotation::Rotate90
        } else {
            Rotation::None
        }
    }

    fn apply_crops<B: UioBackend>(&self, veu: &mut Veu<B>) {
        if let Some(rect) = self.src_crop {
            veu.set_crop(CropTarget::Source, rect);
        }
        if let Some(rect) = self.dst_crop {
            veu.set_crop(CropTarget::Destination, rect);
        }
    }
}

fn surface(
    format: PixelFormat,
    (width, height): (u32, u32),
    pitch: Option<u32>,
    luma: u32,
    chroma: Option<u32>,
) -> Surface {
    let pitch = pitch.unwrap_or(width);
    let planes = if format.is_two_plane() {
        let chroma = chroma.unwrap_or_else(|| luma.wrapping_add(pitch.wrapping_mul(height)));
        Planes::two_plane(luma, chroma)
    } else {
        Planes::packed(luma)
    };
    Surface::new(format, width, height, planes).with_pitch(pitch)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Plan { transform, variant } => {
            let mut veu = Veu::with_backend(
                MemoryBackend::new(variant.into()),
                &VeuConfig::default(),
            )?;
            let report = execute(&mut veu, &transform)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            veu.close();
        }
        Command::Run {
            transform,
            uio_name,
            timeout_ms,
        } => {
            let mut config = VeuConfig::default().with_uio_name(uio_name);
            if let Some(ms) = timeout_ms {
                config = config.with_hang_timeout(Duration::from_millis(ms));
            }
            let mut veu = Veu::open(&config).context("failed to open VEU")?;
            let report = execute(&mut veu, &transform)?;
            info!("transform complete");
            println!("{}", serde_json::to_string_pretty(&report)?);
            veu.close();
        }
    }

    Ok(())
}

/// Program one transform, wait for it and describe what was written.
fn execute<B: UioBackend>(veu: &mut Veu<B>, args: &TransformArgs) -> Result<Value> {
    let (src, dst) = args.surfaces();
    let rotation = args.rotation();
    args.apply_crops(veu);

    let plan = veu.plan(&src, &dst, rotation)?;
    veu.program_transform(&src, &dst, rotation)?
        .wait_for_completion()?;

    let mut registers = Map::new();
    for (reg, value) in veu.window().snapshot()? {
        registers.insert(reg.name().to_string(), json!(format!("0x{value:08x}")));
    }

    Ok(json!({
        "variant": veu.variant().name(),
        "plan": describe(&plan),
        "registers": registers,
    }))
}

fn describe(plan: &TransformPlan) -> Value {
    let rect = |r: Rect| json!([r.tl.x, r.tl.y, r.br.x, r.br.y]);
    json!({
        "src_crop": rect(plan.src_crop),
        "dst_crop": rect(plan.dst_crop),
        "dst_clip": rect(plan.dst_clip),
        "scale_x": plan.scale_x,
        "scale_y": plan.scale_y,
        "zoom": plan.zoom,
        "rotate": plan.rotation.is_rotating(),
    })
}

/// Parse a format name, falling back to a four character fourcc
fn parse_format(text: &str) -> Result<PixelFormat> {
    if let Ok(format) = <PixelFormat as ValueEnum>::from_str(text, false) {
        return Ok(format);
    }
    let code: [u8; 4] = text
        .as_bytes()
        .try_into()
        .map_err(|_| anyhow::anyhow!("Invalid format: {}. Use a name or a fourcc", text))?;
    Ok(format_from_fourcc(u32::from_le_bytes(code))?)
}

/// Parse "720x480"
fn parse_size(text: &str) -> Result<(u32, u32)> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow::anyhow!("Invalid size: {}. Use WIDTHxHEIGHT", text))?;
    let width = w.trim().parse().with_context(|| format!("Invalid width in size: {w}"))?;
    let height = h.trim().parse().with_context(|| format!("Invalid height in size: {h}"))?;
    Ok((width, height))
}

/// Parse "x1,y1,x2,y2"
fn parse_rect(text: &str) -> Result<Rect> {
    let coords = text
        .split(',')
        .map(|part| part.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid crop: {text}"))?;
    match coords.as_slice() {
        [x1, y1, x2, y2] => Ok(Rect::from_coords(*x1, *y1, *x2, *y2)),
        _ => bail!("Invalid crop: {}. Use X1,Y1,X2,Y2", text),
    }
}

/// Parse a physical address, hex with 0x prefix or decimal
fn parse_addr(text: &str) -> Result<u32> {
    let text = text.trim();
    let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    value.with_context(|| format!("Invalid address: {text}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("nv16").unwrap(), PixelFormat::Nv16);
        assert_eq!(parse_format("RGBP").unwrap(), PixelFormat::Rgb565);
        assert_eq!(parse_format("RGB4").unwrap(), PixelFormat::Rgb32);

        let err = parse_format("YUYV").unwrap_err();
        assert!(err.to_string().contains("'YUYV'"), "{err}");
        assert!(parse_format("yuv420p").is_err());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("720x480").unwrap(), (720, 480));
        assert!(parse_size("720").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn test_parse_rect() {
        assert_eq!(parse_rect("0, 0, 320, 240").unwrap(), Rect::from_coords(0, 0, 320, 240));
        assert!(parse_rect("1,2,3").is_err());
    }

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr("0x40000000").unwrap(), 0x4000_0000);
        assert_eq!(parse_addr("4096").unwrap(), 4096);
        assert!(parse_addr("0xzz").is_err());
    }

    #[test]
    fn test_plan_report() {
        let cli = Cli::parse_from([
            "shveu",
            "plan",
            "--src-format",
            "NV12",
            "--src-size",
            "720x480",
            "--dst-format",
            "rgb565",
            "--dst-size",
            "320x240",
        ]);
        let Command::Plan { transform, variant } = cli.command else {
            panic!("expected plan");
        };
        let mut veu =
            Veu::with_backend(MemoryBackend::new(variant.into()), &VeuConfig::default()).unwrap();
        let report = execute(&mut veu, &transform).unwrap();

        assert_eq!(report["variant"], "veu3f");
        assert_eq!(report["registers"]["VEDWR"], "0x00000280");
        assert_eq!(report["registers"]["VESTR"], "0x00000001");
    }
}

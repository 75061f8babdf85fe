use clap::Parser;
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::{raw::RawU16, Rgb565, Rgb888},
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::Text,
};
use embedded_io::{Read as _, Write as _};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use video::device::sim::{SimControl, SimMapper, SwapLatency};
use video::{BoundsMode, Canvas, Display, DisplayConfig, DisplayGeometry, MemWindow, VideoDevice, VideoError};

mod logger;

type SimDevice = VideoDevice<SimControl, MemWindow>;
type SimDisplay = Display<SimControl, MemWindow>;

/// Run video commands against a simulated DE1-SoC VGA subsystem
#[derive(Parser)]
struct Args {
    /// Command script, one command per line (stdin if omitted)
    script: Option<PathBuf>,

    /// Pixel resolution reported by the pixel controller
    #[arg(long, default_value_t = 320)]
    width: u32,
    #[arg(long, default_value_t = 240)]
    height: u32,

    /// Character grid reported by the character controller
    #[arg(long, default_value_t = 80)]
    columns: u32,
    #[arg(long, default_value_t = 60)]
    rows: u32,

    /// Write wherever the addressing formula lands instead of rejecting
    /// off-screen coordinates
    #[arg(long)]
    unchecked: bool,

    /// Status polls before the simulated controller acknowledges a swap
    #[arg(long, default_value_t = 2)]
    swap_latency: u32,

    /// Simulate a controller that never acknowledges a swap
    #[arg(long)]
    hung: bool,

    /// Give up on a swap after this many polls
    #[arg(long)]
    poll_limit: Option<u32>,

    /// Draw a border and banner with embedded-graphics before the script
    #[arg(long)]
    test_pattern: bool,

    /// Print the geometry message read from the device before running
    #[arg(short, long)]
    query: bool,

    /// Keep going after a rejected command
    #[arg(short, long)]
    keep_going: bool,

    /// Dump the visible frame as a binary PPM
    #[arg(long)]
    ppm: Option<PathBuf>,

    /// Print the character grid after the script
    #[arg(long)]
    dump_text: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init_logger(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("vgactl: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when a command was rejected
fn run(args: &Args) -> io::Result<bool> {
    let mut mapper = SimMapper {
        pixel_geometry: DisplayGeometry::new(args.width, args.height),
        char_geometry: DisplayGeometry::new(args.columns, args.rows),
        latency: if args.hung {
            SwapLatency::Never
        } else {
            SwapLatency::Polls(args.swap_latency)
        },
        ..SimMapper::de1_soc()
    };
    let bounds = if args.unchecked {
        BoundsMode::Unchecked
    } else {
        BoundsMode::Checked
    };
    let config = DisplayConfig::default()
        .with_bounds(bounds)
        .with_swap_poll_limit(args.poll_limit);

    let mut display = Display::open(&mut mapper, config).map_err(video_err)?;
    if args.test_pattern {
        draw_test_pattern(&mut display).map_err(video_err)?;
    }
    let mut device = VideoDevice::new(display);

    if args.query {
        print!("{}", read_message(&mut device).map_err(video_err)?);
    }

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let clean = run_script(&mut device, input, args.keep_going)?;

    let display = device.into_inner();
    if let Some(path) = &args.ppm {
        let frame = encode_ppm(&display).map_err(video_err)?;
        fs::write(path, frame)?;
        println!("Wrote {}x{} frame to {:?}", args.width, args.height, path);
    }
    if args.dump_text {
        dump_text(&display, &mut io::stdout().lock())?;
    }
    display.close().unmap(&mut mapper);
    Ok(clean)
}

fn video_err(e: VideoError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

/// Read one complete geometry message from the device
fn read_message(device: &mut SimDevice) -> Result<String, VideoError> {
    let mut message = Vec::new();
    let mut buf = [0u8; 16];
    loop {
        let n = device.read(&mut buf)?;
        if n == 0 {
            break;
        }
        message.extend_from_slice(&buf[..n]);
    }
    Ok(String::from_utf8_lossy(&message).into_owned())
}

/// Feed each non-blank, non-comment line to the device
///
/// Returns `false` if any command was rejected.
fn run_script(device: &mut SimDevice, input: impl BufRead, keep_going: bool) -> io::Result<bool> {
    let mut clean = true;
    for (number, line) in input.lines().enumerate() {
        let line = line?;
        let command = line.trim();
        if command.is_empty() || command.starts_with('#') {
            continue;
        }
        if let Err(e) = device.write(command.as_bytes()) {
            eprintln!("line {}: {}: {}", number + 1, command, e);
            clean = false;
            if !keep_going {
                break;
            }
        }
    }
    Ok(clean)
}

fn draw_test_pattern(display: &mut SimDisplay) -> Result<(), VideoError> {
    let mut raster = display.raster()?;
    let size = raster.geometry();
    let mut canvas = Canvas::new(&mut raster);

    Rectangle::new(Point::zero(), Size::new(size.width, size.height))
        .into_styled(PrimitiveStyle::with_stroke(Rgb565::WHITE, 1))
        .draw(&mut canvas)?;
    let style = MonoTextStyle::new(&FONT_6X10, Rgb565::GREEN);
    Text::new("vgactl", Point::new(4, 12), style).draw(&mut canvas)?;
    Ok(())
}

/// Visible buffer as a binary PPM (P6), RGB565 widened to 8 bits per channel
fn encode_ppm(display: &SimDisplay) -> Result<Vec<u8>, VideoError> {
    let geometry = display.geometry()?;
    let visible = display.visible_buffer()?;
    let mut out = format!("P6\n{} {}\n255\n", geometry.width, geometry.height).into_bytes();
    for y in 0..geometry.height as i32 {
        for x in 0..geometry.width as i32 {
            let raw = display.pixel(visible, x, y)?;
            let color = Rgb888::from(Rgb565::from(RawU16::new(raw)));
            out.extend_from_slice(&[color.r(), color.g(), color.b()]);
        }
    }
    Ok(out)
}

fn dump_text(display: &SimDisplay, out: &mut impl Write) -> io::Result<()> {
    let rows = display.text_geometry().map_err(video_err)?.height as i32;
    let mut out = BufWriter::new(out);
    for y in 0..rows {
        let row = display.text_row(y).map_err(video_err)?;
        let line: String = row
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        writeln!(out, "{}", line.trim_end())?;
    }
    out.flush()
}

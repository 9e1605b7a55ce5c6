//! NES emulator entry point.
//!
//! Loads an NROM cartridge and runs it in a 256×240 window, or headless with `--headless`.
//! Usage: jane [OPTIONS] <ROM>

use std::{path::PathBuf, process::ExitCode};

use ansi_term::Colour::{Cyan, Green, Red, Yellow};
use clap::Parser;
use jane::{
    apu::apu::Port,
    bus::Watch,
    cartridge::cartridge::Cartridge,
    config::{EmulatorConfig, PowerUpState},
    console::{Console, Devices, FrameSink},
    controller::Button,
    cpu::{cpu::CpuError, flags, trace::trace_line},
    ppu::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH},
};
use minifb::{Key, Scale, ScaleMode, Window, WindowOptions};
use tracing_subscriber::EnvFilter;

const KEYMAP: [(Key, Button); 8] = [
    (Key::Z, Button::A),
    (Key::X, Button::B),
    (Key::RightShift, Button::Select),
    (Key::Enter, Button::Start),
    (Key::Up, Button::Up),
    (Key::Down, Button::Down),
    (Key::Left, Button::Left),
    (Key::Right, Button::Right),
];

/// Cycle-stepped NES core: 6502 CPU, memory map and PPU
#[derive(Parser, Debug)]
#[command(name = "jane", version, about, long_about = None)]
struct Args {
    /// Path to an iNES (.nes) ROM, mapper 0 only
    rom: PathBuf,

    /// Print a nestest-style trace line before every instruction
    #[arg(long)]
    trace: bool,

    /// Start here instead of the reset vector (hex, e.g. C000 for nestest automation)
    #[arg(long, value_parser = parse_hex)]
    start_pc: Option<u16>,

    /// Report CPU reads of this address (hex, repeatable)
    #[arg(long = "watch-read", value_parser = parse_hex)]
    watch_read: Vec<u16>,

    /// Report CPU writes to this address (hex, repeatable)
    #[arg(long = "watch-write", value_parser = parse_hex)]
    watch_write: Vec<u16>,

    /// Stop after this many instructions
    #[arg(long)]
    max_instructions: Option<u64>,

    /// Run without a window
    #[arg(long)]
    headless: bool,
}

impl Args {
    fn config(&self) -> EmulatorConfig {
        EmulatorConfig {
            power_up: PowerUpState {
                pc: self.start_pc,
                ..PowerUpState::default()
            },
            read_watches: self.watch_read.clone(),
            write_watches: self.watch_write.clone(),
            trace: self.trace,
            max_instructions: self.max_instructions,
            headless: self.headless,
        }
    }
}

fn parse_hex(s: &str) -> Result<u16, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches('$');
    u16::from_str_radix(digits, 16).map_err(|e| format!("`{s}` is not a hex address: {e}"))
}

/// Presents frames to the window and feeds its keyboard into pad 1.
struct Screen {
    window: Window,
}

impl Screen {
    fn open() -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Jane",
            SCREEN_WIDTH,
            SCREEN_HEIGHT,
            WindowOptions {
                resize: true,
                scale: Scale::X2,
                scale_mode: ScaleMode::AspectRatioStretch,
                ..WindowOptions::default()
            },
        )?;
        // NES runs at ~60.0988 Hz (NTSC).
        window.set_target_fps(60);
        Ok(Screen { window })
    }

    fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    fn buttons(&self) -> u8 {
        KEYMAP
            .iter()
            .filter(|(key, _)| self.window.is_key_down(*key))
            .fold(0, |state, (_, button)| state | *button as u8)
    }
}

impl FrameSink for Screen {
    fn present(&mut self, rgb: &[u32], _indices: &[u8]) {
        if let Err(e) = self.window.update_with_buffer(rgb, SCREEN_WIDTH, SCREEN_HEIGHT) {
            tracing::warn!("window update failed: {e}");
        }
    }
}

/// Counts frames when there is nowhere to show them.
struct Headless {
    frames: u64,
}

impl FrameSink for Headless {
    fn present(&mut self, _rgb: &[u32], _indices: &[u8]) {
        self.frames += 1;
    }
}

enum Exit {
    /// Window closed or instruction limit reached.
    Stopped,
    Fault(CpuError),
}

/// One instruction with tracing, watchpoint reporting and the instruction limit applied.
fn step(console: &mut Console<'_>, config: &EmulatorConfig) -> Result<(), Exit> {
    if config
        .max_instructions
        .is_some_and(|limit| console.instructions() >= limit)
    {
        return Err(Exit::Stopped);
    }
    if config.trace {
        println!("{}", trace_line(console.cpu_mut()).map_err(Exit::Fault)?);
    }
    console.step().map_err(Exit::Fault)?;

    for hit in console.cpu_mut().map_mut().take_watch_hits() {
        let kind = match hit.kind {
            Watch::Read => "read",
            Watch::Write => "write",
        };
        println!(
            "{} {} ${:04X} = ${:02X} (PC=${:04X})",
            Yellow.bold().paint("WATCH"),
            kind,
            hit.address,
            hit.data,
            hit.pc
        );
    }
    Ok(())
}

/// Runs until the window closes, the instruction limit is hit, or the CPU faults.
fn run(
    console: &mut Console<'_>,
    config: &EmulatorConfig,
    screen: Option<Screen>,
) -> Result<(), CpuError> {
    let outcome = match screen {
        None => {
            let mut sink = Headless { frames: 0 };
            let outcome = loop {
                if let Err(exit) = step(console, config) {
                    break exit;
                }
                console.present_frame(&mut sink);
            };
            println!("{} {} frames", Green.bold().paint("INFO"), sink.frames);
            outcome
        }
        Some(mut screen) => loop {
            if !screen.is_open() {
                break Exit::Stopped;
            }
            console.apu().controller_mut(Port::One).set_state(screen.buttons());
            if let Err(exit) = step(console, config) {
                break exit;
            }
            // The window's target FPS paces the loop.
            console.present_frame(&mut screen);
        },
    };

    match outcome {
        Exit::Stopped => Ok(()),
        Exit::Fault(e) => Err(e),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = args.config();

    let cart = match Cartridge::load(&args.rom) {
        Ok(cart) => cart,
        Err(e) => {
            eprintln!("{} {}: {e}", Red.bold().paint("ERROR"), args.rom.display());
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        "loaded {} (PRG {} KiB, CHR {} KiB)",
        args.rom.display(),
        cart.prg.len() / 1024,
        cart.chr.len() / 1024
    );

    let devices = Devices::new(&cart);
    let mut console = match Console::new(&devices, &config) {
        Ok(console) => console,
        Err(e) => {
            eprintln!("{} {e}", Red.bold().paint("ERROR"));
            return ExitCode::FAILURE;
        }
    };

    let screen = if config.headless {
        None
    } else {
        match Screen::open() {
            Ok(screen) => Some(screen),
            Err(e) => {
                eprintln!("{} failed to open window: {e}", Red.bold().paint("ERROR"));
                return ExitCode::FAILURE;
            }
        }
    };

    match run(&mut console, &config, screen) {
        Ok(()) => {
            println!(
                "{} {} instructions, {} CPU cycles",
                Green.bold().paint("INFO"),
                console.instructions(),
                console.cpu().total_cycles
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            let cpu = console.cpu();
            eprintln!("{} {e}", Red.bold().paint("ERROR"));
            eprintln!(
                "      {}",
                Cyan.paint(format!(
                    "A:{:02X} X:{:02X} Y:{:02X} P:{:02X} ({}) SP:{:02X} CYC:{}",
                    cpu.a,
                    cpu.x,
                    cpu.y,
                    cpu.status,
                    flags::describe(cpu.status),
                    cpu.sp,
                    cpu.total_cycles
                ))
            );
            ExitCode::FAILURE
        }
    }
}

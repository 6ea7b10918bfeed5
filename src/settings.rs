use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_FRAME_RATE: u64 = 60;
pub const DEFAULT_CYCLES_PER_FRAME: u64 = 10;
pub const DEFAULT_BEEP_FREQUENCY: f32 = 440.0;

#[derive(Parser, Debug)]
#[command(version, about = "Run a CHIP-8 ROM in the terminal")]
pub struct Settings {
    /// Path to the ROM image.
    pub rom: PathBuf,

    /// Instructions executed per display frame.
    #[arg(long, default_value_t = DEFAULT_CYCLES_PER_FRAME)]
    pub cycles: u64,

    /// Display and timer refresh rate in Hz.
    #[arg(long, default_value_t = DEFAULT_FRAME_RATE, value_parser = clap::value_parser!(u64).range(1..))]
    pub frame_rate: u64,

    /// Seed for the random number generator, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Tone played while the sound timer is running, in Hz.
    #[arg(long, default_value_t = DEFAULT_BEEP_FREQUENCY)]
    pub beep_frequency: f32,
}

use std::path::Path;

use log::{debug, info, trace, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{ExecutionError, LoadError};
use crate::instruction::{ProgramCounter, decode};
use crate::state::{
    Address, Chip8State, DISPLAY_HEIGHT, DISPLAY_WIDTH, Key, MEM_SIZE, NUM_REGISTERS, Register,
    Timer,
};

pub const PIXEL_COUNT: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;
pub const ON_COLOR: u32 = 0x00FF_FFFF;
pub const OFF_COLOR: u32 = 0x0000_0000;

/// The CHIP-8 virtual machine.
///
/// A host drives it by loading a ROM, then repeatedly calling [`Chip8::execute`]
/// some number of times per frame, [`Chip8::render_to`] and [`Chip8::tick_timers`]
/// once per frame at 60 Hz.
pub struct Chip8 {
    state: Chip8State,
}

impl Chip8 {
    /// Creates a zeroed machine whose `CXNN` generator is seeded from the OS.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Creates a zeroed machine with a reproducible `CXNN` sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Chip8 {
            state: Chip8State::new(rng),
        }
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Embeds the fontset, then reads the ROM at `path` into program memory.
    ///
    /// Returns the number of ROM bytes that fit in memory. The fontset is written
    /// even when the file cannot be read.
    pub fn load_rom(&mut self, path: impl AsRef<Path>) -> Result<usize, LoadError> {
        let path = path.as_ref();
        self.state.memory.load_font();
        let rom = std::fs::read(path).map_err(|e| LoadError::from_io(path.to_path_buf(), e))?;
        info!("Loaded ROM {} ({} bytes)", path.display(), rom.len());
        Ok(self.copy_program(&rom))
    }

    /// Embeds the fontset and copies `rom` into program memory, returning the
    /// number of bytes that fit.
    pub fn load_rom_bytes(&mut self, rom: &[u8]) -> usize {
        self.state.memory.load_font();
        self.copy_program(rom)
    }

    fn copy_program(&mut self, rom: &[u8]) -> usize {
        let copied = self.state.memory.load_rom(rom);
        if copied < rom.len() {
            warn!(
                "ROM truncated to {} of {} bytes to fit in memory",
                copied,
                rom.len()
            );
        }
        copied
    }

    fn fetch(&self) -> u16 {
        let pc = self.state.pc;
        u16::from_be_bytes([
            self.state.memory.read(pc),
            self.state.memory.read(pc.wrapping_add(1)),
        ])
    }

    /// Runs the instruction at the program counter.
    ///
    /// On error nothing is modified, including the program counter.
    pub fn execute(&mut self) -> Result<(), ExecutionError> {
        let pc = self.state.pc;
        let raw = self.fetch();
        trace!("{pc:#05X}: {raw:#06X}");

        let next = decode(raw)
            .and_then(|instruction| instruction.execute(&mut self.state))
            .inspect_err(|e| debug!("Execution stopped at {pc:#05X}: {e}"))?;

        self.state.pc = match next {
            ProgramCounter::Next => pc.wrapping_add(2),
            ProgramCounter::Skip => pc.wrapping_add(4),
            ProgramCounter::Jump(addr) => addr,
            ProgramCounter::Wait => pc,
        };
        Ok(())
    }

    pub fn tick_timers(&mut self) {
        self.state.tick_timers();
    }

    /// Expands the framebuffer into one color per pixel, row-major.
    ///
    /// `pixels` should hold [`PIXEL_COUNT`] entries; a shorter buffer receives the
    /// leading pixels only.
    pub fn render_to(&self, pixels: &mut [u32]) {
        for (pixel, lit) in pixels.iter_mut().zip(self.state.display.iter().by_vals()) {
            *pixel = if lit { ON_COLOR } else { OFF_COLOR };
        }
    }

    pub fn sound_timer(&self) -> Timer {
        self.state.sound_timer
    }

    pub fn delay_timer(&self) -> Timer {
        self.state.delay_timer
    }

    pub fn press_key(&mut self, key: Key) {
        self.state.keypad.press_key(key);
    }

    pub fn release_key(&mut self, key: Key) {
        self.state.keypad.release_key(key);
    }

    pub fn release_all_keys(&mut self) {
        self.state.keypad.release_all();
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.state.keypad.is_key_pressed(key)
    }

    pub fn pc(&self) -> Address {
        self.state.pc
    }

    pub fn index(&self) -> Address {
        self.state.index
    }

    pub fn register(&self, reg: Register) -> u8 {
        self.state.registers.read(reg)
    }

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        self.state.registers.as_array()
    }

    pub fn stack_depth(&self) -> usize {
        self.state.stack.depth()
    }

    pub fn memory(&self) -> &[u8; MEM_SIZE] {
        self.state.memory.as_bytes()
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

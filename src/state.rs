use bitvec::prelude::*;
use rand::rngs::StdRng;

use crate::error::ExecutionError;

pub type Timer = u8;
pub type Address = u16;

pub const MEM_SIZE: usize = 4096;
pub const ADDR_MASK: Address = 0x0FFF;
pub const FONT_ADDR: Address = 0x50;
pub const FONT_HEIGHT: usize = 5;
pub const PC_START_ADDR: Address = 0x200;
pub const NUM_REGISTERS: usize = 16;
pub const NUM_KEYS: usize = 16;
pub const STACK_DEPTH: usize = 16;
pub const SPRITE_WIDTH: usize = 8;
pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

pub const FONT_SET: [u8; 16 * FONT_HEIGHT] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Packed monochrome framebuffer, one bit per pixel, row-major.
///
/// Bits are stored most-significant first, so bit 7 of each byte is the leftmost
/// pixel of its 8-pixel group.
pub type Framebuffer = BitArr!(for DISPLAY_WIDTH * DISPLAY_HEIGHT, in u8, Msb0);

/// The 4 KiB address space. Every access is masked to 12 bits.
pub struct Memory {
    data: [u8; MEM_SIZE],
}
impl Memory {
    pub fn new() -> Self {
        Memory {
            data: [0; MEM_SIZE],
        }
    }

    pub fn read(&self, addr: Address) -> u8 {
        self.data[usize::from(addr & ADDR_MASK)]
    }

    pub fn write(&mut self, addr: Address, value: u8) {
        self.data[usize::from(addr & ADDR_MASK)] = value;
    }

    pub fn load_font(&mut self) {
        let start = usize::from(FONT_ADDR);
        self.data[start..start + FONT_SET.len()].copy_from_slice(&FONT_SET);
    }

    /// Copies `rom` to the program region and returns how many bytes fit.
    ///
    /// Bytes past the end of memory are dropped.
    pub fn load_rom(&mut self, rom: &[u8]) -> usize {
        let start = usize::from(PC_START_ADDR);
        let len = rom.len().min(MEM_SIZE - start);
        self.data[start..start + len].copy_from_slice(&rom[..len]);
        len
    }

    pub fn as_bytes(&self) -> &[u8; MEM_SIZE] {
        &self.data
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}
impl Register {
    /// Maps the low nibble of `value` to a register.
    pub fn from_nibble(value: u8) -> Self {
        match value & 0x0F {
            0x0 => Register::V0,
            0x1 => Register::V1,
            0x2 => Register::V2,
            0x3 => Register::V3,
            0x4 => Register::V4,
            0x5 => Register::V5,
            0x6 => Register::V6,
            0x7 => Register::V7,
            0x8 => Register::V8,
            0x9 => Register::V9,
            0xA => Register::VA,
            0xB => Register::VB,
            0xC => Register::VC,
            0xD => Register::VD,
            0xE => Register::VE,
            _ => Register::VF,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

pub struct RegisterBank {
    registers: [u8; NUM_REGISTERS],
}
impl RegisterBank {
    pub fn new() -> Self {
        RegisterBank {
            registers: [0; NUM_REGISTERS],
        }
    }

    pub fn read(&self, reg: Register) -> u8 {
        self.registers[reg.index()]
    }

    pub fn write(&mut self, reg: Register, value: u8) {
        self.registers[reg.index()] = value;
    }

    /// Writes 1 or 0 to VF.
    pub fn set_flag(&mut self, flag: bool) {
        self.write(Register::VF, u8::from(flag));
    }

    pub fn as_array(&self) -> &[u8; NUM_REGISTERS] {
        &self.registers
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
}
impl Key {
    pub const ALL: [Key; NUM_KEYS] = [
        Key::Key0,
        Key::Key1,
        Key::Key2,
        Key::Key3,
        Key::Key4,
        Key::Key5,
        Key::Key6,
        Key::Key7,
        Key::Key8,
        Key::Key9,
        Key::KeyA,
        Key::KeyB,
        Key::KeyC,
        Key::KeyD,
        Key::KeyE,
        Key::KeyF,
    ];

    /// Returns `None` for values outside the 16-key pad.
    pub fn from_index(index: u8) -> Option<Key> {
        Key::ALL.get(usize::from(index)).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Pressed state of the hex keypad. Written by the host, read by the interpreter.
pub struct Keypad {
    keys: [bool; NUM_KEYS],
}
impl Keypad {
    pub fn new() -> Self {
        Keypad {
            keys: [false; NUM_KEYS],
        }
    }

    pub fn press_key(&mut self, key: Key) {
        self.keys[usize::from(key.index())] = true;
    }

    pub fn release_key(&mut self, key: Key) {
        self.keys[usize::from(key.index())] = false;
    }

    pub fn release_all(&mut self) {
        self.keys = [false; NUM_KEYS];
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.keys[usize::from(key.index())]
    }

    /// Lowest-numbered key currently held down.
    pub fn first_pressed(&self) -> Option<Key> {
        Key::ALL.into_iter().find(|&key| self.is_key_pressed(key))
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}

/// Return addresses of active subroutine calls, at most [`STACK_DEPTH`] deep.
pub struct CallStack {
    frames: Vec<Address>,
}
impl CallStack {
    pub fn new() -> Self {
        CallStack {
            frames: Vec::with_capacity(STACK_DEPTH),
        }
    }

    pub fn push(&mut self, return_address: Address) -> Result<(), ExecutionError> {
        if self.frames.len() >= STACK_DEPTH {
            return Err(ExecutionError::StackOverflow);
        }
        self.frames.push(return_address);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Address, ExecutionError> {
        self.frames.pop().ok_or(ExecutionError::StackUnderflow)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Chip8State {
    pub memory: Memory,
    pub registers: RegisterBank,
    pub pc: Address,
    pub index: Address,
    pub stack: CallStack,
    pub delay_timer: Timer,
    pub sound_timer: Timer,
    pub(crate) display: Framebuffer,
    pub keypad: Keypad,
    pub rng: StdRng,
}
impl Chip8State {
    pub fn new(rng: StdRng) -> Self {
        Chip8State {
            memory: Memory::new(),
            registers: RegisterBank::new(),
            pc: PC_START_ADDR,
            index: 0,
            stack: CallStack::new(),
            delay_timer: 0,
            sound_timer: 0,
            display: BitArray::ZERO,
            keypad: Keypad::new(),
            rng,
        }
    }

    /// Zeroes everything except the random number generator.
    pub fn reset(&mut self) {
        self.memory = Memory::new();
        self.registers = RegisterBank::new();
        self.pc = PC_START_ADDR;
        self.index = 0;
        self.stack.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.display = BitArray::ZERO;
        self.keypad.release_all();
    }

    pub fn clear_display(&mut self) {
        self.display.fill(false);
    }

    /// XORs an 8-pixel-wide sprite of `rows` rows read from memory at I onto the display.
    ///
    /// The origin is wrapped to the screen first; pixels running off the right or
    /// bottom edge wrap around within the same row or column. Returns true if any
    /// lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: u8) -> bool {
        let origin_x = usize::from(x) % DISPLAY_WIDTH;
        let origin_y = usize::from(y) % DISPLAY_HEIGHT;
        let mut collision = false;

        for row in 0..rows {
            let byte = self.memory.read(self.index.wrapping_add(Address::from(row)));
            let pixel_y = (origin_y + usize::from(row)) % DISPLAY_HEIGHT;

            for bit in 0..SPRITE_WIDTH {
                if byte & (0x80 >> bit) == 0 {
                    continue;
                }
                let pixel_x = (origin_x + bit) % DISPLAY_WIDTH;
                let index = pixel_y * DISPLAY_WIDTH + pixel_x;
                let current_pixel = self.display[index];

                collision |= current_pixel;
                self.display.set(index, !current_pixel);
            }
        }
        collision
    }

    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

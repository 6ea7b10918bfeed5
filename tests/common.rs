#![allow(dead_code)]

use chip8_vm::Chip8;
use chip8_vm::chip8::{OFF_COLOR, ON_COLOR, PIXEL_COUNT};
use chip8_vm::state::Register;

/// Assembles opcodes into a big-endian ROM image.
pub fn rom(opcodes: &[u16]) -> Vec<u8> {
    opcodes.iter().flat_map(|op| op.to_be_bytes()).collect()
}

pub fn boot(opcodes: &[u16]) -> Chip8 {
    let mut chip8 = Chip8::with_seed(0x5EED);
    chip8.load_rom_bytes(&rom(opcodes));
    chip8
}

pub fn step(chip8: &mut Chip8, count: usize) {
    for _ in 0..count {
        chip8.execute().unwrap();
    }
}

/// Number of lit pixels, counted through the rendered frame.
pub fn lit_pixels(chip8: &Chip8) -> usize {
    let mut pixels = vec![OFF_COLOR; PIXEL_COUNT];
    chip8.render_to(&mut pixels);
    pixels.iter().filter(|&&p| p == ON_COLOR).count()
}

pub fn reg(chip8: &Chip8, index: u8) -> u8 {
    chip8.register(Register::from_nibble(index))
}

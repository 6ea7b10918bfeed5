mod common;

use chip8_vm::ExecutionError;
use chip8_vm::chip8::{OFF_COLOR, ON_COLOR, PIXEL_COUNT};
use chip8_vm::state::{DISPLAY_WIDTH, PC_START_ADDR, STACK_DEPTH};
use common::{boot, reg, step};

#[test]
fn adds_two_registers_into_v0() {
    let mut chip8 = boot(&[0x6105, 0x6203, 0x8014, 0x8024]);
    step(&mut chip8, 4);
    assert_eq!(reg(&chip8, 0x0), 0x08);
    assert_eq!(reg(&chip8, 0xF), 0);
}

#[test]
fn jump_to_zero_touches_only_pc() {
    let mut chip8 = boot(&[0x1000]);
    let before = *chip8.registers();
    step(&mut chip8, 1);
    assert_eq!(chip8.pc(), 0x000);
    assert_eq!(chip8.index(), 0);
    assert_eq!(*chip8.registers(), before);
}

#[test]
fn delay_timer_counts_down_and_stops() {
    let mut chip8 = boot(&[0x651E, 0xF515]);
    step(&mut chip8, 2);
    assert_eq!(chip8.delay_timer(), 30);

    for _ in 0..60 {
        chip8.tick_timers();
    }
    assert_eq!(chip8.delay_timer(), 0);
    chip8.tick_timers();
    assert_eq!(chip8.delay_timer(), 0);
}

#[test]
fn sixteen_nested_calls_then_overflow() {
    // Every call lands on the next call instruction.
    let opcodes: Vec<u16> = (0..=STACK_DEPTH as u16)
        .map(|i| 0x2000 | (PC_START_ADDR + 2 * (i + 1)))
        .collect();
    let mut chip8 = boot(&opcodes);

    step(&mut chip8, STACK_DEPTH);
    assert_eq!(chip8.stack_depth(), STACK_DEPTH);
    let pc = chip8.pc();
    assert_eq!(chip8.execute(), Err(ExecutionError::StackOverflow));
    assert_eq!(chip8.pc(), pc);
}

#[test]
fn return_without_call_underflows() {
    let mut chip8 = boot(&[0x00EE]);
    assert_eq!(chip8.execute(), Err(ExecutionError::StackUnderflow));
    assert_eq!(chip8.pc(), PC_START_ADDR);
}

#[test]
fn subroutine_round_trip() {
    // 0x200: call 0x206; 0x202: V1 = 1; 0x204: halt loop; 0x206: V0 = 9; return
    let mut chip8 = boot(&[0x2206, 0x6101, 0x1204, 0x6009, 0x00EE]);
    step(&mut chip8, 5);
    assert_eq!(reg(&chip8, 0x0), 9);
    assert_eq!(reg(&chip8, 0x1), 1);
    assert_eq!(chip8.pc(), 0x204);
    assert_eq!(chip8.stack_depth(), 0);
}

#[test]
fn sprite_wraps_from_bottom_right_corner() {
    // Four full rows at 0x20A, drawn at (60, 30).
    let mut chip8 = boot(&[0x603C, 0x611E, 0xA20A, 0xD014, 0x1208, 0xFFFF, 0xFFFF]);
    step(&mut chip8, 4);

    let mut pixels = vec![0; PIXEL_COUNT];
    chip8.render_to(&mut pixels);
    let at = |x: usize, y: usize| pixels[y * DISPLAY_WIDTH + x];

    for y in [30, 31, 0, 1] {
        for x in [60, 61, 62, 63, 0, 1, 2, 3] {
            assert_eq!(at(x, y), ON_COLOR, "({x}, {y})");
        }
        assert_eq!(at(59, y), OFF_COLOR);
        assert_eq!(at(4, y), OFF_COLOR);
    }
    assert_eq!(pixels.iter().filter(|&&p| p == ON_COLOR).count(), 32);
    assert_eq!(reg(&chip8, 0xF), 0);
}

#[test]
fn draws_font_digit() {
    // V0 = 8, I = glyph(8), draw at (V1, V1) = (0, 0)
    let mut chip8 = boot(&[0x6008, 0xF029, 0xD115]);
    step(&mut chip8, 3);

    let mut pixels = vec![0; PIXEL_COUNT];
    chip8.render_to(&mut pixels);
    let row = |y: usize| -> Vec<bool> {
        pixels[y * DISPLAY_WIDTH..y * DISPLAY_WIDTH + 4]
            .iter()
            .map(|&p| p == ON_COLOR)
            .collect()
    };
    // 0xF0, 0x90, 0xF0, 0x90, 0xF0
    assert_eq!(row(0), vec![true; 4]);
    assert_eq!(row(1), vec![true, false, false, true]);
    assert_eq!(row(2), vec![true; 4]);
    assert_eq!(row(4), vec![true; 4]);
}

#[test]
fn bcd_then_load_round_trips_digits() {
    // V0 = 137, I = 0x300, BCD, load V0..V2
    let mut chip8 = boot(&[0x6089, 0xA300, 0xF033, 0xF265]);
    step(&mut chip8, 4);
    assert_eq!([reg(&chip8, 0), reg(&chip8, 1), reg(&chip8, 2)], [1, 3, 7]);
}

#[test]
fn key_wait_blocks_until_press() {
    let mut chip8 = boot(&[0xF20A, 0x6301]);
    step(&mut chip8, 10);
    assert_eq!(chip8.pc(), PC_START_ADDR);
    assert_eq!(reg(&chip8, 0x3), 0);

    chip8.press_key(chip8_vm::Key::KeyD);
    step(&mut chip8, 2);
    assert_eq!(reg(&chip8, 0x2), 0xD);
    assert_eq!(reg(&chip8, 0x3), 1);
}

#[test]
fn unsupported_opcode_halts_in_place() {
    let mut chip8 = boot(&[0x6001, 0x5011]);
    step(&mut chip8, 1);
    assert_eq!(
        chip8.execute(),
        Err(ExecutionError::UnsupportedOpcode { opcode: 0x5011 })
    );
    assert_eq!(chip8.pc(), 0x202);
}

#[test]
fn reset_clears_loaded_program() {
    let mut chip8 = boot(&[0x6001]);
    step(&mut chip8, 1);
    chip8.reset();
    assert_eq!(chip8.pc(), PC_START_ADDR);
    assert_eq!(reg(&chip8, 0), 0);
    assert!(chip8.memory().iter().all(|&b| b == 0));
}

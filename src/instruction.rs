use rand::Rng;

use crate::error::ExecutionError;
use crate::state::{Address, Chip8State, FONT_ADDR, FONT_HEIGHT, Key, Register};

/// Effect an executed instruction has on the program counter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProgramCounter {
    /// Advance to the following instruction.
    Next,
    /// Skip over the following instruction.
    Skip,
    /// Continue at an absolute address.
    Jump(Address),
    /// Stay on this instruction so it runs again next cycle.
    Wait,
}

/// One decoded CHIP-8 instruction.
///
/// `x` and `y` are register operands, `n`/`nn`/`nnn` the 4-, 8- and 12-bit immediates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    ClearScreen,
    SubroutineReturn,
    Jump { nnn: Address },
    SubroutineCall { nnn: Address },
    SkipEqImmediate { x: Register, nn: u8 },
    SkipNeqImmediate { x: Register, nn: u8 },
    SkipEqRegister { x: Register, y: Register },
    SetImmediate { x: Register, nn: u8 },
    AddImmediate { x: Register, nn: u8 },
    SetXToY { x: Register, y: Register },
    BinaryOr { x: Register, y: Register },
    BinaryAnd { x: Register, y: Register },
    BinaryXor { x: Register, y: Register },
    AddWithCarry { x: Register, y: Register },
    SubtractYFromX { x: Register, y: Register },
    RightShift { x: Register, y: Register },
    SubtractXFromY { x: Register, y: Register },
    LeftShift { x: Register, y: Register },
    SkipNeqRegister { x: Register, y: Register },
    SetIndex { nnn: Address },
    JumpWithOffset { nnn: Address },
    Random { x: Register, nn: u8 },
    Draw { x: Register, y: Register, n: u8 },
    SkipIfKeyPressed { x: Register },
    SkipIfKeyNotPressed { x: Register },
    ReadDelayTimer { x: Register },
    WaitForKey { x: Register },
    SetDelayTimer { x: Register },
    SetSoundTimer { x: Register },
    AddToIndex { x: Register },
    FontChar { x: Register },
    BinaryCodedDecimal { x: Register },
    Store { x: Register },
    Load { x: Register },
}

/// Splits a raw opcode into its fixed fields.
struct Fields {
    /// First nibble. Selects the instruction family.
    opcode: u8,
    /// Second nibble. Used to look up one of the 16 registers.
    x: Register,
    /// Third nibble. Used to look up one of the 16 registers.
    y: Register,
    /// Fourth nibble. A 4-bit number.
    n: u8,
    /// The second byte (third and fourth nibbles). An 8-bit immediate number.
    nn: u8,
    /// The second, third, and fourth nibbles. A 12-bit immediate address.
    nnn: Address,
}
impl Fields {
    fn new(raw: u16) -> Self {
        Fields {
            opcode: (raw >> 12) as u8,
            x: Register::from_nibble((raw >> 8) as u8),
            y: Register::from_nibble((raw >> 4) as u8),
            n: (raw & 0x000F) as u8,
            nn: (raw & 0x00FF) as u8,
            nnn: raw & 0x0FFF,
        }
    }
}

pub fn decode(raw: u16) -> Result<Instruction, ExecutionError> {
    use Instruction::*;

    let Fields {
        opcode,
        x,
        y,
        n,
        nn,
        nnn,
    } = Fields::new(raw);
    let unsupported = ExecutionError::UnsupportedOpcode { opcode: raw };

    let instruction = match opcode {
        0x0 => match raw {
            0x00E0 => ClearScreen,
            0x00EE => SubroutineReturn,
            _ => return Err(unsupported),
        },
        0x1 => Jump { nnn },
        0x2 => SubroutineCall { nnn },
        0x3 => SkipEqImmediate { x, nn },
        0x4 => SkipNeqImmediate { x, nn },
        0x5 if n == 0 => SkipEqRegister { x, y },
        0x6 => SetImmediate { x, nn },
        0x7 => AddImmediate { x, nn },
        0x8 => match n {
            0x0 => SetXToY { x, y },
            0x1 => BinaryOr { x, y },
            0x2 => BinaryAnd { x, y },
            0x3 => BinaryXor { x, y },
            0x4 => AddWithCarry { x, y },
            0x5 => SubtractYFromX { x, y },
            0x6 => RightShift { x, y },
            0x7 => SubtractXFromY { x, y },
            0xE => LeftShift { x, y },
            _ => return Err(unsupported),
        },
        0x9 if n == 0 => SkipNeqRegister { x, y },
        0xA => SetIndex { nnn },
        0xB => JumpWithOffset { nnn },
        0xC => Random { x, nn },
        0xD => Draw { x, y, n },
        0xE => match nn {
            0x9E => SkipIfKeyPressed { x },
            0xA1 => SkipIfKeyNotPressed { x },
            _ => return Err(unsupported),
        },
        0xF => match nn {
            0x07 => ReadDelayTimer { x },
            0x0A => WaitForKey { x },
            0x15 => SetDelayTimer { x },
            0x18 => SetSoundTimer { x },
            0x1E => AddToIndex { x },
            0x29 => FontChar { x },
            0x33 => BinaryCodedDecimal { x },
            0x55 => Store { x },
            0x65 => Load { x },
            _ => return Err(unsupported),
        },
        _ => return Err(unsupported),
    };
    Ok(instruction)
}

fn skip_if(condition: bool) -> ProgramCounter {
    if condition {
        ProgramCounter::Skip
    } else {
        ProgramCounter::Next
    }
}

fn key_in(state: &Chip8State, x: Register) -> Result<Key, ExecutionError> {
    let value = state.registers.read(x);
    Key::from_index(value).ok_or(ExecutionError::InvalidKey { value })
}

impl Instruction {
    /// Applies the instruction to `state`. The program counter itself is not
    /// touched; the caller applies the returned [`ProgramCounter`].
    ///
    /// On error `state` is unchanged.
    pub fn execute(self, state: &mut Chip8State) -> Result<ProgramCounter, ExecutionError> {
        use Instruction::*;

        let regs = &mut state.registers;
        let pc = match self {
            ClearScreen => {
                state.clear_display();
                ProgramCounter::Next
            }
            SubroutineReturn => ProgramCounter::Jump(state.stack.pop()?),
            Jump { nnn } => ProgramCounter::Jump(nnn),
            SubroutineCall { nnn } => {
                state.stack.push(state.pc.wrapping_add(2))?;
                ProgramCounter::Jump(nnn)
            }
            SkipEqImmediate { x, nn } => skip_if(regs.read(x) == nn),
            SkipNeqImmediate { x, nn } => skip_if(regs.read(x) != nn),
            SkipEqRegister { x, y } => skip_if(regs.read(x) == regs.read(y)),
            SkipNeqRegister { x, y } => skip_if(regs.read(x) != regs.read(y)),
            SetImmediate { x, nn } => {
                regs.write(x, nn);
                ProgramCounter::Next
            }
            AddImmediate { x, nn } => {
                regs.write(x, regs.read(x).wrapping_add(nn));
                ProgramCounter::Next
            }
            SetXToY { x, y } => {
                regs.write(x, regs.read(y));
                ProgramCounter::Next
            }
            BinaryOr { x, y } => {
                regs.write(x, regs.read(x) | regs.read(y));
                ProgramCounter::Next
            }
            BinaryAnd { x, y } => {
                regs.write(x, regs.read(x) & regs.read(y));
                ProgramCounter::Next
            }
            BinaryXor { x, y } => {
                regs.write(x, regs.read(x) ^ regs.read(y));
                ProgramCounter::Next
            }
            // VF is written last so the flag survives when X is VF.
            AddWithCarry { x, y } => {
                let (sum, carry) = regs.read(x).overflowing_add(regs.read(y));
                regs.write(x, sum);
                regs.set_flag(carry);
                ProgramCounter::Next
            }
            SubtractYFromX { x, y } => {
                let (value_x, value_y) = (regs.read(x), regs.read(y));
                regs.write(x, value_x.wrapping_sub(value_y));
                regs.set_flag(value_y <= value_x);
                ProgramCounter::Next
            }
            SubtractXFromY { x, y } => {
                let (value_x, value_y) = (regs.read(x), regs.read(y));
                regs.write(x, value_y.wrapping_sub(value_x));
                regs.set_flag(value_y >= value_x);
                ProgramCounter::Next
            }
            RightShift { x, y } => {
                let value_y = regs.read(y);
                regs.write(x, value_y >> 1);
                regs.set_flag(value_y & 0x01 != 0);
                ProgramCounter::Next
            }
            LeftShift { x, y } => {
                let value_y = regs.read(y);
                regs.write(x, value_y << 1);
                regs.set_flag(value_y & 0x80 != 0);
                ProgramCounter::Next
            }
            SetIndex { nnn } => {
                state.index = nnn;
                ProgramCounter::Next
            }
            JumpWithOffset { nnn } => {
                ProgramCounter::Jump(Address::from(regs.read(Register::V0)) + nnn)
            }
            Random { x, nn } => {
                let random_value = state.rng.random::<u8>() & nn;
                regs.write(x, random_value);
                ProgramCounter::Next
            }
            Draw { x, y, n } => {
                let (value_x, value_y) = (regs.read(x), regs.read(y));
                let collision = state.draw_sprite(value_x, value_y, n);
                state.registers.set_flag(collision);
                ProgramCounter::Next
            }
            SkipIfKeyPressed { x } => {
                let key = key_in(state, x)?;
                skip_if(state.keypad.is_key_pressed(key))
            }
            SkipIfKeyNotPressed { x } => {
                let key = key_in(state, x)?;
                skip_if(!state.keypad.is_key_pressed(key))
            }
            ReadDelayTimer { x } => {
                regs.write(x, state.delay_timer);
                ProgramCounter::Next
            }
            WaitForKey { x } => match state.keypad.first_pressed() {
                Some(key) => {
                    regs.write(x, key.index());
                    ProgramCounter::Next
                }
                None => ProgramCounter::Wait,
            },
            SetDelayTimer { x } => {
                state.delay_timer = regs.read(x);
                ProgramCounter::Next
            }
            SetSoundTimer { x } => {
                state.sound_timer = regs.read(x);
                ProgramCounter::Next
            }
            AddToIndex { x } => {
                state.index = state.index.wrapping_add(Address::from(regs.read(x)));
                regs.set_flag(state.index > 0x0FFF);
                ProgramCounter::Next
            }
            FontChar { x } => {
                state.index = FONT_ADDR + Address::from(regs.read(x)) * FONT_HEIGHT as Address;
                ProgramCounter::Next
            }
            BinaryCodedDecimal { x } => {
                let value_x = regs.read(x);
                let bcd = [value_x / 100, (value_x / 10) % 10, value_x % 10];
                for (offset, digit) in (0..).zip(bcd) {
                    state.memory.write(state.index.wrapping_add(offset), digit);
                }
                ProgramCounter::Next
            }
            Store { x } => {
                for i in 0..=x.index() {
                    let addr = state.index.wrapping_add(i as Address);
                    state.memory.write(addr, regs.read(Register::from_nibble(i as u8)));
                }
                ProgramCounter::Next
            }
            Load { x } => {
                for i in 0..=x.index() {
                    let addr = state.index.wrapping_add(i as Address);
                    regs.write(Register::from_nibble(i as u8), state.memory.read(addr));
                }
                ProgramCounter::Next
            }
        };
        Ok(pc)
    }
}

//! A CHIP-8 virtual machine: 4 KiB of memory, sixteen 8-bit registers, a
//! 16-deep call stack, a 64x32 monochrome display and two 60 Hz timers.

pub mod chip8;
pub mod error;
pub mod instruction;
pub mod state;

pub use chip8::Chip8;
pub use error::{ExecutionError, LoadError};
pub use state::Key;

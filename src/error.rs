use std::path::PathBuf;

use thiserror::Error;

/// Conditions that stop a running CHIP-8 session while executing an instruction.
///
/// The machine state is left untouched by the instruction that raised the error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Unsupported opcode: {opcode:#06X}")]
    UnsupportedOpcode { opcode: u16 },

    #[error("Stack underflow: no return address available")]
    StackUnderflow,

    #[error("Stack overflow: call depth exceeds {} frames", crate::state::STACK_DEPTH)]
    StackOverflow,

    #[error("Invalid key index in register: {value:#04X}")]
    InvalidKey { value: u8 },
}

/// Failures while reading a ROM image from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("ROM not found: {}", path.display())]
    RomNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read ROM {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::RomNotFound { path, source }
        } else {
            LoadError::Io { path, source }
        }
    }
}

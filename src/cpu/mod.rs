//! CPU emulation for the acc8 machine.
//!
//! - 8 signed 16-bit registers, register 0 is the accumulator
//! - word-addressed memory, two instruction bytes packed per word
//! - 4 opcodes, with 8 accumulator sub-operations under `functional`

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::{Reg, Registers};
pub use decode::{Instruction, Funct, Fields};
pub use execute::{Cpu, CpuError, CpuState};

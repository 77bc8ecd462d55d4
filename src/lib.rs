//! # acc8
//!
//! An emulator for a tiny 8-bit accumulator instruction set.
//!
//! Each instruction is a single byte: a 2-bit opcode and two 3-bit fields.
//! The machine has eight signed 16-bit registers (register 0 is the
//! accumulator) and word-addressed memory holding two instruction bytes
//! per word. Programs run until the program counter leaves the loaded
//! image; there is no halt instruction.

pub mod config;
pub mod cpu;
pub mod asm;
pub mod inspect;

// Re-export commonly used types
pub use config::{AddressPolicy, ConfigError, EmuConfig};
pub use cpu::{Cpu, CpuError, CpuState, Instruction, Funct, Memory, MemoryError, Reg, Registers};
pub use asm::{assemble, disassemble, AssemblerError, ImageError, load_image, save_image};
pub use inspect::run_inspector;

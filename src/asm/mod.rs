//! Assembler, disassembler and image files for acc8 programs.
//!
//! This module provides:
//! - A two-pass assembler (text → raw binary image)
//! - A disassembler (image → readable text)
//! - Loading and saving raw binary images

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_byte};
pub use image::{load_image, save_image, ImageError};

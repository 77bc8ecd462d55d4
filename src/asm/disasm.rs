//! Disassembler for acc8 programs.
//!
//! Converts instruction bytes back to assembler syntax.

use crate::cpu::decode::{decode, Funct, Instruction};

/// Disassemble a single instruction byte to text.
pub fn disassemble_byte(byte: u8) -> String {
    format_instruction(&decode(byte))
}

/// Disassemble a whole program image.
pub fn disassemble(program: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; acc8 disassembly\n");
    output.push_str("; ----------------\n\n");

    for (addr, byte) in program.iter().enumerate() {
        let line = disassemble_byte(*byte);
        output.push_str(&format!("{:04x}: {:02x}  {}\n", addr, byte, line));
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    match instr {
        Instruction::Move { dst, src } => format!("mv {} {}", dst, src),
        Instruction::Bounce { target, cond } => format!("bz {} {}", target, cond),
        Instruction::WriteImmediate { imm } => format!("wi {}", imm),
        Instruction::Functional(funct) => match funct {
            Funct::Add { src } => format!("ad {}", src),
            Funct::Sub { src } => format!("sb {}", src),
            Funct::And { src } => format!("an {}", src),
            Funct::Nor { src } => format!("nr {}", src),
            Funct::Shl { amount } => format!("sl {}", amount),
            Funct::Shr { amount } => format!("sr {}", amount),
            Funct::Load { addr } => format!("lw {}", addr),
            Funct::Store { addr } => format!("sw {}", addr),
        },
    }
}

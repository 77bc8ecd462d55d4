//! Instruction decoder for acc8.
//!
//! Every instruction is one byte:
//!
//! ```text
//!  7 6 | 5 4 3 | 2 1 0
//!  op  |   A   |   B
//! ```
//!
//! Decoding cannot fail: all 256 byte values are valid instructions.

use crate::cpu::registers::Reg;
use serde::{Serialize, Deserialize};

/// The raw fields of an instruction byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fields {
    /// Bits 7-6.
    pub opcode: u8,
    /// Bits 5-3.
    pub a: u8,
    /// Bits 2-0.
    pub b: u8,
}

/// Split an instruction byte into its fields.
#[inline]
pub const fn fields(byte: u8) -> Fields {
    Fields {
        opcode: byte >> 6,
        a: (byte >> 3) & 0b111,
        b: byte & 0b111,
    }
}

/// Accumulator sub-operations, selected by field A under the functional opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Funct {
    /// acc := acc + src
    Add { src: Reg },
    /// acc := acc - src
    Sub { src: Reg },
    /// acc := acc & src
    And { src: Reg },
    /// acc := !(acc | src)
    Nor { src: Reg },
    /// acc := acc << amount
    Shl { amount: u8 },
    /// acc := acc >> amount, sign-preserving
    Shr { amount: u8 },
    /// acc := mem[addr]
    Load { addr: Reg },
    /// mem[addr] := acc
    Store { addr: Reg },
}

impl Funct {
    // Field A selectors
    const ADD: u8 = 0b000;
    const SUB: u8 = 0b001;
    const AND: u8 = 0b010;
    const NOR: u8 = 0b011;
    const SHL: u8 = 0b100;
    const SHR: u8 = 0b101;
    const LOAD: u8 = 0b110;
    const STORE: u8 = 0b111;

    fn decode(a: u8, b: u8) -> Self {
        let reg = Reg::from_field(b);
        match a & 0b111 {
            Self::ADD => Funct::Add { src: reg },
            Self::SUB => Funct::Sub { src: reg },
            Self::AND => Funct::And { src: reg },
            Self::NOR => Funct::Nor { src: reg },
            Self::SHL => Funct::Shl { amount: b },
            Self::SHR => Funct::Shr { amount: b },
            Self::LOAD => Funct::Load { addr: reg },
            Self::STORE => Funct::Store { addr: reg },
            _ => unreachable!("field A is three bits"),
        }
    }

    /// (field A, field B)
    fn encode(&self) -> (u8, u8) {
        match *self {
            Funct::Add { src } => (Self::ADD, src.index()),
            Funct::Sub { src } => (Self::SUB, src.index()),
            Funct::And { src } => (Self::AND, src.index()),
            Funct::Nor { src } => (Self::NOR, src.index()),
            Funct::Shl { amount } => (Self::SHL, amount & 0b111),
            Funct::Shr { amount } => (Self::SHR, amount & 0b111),
            Funct::Load { addr } => (Self::LOAD, addr.index()),
            Funct::Store { addr } => (Self::STORE, addr.index()),
        }
    }
}

/// A decoded acc8 instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// dst := src
    Move { dst: Reg, src: Reg },
    /// if cond != 0 then pc := target
    Bounce { target: Reg, cond: Reg },
    /// Accumulator arithmetic, logic, shifts and memory access.
    Functional(Funct),
    /// acc := imm (unsigned, 0-63)
    WriteImmediate { imm: u8 },
}

impl Instruction {
    pub const OP_MOVE: u8 = 0b00;
    pub const OP_BOUNCE: u8 = 0b01;
    pub const OP_FUNCTIONAL: u8 = 0b10;
    pub const OP_WRITE_IMMEDIATE: u8 = 0b11;

    /// Largest value `WriteImmediate` can carry.
    pub const MAX_IMMEDIATE: u8 = 0b11_1111;

    /// The 2-bit opcode of this instruction.
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::Move { .. } => Self::OP_MOVE,
            Instruction::Bounce { .. } => Self::OP_BOUNCE,
            Instruction::Functional(_) => Self::OP_FUNCTIONAL,
            Instruction::WriteImmediate { .. } => Self::OP_WRITE_IMMEDIATE,
        }
    }

    /// Whether this instruction may redirect the program counter.
    pub fn is_control_transfer(&self) -> bool {
        matches!(self, Instruction::Bounce { .. })
    }
}

/// Decode one instruction byte.
pub fn decode(byte: u8) -> Instruction {
    let Fields { opcode, a, b } = fields(byte);

    match opcode {
        Instruction::OP_MOVE => Instruction::Move {
            dst: Reg::from_field(a),
            src: Reg::from_field(b),
        },
        Instruction::OP_BOUNCE => Instruction::Bounce {
            target: Reg::from_field(a),
            cond: Reg::from_field(b),
        },
        Instruction::OP_FUNCTIONAL => Instruction::Functional(Funct::decode(a, b)),
        Instruction::OP_WRITE_IMMEDIATE => Instruction::WriteImmediate { imm: (a << 3) | b },
        _ => unreachable!("opcode is two bits"),
    }
}

/// Encode an instruction back to its byte.
///
/// Out-of-range immediates and shift amounts are truncated to their field width.
pub fn encode(instr: &Instruction) -> u8 {
    let (a, b) = match *instr {
        Instruction::Move { dst, src } => (dst.index(), src.index()),
        Instruction::Bounce { target, cond } => (target.index(), cond.index()),
        Instruction::Functional(funct) => funct.encode(),
        Instruction::WriteImmediate { imm } => {
            let imm = imm & Instruction::MAX_IMMEDIATE;
            (imm >> 3, imm & 0b111)
        }
    };

    (instr.opcode() << 6) | ((a & 0b111) << 3) | (b & 0b111)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_every_byte() {
        for byte in 0..=255u8 {
            let f = fields(byte);
            assert_eq!(f.opcode, byte >> 6);
            assert_eq!(f.a, (byte >> 3) & 7);
            assert_eq!(f.b, byte & 7);
        }
    }

    #[test]
    fn test_decode_write_immediate() {
        assert_eq!(decode(0b11_000_010), Instruction::WriteImmediate { imm: 2 });
        assert_eq!(decode(0xFF), Instruction::WriteImmediate { imm: 63 });
    }

    #[test]
    fn test_decode_functional_table() {
        let r3 = Reg::from_field(3);
        assert_eq!(decode(0b10_000_011), Instruction::Functional(Funct::Add { src: r3 }));
        assert_eq!(decode(0b10_001_011), Instruction::Functional(Funct::Sub { src: r3 }));
        assert_eq!(decode(0b10_010_011), Instruction::Functional(Funct::And { src: r3 }));
        assert_eq!(decode(0b10_011_011), Instruction::Functional(Funct::Nor { src: r3 }));
        assert_eq!(decode(0b10_100_011), Instruction::Functional(Funct::Shl { amount: 3 }));
        assert_eq!(decode(0b10_101_011), Instruction::Functional(Funct::Shr { amount: 3 }));
        assert_eq!(decode(0b10_110_011), Instruction::Functional(Funct::Load { addr: r3 }));
        assert_eq!(decode(0b10_111_011), Instruction::Functional(Funct::Store { addr: r3 }));
    }

    #[test]
    fn test_decode_move_and_bounce() {
        assert_eq!(
            decode(0b00_010_001),
            Instruction::Move { dst: Reg::from_field(2), src: Reg::from_field(1) }
        );
        assert_eq!(
            decode(0b01_100_111),
            Instruction::Bounce { target: Reg::from_field(4), cond: Reg::from_field(7) }
        );
        assert!(decode(0b01_000_000).is_control_transfer());
        assert!(!decode(0b00_000_000).is_control_transfer());
    }

    #[test]
    fn test_encode_inverts_decode() {
        for byte in 0..=255u8 {
            assert_eq!(encode(&decode(byte)), byte, "byte {:#04x}", byte);
        }
    }

    #[test]
    fn test_encode_truncates_immediate() {
        assert_eq!(encode(&Instruction::WriteImmediate { imm: 0x41 }), 0b11_000_001);
    }
}

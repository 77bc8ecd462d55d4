//! Simple assembler for acc8 programs.
//!
//! Syntax:
//! ```text
//! ; Comment (or # comment)
//! loop:           ; Define a label at the next byte
//!     wi 5        ; acc := 5
//!     mv $1 $a    ; $1 := acc
//!     ad $1       ; acc := acc + $1
//!     sl 2        ; acc := acc << 2
//!     wi loop     ; acc := address of loop
//!     bz $a $1    ; jump to acc if $1 != 0
//!     db 0xff     ; raw byte
//! ```
//!
//! Registers are `$a` (the accumulator), `$0`-`$7`, or bare digits.
//! Operands may be separated by spaces or commas.

use crate::cpu::decode::{encode, Funct, Instruction};
use crate::cpu::registers::Reg;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to a program image.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// Where a label reference gets patched in.
#[derive(Debug, Clone, Copy)]
enum Fixup {
    /// `wi label`
    Immediate,
    /// `db label`
    Byte,
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label -> byte address).
    symbols: HashMap<String, usize>,
    /// Pending references: (output_index, label, source_line, fixup).
    pending: Vec<(usize, String, usize, Fixup)>,
    /// Output bytes.
    output: Vec<u8>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<u8>, AssemblerError> {
        // Pass 1: collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: resolve label references
        self.resolve_references()?;

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Strip comments
        let line = match line.find([';', '#']) {
            Some(idx) => &line[..idx],
            None => line,
        };
        let line = line.trim();

        if line.is_empty() {
            return Ok(());
        }

        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            if label.is_empty() || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid label '{}'", &line[..colon_idx]),
                });
            }
            if self.symbols.insert(label.clone(), self.output.len()).is_some() {
                return Err(AssemblerError::DuplicateLabel { line: line_num, label });
            }

            // Process rest of line if any
            let rest = line[colon_idx + 1..].trim();
            if !rest.is_empty() {
                return self.process_instruction(rest, line_num);
            }
            return Ok(());
        }

        self.process_instruction(line, line_num)
    }

    fn process_instruction(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let parts: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .collect();
        let Some((mnemonic, operands)) = parts.split_first() else {
            return Ok(());
        };
        let mnemonic = mnemonic.to_lowercase();

        let expected = match mnemonic.as_str() {
            "mv" | "bz" => 2,
            "ad" | "sb" | "an" | "nr" | "sl" | "sr" | "lw" | "sw" | "wi" | "db" => 1,
            _ => return Err(AssemblerError::UnknownMnemonic {
                line: line_num,
                mnemonic,
            }),
        };
        if operands.len() != expected {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("{} takes {} operand(s), found {}", mnemonic, expected, operands.len()),
            });
        }
        let first = operands[0];

        let instr = match mnemonic.as_str() {
            "db" => {
                let byte = self.parse_value(first, 0xFF, Fixup::Byte, line_num)?;
                self.output.push(byte);
                return Ok(());
            }

            "mv" => Instruction::Move {
                dst: parse_register(first, line_num)?,
                src: parse_register(operands[1], line_num)?,
            },
            "bz" => Instruction::Bounce {
                target: parse_register(first, line_num)?,
                cond: parse_register(operands[1], line_num)?,
            },

            "ad" => Instruction::Functional(Funct::Add { src: parse_register(first, line_num)? }),
            "sb" => Instruction::Functional(Funct::Sub { src: parse_register(first, line_num)? }),
            "an" => Instruction::Functional(Funct::And { src: parse_register(first, line_num)? }),
            "nr" => Instruction::Functional(Funct::Nor { src: parse_register(first, line_num)? }),
            "sl" => Instruction::Functional(Funct::Shl { amount: parse_number(first, 7, line_num)? }),
            "sr" => Instruction::Functional(Funct::Shr { amount: parse_number(first, 7, line_num)? }),
            "lw" => Instruction::Functional(Funct::Load { addr: parse_register(first, line_num)? }),
            "sw" => Instruction::Functional(Funct::Store { addr: parse_register(first, line_num)? }),

            "wi" => {
                let imm = self.parse_value(first, Instruction::MAX_IMMEDIATE, Fixup::Immediate, line_num)?;
                Instruction::WriteImmediate { imm }
            }

            _ => unreachable!("arity table covers every mnemonic"),
        };

        self.output.push(encode(&instr));
        Ok(())
    }

    /// Parse a number or a label; labels are patched in pass 2.
    fn parse_value(&mut self, operand: &str, max: u8, fixup: Fixup, line_num: usize) -> Result<u8, AssemblerError> {
        if operand.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            return parse_number(operand, max, line_num);
        }

        self.pending.push((self.output.len(), operand.to_uppercase(), line_num, fixup));
        Ok(0) // Placeholder, will be resolved in pass 2
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for (out_idx, label, line_num, fixup) in &self.pending {
            let addr = *self.symbols.get(label)
                .ok_or_else(|| AssemblerError::UndefinedLabel {
                    line: *line_num,
                    label: label.clone(),
                })?;

            let max = match fixup {
                Fixup::Immediate => Instruction::MAX_IMMEDIATE as usize,
                Fixup::Byte => 0xFF,
            };
            if addr > max {
                return Err(AssemblerError::ValueOutOfRange {
                    line: *line_num,
                    value: addr as i64,
                    max: max as u8,
                });
            }

            self.output[*out_idx] = match fixup {
                Fixup::Immediate => encode(&Instruction::WriteImmediate { imm: addr as u8 }),
                Fixup::Byte => addr as u8,
            };
        }
        Ok(())
    }
}

/// Parse `$a`, `$0`-`$7` or a bare register digit.
fn parse_register(operand: &str, line_num: usize) -> Result<Reg, AssemblerError> {
    let name = operand.strip_prefix('$').unwrap_or(operand);
    if name.eq_ignore_ascii_case("a") {
        return Ok(Reg::ACC);
    }

    name.parse::<u8>()
        .ok()
        .and_then(Reg::new)
        .ok_or_else(|| AssemblerError::InvalidRegister {
            line: line_num,
            operand: operand.to_string(),
        })
}

/// Parse a decimal, `0x` hex or `0b` binary literal in `0..=max`.
fn parse_number(operand: &str, max: u8, line_num: usize) -> Result<u8, AssemblerError> {
    let parsed = if let Some(hex) = operand.strip_prefix("0x").or_else(|| operand.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = operand.strip_prefix("0b").or_else(|| operand.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2)
    } else {
        operand.parse::<i64>()
    };

    let value = parsed.map_err(|_| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("invalid number '{}'", operand),
    })?;

    if value < 0 || value > max as i64 {
        return Err(AssemblerError::ValueOutOfRange { line: line_num, value, max });
    }
    Ok(value as u8)
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("invalid register on line {line}: {operand}")]
    InvalidRegister { line: usize, operand: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value} (max {max})")]
    ValueOutOfRange { line: usize, value: i64, max: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; put 2 in a, shift it around
            wi 2
            sl 2
            sr 1
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![0b11_000_010, 0b10_100_010, 0b10_101_001]);
    }

    #[test]
    fn test_assemble_every_mnemonic() {
        let source = "mv $2, $1\nbz 4 7\nad $3\nsb $3\nan $3\nnr $3\nsl 3\nsr 3\nlw $3\nsw $A\nwi 63";
        let result = assemble(source).unwrap();
        assert_eq!(result, vec![
            0b00_010_001,
            0b01_100_111,
            0b10_000_011,
            0b10_001_011,
            0b10_010_011,
            0b10_011_011,
            0b10_100_011,
            0b10_101_011,
            0b10_110_011,
            0b10_111_000,
            0b11_111_111,
        ]);
    }

    #[test]
    fn test_assemble_with_labels() {
        let source = r#"
            wi end      # forward reference
            mv $1 $a
        top: wi 1
            db top
        end:
            sw $1
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(result[0], 0b11_000_100); // wi 4
        assert_eq!(result[3], 2);
    }

    #[test]
    fn test_assemble_data() {
        let result = assemble("db 0xAB\ndb 0b1100_1101\ndb 7").unwrap_err();
        assert!(matches!(result, AssemblerError::SyntaxError { line: 2, .. }));

        let result = assemble("db 0xAB\ndb 0b11001101\ndb 7").unwrap();
        assert_eq!(result, vec![0xAB, 0xCD, 7]);
    }

    #[test]
    fn test_immediate_out_of_range() {
        assert_eq!(
            assemble("wi 64"),
            Err(AssemblerError::ValueOutOfRange { line: 1, value: 64, max: 63 })
        );
        assert!(matches!(assemble("sl 8"), Err(AssemblerError::ValueOutOfRange { .. })));
    }

    #[test]
    fn test_bad_register() {
        assert!(matches!(assemble("ad $8"), Err(AssemblerError::InvalidRegister { line: 1, .. })));
        assert!(matches!(assemble("mv $1 $b"), Err(AssemblerError::InvalidRegister { .. })));
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        assert_eq!(
            assemble("wi 1\n\nhalt"),
            Err(AssemblerError::UnknownMnemonic { line: 3, mnemonic: "halt".into() })
        );
        assert_eq!(
            assemble("wi nowhere"),
            Err(AssemblerError::UndefinedLabel { line: 1, label: "NOWHERE".into() })
        );
        assert!(matches!(assemble("x:\nx:"), Err(AssemblerError::DuplicateLabel { line: 2, .. })));
        assert!(matches!(assemble("mv $1"), Err(AssemblerError::SyntaxError { line: 1, .. })));
    }
}

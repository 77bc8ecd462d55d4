//! acc8 register file.
//!
//! Eight signed 16-bit registers. Register 0 is the accumulator and is the
//! implicit source and destination of every functional operation.

use serde::{Serialize, Deserialize};
use std::ops::{Index, IndexMut};

/// Number of registers.
pub const REGISTER_COUNT: usize = 8;

/// A register index, always in 0-7.
///
/// Built from a 3-bit instruction field, so indexing with it never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reg(u8);

impl Reg {
    /// The accumulator, register 0.
    pub const ACC: Reg = Reg(0);

    /// Build from the low 3 bits of `field`.
    #[inline]
    pub const fn from_field(field: u8) -> Self {
        Reg(field & 0b111)
    }

    /// Build from an index, rejecting anything past 7.
    pub fn new(index: u8) -> Option<Self> {
        (index < REGISTER_COUNT as u8).then_some(Reg(index))
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }

    pub const fn is_accumulator(self) -> bool {
        self.0 == 0
    }

    /// Every register, accumulator first.
    pub fn all() -> impl Iterator<Item = Reg> {
        (0..REGISTER_COUNT as u8).map(Reg)
    }
}

impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_accumulator() {
            write!(f, "$a")
        } else {
            write!(f, "${}", self.0)
        }
    }
}

/// The register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    values: [i16; REGISTER_COUNT],
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self { values: [0; REGISTER_COUNT] }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        self.values = [0; REGISTER_COUNT];
    }

    /// The accumulator.
    #[inline]
    pub fn acc(&self) -> i16 {
        self.values[0]
    }

    #[inline]
    pub fn set_acc(&mut self, value: i16) {
        self.values[0] = value;
    }

    /// All register values, accumulator first.
    pub fn as_array(&self) -> &[i16; REGISTER_COUNT] {
        &self.values
    }
}

impl Index<Reg> for Registers {
    type Output = i16;

    #[inline]
    fn index(&self, reg: Reg) -> &i16 {
        &self.values[reg.0 as usize]
    }
}

impl IndexMut<Reg> for Registers {
    #[inline]
    fn index_mut(&mut self, reg: Reg) -> &mut i16 {
        &mut self.values[reg.0 as usize]
    }
}

/// One line per register, accumulator labeled `$a`.
impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Registers")?;
        for reg in Reg::all() {
            writeln!(f, " {} {}", reg, self[reg])?;
        }
        Ok(())
    }
}

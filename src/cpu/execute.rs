//! CPU execution engine for acc8.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::asm::disasm::format_instruction;
use crate::config::{ConfigError, EmuConfig};
use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{self, Funct, Instruction};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::REGISTER_COUNT;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// The program counter is inside the loaded program.
    Running,
    /// The program counter has left the loaded program.
    Halted,
    /// An instruction failed; the program counter still points at it.
    Faulted,
}

/// The acc8 CPU.
#[derive(Clone)]
pub struct Cpu {
    regs: Registers,
    mem: Memory,
    /// Byte index of the next instruction.
    pc: usize,
    /// Number of instruction bytes in the current program.
    loaded: usize,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions executed since the program was loaded.
    pub cycles: u64,
    max_steps: Option<u64>,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a CPU with the default configuration.
    pub fn new() -> Self {
        Self::with_memory(Memory::new(), EmuConfig::default().max_steps)
    }

    /// Create a CPU sized and limited by `config`.
    ///
    /// Fails if `config` does not pass `EmuConfig::validate`.
    pub fn with_config(config: &EmuConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mem = Memory::with_address_bits(config.address_bits, config.address_policy)?;
        Ok(Self::with_memory(mem, config.max_steps))
    }

    fn with_memory(mem: Memory, max_steps: Option<u64>) -> Self {
        Self {
            regs: Registers::new(),
            mem,
            pc: 0,
            loaded: 0,
            state: CpuState::Halted,
            cycles: 0,
            max_steps,
            last_instr: None,
        }
    }

    /// Reset the CPU to initial state, discarding the program.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.pc = 0;
        self.loaded = 0;
        self.state = CpuState::Halted;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Load a program image and prepare to run it from byte 0.
    ///
    /// Returns the number of instruction bytes loaded.
    pub fn load(&mut self, program: &[u8]) -> Result<usize, MemoryError> {
        self.reset();
        let loaded = self.mem.load_program(program)?;
        self.loaded = loaded;
        self.state = if loaded > 0 { CpuState::Running } else { CpuState::Halted };
        tracing::debug!(
            bytes = loaded,
            words = loaded.div_ceil(2),
            capacity = self.mem.capacity(),
            "program loaded"
        );
        Ok(loaded)
    }

    /// Execute a single instruction.
    ///
    /// Returns `Ok(true)` while the program counter stays inside the program.
    /// Once it has left, further calls do nothing and return `Ok(false)`.
    pub fn step(&mut self) -> Result<bool, CpuError> {
        if self.state == CpuState::Faulted {
            return Err(CpuError::NotRunning(self.state));
        }
        if self.pc >= self.loaded {
            self.state = CpuState::Halted;
            return Ok(false);
        }
        if let Some(limit) = self.max_steps {
            if self.cycles >= limit {
                tracing::warn!(limit, pc = self.pc, "step limit reached");
                return Err(CpuError::StepLimitExceeded { limit, pc: self.pc });
            }
        }

        // Fetch
        let pc = self.pc;
        let byte = self.mem.fetch_byte(pc).inspect_err(|_| self.state = CpuState::Faulted)?;

        // Decode
        let instr = decode::decode(byte);

        // Execute
        let jump = self.execute(instr).inspect_err(|_| self.state = CpuState::Faulted)?;
        self.pc = jump.unwrap_or(pc + 1);

        self.cycles += 1;
        self.last_instr = Some(instr);

        tracing::trace!(
            pc,
            byte,
            instr = %format_instruction(&instr),
            acc = self.regs.acc(),
            next = self.pc,
        );

        if self.pc < self.loaded {
            Ok(true)
        } else {
            self.state = CpuState::Halted;
            Ok(false)
        }
    }

    /// Run until the program counter leaves the program.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.step()? {}

        let executed = self.cycles - start_cycles;
        tracing::debug!(steps = executed, pc = self.pc, "program finished");
        Ok(executed)
    }

    /// Execute a decoded instruction.
    ///
    /// Returns the new program counter for a taken bounce.
    fn execute(&mut self, instr: Instruction) -> Result<Option<usize>, CpuError> {
        match instr {
            Instruction::Move { dst, src } => {
                self.regs[dst] = self.regs[src];
            }

            Instruction::Bounce { target, cond } => {
                if self.regs[cond] != 0 {
                    // Register bits as an unsigned byte index; a negative
                    // value only halts if it lands past the loaded bytes
                    return Ok(Some(self.regs[target] as u16 as usize));
                }
            }

            Instruction::Functional(funct) => self.execute_functional(funct)?,

            Instruction::WriteImmediate { imm } => {
                self.regs.set_acc(imm as i16);
            }
        }

        Ok(None)
    }

    fn execute_functional(&mut self, funct: Funct) -> Result<(), CpuError> {
        let acc = self.regs.acc();

        let result = match funct {
            Funct::Add { src } => acc.wrapping_add(self.regs[src]),
            Funct::Sub { src } => acc.wrapping_sub(self.regs[src]),
            Funct::And { src } => acc & self.regs[src],
            Funct::Nor { src } => !(acc | self.regs[src]),
            Funct::Shl { amount } => acc.wrapping_shl(amount as u32),
            Funct::Shr { amount } => acc >> amount,
            Funct::Load { addr } => {
                self.mem.load_word(self.regs[addr] as u16)? as i16
            }
            Funct::Store { addr } => {
                self.mem.store_word(self.regs[addr] as u16, acc as u16)?;
                return Ok(());
            }
        };

        self.regs.set_acc(result);
        Ok(())
    }

    /// Byte index of the next instruction.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Number of instruction bytes in the loaded program.
    pub fn instructions_loaded(&self) -> usize {
        self.loaded
    }

    /// Instructions executed since the program was loaded.
    pub fn steps(&self) -> u64 {
        self.cycles
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    /// Mutable registers, for seeding state before a run.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Fetch the instruction byte at `pc` without executing it.
    pub fn fetch(&self, pc: usize) -> Result<u8, MemoryError> {
        self.mem.fetch_byte(pc)
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Final program counter and register listing.
    pub fn register_dump(&self) -> String {
        format!("PC: {}\n{}", self.pc, self.regs)
    }

    /// Serializable summary of the machine state.
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            pc: self.pc,
            instructions_loaded: self.loaded,
            steps: self.cycles,
            state: self.state,
            registers: *self.regs.as_array(),
            last_instruction: self.last_instr,
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("pc", &self.pc)
            .field("loaded", &self.loaded)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Machine state without the memory image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub pc: usize,
    pub instructions_loaded: usize,
    pub steps: u64,
    pub state: CpuState,
    pub registers: [i16; REGISTER_COUNT],
    pub last_instruction: Option<Instruction>,
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("step limit of {limit} instructions reached at pc {pc}")]
    StepLimitExceeded { limit: u64, pc: usize },
}

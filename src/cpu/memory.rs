//! acc8 memory subsystem.
//!
//! Memory is an array of 16-bit words. Loads and stores address whole words.
//! Instruction fetch addresses bytes: byte `2n` is the high half of word `n`
//! and byte `2n + 1` is the low half.

use crate::config::{AddressPolicy, ConfigError, DEFAULT_ADDRESS_BITS, MAX_ADDRESS_BITS};

/// Word-addressed memory with byte-granular instruction fetch.
#[derive(Clone)]
pub struct Memory {
    words: Vec<u16>,
    policy: AddressPolicy,
}

impl Memory {
    /// Create a zeroed memory of the default size.
    pub fn new() -> Self {
        Self::zeroed(DEFAULT_ADDRESS_BITS, AddressPolicy::Fault)
    }

    /// Create a zeroed memory of `2^bits` words.
    ///
    /// `bits` must be between 1 and 16.
    pub fn with_address_bits(bits: u8, policy: AddressPolicy) -> Result<Self, ConfigError> {
        if bits == 0 || bits > MAX_ADDRESS_BITS {
            return Err(ConfigError::AddressBits(bits));
        }
        Ok(Self::zeroed(bits, policy))
    }

    fn zeroed(bits: u8, policy: AddressPolicy) -> Self {
        Self {
            words: vec![0; 1usize << bits],
            policy,
        }
    }

    /// Number of words.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    /// Largest program, in instruction bytes, that fits.
    #[inline]
    pub fn max_program_bytes(&self) -> usize {
        self.words.len() * 2
    }

    /// Read a word by index.
    ///
    /// # Panics
    /// Panics if address is out of range.
    #[inline]
    pub fn read(&self, addr: usize) -> u16 {
        assert!(addr < self.words.len(), "Memory address {} out of range (0-{})", addr, self.words.len() - 1);
        self.words[addr]
    }

    /// Write a word by index.
    ///
    /// # Panics
    /// Panics if address is out of range.
    #[inline]
    pub fn write(&mut self, addr: usize, value: u16) {
        assert!(addr < self.words.len(), "Memory address {} out of range (0-{})", addr, self.words.len() - 1);
        self.words[addr] = value;
    }

    /// Read a word without panicking.
    pub fn get(&self, addr: usize) -> Option<u16> {
        self.words.get(addr).copied()
    }

    /// Load a word through a register-held address.
    pub fn load_word(&self, addr: u16) -> Result<u16, MemoryError> {
        let index = self.resolve(addr)?;
        Ok(self.words[index])
    }

    /// Store a word through a register-held address.
    pub fn store_word(&mut self, addr: u16, value: u16) -> Result<(), MemoryError> {
        let index = self.resolve(addr)?;
        self.words[index] = value;
        Ok(())
    }

    /// Apply the address policy to a register-held address.
    fn resolve(&self, addr: u16) -> Result<usize, MemoryError> {
        let index = addr as usize;
        if index < self.words.len() {
            return Ok(index);
        }
        match self.policy {
            AddressPolicy::Fault => Err(MemoryError::AddressOutOfRange {
                addr: index,
                capacity: self.words.len(),
            }),
            // capacity is a power of two
            AddressPolicy::Wrap => Ok(index & (self.words.len() - 1)),
        }
    }

    /// Fetch the instruction byte at byte index `pc`.
    ///
    /// Even `pc` selects the high byte of word `pc / 2`, odd `pc` the low byte.
    pub fn fetch_byte(&self, pc: usize) -> Result<u8, MemoryError> {
        let word = self.words.get(pc / 2).copied().ok_or(MemoryError::AddressOutOfRange {
            addr: pc / 2,
            capacity: self.words.len(),
        })?;
        let [high, low] = word.to_be_bytes();
        Ok(if pc % 2 == 0 { high } else { low })
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Zero memory and pack `program` into it, two bytes per word, high byte first.
    ///
    /// Returns the number of instruction bytes loaded.
    pub fn load_program(&mut self, program: &[u8]) -> Result<usize, MemoryError> {
        if program.len() > self.max_program_bytes() {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: self.max_program_bytes(),
            });
        }

        self.clear();
        for (word, pair) in self.words.iter_mut().zip(program.chunks(2)) {
            let high = pair[0];
            let low = pair.get(1).copied().unwrap_or(0);
            *word = u16::from_be_bytes([high, low]);
        }

        Ok(program.len())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u16)> {
        let end = start.saturating_add(count).min(self.words.len());
        (start.min(end)..end)
            .map(|i| (i, self.words[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.words.iter().filter(|w| **w != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_words", &non_zero)
            .field("total_words", &self.words.len())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Address is outside valid memory range.
    AddressOutOfRange { addr: usize, capacity: usize },
    /// Program is too large to fit in memory.
    ProgramTooLarge { size: usize, available: usize },
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::AddressOutOfRange { addr, capacity } => {
                write!(f, "memory address {:#06x} out of range (0-{:#06x})", addr, capacity - 1)
            }
            MemoryError::ProgramTooLarge { size, available } => {
                write!(f, "program size {} bytes exceeds available space {} bytes", size, available)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();
        mem.write(10, 0xBEEF);
        assert_eq!(mem.read(10), 0xBEEF);
        assert_eq!(mem.capacity(), 65536);
    }

    #[test]
    fn test_fetch_byte_parity() {
        let mut mem = Memory::new();
        mem.load_program(&[0xAB, 0xCD]).unwrap();

        assert_eq!(mem.read(0), 0xABCD);
        assert_eq!(mem.fetch_byte(0).unwrap(), 0xAB);
        assert_eq!(mem.fetch_byte(1).unwrap(), 0xCD);
    }

    #[test]
    fn test_fetch_byte_later_words() {
        let mut mem = Memory::new();
        mem.load_program(&[0x01, 0x02, 0x03, 0x04, 0x05]).unwrap();

        let fetched: Vec<u8> = (0..5).map(|pc| mem.fetch_byte(pc).unwrap()).collect();
        assert_eq!(fetched, vec![0x01, 0x02, 0x03, 0x04, 0x05]);
        // Odd length: the pad byte is zero
        assert_eq!(mem.read(2), 0x0500);
    }

    #[test]
    fn test_load_program_clears_previous_image() {
        let mut mem = Memory::with_address_bits(4, AddressPolicy::Fault).unwrap();
        mem.write(7, 0xFFFF);
        assert_eq!(mem.load_program(&[0x11]).unwrap(), 1);
        assert_eq!(mem.read(7), 0);
    }

    #[test]
    fn test_program_too_large() {
        let mut mem = Memory::with_address_bits(2, AddressPolicy::Fault).unwrap();
        assert!(mem.load_program(&[0; 8]).is_ok());
        assert_eq!(
            mem.load_program(&[0; 9]),
            Err(MemoryError::ProgramTooLarge { size: 9, available: 8 })
        );
    }

    #[test]
    fn test_fault_policy() {
        let mut mem = Memory::with_address_bits(4, AddressPolicy::Fault).unwrap();
        assert!(mem.store_word(15, 1).is_ok());
        assert_eq!(
            mem.store_word(16, 1),
            Err(MemoryError::AddressOutOfRange { addr: 16, capacity: 16 })
        );
        assert!(mem.load_word(0xFFFF).is_err());
    }

    #[test]
    fn test_wrap_policy() {
        let mut mem = Memory::with_address_bits(4, AddressPolicy::Wrap).unwrap();
        mem.store_word(17, 42).unwrap();
        assert_eq!(mem.read(1), 42);
        assert_eq!(mem.load_word(0xFFF1).unwrap(), 42);
    }

    #[test]
    fn test_dump_clamps_to_capacity() {
        let mem = Memory::with_address_bits(3, AddressPolicy::Fault).unwrap();
        assert_eq!(mem.dump(6, 10).len(), 2);
        assert!(mem.dump(100, 4).is_empty());
    }

    #[test]
    fn test_rejects_unsupported_sizes() {
        assert_eq!(
            Memory::with_address_bits(0, AddressPolicy::Fault).unwrap_err(),
            ConfigError::AddressBits(0)
        );
        assert_eq!(
            Memory::with_address_bits(17, AddressPolicy::Wrap).unwrap_err(),
            ConfigError::AddressBits(17)
        );
        assert_eq!(Memory::with_address_bits(16, AddressPolicy::Fault).unwrap().capacity(), 65536);
        assert_eq!(Memory::with_address_bits(1, AddressPolicy::Fault).unwrap().capacity(), 2);
    }
}

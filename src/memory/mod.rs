//! Emulated memory access
//!
//! The engine never owns emulator memory. Hosts register one [`MemoryBank`]
//! per emulated region and the [`BankRegistry`] lays the banks out back to
//! back, in ascending id order, to form a single flat address space.

mod banks;
mod search;

pub use banks::{CallbackBank, SharedMemory};
pub use search::{MemoryCandidate, MemorySearchEngine, SearchOutcome, SearchSize};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// One contiguous region of emulated memory
pub trait MemoryBank: Send {
    /// Size of the bank in bytes
    fn size(&self) -> usize;

    /// Read a byte at a bank-relative offset
    fn read_byte(&self, offset: usize) -> u8;

    /// Write a byte at a bank-relative offset
    fn write_byte(&mut self, offset: usize, value: u8);
}

/// Width of a memory read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemSize {
    Bit0,
    Bit1,
    Bit2,
    Bit3,
    Bit4,
    Bit5,
    Bit6,
    Bit7,
    LowerNibble,
    UpperNibble,
    #[default]
    Byte,
    Word,
    Dword,
}

/// Size letter used in definition strings. Word serializes as a space.
const SIZE_CODES: [(MemSize, u8); 13] = [
    (MemSize::Bit0, b'M'),
    (MemSize::Bit1, b'N'),
    (MemSize::Bit2, b'O'),
    (MemSize::Bit3, b'P'),
    (MemSize::Bit4, b'Q'),
    (MemSize::Bit5, b'R'),
    (MemSize::Bit6, b'S'),
    (MemSize::Bit7, b'T'),
    (MemSize::LowerNibble, b'L'),
    (MemSize::UpperNibble, b'U'),
    (MemSize::Byte, b'H'),
    (MemSize::Word, b' '),
    (MemSize::Dword, b'X'),
];

impl MemSize {
    /// Look up a size by its definition letter (case-insensitive)
    pub fn from_code(code: u8) -> Option<MemSize> {
        let code = code.to_ascii_uppercase();
        SIZE_CODES
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(size, _)| *size)
    }

    /// The definition letter for this size
    pub fn code(&self) -> char {
        SIZE_CODES
            .iter()
            .find(|(size, _)| size == self)
            .map(|(_, c)| *c as char)
            .unwrap_or(' ')
    }

    /// Bit index for single-bit sizes
    pub fn bit_index(&self) -> Option<u8> {
        match self {
            MemSize::Bit0 => Some(0),
            MemSize::Bit1 => Some(1),
            MemSize::Bit2 => Some(2),
            MemSize::Bit3 => Some(3),
            MemSize::Bit4 => Some(4),
            MemSize::Bit5 => Some(5),
            MemSize::Bit6 => Some(6),
            MemSize::Bit7 => Some(7),
            _ => None,
        }
    }
}

/// Registry of memory banks forming one flat address space
#[derive(Default)]
pub struct BankRegistry {
    banks: BTreeMap<usize, Box<dyn MemoryBank>>,
}

impl BankRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bank under an id. Ids must be unique.
    pub fn register(&mut self, id: usize, bank: Box<dyn MemoryBank>) -> Result<()> {
        if self.banks.contains_key(&id) {
            return Err(EngineError::DuplicateBank(id));
        }
        log::info!("Registered memory bank {} ({} bytes)", id, bank.size());
        self.banks.insert(id, bank);
        Ok(())
    }

    /// Remove every registered bank
    pub fn clear(&mut self) {
        if !self.banks.is_empty() {
            log::info!("Cleared {} memory banks", self.banks.len());
        }
        self.banks.clear();
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    /// Registered bank ids in address order
    pub fn bank_ids(&self) -> Vec<usize> {
        self.banks.keys().copied().collect()
    }

    pub fn bank_size(&self, id: usize) -> Option<usize> {
        self.banks.get(&id).map(|bank| bank.size())
    }

    /// Sum of all bank sizes
    pub fn total_size(&self) -> usize {
        self.banks.values().map(|bank| bank.size()).sum()
    }

    /// Find the bank containing a flat address and the offset within it
    fn locate(&self, address: usize) -> Option<(&dyn MemoryBank, usize)> {
        let mut offset = address;
        for bank in self.banks.values() {
            let size = bank.size();
            if offset < size {
                return Some((bank.as_ref(), offset));
            }
            offset -= size;
        }
        None
    }

    /// Read one byte. Addresses past the end of the last bank read as zero.
    pub fn read_byte(&self, address: usize) -> u8 {
        match self.locate(address) {
            Some((bank, offset)) => bank.read_byte(offset),
            None => 0,
        }
    }

    /// Write one byte. Writes past the end of the last bank are dropped.
    pub fn write_byte(&mut self, address: usize, value: u8) {
        let mut offset = address;
        for bank in self.banks.values_mut() {
            let size = bank.size();
            if offset < size {
                bank.write_byte(offset, value);
                return;
            }
            offset -= size;
        }
        log::debug!("Dropped write to unmapped address 0x{:x}", address);
    }

    /// Read a value of the given width. Multi-byte values are little-endian.
    pub fn read(&self, address: usize, size: MemSize) -> u32 {
        match size {
            MemSize::LowerNibble => u32::from(self.read_byte(address) & 0x0F),
            MemSize::UpperNibble => u32::from(self.read_byte(address) >> 4),
            MemSize::Byte => u32::from(self.read_byte(address)),
            MemSize::Word => self.read_le(address, 2),
            MemSize::Dword => self.read_le(address, 4),
            bit => {
                let index = bit.bit_index().unwrap_or(0);
                u32::from((self.read_byte(address) >> index) & 0x01)
            }
        }
    }

    fn read_le(&self, address: usize, count: usize) -> u32 {
        (0..count).fold(0u32, |value, i| {
            value | (u32::from(self.read_byte(address.wrapping_add(i))) << (8 * i))
        })
    }
}

impl std::fmt::Debug for BankRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankRegistry")
            .field("bank_ids", &self.bank_ids())
            .field("total_size", &self.total_size())
            .finish()
    }
}

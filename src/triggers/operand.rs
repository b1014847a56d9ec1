//! Operands: literals, live memory reads and previous-frame deltas

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::lexer::Cursor;
use super::types::OperandKind;
use crate::error::ParseError;
use crate::memory::{BankRegistry, MemSize};

/// One side of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Operand {
    pub kind: OperandKind,
    pub size: MemSize,
    /// Literal value, or the address for memory operands
    pub raw: u32,
    /// Value observed by the previous delta evaluation
    pub last: u32,
}

impl Operand {
    pub fn value(value: u32) -> Self {
        Self {
            kind: OperandKind::Value,
            size: MemSize::Byte,
            raw: value,
            last: 0,
        }
    }

    pub fn address(address: u32, size: MemSize) -> Self {
        Self {
            kind: OperandKind::Address,
            size,
            raw: address,
            last: 0,
        }
    }

    pub fn delta(address: u32, size: MemSize) -> Self {
        Self {
            kind: OperandKind::Delta,
            ..Self::address(address, size)
        }
    }

    /// Parse an operand. An address without a size letter reads a word.
    pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self, ParseError> {
        Self::parse_with_default(cursor, MemSize::Word)
    }

    /// Parse an operand, using `default_size` when no size letter is given
    pub fn parse_with_default(
        cursor: &mut Cursor<'_>,
        default_size: MemSize,
    ) -> Result<Self, ParseError> {
        let start = cursor.position();

        let kind = if matches!(cursor.peek_char(), Some(b'd' | b'D')) && cursor.at_hex_prefix(1) {
            cursor.advance();
            OperandKind::Delta
        } else if cursor.at_hex_prefix(0) {
            OperandKind::Address
        } else {
            OperandKind::Value
        };

        if kind != OperandKind::Value {
            cursor.set_position(cursor.position() + 2);
            let size = match cursor.peek_char().and_then(MemSize::from_code) {
                Some(size) => {
                    cursor.advance();
                    size
                }
                None => default_size,
            };
            let Some(address) = cursor.hex_number() else {
                let fallback = Self {
                    kind,
                    ..Self::address(0, size)
                };
                return cursor.recover(
                    fallback,
                    ParseError::operand(cursor.position(), "expected a hexadecimal address"),
                );
            };
            return Ok(Self {
                kind,
                ..Self::address(address, size)
            });
        }

        if cursor.match_char_ignore_case(b'h') {
            if cursor.at_hex_prefix(0) {
                cursor.set_position(cursor.position() + 2);
            }
            return match cursor.hex_number() {
                Some(value) => Ok(Self::value(value)),
                None => {
                    cursor.set_position(start);
                    cursor.recover(
                        Self::value(0),
                        ParseError::operand(start, "expected hexadecimal digits after 'h'"),
                    )
                }
            };
        }

        let negative = cursor.match_char(b'-');
        if !negative {
            cursor.match_char(b'+');
        }
        match cursor.decimal_number() {
            Some(value) if negative => Ok(Self::value(value.wrapping_neg())),
            Some(value) => Ok(Self::value(value)),
            None => {
                cursor.set_position(start);
                cursor.recover(
                    Self::value(0),
                    ParseError::operand(start, "expected an address, delta or literal"),
                )
            }
        }
    }

    /// Current value of this operand
    ///
    /// Delta operands return the value recorded by their previous evaluation
    /// and then record the live value.
    pub fn resolve(&mut self, banks: &BankRegistry) -> u32 {
        match self.kind {
            OperandKind::Value => self.raw,
            OperandKind::Address => banks.read(self.raw as usize, self.size),
            OperandKind::Delta => {
                let live = banks.read(self.raw as usize, self.size);
                std::mem::replace(&mut self.last, live)
            }
        }
    }

    pub fn reset_delta(&mut self) {
        self.last = 0;
    }

    /// Overwrite the raw value and delta state, as restored from progress data
    pub fn set_values(&mut self, raw: u32, last: u32) {
        self.raw = raw;
        self.last = last;
    }

    /// Canonical definition text
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        match self.kind {
            OperandKind::Value => {
                let _ = write!(out, "{}", self.raw);
            }
            OperandKind::Address | OperandKind::Delta => {
                if self.kind == OperandKind::Delta {
                    out.push('d');
                }
                out.push_str("0x");
                out.push(self.size.code());
                if self.raw >= 0x10000 {
                    let _ = write!(out, "{:06x}", self.raw);
                } else {
                    let _ = write!(out, "{:04x}", self.raw);
                }
            }
        }
    }
}

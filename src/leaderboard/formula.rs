//! Weighted-sum memory formulas for leaderboard values

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::memory::{BankRegistry, MemSize};
use crate::triggers::{Cursor, Operand, OperandKind};

/// One `[B|V]<operand>[*<float>]` term
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormulaTerm {
    /// Address to read, or the literal for raw-value terms
    pub address: u32,
    pub size: MemSize,
    pub multiplier: f64,
    /// Decode the read byte as two packed decimal digits
    pub is_bcd: bool,
    /// Use `address` itself as the value
    pub is_raw_value: bool,
}

impl FormulaTerm {
    pub fn memory(address: u32, size: MemSize, multiplier: f64) -> Self {
        Self {
            address,
            size,
            multiplier,
            is_bcd: false,
            is_raw_value: false,
        }
    }

    pub fn literal(value: u32, multiplier: f64) -> Self {
        Self {
            address: value,
            size: MemSize::Byte,
            multiplier,
            is_bcd: false,
            is_raw_value: true,
        }
    }

    fn parse(cursor: &mut Cursor<'_>) -> Result<Self, ParseError> {
        let is_bcd = cursor.match_char_ignore_case(b'B');
        let is_raw_value = !is_bcd && cursor.match_char_ignore_case(b'V');

        let operand = Operand::parse_with_default(cursor, MemSize::Byte)?;
        let size = match operand.kind {
            OperandKind::Value => MemSize::Byte,
            OperandKind::Address | OperandKind::Delta => operand.size,
        };

        let mut multiplier = 1.0;
        if cursor.match_char(b'*') {
            let at = cursor.position();
            multiplier = match cursor.float_number() {
                Some(value) => value,
                None => cursor.recover(1.0, ParseError::formula(at, "expected a multiplier"))?,
            };
        }

        Ok(Self {
            address: operand.raw,
            size,
            multiplier,
            is_bcd,
            is_raw_value,
        })
    }

    /// Unweighted value of this term
    pub fn value(&self, banks: &BankRegistry) -> u32 {
        if self.is_raw_value {
            return self.address;
        }
        let value = banks.read(self.address as usize, self.size);
        if self.is_bcd {
            ((value >> 4) & 0x0F) * 10 + (value & 0x0F)
        } else {
            value
        }
    }

    /// Weighted value; the term value is taken as signed 32-bit
    pub fn resolve(&self, banks: &BankRegistry) -> f64 {
        f64::from(self.value(banks) as i32) * self.multiplier
    }

    fn write_to(&self, out: &mut String) {
        if self.is_raw_value {
            let _ = write!(out, "V{}", self.address);
        } else {
            if self.is_bcd {
                out.push('B');
            }
            Operand::address(self.address, self.size).write_to(out);
        }
        if self.multiplier != 1.0 {
            let _ = write!(out, "*{}", self.multiplier);
        }
    }
}

/// Sum of weighted memory terms, e.g. `0xH0024*1_0xH0025*60`
///
/// There is no precedence or grouping; terms simply accumulate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueFormula {
    terms: Vec<FormulaTerm>,
}

impl ValueFormula {
    pub fn new(terms: Vec<FormulaTerm>) -> Self {
        Self { terms }
    }

    /// Parse `_`-joined terms. An address without a size letter reads a byte.
    pub fn parse(text: &str, lenient: bool) -> Result<Self, ParseError> {
        let mut cursor = Cursor::new(text, lenient);
        let formula = Self::parse_terms(&mut cursor)?;
        cursor.finish()?;
        Ok(formula)
    }

    pub fn parse_terms(cursor: &mut Cursor<'_>) -> Result<Self, ParseError> {
        let mut terms = Vec::new();
        while !cursor.is_eof() {
            terms.push(FormulaTerm::parse(cursor)?);
            if !cursor.match_char(b'_') {
                break;
            }
        }
        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[FormulaTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn resolve(&self, banks: &BankRegistry) -> f64 {
        self.terms.iter().map(|term| term.resolve(banks)).sum()
    }

    /// The sum truncated to 32 bits; negative sums wrap to two's complement
    pub fn resolve_u32(&self, banks: &BankRegistry) -> u32 {
        self.resolve(banks) as i64 as u32
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                out.push('_');
            }
            term.write_to(&mut out);
        }
        out
    }
}

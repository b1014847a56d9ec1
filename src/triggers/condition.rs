//! A single memory comparison with hit counting

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::lexer::Cursor;
use super::operand::Operand;
use super::types::{Comparison, ConditionRole};
use crate::error::ParseError;
use crate::memory::BankRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Condition {
    pub role: ConditionRole,
    pub source: Operand,
    pub comparison: Comparison,
    pub target: Operand,
    /// Qualifying frames needed before the condition latches. Zero means
    /// the condition is re-evaluated every frame and never latches.
    pub required_hits: u32,
    pub current_hits: u32,
}

impl Condition {
    pub fn new(source: Operand, comparison: Comparison, target: Operand) -> Self {
        Self {
            role: ConditionRole::Standard,
            source,
            comparison,
            target,
            required_hits: 0,
            current_hits: 0,
        }
    }

    pub fn with_role(mut self, role: ConditionRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_required_hits(mut self, hits: u32) -> Self {
        self.required_hits = hits;
        self
    }

    /// Parse `[R:|P:]<source><cmp><target>[.N.|(N)]`
    pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self, ParseError> {
        let role = if cursor.match_str("R:") {
            ConditionRole::ResetIf
        } else if cursor.match_str("P:") {
            ConditionRole::PauseIf
        } else {
            ConditionRole::Standard
        };

        let source = Operand::parse(cursor)?;
        let comparison = parse_comparison(cursor)?;
        let target = Operand::parse(cursor)?;
        let required_hits = parse_hit_count(cursor)?;

        Ok(Self {
            role,
            source,
            comparison,
            target,
            required_hits,
            current_hits: 0,
        })
    }

    /// Resolve both operands and compare them
    pub fn compare(&mut self, banks: &BankRegistry) -> bool {
        let source = self.source.resolve(banks);
        let target = self.target.resolve(banks);
        self.comparison.evaluate(source, target)
    }

    pub fn is_complete(&self) -> bool {
        self.current_hits >= self.required_hits
    }

    pub fn incr_hits(&mut self) {
        self.current_hits = self.current_hits.saturating_add(1);
    }

    /// Zero the hit counter, returning whether it changed
    pub fn reset_hits(&mut self) -> bool {
        if self.current_hits == 0 {
            return false;
        }
        self.current_hits = 0;
        true
    }

    pub fn reset_deltas(&mut self) {
        self.source.reset_delta();
        self.target.reset_delta();
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        out.push_str(self.role.prefix());
        self.source.write_to(out);
        out.push_str(self.comparison.as_str());
        self.target.write_to(out);
        if self.required_hits > 0 {
            let _ = write!(out, ".{}.", self.required_hits);
        }
    }
}

fn parse_comparison(cursor: &mut Cursor<'_>) -> Result<Comparison, ParseError> {
    let comparison = match cursor.peek_char() {
        Some(b'=') => {
            cursor.advance();
            cursor.match_char(b'=');
            Comparison::Equal
        }
        Some(b'!') if cursor.peek_at(1) == Some(b'=') => {
            cursor.set_position(cursor.position() + 2);
            Comparison::NotEqual
        }
        Some(b'<') => {
            cursor.advance();
            if cursor.match_char(b'=') {
                Comparison::LessOrEqual
            } else {
                Comparison::LessThan
            }
        }
        Some(b'>') => {
            cursor.advance();
            if cursor.match_char(b'=') {
                Comparison::GreaterOrEqual
            } else {
                Comparison::GreaterThan
            }
        }
        _ => {
            return cursor.recover(
                Comparison::Equal,
                ParseError::comparator(cursor.position(), "expected one of = == != < <= > >="),
            )
        }
    };
    Ok(comparison)
}

fn parse_hit_count(cursor: &mut Cursor<'_>) -> Result<u32, ParseError> {
    let close = match cursor.peek_char() {
        Some(b'.') => b'.',
        Some(b'(') => b')',
        _ => return Ok(0),
    };
    let start = cursor.position();
    cursor.advance();
    match cursor.decimal_number() {
        Some(hits) if cursor.match_char(close) => Ok(hits),
        _ => {
            cursor.set_position(start);
            cursor.recover(0, ParseError::hit_count(start, "expected .N. or (N)"))
        }
    }
}

//! Character cursor shared by the definition parsers
//!
//! Definitions are plain ASCII, so the cursor walks bytes. In lenient mode
//! the parsers recover from malformed input with zero-valued constructs
//! instead of failing, which is how legacy definitions have always loaded.

use crate::error::ParseError;

pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
    lenient: bool,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str, lenient: bool) -> Self {
        Self {
            input: source.as_bytes(),
            pos: 0,
            lenient,
        }
    }

    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Rewind (or skip) to a previously observed position
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn peek_char(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.input.get(self.pos + ahead).copied()
    }

    pub fn advance(&mut self) -> Option<u8> {
        let ch = self.peek_char()?;
        self.pos += 1;
        Some(ch)
    }

    pub fn match_char(&mut self, expected: u8) -> bool {
        if self.peek_char() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn match_char_ignore_case(&mut self, expected: u8) -> bool {
        match self.peek_char() {
            Some(ch) if ch.eq_ignore_ascii_case(&expected) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// Consume `prefix` if the input continues with it
    pub fn match_str(&mut self, prefix: &str) -> bool {
        if self.input[self.pos..].starts_with(prefix.as_bytes()) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// True when the input continues with `0x` or `0X`
    pub fn at_hex_prefix(&self, offset: usize) -> bool {
        self.peek_at(offset) == Some(b'0') && matches!(self.peek_at(offset + 1), Some(b'x' | b'X'))
    }

    /// Consume hexadecimal digits, saturating at `u32::MAX`
    pub fn hex_number(&mut self) -> Option<u32> {
        self.digits(16)
    }

    /// Consume decimal digits, saturating at `u32::MAX`
    pub fn decimal_number(&mut self) -> Option<u32> {
        self.digits(10)
    }

    fn digits(&mut self, radix: u32) -> Option<u32> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(digit) = self.peek_char().and_then(|ch| (ch as char).to_digit(radix)) {
            value = value.saturating_mul(radix).saturating_add(digit);
            self.pos += 1;
        }
        (self.pos > start).then_some(value)
    }

    /// Consume a signed floating point literal such as `-0.5` or `60`
    pub fn float_number(&mut self) -> Option<f64> {
        let start = self.pos;
        if matches!(self.peek_char(), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        while matches!(self.peek_char(), Some(b'0'..=b'9' | b'.')) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).ok()?;
        match text.parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = start;
                None
            }
        }
    }

    /// Resolve a parse failure according to the mode
    ///
    /// Lenient cursors log the problem and continue with `fallback`.
    pub fn recover<T>(&self, fallback: T, error: ParseError) -> Result<T, ParseError> {
        if self.lenient {
            log::debug!("Recovered from malformed definition: {}", error);
            Ok(fallback)
        } else {
            Err(error)
        }
    }

    /// Fail on unconsumed input in strict mode
    pub fn finish(&self) -> Result<(), ParseError> {
        if self.is_eof() {
            return Ok(());
        }
        self.recover((), ParseError::trailing(self.pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers() {
        let mut cursor = Cursor::new("1234abcz", false);
        assert_eq!(cursor.decimal_number(), Some(1234));
        assert_eq!(cursor.hex_number(), Some(0xabc));
        assert_eq!(cursor.hex_number(), None);
        assert_eq!(cursor.peek_char(), Some(b'z'));
    }

    #[test]
    fn test_decimal_saturates() {
        let mut cursor = Cursor::new("99999999999", false);
        assert_eq!(cursor.decimal_number(), Some(u32::MAX));
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_float_number() {
        let mut cursor = Cursor::new("-0.5_", false);
        assert_eq!(cursor.float_number(), Some(-0.5));
        assert_eq!(cursor.peek_char(), Some(b'_'));

        let mut cursor = Cursor::new("-x", false);
        assert_eq!(cursor.float_number(), None);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_match_helpers() {
        let mut cursor = Cursor::new("0XhSTA:", false);
        assert!(cursor.at_hex_prefix(0));
        cursor.set_position(2);
        assert!(cursor.match_char_ignore_case(b'H'));
        assert!(cursor.match_str("STA:"));
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_recover_by_mode() {
        let strict = Cursor::new("x", false);
        assert!(strict.recover(0, ParseError::operand(0, "bad")).is_err());
        assert!(strict.finish().is_err());

        let lenient = Cursor::new("x", true);
        assert_eq!(lenient.recover(7, ParseError::operand(0, "bad")), Ok(7));
        assert!(lenient.finish().is_ok());
    }
}

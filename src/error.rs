//! Error types for the trigger engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Memory bank {0} is already registered")]
    DuplicateBank(usize),

    #[error("Malformed progress data: {0}")]
    Progress(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// The kind of definition parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Operand is neither an address, a delta nor a literal
    InvalidOperand,
    /// Missing or unknown comparison operator
    InvalidComparator,
    /// Hit count suffix is not `.N.` or `(N)`
    InvalidHitCount,
    /// Input left over after a complete definition
    TrailingInput,
    /// Malformed value formula term
    InvalidFormula,
    /// Malformed or incomplete leaderboard definition
    InvalidLeaderboard,
}

impl ParseErrorKind {
    fn label(&self) -> &'static str {
        match self {
            ParseErrorKind::InvalidOperand => "Invalid operand",
            ParseErrorKind::InvalidComparator => "Invalid comparator",
            ParseErrorKind::InvalidHitCount => "Invalid hit count",
            ParseErrorKind::TrailingInput => "Trailing input",
            ParseErrorKind::InvalidFormula => "Invalid formula",
            ParseErrorKind::InvalidLeaderboard => "Invalid leaderboard",
        }
    }
}

/// Error raised by the strict definition parser
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} at position {position}: {message}", .kind.label())]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Byte offset into the parsed text
    pub position: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            message: message.into(),
        }
    }

    pub fn operand(position: usize, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::InvalidOperand, position, message)
    }

    pub fn comparator(position: usize, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::InvalidComparator, position, message)
    }

    pub fn hit_count(position: usize, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::InvalidHitCount, position, message)
    }

    pub fn trailing(position: usize) -> Self {
        Self::new(ParseErrorKind::TrailingInput, position, "unexpected trailing characters")
    }

    pub fn formula(position: usize, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::InvalidFormula, position, message)
    }

    pub fn leaderboard(position: usize, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::InvalidLeaderboard, position, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::comparator(7, "expected one of = != < <= > >=");
        let s = err.to_string();
        assert!(s.contains("Invalid comparator"));
        assert!(s.contains("position 7"));
    }

    #[test]
    fn test_engine_error_from_parse() {
        let err: EngineError = ParseError::trailing(3).into();
        assert!(matches!(err, EngineError::Parse(_)));
        assert!(err.to_string().contains("Trailing input"));
    }

    #[test]
    fn test_duplicate_bank_display() {
        let err = EngineError::DuplicateBank(2);
        assert_eq!(err.to_string(), "Memory bank 2 is already registered");
    }
}

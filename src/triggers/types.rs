//! Shared trigger type definitions

use serde::{Deserialize, Serialize};

/// Comparison operators for conditions and memory search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[default]
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl Comparison {
    pub fn evaluate<T: PartialOrd + PartialEq>(&self, value: T, target: T) -> bool {
        match self {
            Comparison::Equal => value == target,
            Comparison::NotEqual => value != target,
            Comparison::LessThan => value < target,
            Comparison::LessOrEqual => value <= target,
            Comparison::GreaterThan => value > target,
            Comparison::GreaterOrEqual => value >= target,
        }
    }

    /// Canonical definition token. Equality serializes as a single `=`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Equal => "=",
            Comparison::NotEqual => "!=",
            Comparison::LessThan => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::GreaterThan => ">",
            Comparison::GreaterOrEqual => ">=",
        }
    }
}

/// How a condition takes part in group evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionRole {
    #[default]
    Standard,
    /// `P:` suspends the group while true
    PauseIf,
    /// `R:` clears hit counts while true
    ResetIf,
}

impl ConditionRole {
    pub fn prefix(&self) -> &'static str {
        match self {
            ConditionRole::Standard => "",
            ConditionRole::PauseIf => "P:",
            ConditionRole::ResetIf => "R:",
        }
    }
}

/// What an operand's raw value means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperandKind {
    /// A literal
    #[default]
    Value,
    /// Current value at a memory address
    Address,
    /// Value at a memory address as of the previous evaluation
    Delta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_evaluate() {
        assert!(Comparison::Equal.evaluate(5, 5));
        assert!(!Comparison::Equal.evaluate(5, 6));
        assert!(Comparison::NotEqual.evaluate(5, 6));
        assert!(Comparison::LessThan.evaluate(5, 6));
        assert!(Comparison::LessOrEqual.evaluate(6, 6));
        assert!(!Comparison::GreaterThan.evaluate(6, 6));
        assert!(Comparison::GreaterOrEqual.evaluate(7, 6));
    }

    #[test]
    fn test_comparison_tokens() {
        assert_eq!(Comparison::Equal.as_str(), "=");
        assert_eq!(Comparison::LessOrEqual.as_str(), "<=");
        assert_eq!(Comparison::NotEqual.as_str(), "!=");
    }

    #[test]
    fn test_role_prefix() {
        assert_eq!(ConditionRole::Standard.prefix(), "");
        assert_eq!(ConditionRole::ResetIf.prefix(), "R:");
        assert_eq!(ConditionRole::PauseIf.prefix(), "P:");
    }
}

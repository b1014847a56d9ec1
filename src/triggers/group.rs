//! Ordered, AND-combined condition lists

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::types::ConditionRole;
use crate::memory::BankRegistry;

/// Result of evaluating a group for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupOutcome {
    pub satisfied: bool,
    /// Some hit counter changed
    pub dirty: bool,
    /// A ResetIf condition fired
    pub reset_triggered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionGroup {
    conditions: Vec<Condition>,
}

impl ConditionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_conditions(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn conditions_mut(&mut self) -> &mut [Condition] {
        &mut self.conditions
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Condition> {
        self.conditions.get(index)
    }

    pub fn add(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Insert at `index`, appending when out of range
    pub fn insert(&mut self, index: usize, condition: Condition) {
        let index = index.min(self.conditions.len());
        self.conditions.insert(index, condition);
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Condition> {
        (index < self.conditions.len()).then(|| self.conditions.remove(index))
    }

    pub fn clear(&mut self) {
        self.conditions.clear();
    }

    /// Evaluate the group for one frame
    ///
    /// PauseIf conditions are checked first and suspend the whole group.
    /// Standard conditions then count hits and fold into the result (AND, or
    /// OR when `match_any` is set). A firing ResetIf forces the result false.
    /// A group without Standard conditions is never satisfied.
    pub fn test(&mut self, banks: &BankRegistry, match_any: bool) -> GroupOutcome {
        let mut outcome = GroupOutcome::default();

        for condition in self.conditions.iter_mut() {
            if condition.role == ConditionRole::PauseIf && condition.compare(banks) {
                condition.current_hits = 1;
                outcome.dirty = true;
                return outcome;
            }
        }

        let mut any_standard = false;
        let mut satisfied = !match_any;
        for condition in self.conditions.iter_mut() {
            if condition.role != ConditionRole::Standard {
                continue;
            }
            any_standard = true;

            let passed = if condition.required_hits > 0 && condition.is_complete() {
                true
            } else {
                let hit = condition.compare(banks);
                if hit {
                    condition.incr_hits();
                    outcome.dirty = true;
                }
                hit && condition.is_complete()
            };

            if match_any {
                if passed {
                    satisfied = true;
                    break;
                }
            } else {
                satisfied &= passed;
            }
        }
        outcome.satisfied = satisfied && any_standard;

        for condition in self.conditions.iter_mut() {
            if condition.role == ConditionRole::ResetIf && condition.compare(banks) {
                outcome.reset_triggered = true;
                outcome.satisfied = false;
                break;
            }
        }

        outcome
    }

    /// Zero every hit counter, returning whether anything changed
    pub fn reset(&mut self, including_deltas: bool) -> bool {
        let mut dirty = false;
        for condition in self.conditions.iter_mut() {
            dirty |= condition.reset_hits();
            if including_deltas {
                condition.reset_deltas();
            }
        }
        dirty
    }

    pub fn has_hits(&self) -> bool {
        self.conditions.iter().any(|c| c.current_hits > 0)
    }

    /// `_`-joined condition text
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                out.push('_');
            }
            condition.write_to(out);
        }
    }
}

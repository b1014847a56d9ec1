//! Trigger engine
//!
//! Triggers are written in a compact text language. Each condition compares
//! two operands, optionally with a role prefix and a hit requirement:
//!
//! ```text
//! R:0xH00fe=1_0xfe20>=10.3._P:0xM0001=1S0xH0010=5
//! ```
//!
//! Conditions joined by `_` form a group; every `S` starts an alternate
//! group. A trigger fires when its core group or any alternate is satisfied.

mod condition;
mod group;
mod lexer;
mod operand;
mod progress;
mod trigger;
mod trigger_set;
mod types;

pub use condition::Condition;
pub use group::{ConditionGroup, GroupOutcome};
pub use lexer::Cursor;
pub use operand::Operand;
pub use progress::{load_progress, save_progress, trigger_progress, ProgressReport};
pub use trigger::{ChangeKind, ChangeSet, Trigger};
pub use trigger_set::{TriggerCategory, TriggerSet};
pub use types::{Comparison, ConditionRole, OperandKind};

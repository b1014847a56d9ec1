//! Cheevos Engine
//!
//! A frame-synchronous achievement and leaderboard engine for emulated
//! consoles. Goals are described in a compact text language of memory
//! comparisons and re-evaluated once per emulated frame against the memory
//! banks the host registers.
//!
//! The crate provides:
//! - A trigger language with hit counts, PauseIf/ResetIf roles and
//!   alternate groups
//! - Leaderboards with start/cancel/submit conditions and value formulas
//! - A progressive memory search for finding addresses
//! - Session progress persistence guarded by MD5 digests

pub mod config;
pub mod core;
pub mod error;
pub mod game_data;
pub mod leaderboard;
pub mod memory;
pub mod triggers;

// Re-export commonly used types
pub use config::EngineConfig;
pub use crate::core::{EngineContext, EngineEvent, FrameReport};
pub use error::{EngineError, ParseError, ParseErrorKind, Result};
pub use game_data::{LocalDefinitions, PatchData};
pub use leaderboard::{Leaderboard, LeaderboardEvent, LeaderboardManager, ValueFormat, ValueFormula};
pub use memory::{BankRegistry, CallbackBank, MemSize, MemoryBank, MemorySearchEngine, SearchSize, SharedMemory};
pub use triggers::{Comparison, Condition, ConditionGroup, Operand, Trigger, TriggerCategory, TriggerSet};

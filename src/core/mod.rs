//! Host-facing engine core
//!
//! - `EngineContext` - owns banks, trigger sets, leaderboards and search state
//! - `EngineEvent` - events reported after each frame

mod context;
mod events;

pub use context::{EngineContext, FrameReport};
pub use events::{EngineEvent, EventCallback, EventHandler};

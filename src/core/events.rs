//! Events emitted by the engine

use crate::leaderboard::LeaderboardEvent;
use crate::triggers::{ChangeSet, Trigger};

/// Event reported to observers after a frame
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A trigger's conditions were met; it has been deactivated
    TriggerUnlocked {
        id: u32,
        title: String,
        points: u32,
        /// The trigger asks the host to pause emulation
        pause_requested: bool,
    },
    /// A ResetIf cleared recorded progress on a trigger flagged for it
    TriggerReset { id: u32, title: String },
    /// A trigger's model changed and any view of it should refresh
    TriggerChanged { id: u32, changes: ChangeSet },
    Leaderboard(LeaderboardEvent),
}

impl EngineEvent {
    pub fn unlocked(trigger: &Trigger) -> Self {
        Self::TriggerUnlocked {
            id: trigger.id(),
            title: trigger.title.clone(),
            points: trigger.points,
            pause_requested: trigger.pause_on_trigger,
        }
    }

    pub fn reset(trigger: &Trigger) -> Self {
        Self::TriggerReset {
            id: trigger.id(),
            title: trigger.title.clone(),
        }
    }
}

impl From<LeaderboardEvent> for EngineEvent {
    fn from(event: LeaderboardEvent) -> Self {
        Self::Leaderboard(event)
    }
}

/// Callback type for engine events
pub type EventCallback = Box<dyn Fn(&EngineEvent) + Send>;

/// Event handler that can have multiple listeners
pub struct EventHandler {
    callbacks: Vec<EventCallback>,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Add a listener
    pub fn on_event(&mut self, callback: EventCallback) {
        self.callbacks.push(callback);
    }

    /// Deliver an event to all listeners
    pub fn emit(&self, event: &EngineEvent) {
        for callback in &self.callbacks {
            callback(event);
        }
    }

    pub fn has_listeners(&self) -> bool {
        !self.callbacks.is_empty()
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandler")
            .field("listeners", &self.callbacks.len())
            .finish()
    }
}

//! Collections of triggers swept once per frame

use serde::{Deserialize, Serialize};

use super::trigger::{ChangeSet, Trigger};
use crate::core::EngineEvent;
use crate::memory::BankRegistry;

/// Where a set of triggers came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCategory {
    #[default]
    Core,
    Unofficial,
    Local,
}

impl TriggerCategory {
    /// Category for a patch record's `Flags` value
    pub fn from_flags(flags: u32) -> Option<Self> {
        match flags {
            3 => Some(TriggerCategory::Core),
            5 => Some(TriggerCategory::Unofficial),
            _ => None,
        }
    }

    pub fn flags(&self) -> Option<u32> {
        match self {
            TriggerCategory::Core => Some(3),
            TriggerCategory::Unofficial => Some(5),
            TriggerCategory::Local => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TriggerSet {
    category: TriggerCategory,
    triggers: Vec<Trigger>,
    processing_active: bool,
}

impl TriggerSet {
    pub fn new(category: TriggerCategory) -> Self {
        Self {
            category,
            triggers: Vec::new(),
            processing_active: true,
        }
    }

    pub fn category(&self) -> TriggerCategory {
        self.category
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn triggers_mut(&mut self) -> &mut [Trigger] {
        &mut self.triggers
    }

    pub fn add(&mut self, trigger: Trigger) {
        self.triggers.push(trigger);
    }

    pub fn find(&self, id: u32) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.id() == id)
    }

    pub fn find_mut(&mut self, id: u32) -> Option<&mut Trigger> {
        self.triggers.iter_mut().find(|t| t.id() == id)
    }

    pub fn remove(&mut self, id: u32) -> Option<Trigger> {
        let index = self.triggers.iter().position(|t| t.id() == id)?;
        Some(self.triggers.remove(index))
    }

    pub fn clear(&mut self) {
        self.triggers.clear();
    }

    /// Number of triggers still waiting to fire
    pub fn num_active(&self) -> usize {
        self.triggers.iter().filter(|t| t.is_active()).count()
    }

    pub fn is_processing_active(&self) -> bool {
        self.processing_active
    }

    /// Pause or resume the per-frame sweep
    pub fn set_processing_active(&mut self, active: bool) {
        self.processing_active = active;
    }

    /// Zero hit counters and deltas on every trigger and resume processing
    pub fn reset(&mut self) {
        for trigger in self.triggers.iter_mut() {
            trigger.reset_all();
        }
        self.processing_active = true;
    }

    /// Activate every trigger the player has not unlocked yet
    pub fn activate_locked(&mut self, unlocked_ids: &[u32]) -> usize {
        let mut activated = 0;
        for trigger in self.triggers.iter_mut() {
            let locked = !unlocked_ids.contains(&trigger.id());
            trigger.set_active(locked);
            if locked {
                activated += 1;
            }
        }
        log::debug!(
            "{:?} set: {} of {} triggers still locked",
            self.category,
            activated,
            self.triggers.len()
        );
        activated
    }

    /// Evaluate every active trigger for one frame
    ///
    /// Triggers that fire are deactivated and reported as unlocked.
    pub fn test_all(&mut self, banks: &BankRegistry) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if !self.processing_active {
            return events;
        }

        for trigger in self.triggers.iter_mut().filter(|t| t.is_active()) {
            if trigger.test(banks) {
                trigger.set_active(false);
                log::info!("Trigger {} unlocked: {}", trigger.id(), trigger.title);
                events.push(EngineEvent::unlocked(trigger));
            } else if trigger.lost_progress() && trigger.pause_on_reset {
                log::info!("Trigger {} reset: {}", trigger.id(), trigger.title);
                events.push(EngineEvent::reset(trigger));
            }
        }
        events
    }

    /// Drain pending change sets, keyed by trigger id
    pub fn take_changes(&mut self) -> Vec<(u32, ChangeSet)> {
        self.triggers
            .iter_mut()
            .filter_map(|t| {
                let changes = t.take_changes();
                (!changes.is_empty()).then(|| (t.id(), changes))
            })
            .collect()
    }
}

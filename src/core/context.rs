//! Engine context owning all per-session state
//!
//! The host registers memory banks, loads definitions and then calls
//! [`EngineContext::advance_frame`] once per emulated frame.

use super::events::{EngineEvent, EventCallback, EventHandler};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::game_data::{LocalDefinitions, PatchData};
use crate::leaderboard::LeaderboardManager;
use crate::memory::{BankRegistry, CallbackBank, MemoryBank, MemorySearchEngine, SearchOutcome, SearchSize};
use crate::triggers::{self, Comparison, ProgressReport, Trigger, TriggerCategory, TriggerSet};

/// Everything that happened during one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub events: Vec<EngineEvent>,
}

impl FrameReport {
    /// Ids of the triggers unlocked this frame
    pub fn unlocked(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|event| match event {
                EngineEvent::TriggerUnlocked { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct EngineContext {
    config: EngineConfig,
    banks: BankRegistry,
    core: TriggerSet,
    unofficial: TriggerSet,
    local: TriggerSet,
    active_category: TriggerCategory,
    leaderboards: LeaderboardManager,
    search: MemorySearchEngine,
    events: EventHandler,
    frame: u64,
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            banks: BankRegistry::new(),
            core: TriggerSet::new(TriggerCategory::Core),
            unofficial: TriggerSet::new(TriggerCategory::Unofficial),
            local: TriggerSet::new(TriggerCategory::Local),
            active_category: TriggerCategory::Core,
            leaderboards: LeaderboardManager::new(),
            search: MemorySearchEngine::new(),
            events: EventHandler::new(),
            frame: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    // Memory banks

    /// Register a bank; the search is dropped since addresses move
    pub fn register_bank(&mut self, id: usize, bank: impl MemoryBank + 'static) -> Result<()> {
        self.banks.register(id, Box::new(bank))?;
        self.search.clear();
        Ok(())
    }

    /// Register a bank backed by host read and write callbacks
    pub fn register_bank_fns<R, W>(&mut self, id: usize, read_fn: R, write_fn: W, size: usize) -> Result<()>
    where
        R: Fn(usize) -> u8 + Send + 'static,
        W: FnMut(usize, u8) + Send + 'static,
    {
        self.register_bank(id, CallbackBank::new(size, read_fn).with_writer(write_fn))
    }

    pub fn clear_banks(&mut self) {
        self.banks.clear();
        self.search.clear();
    }

    pub fn banks(&self) -> &BankRegistry {
        &self.banks
    }

    pub fn banks_mut(&mut self) -> &mut BankRegistry {
        &mut self.banks
    }

    // Trigger sets

    pub fn set(&self, category: TriggerCategory) -> &TriggerSet {
        match category {
            TriggerCategory::Core => &self.core,
            TriggerCategory::Unofficial => &self.unofficial,
            TriggerCategory::Local => &self.local,
        }
    }

    pub fn set_mut(&mut self, category: TriggerCategory) -> &mut TriggerSet {
        match category {
            TriggerCategory::Core => &mut self.core,
            TriggerCategory::Unofficial => &mut self.unofficial,
            TriggerCategory::Local => &mut self.local,
        }
    }

    pub fn active_category(&self) -> TriggerCategory {
        self.active_category
    }

    /// Choose which set is swept on each frame
    pub fn set_active_category(&mut self, category: TriggerCategory) {
        if self.active_category != category {
            log::debug!("Active trigger set: {:?} -> {:?}", self.active_category, category);
            self.active_category = category;
        }
    }

    pub fn active_set(&self) -> &TriggerSet {
        self.set(self.active_category)
    }

    pub fn active_set_mut(&mut self) -> &mut TriggerSet {
        self.set_mut(self.active_category)
    }

    pub fn leaderboards(&self) -> &LeaderboardManager {
        &self.leaderboards
    }

    pub fn leaderboards_mut(&mut self) -> &mut LeaderboardManager {
        &mut self.leaderboards
    }

    // Memory search

    /// Start a new search. `None` uses the configured size.
    pub fn reset_search(&mut self, size: Option<SearchSize>) {
        let size = size.unwrap_or(self.config.search_size);
        self.search.reset(&self.banks, size);
    }

    pub fn filter_search(&mut self, op: Comparison, query_value: u32, use_last_known: bool) -> SearchOutcome {
        self.search.compare(&self.banks, op, query_value, use_last_known)
    }

    pub fn search(&self) -> &MemorySearchEngine {
        &self.search
    }

    // Frames and events

    /// Add an event listener
    pub fn on_event(&mut self, callback: EventCallback) {
        self.events.on_event(callback);
    }

    /// Evaluate one frame
    ///
    /// Sweeps the active trigger set, then the leaderboards. Every event is
    /// delivered to the listeners and returned in the report.
    pub fn advance_frame(&mut self) -> FrameReport {
        self.frame += 1;

        let set = match self.active_category {
            TriggerCategory::Core => &mut self.core,
            TriggerCategory::Unofficial => &mut self.unofficial,
            TriggerCategory::Local => &mut self.local,
        };
        let mut events = set.test_all(&self.banks);
        events.extend(
            set.take_changes()
                .into_iter()
                .map(|(id, changes)| EngineEvent::TriggerChanged { id, changes }),
        );

        if self.config.leaderboards_active {
            events.extend(
                self.leaderboards
                    .test_all(&self.banks)
                    .into_iter()
                    .map(EngineEvent::from),
            );
        }

        for event in &events {
            self.events.emit(event);
        }
        log::trace!("Frame {}: {} events", self.frame, events.len());

        FrameReport {
            frame: self.frame,
            events,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Drop every trigger, leaderboard and search candidate
    ///
    /// Banks and listeners are kept.
    pub fn reset_session(&mut self) {
        self.core.clear();
        self.unofficial.clear();
        self.local.clear();
        for set in [&mut self.core, &mut self.unofficial, &mut self.local] {
            set.set_processing_active(true);
        }
        self.leaderboards.clear();
        self.search = MemorySearchEngine::new();
        self.frame = 0;
        log::info!("Session reset");
    }

    // Definitions

    /// Load a patch document into the core and unofficial sets and the
    /// leaderboards, replacing what was there
    ///
    /// Core achievements start active, unofficial ones inactive.
    pub fn load_patch(&mut self, json: &str) -> Result<()> {
        let patch = PatchData::from_json(json)?;
        let lenient = self.config.lenient_parsing;

        let mut core = TriggerSet::new(TriggerCategory::Core);
        let mut unofficial = TriggerSet::new(TriggerCategory::Unofficial);
        for definition in &patch.achievements {
            let Some(category) = TriggerCategory::from_flags(definition.flags) else {
                log::debug!(
                    "Skipping achievement {} with flags {}",
                    definition.id,
                    definition.flags
                );
                continue;
            };
            let mut trigger = definition.to_trigger(lenient)?;
            trigger.set_active(category == TriggerCategory::Core);
            match category {
                TriggerCategory::Unofficial => unofficial.add(self.prepare(trigger)),
                _ => core.add(self.prepare(trigger)),
            }
        }

        let mut leaderboards = LeaderboardManager::new();
        for definition in &patch.leaderboards {
            leaderboards.add(definition.to_leaderboard(lenient)?);
        }

        log::info!(
            "Loaded patch for {} ({}): {} core, {} unofficial, {} leaderboards",
            patch.title,
            patch.id,
            core.len(),
            unofficial.len(),
            leaderboards.len()
        );
        self.core = core;
        self.unofficial = unofficial;
        self.leaderboards = leaderboards;
        Ok(())
    }

    /// Load user-authored definitions into the local set, replacing it
    pub fn load_local_definitions(&mut self, text: &str) -> Result<LocalDefinitions> {
        let mut definitions = LocalDefinitions::parse(text, self.config.lenient_parsing)?;
        let mut local = TriggerSet::new(TriggerCategory::Local);
        for trigger in definitions.triggers.drain(..) {
            local.add(self.prepare(trigger));
        }
        log::info!(
            "Loaded {} local definitions for {}",
            local.len(),
            definitions.game_title
        );
        definitions.triggers = local.triggers().to_vec();
        self.local = local;
        Ok(definitions)
    }

    /// Render the local set in the local definition file layout
    pub fn local_definitions(&self, version: &str, game_title: &str) -> String {
        LocalDefinitions {
            version: version.to_string(),
            game_title: game_title.to_string(),
            triggers: self.local.triggers().to_vec(),
        }
        .write()
    }

    fn prepare(&self, mut trigger: Trigger) -> Trigger {
        trigger.pause_on_reset = self.config.pause_on_reset;
        trigger.take_changes();
        trigger
    }

    /// Activate every trigger in the active set that is not listed as
    /// already unlocked
    pub fn activate_locked(&mut self, unlocked_ids: &[u32]) -> usize {
        self.active_set_mut().activate_locked(unlocked_ids)
    }

    // Progress

    /// Session progress for the active set
    pub fn save_progress(&self) -> String {
        triggers::save_progress(self.active_set(), &self.config.username)
    }

    pub fn load_progress(&mut self, text: &str) -> Result<ProgressReport> {
        let username = self.config.username.clone();
        let set = self.active_set_mut();
        triggers::load_progress(set, &username, text)
    }
}

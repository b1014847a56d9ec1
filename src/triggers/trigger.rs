//! Triggers: a core condition group plus OR-combined alternates

use serde::{Deserialize, Serialize};

use super::group::ConditionGroup;
use super::lexer::Cursor;
use super::condition::Condition;
use crate::error::ParseError;
use crate::memory::BankRegistry;

/// Kinds of change a presentation layer may need to refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Title,
    Description,
    Points,
    Author,
    Id,
    Badge,
    Conditions,
    Votes,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 8] = [
        ChangeKind::Title,
        ChangeKind::Description,
        ChangeKind::Points,
        ChangeKind::Author,
        ChangeKind::Id,
        ChangeKind::Badge,
        ChangeKind::Conditions,
        ChangeKind::Votes,
    ];

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// A typed set of [`ChangeKind`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeSet(u16);

impl ChangeSet {
    pub fn all() -> Self {
        ChangeKind::ALL.iter().fold(Self::default(), |set, kind| set.with(*kind))
    }

    pub fn with(mut self, kind: ChangeKind) -> Self {
        self.insert(kind);
        self
    }

    pub fn insert(&mut self, kind: ChangeKind) {
        self.0 |= kind.bit();
    }

    pub fn contains(&self, kind: ChangeKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = ChangeKind> + '_ {
        ChangeKind::ALL.into_iter().filter(|kind| self.contains(*kind))
    }
}

/// An achievement's condition logic and editor metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    id: u32,
    groups: Vec<ConditionGroup>,
    active: bool,
    changes: ChangeSet,
    /// Set when the last evaluation was reset while holding hits
    progress_lost: bool,

    pub title: String,
    pub description: String,
    pub author: String,
    pub points: u32,
    badge: String,
    /// Unix timestamps
    pub created: i64,
    pub modified: i64,
    /// Edited locally since it was loaded
    pub is_modified: bool,
    pub upvotes: u32,
    pub downvotes: u32,
    /// Ask the host to pause emulation when this trigger fires
    pub pause_on_trigger: bool,
    /// Ask the host to pause emulation when a ResetIf clears progress
    pub pause_on_reset: bool,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            id: 0,
            groups: vec![ConditionGroup::new()],
            active: true,
            changes: ChangeSet::default(),
            progress_lost: false,
            title: String::new(),
            description: String::new(),
            author: String::new(),
            points: 0,
            badge: String::new(),
            created: 0,
            modified: 0,
            is_modified: false,
            upvotes: 0,
            downvotes: 0,
            pause_on_trigger: false,
            pause_on_reset: false,
        }
    }
}

impl Trigger {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Parse a complete condition definition such as `0xH0001=1_R:0xH0002=0S0xH0003=1`
    pub fn parse(definition: &str, lenient: bool) -> Result<Self, ParseError> {
        let mut cursor = Cursor::new(definition, lenient);
        let groups = Self::parse_groups(&mut cursor)?;
        cursor.finish()?;
        Ok(Self {
            groups,
            ..Self::default()
        })
    }

    /// Parse condition groups, stopping at the first character that cannot
    /// continue the definition (such as the `:` of a definition line)
    pub fn parse_groups(cursor: &mut Cursor<'_>) -> Result<Vec<ConditionGroup>, ParseError> {
        let mut groups = vec![ConditionGroup::new()];
        loop {
            if cursor.match_char(b'S') {
                groups.push(ConditionGroup::new());
                continue;
            }
            if cursor.is_eof() || cursor.peek_char() == Some(b':') {
                break;
            }
            let condition = Condition::parse(cursor)?;
            if let Some(group) = groups.last_mut() {
                group.add(condition);
            }
            if cursor.match_char(b'_') || cursor.peek_char() == Some(b'S') {
                continue;
            }
            break;
        }
        Ok(groups)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn set_id(&mut self, id: u32) {
        if self.id != id {
            self.id = id;
            self.changes.insert(ChangeKind::Id);
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.changes.insert(ChangeKind::Title);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.changes.insert(ChangeKind::Description);
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
        self.changes.insert(ChangeKind::Author);
    }

    pub fn set_points(&mut self, points: u32) {
        self.points = points;
        self.changes.insert(ChangeKind::Points);
    }

    pub fn set_votes(&mut self, upvotes: u32, downvotes: u32) {
        self.upvotes = upvotes;
        self.downvotes = downvotes;
        self.changes.insert(ChangeKind::Votes);
    }

    pub fn badge(&self) -> &str {
        &self.badge
    }

    /// Set the badge image name. A `_lock` suffix is stripped.
    pub fn set_badge(&mut self, badge: &str) {
        self.badge = badge.strip_suffix("_lock").unwrap_or(badge).to_string();
        self.changes.insert(ChangeKind::Badge);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn groups(&self) -> &[ConditionGroup] {
        &self.groups
    }

    /// Mutable access for editors; conditions are marked changed
    pub fn groups_mut(&mut self) -> &mut [ConditionGroup] {
        self.changes.insert(ChangeKind::Conditions);
        &mut self.groups
    }

    /// Append an empty alternate group and return it
    pub fn add_alternate(&mut self) -> &mut ConditionGroup {
        self.changes.insert(ChangeKind::Conditions);
        self.groups.push(ConditionGroup::new());
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    /// Remove an alternate group by its index among the alternates
    pub fn remove_alternate(&mut self, index: usize) -> Option<ConditionGroup> {
        let index = index.checked_add(1)?;
        if index >= self.groups.len() {
            return None;
        }
        self.changes.insert(ChangeKind::Conditions);
        Some(self.groups.remove(index))
    }

    /// Replace the condition logic
    pub fn set_groups(&mut self, groups: Vec<ConditionGroup>) {
        self.groups = if groups.is_empty() {
            vec![ConditionGroup::new()]
        } else {
            groups
        };
        self.changes.insert(ChangeKind::Conditions);
    }

    pub fn core(&self) -> &ConditionGroup {
        &self.groups[0]
    }

    pub fn alternates(&self) -> &[ConditionGroup] {
        &self.groups[1..]
    }

    pub fn num_conditions(&self) -> usize {
        self.groups.iter().map(ConditionGroup::len).sum()
    }

    /// Evaluate every group for one frame
    pub fn test(&mut self, banks: &BankRegistry) -> bool {
        self.test_with(banks, false)
    }

    /// Evaluate with an explicit fold; `match_any` ORs the conditions within
    /// each group
    ///
    /// Inactive triggers are not evaluated. Groups are OR-combined and every
    /// group runs each frame. A firing ResetIf fails only its own group, but
    /// clears the hit counts of every group.
    pub fn test_with(&mut self, banks: &BankRegistry, match_any: bool) -> bool {
        self.progress_lost = false;
        if !self.active {
            return false;
        }

        let had_hits = self.has_hits();
        let mut satisfied = false;
        let mut dirty = false;
        let mut reset = false;
        for group in self.groups.iter_mut() {
            let outcome = group.test(banks, match_any);
            satisfied |= outcome.satisfied;
            dirty |= outcome.dirty;
            reset |= outcome.reset_triggered;
        }

        if reset {
            dirty |= self.reset();
            self.progress_lost = had_hits;
        }
        if dirty {
            self.changes.insert(ChangeKind::Conditions);
        }
        satisfied
    }

    /// Zero every hit counter in every group, keeping delta state
    pub fn reset(&mut self) -> bool {
        let mut dirty = false;
        for group in self.groups.iter_mut() {
            dirty |= group.reset(false);
        }
        if dirty {
            self.changes.insert(ChangeKind::Conditions);
        }
        dirty
    }

    /// Zero hit counters and delta state, as for a fresh session
    pub fn reset_all(&mut self) {
        for group in self.groups.iter_mut() {
            group.reset(true);
        }
        self.changes.insert(ChangeKind::Conditions);
    }

    pub fn has_hits(&self) -> bool {
        self.groups.iter().any(ConditionGroup::has_hits)
    }

    /// Whether the last evaluation cleared recorded hits
    pub fn lost_progress(&self) -> bool {
        self.progress_lost
    }

    pub fn changes(&self) -> ChangeSet {
        self.changes
    }

    pub fn mark_changed(&mut self, kind: ChangeKind) {
        self.changes.insert(kind);
    }

    /// Drain the pending change set
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }

    /// Canonical definition text; empty alternate groups are omitted
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                if group.is_empty() {
                    continue;
                }
                out.push('S');
            }
            group.write_to(&mut out);
        }
        out
    }
}

//! Session progress persistence
//!
//! Each active trigger is saved as one colon-delimited record:
//!
//! ```text
//! <id>:<count>:(<hits>:<srcRaw>:<srcLast>:<tgtRaw>:<tgtLast>:){count}   repeated per group
//! <progressMd5>:<definitionMd5>:
//! ```
//!
//! The progress digest covers `<username><body><username><id>` and the
//! definition digest covers the canonical trigger text. A record is only
//! restored when both digests match and the condition layout is unchanged.

use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::Split;

use md5::{Digest, Md5};

use super::trigger::Trigger;
use super::trigger_set::TriggerSet;
use crate::error::{EngineError, Result};

/// Outcome of loading a progress file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressReport {
    /// Trigger ids whose hit counts were restored
    pub restored: Vec<u32>,
    /// Trigger ids whose records were rejected
    pub discarded: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConditionState {
    hits: u32,
    source_raw: u32,
    source_last: u32,
    target_raw: u32,
    target_last: u32,
}

#[derive(Debug)]
struct ProgressRecord {
    id: u32,
    groups: Vec<Vec<ConditionState>>,
    progress_digest: String,
    definition_digest: String,
}

impl ProgressRecord {
    fn body(&self) -> String {
        let mut body = String::new();
        for group in &self.groups {
            let _ = write!(body, "{}:{}:", self.id, group.len());
            for c in group {
                let _ = write!(
                    body,
                    "{}:{}:{}:{}:{}:",
                    c.hits, c.source_raw, c.source_last, c.target_raw, c.target_last
                );
            }
        }
        body
    }

    fn matches_shape(&self, trigger: &Trigger) -> bool {
        self.groups.len() == trigger.groups().len()
            && self
                .groups
                .iter()
                .zip(trigger.groups())
                .all(|(saved, group)| saved.len() == group.len())
    }
}

fn md5_hex(text: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

fn progress_digest(username: &str, body: &str, id: u32) -> String {
    md5_hex(&format!("{username}{body}{username}{id}"))
}

/// Serialized progress for one trigger's current hit and delta state
pub fn trigger_progress(trigger: &Trigger, username: &str) -> String {
    let record = ProgressRecord {
        id: trigger.id(),
        groups: trigger
            .groups()
            .iter()
            .map(|group| {
                group
                    .conditions()
                    .iter()
                    .map(|c| ConditionState {
                        hits: c.current_hits,
                        source_raw: c.source.raw,
                        source_last: c.source.last,
                        target_raw: c.target.raw,
                        target_last: c.target.last,
                    })
                    .collect()
            })
            .collect(),
        progress_digest: String::new(),
        definition_digest: String::new(),
    };

    let mut out = record.body();
    let progress = progress_digest(username, &out, record.id);
    let definition = md5_hex(&trigger.serialize());
    let _ = write!(out, "{progress}:{definition}:");
    out
}

/// Serialize progress for every active trigger in the set
pub fn save_progress(set: &TriggerSet, username: &str) -> String {
    set.triggers()
        .iter()
        .filter(|t| t.is_active())
        .map(|t| trigger_progress(t, username))
        .collect()
}

/// Restore progress into the active triggers of a set
///
/// Records with no matching active trigger are skipped. A bad digest or a
/// changed layout zeroes the trigger's hits and deltas. Structurally unreadable text is rejected without
/// restoring anything.
pub fn load_progress(set: &mut TriggerSet, username: &str, text: &str) -> Result<ProgressReport> {
    let records = parse_records(text)?;
    let mut report = ProgressReport::default();

    for record in records {
        let Some(trigger) = set.find_mut(record.id).filter(|t| t.is_active()) else {
            log::debug!("No active trigger {} for saved progress", record.id);
            report.discarded.push(record.id);
            continue;
        };

        let expected_progress = progress_digest(username, &record.body(), record.id);
        let expected_definition = md5_hex(&trigger.serialize());
        if !record.progress_digest.eq_ignore_ascii_case(&expected_progress)
            || !record.definition_digest.eq_ignore_ascii_case(&expected_definition)
        {
            log::warn!("Discarding progress for trigger {}: checksum mismatch", record.id);
            trigger.reset_all();
            report.discarded.push(record.id);
            continue;
        }
        if !record.matches_shape(trigger) {
            log::warn!("Discarding progress for trigger {}: layout changed", record.id);
            trigger.reset_all();
            report.discarded.push(record.id);
            continue;
        }

        for (group, saved) in trigger.groups_mut().iter_mut().zip(&record.groups) {
            for (condition, state) in group.conditions_mut().iter_mut().zip(saved) {
                condition.current_hits = state.hits;
                condition.source.set_values(state.source_raw, state.source_last);
                condition.target.set_values(state.target_raw, state.target_last);
            }
        }
        report.restored.push(record.id);
    }

    log::info!(
        "Loaded progress: {} restored, {} discarded",
        report.restored.len(),
        report.discarded.len()
    );
    Ok(report)
}

type Tokens<'a> = Peekable<Split<'a, char>>;

fn parse_records(text: &str) -> Result<Vec<ProgressRecord>> {
    let mut tokens = text.split(':').peekable();
    let mut records = Vec::new();

    while let Some(token) = tokens.next() {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let id = token
            .parse::<u32>()
            .map_err(|_| EngineError::Progress(format!("expected a trigger id, found {token:?}")))?;
        let record = parse_record(&mut tokens, id).ok_or_else(|| {
            EngineError::Progress(format!("truncated or malformed record for trigger {id}"))
        })?;
        records.push(record);
    }
    Ok(records)
}

fn next_u32(tokens: &mut Tokens<'_>) -> Option<u32> {
    tokens.next()?.trim().parse().ok()
}

fn is_digest(token: &str) -> bool {
    let token = token.trim();
    token.len() == 32 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

fn parse_record(tokens: &mut Tokens<'_>, id: u32) -> Option<ProgressRecord> {
    let mut groups = Vec::new();
    loop {
        let count = next_u32(tokens)?;
        let mut conditions = Vec::new();
        for _ in 0..count {
            conditions.push(ConditionState {
                hits: next_u32(tokens)?,
                source_raw: next_u32(tokens)?,
                source_last: next_u32(tokens)?,
                target_raw: next_u32(tokens)?,
                target_last: next_u32(tokens)?,
            });
        }
        groups.push(conditions);

        if is_digest(tokens.peek()?) {
            break;
        }
        if next_u32(tokens)? != id {
            return None;
        }
    }

    let progress_digest = tokens.next()?.trim().to_string();
    let definition_digest = tokens.next()?.trim().to_string();
    is_digest(&definition_digest).then_some(ProgressRecord {
        id,
        groups,
        progress_digest,
        definition_digest,
    })
}

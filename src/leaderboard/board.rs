//! A single leaderboard and its start/cancel/submit lifecycle

use super::format::ValueFormat;
use super::formula::ValueFormula;
use crate::error::ParseError;
use crate::memory::BankRegistry;
use crate::triggers::Trigger;

/// What happened to a leaderboard attempt this frame
#[derive(Debug, Clone, PartialEq)]
pub enum LeaderboardEvent {
    Started { id: u32, title: String },
    Cancelled { id: u32, title: String },
    Submitted {
        id: u32,
        title: String,
        value: u32,
        /// `value` rendered with the leaderboard's format
        formatted: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    id: u32,
    pub title: String,
    pub description: String,
    start: Trigger,
    cancel: Trigger,
    submit: Trigger,
    value: ValueFormula,
    progress: Option<ValueFormula>,
    pub format: ValueFormat,
    started: bool,
}

impl Leaderboard {
    /// Parse `STA:...::CAN:...::SUB:...::VAL:...` definitions
    ///
    /// `PRO:`, `FOR:`, `TTL:` and `DES:` segments are optional. A strict
    /// parse requires all four mandatory segments and rejects unknown ones.
    pub fn parse(id: u32, definition: &str, lenient: bool) -> Result<Self, ParseError> {
        let mut start = None;
        let mut cancel = None;
        let mut submit = None;
        let mut value = None;
        let mut progress = None;
        let mut format = ValueFormat::default();
        let mut title = String::new();
        let mut description = String::new();

        let mut offset = 0;
        for segment in definition.split("::") {
            let at = offset;
            offset += segment.len() + 2;
            if segment.is_empty() {
                continue;
            }

            let tag = segment.get(..4).unwrap_or(segment);
            let body = &segment[tag.len()..];
            let located = |err: ParseError| ParseError {
                position: err.position + at + tag.len(),
                ..err
            };
            match tag {
                "STA:" => start = Some(Trigger::parse(body, lenient).map_err(located)?),
                "CAN:" => cancel = Some(Trigger::parse(body, lenient).map_err(located)?),
                "SUB:" => submit = Some(Trigger::parse(body, lenient).map_err(located)?),
                "VAL:" => value = Some(ValueFormula::parse(body, lenient).map_err(located)?),
                "PRO:" => progress = Some(ValueFormula::parse(body, lenient).map_err(located)?),
                "FOR:" => format = ValueFormat::from_token(body),
                "TTL:" => title = body.to_string(),
                "DES:" => description = body.to_string(),
                _ if lenient => log::debug!("Ignoring leaderboard segment {:?}", segment),
                _ => {
                    return Err(ParseError::leaderboard(
                        at,
                        format!("unknown segment {:?}", tag),
                    ))
                }
            }
        }

        if !lenient {
            let missing = [
                ("STA", start.is_none()),
                ("CAN", cancel.is_none()),
                ("SUB", submit.is_none()),
                ("VAL", value.is_none()),
            ]
            .into_iter()
            .find(|(_, missing)| *missing);
            if let Some((tag, _)) = missing {
                return Err(ParseError::leaderboard(
                    definition.len(),
                    format!("missing {} segment", tag),
                ));
            }
        }

        Ok(Self {
            id,
            title,
            description,
            start: start.unwrap_or_default(),
            cancel: cancel.unwrap_or_default(),
            submit: submit.unwrap_or_default(),
            value: value.unwrap_or_default(),
            progress,
            format,
            started: false,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn start_trigger(&self) -> &Trigger {
        &self.start
    }

    pub fn cancel_trigger(&self) -> &Trigger {
        &self.cancel
    }

    pub fn submit_trigger(&self) -> &Trigger {
        &self.submit
    }

    pub fn value_formula(&self) -> &ValueFormula {
        &self.value
    }

    pub fn progress_formula(&self) -> Option<&ValueFormula> {
        self.progress.as_ref()
    }

    pub fn current_value(&self, banks: &BankRegistry) -> u32 {
        self.value.resolve_u32(banks)
    }

    /// Value to show while an attempt is running
    pub fn current_progress(&self, banks: &BankRegistry) -> u32 {
        self.progress
            .as_ref()
            .unwrap_or(&self.value)
            .resolve_u32(banks)
    }

    /// Evaluate all three condition sets for one frame
    ///
    /// Start and submit fire when all of their conditions are true, cancel
    /// when any of them is.
    pub fn test(&mut self, banks: &BankRegistry) -> Option<LeaderboardEvent> {
        let start = self.start.test_with(banks, false);
        let cancel = self.cancel.test_with(banks, true);
        let submit = self.submit.test_with(banks, false);

        if !self.started {
            if start {
                self.started = true;
                log::info!("Leaderboard {} started: {}", self.id, self.title);
                return Some(LeaderboardEvent::Started {
                    id: self.id,
                    title: self.title.clone(),
                });
            }
            return None;
        }

        if cancel {
            self.started = false;
            log::info!("Leaderboard {} cancelled: {}", self.id, self.title);
            return Some(LeaderboardEvent::Cancelled {
                id: self.id,
                title: self.title.clone(),
            });
        }

        if submit {
            self.started = false;
            let value = self.current_value(banks);
            let formatted = self.format.format_value(value);
            log::info!("Leaderboard {} submitted {}: {}", self.id, formatted, self.title);
            return Some(LeaderboardEvent::Submitted {
                id: self.id,
                title: self.title.clone(),
                value,
                formatted,
            });
        }

        None
    }

    /// Abandon any running attempt and clear hit counters
    pub fn reset(&mut self) {
        self.started = false;
        self.start.reset_all();
        self.cancel.reset_all();
        self.submit.reset_all();
    }

    /// Canonical definition text
    pub fn serialize(&self) -> String {
        let mut out = format!(
            "STA:{}::CAN:{}::SUB:{}::VAL:{}",
            self.start.serialize(),
            self.cancel.serialize(),
            self.submit.serialize(),
            self.value.serialize()
        );
        if let Some(progress) = &self.progress {
            out.push_str("::PRO:");
            out.push_str(&progress.serialize());
        }
        if self.format != ValueFormat::Other {
            out.push_str("::FOR:");
            out.push_str(self.format.as_token());
        }
        if !self.title.is_empty() {
            out.push_str("::TTL:");
            out.push_str(&self.title);
        }
        if !self.description.is_empty() {
            out.push_str("::DES:");
            out.push_str(&self.description);
        }
        out
    }
}

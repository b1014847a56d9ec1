//! Game definition documents
//!
//! Published achievements and leaderboards arrive as a JSON patch document.
//! User-authored achievements are kept in a line-based local file:
//!
//! ```text
//! <version>
//! <game title>
//! id:memaddr:title:description::::author:points:created:modified:::badge
//! ```

use std::fmt::Write as _;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ParseError, Result};
use crate::leaderboard::{Leaderboard, ValueFormat};
use crate::triggers::{Cursor, Trigger, TriggerCategory};

/// Root patch document for one game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PatchData {
    #[serde(rename = "ID", deserialize_with = "lenient_u32")]
    pub id: u32,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    pub achievements: Vec<AchievementDefinition>,
    pub leaderboards: Vec<LeaderboardDefinition>,
}

impl PatchData {
    /// Parse a patch document, accepting either the bare document or a
    /// server response wrapping it in `PatchData`
    pub fn from_json(json: &str) -> Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(inner) = value.get_mut("PatchData") {
            return Ok(serde_json::from_value(inner.take())?);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Achievement records belonging to a category
    pub fn achievements_in(
        &self,
        category: TriggerCategory,
    ) -> impl Iterator<Item = &AchievementDefinition> {
        self.achievements
            .iter()
            .filter(move |a| TriggerCategory::from_flags(a.flags) == Some(category))
    }
}

/// One published achievement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AchievementDefinition {
    #[serde(rename = "ID", deserialize_with = "lenient_u32")]
    pub id: u32,
    #[serde(deserialize_with = "lenient_string")]
    pub mem_addr: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub points: u32,
    #[serde(deserialize_with = "lenient_string")]
    pub author: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub modified: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub created: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub badge_name: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub flags: u32,
}

impl AchievementDefinition {
    pub fn to_trigger(&self, lenient: bool) -> std::result::Result<Trigger, ParseError> {
        let mut trigger = Trigger::parse(&self.mem_addr, lenient)?;
        trigger.set_id(self.id);
        trigger.set_title(self.title.as_str());
        trigger.set_description(self.description.as_str());
        trigger.set_author(self.author.as_str());
        trigger.set_points(self.points);
        trigger.set_badge(&self.badge_name);
        trigger.created = self.created;
        trigger.modified = self.modified;
        Ok(trigger)
    }

    pub fn from_trigger(trigger: &Trigger, category: TriggerCategory) -> Self {
        Self {
            id: trigger.id(),
            mem_addr: trigger.serialize(),
            title: trigger.title.clone(),
            description: trigger.description.clone(),
            points: trigger.points,
            author: trigger.author.clone(),
            modified: trigger.modified,
            created: trigger.created,
            badge_name: trigger.badge().to_string(),
            flags: category.flags().unwrap_or(0),
        }
    }
}

/// One published leaderboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LeaderboardDefinition {
    #[serde(rename = "ID", deserialize_with = "lenient_u32")]
    pub id: u32,
    #[serde(deserialize_with = "lenient_string")]
    pub mem: String,
    #[serde(deserialize_with = "lenient_string")]
    pub format: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
}

impl LeaderboardDefinition {
    /// Build the leaderboard; `Format`, `Title` and `Description` override
    /// any matching segments inside `Mem`
    pub fn to_leaderboard(&self, lenient: bool) -> std::result::Result<Leaderboard, ParseError> {
        let mut board = Leaderboard::parse(self.id, &self.mem, lenient)?;
        if !self.format.is_empty() {
            board.format = ValueFormat::from_token(&self.format);
        }
        if !self.title.is_empty() {
            board.title = self.title.clone();
        }
        if !self.description.is_empty() {
            board.description = self.description.clone();
        }
        Ok(board)
    }
}

/// User-authored achievements for one game
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalDefinitions {
    /// Version of the tool that wrote the file
    pub version: String,
    pub game_title: String,
    pub triggers: Vec<Trigger>,
}

impl LocalDefinitions {
    /// Parse a local file. Lines not starting with a digit are skipped.
    pub fn parse(text: &str, lenient: bool) -> std::result::Result<Self, ParseError> {
        let mut lines = text.lines();
        let version = lines.next().unwrap_or_default().trim().to_string();
        let game_title = lines.next().unwrap_or_default().trim().to_string();

        let mut triggers = Vec::new();
        for line in lines {
            if let Some(trigger) = parse_local_line(line, lenient)? {
                triggers.push(trigger);
            }
        }
        Ok(Self {
            version,
            game_title,
            triggers,
        })
    }

    pub fn write(&self) -> String {
        let mut out = format!("{}\n{}\n", self.version, self.game_title);
        for trigger in &self.triggers {
            out.push_str(&local_line(trigger));
            out.push('\n');
        }
        out
    }
}

/// Parse one local definition line
///
/// Returns `None` for lines that do not hold an achievement. Parsed
/// triggers start inactive.
pub fn parse_local_line(line: &str, lenient: bool) -> std::result::Result<Option<Trigger>, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if !line.starts_with(|c: char| c.is_ascii_digit()) {
        return Ok(None);
    }

    let mut cursor = Cursor::new(line, lenient);
    let id = cursor.decimal_number().unwrap_or(0);
    if !cursor.match_char(b':') {
        let fallback = Trigger::new(id);
        return cursor
            .recover(fallback, ParseError::trailing(cursor.position()))
            .map(Some);
    }

    let groups = Trigger::parse_groups(&mut cursor)?;
    let rest_at = cursor.position();
    if !cursor.is_eof() && !cursor.match_char(b':') {
        cursor.recover((), ParseError::trailing(rest_at))?;
    }
    let rest = line.get(cursor.position()..).unwrap_or_default();

    // title : description : progress : progress max : progress format :
    // author : points : created : modified : upvotes : downvotes : badge
    let fields: Vec<&str> = rest.split(':').collect();
    let field = |index: usize| fields.get(index).copied().unwrap_or_default();

    let mut trigger = Trigger::new(id);
    trigger.set_groups(groups);
    trigger.set_title(field(0));
    trigger.set_description(field(1));
    trigger.set_author(field(5));
    trigger.set_points(field(6).trim().parse().unwrap_or(0));
    trigger.created = field(7).trim().parse().unwrap_or(0);
    trigger.modified = field(8).trim().parse().unwrap_or(0);
    trigger.set_badge(field(11).trim());
    trigger.set_active(false);
    Ok(Some(trigger))
}

/// Local definition line for a trigger
pub fn local_line(trigger: &Trigger) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{}:{}:{}:{}::::{}:{}:{}:{}:::{}",
        trigger.id(),
        trigger.serialize(),
        trigger.title,
        trigger.description,
        trigger.author,
        trigger.points,
        trigger.created,
        trigger.modified,
        trigger.badge()
    );
    out
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Lenient {
    fn as_i64(&self) -> i64 {
        match self {
            Lenient::Int(v) => *v,
            Lenient::Float(v) => *v as i64,
            Lenient::Text(s) => s.trim().parse().unwrap_or(0),
            Lenient::Null => 0,
        }
    }
}

/// Numbers sometimes arrive as strings
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    Ok(u32::try_from(Lenient::deserialize(deserializer)?.as_i64()).unwrap_or(0))
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    Ok(Lenient::deserialize(deserializer)?.as_i64())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

//! Leaderboard value display formats

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// Frame count at 60 frames per second
    TimeFrames,
    /// Whole seconds
    TimeSecs,
    /// Hundredths of a second
    TimeMillisecs,
    Score,
    Value,
    #[default]
    Other,
}

impl ValueFormat {
    /// Format for a `FOR:` token; unknown tokens map to `Other`
    pub fn from_token(token: &str) -> Self {
        match token {
            "TIMESECS" => ValueFormat::TimeSecs,
            "TIME" => ValueFormat::TimeFrames,
            "MILLISECS" => ValueFormat::TimeMillisecs,
            "POINTS" | "SCORE" => ValueFormat::Score,
            "VALUE" => ValueFormat::Value,
            _ => ValueFormat::Other,
        }
    }

    /// `FOR:` token for this format. `Other` has no token of its own; its
    /// name is only used for display and a definition omits the segment.
    pub fn as_token(&self) -> &'static str {
        match self {
            ValueFormat::TimeFrames => "TIME",
            ValueFormat::TimeSecs => "TIMESECS",
            ValueFormat::TimeMillisecs => "MILLISECS",
            ValueFormat::Score => "POINTS",
            ValueFormat::Value => "VALUE",
            ValueFormat::Other => "OTHER",
        }
    }

    /// Render a submitted value for display
    pub fn format_value(&self, value: u32) -> String {
        match self {
            ValueFormat::TimeFrames => {
                let secs = value / 60;
                let hundredths = (value % 60) * 100 / 60;
                format!("{:02}:{:02}.{:02}", secs / 60, secs % 60, hundredths)
            }
            ValueFormat::TimeSecs => format!("{:02}:{:02}", value / 60, value % 60),
            ValueFormat::TimeMillisecs => {
                let secs = value / 100;
                format!("{:02}:{:02}.{:02}", secs / 60, secs % 60, value % 100)
            }
            ValueFormat::Score => format!("{:06} Points", value as i32),
            ValueFormat::Value => format!("{}", value as i32),
            ValueFormat::Other => format!("{:06}", value as i32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        assert_eq!(ValueFormat::from_token("TIME"), ValueFormat::TimeFrames);
        assert_eq!(ValueFormat::from_token("TIMESECS"), ValueFormat::TimeSecs);
        assert_eq!(ValueFormat::from_token("MILLISECS"), ValueFormat::TimeMillisecs);
        assert_eq!(ValueFormat::from_token("SCORE"), ValueFormat::Score);
        assert_eq!(ValueFormat::from_token("POINTS"), ValueFormat::Score);
        assert_eq!(ValueFormat::from_token("VALUE"), ValueFormat::Value);
        assert_eq!(ValueFormat::from_token("FRAMES"), ValueFormat::Other);
        assert_eq!(ValueFormat::from_token("time"), ValueFormat::Other);
    }

    #[test]
    fn test_format_time_frames() {
        // 1 minute, 2 seconds and 30 frames
        assert_eq!(ValueFormat::TimeFrames.format_value(3750), "01:02.50");
        assert_eq!(ValueFormat::TimeFrames.format_value(0), "00:00.00");
    }

    #[test]
    fn test_format_time_secs_and_millis() {
        assert_eq!(ValueFormat::TimeSecs.format_value(125), "02:05");
        assert_eq!(ValueFormat::TimeMillisecs.format_value(12345), "02:03.45");
    }

    #[test]
    fn test_format_numbers() {
        assert_eq!(ValueFormat::Score.format_value(1234), "001234 Points");
        assert_eq!(ValueFormat::Value.format_value(42), "42");
        assert_eq!(ValueFormat::Value.format_value(u32::MAX), "-1");
        assert_eq!(ValueFormat::Other.format_value(77), "000077");
    }
}

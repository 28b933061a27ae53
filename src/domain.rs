use std::fmt::{Display, Formatter};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const UNTITLED_EVENT: &str = "Untitled event";
pub const NO_DESCRIPTION: &str = "No description available.";
pub const UNKNOWN_ORGANIZER: &str = "unknown";

const PACIFIC_ISLANDER_LABEL: &str = "Pacific Islander";
const LATINO_LABEL: &str = "Latino";
const UNCLASSIFIED_LABEL: &str = "Unclassified";

/// Community tag an event belongs to.
///
/// The set is open: tags that are not one of the known communities are kept
/// verbatim in `Other` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Community {
    PacificIslander,
    Latino,
    Unclassified,
    Other(String),
}

impl Community {
    /// Maps a raw source value to a tag. Absent or blank values are `Unclassified`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(trimmed) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Community::Unclassified;
        };

        if trimmed.eq_ignore_ascii_case(PACIFIC_ISLANDER_LABEL) {
            Community::PacificIslander
        } else if trimmed.eq_ignore_ascii_case(LATINO_LABEL) {
            Community::Latino
        } else if trimmed.eq_ignore_ascii_case(UNCLASSIFIED_LABEL) {
            Community::Unclassified
        } else {
            Community::Other(trimmed.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Community::PacificIslander => PACIFIC_ISLANDER_LABEL,
            Community::Latino => LATINO_LABEL,
            Community::Unclassified => UNCLASSIFIED_LABEL,
            Community::Other(label) => label,
        }
    }

    pub fn known() -> [Community; 2] {
        [Community::PacificIslander, Community::Latino]
    }
}

impl Display for Community {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Community {
    fn from(value: String) -> Self {
        Community::from_raw(Some(&value))
    }
}

impl From<&str> for Community {
    fn from(value: &str) -> Self {
        Community::from_raw(Some(value))
    }
}

impl From<Community> for String {
    fn from(value: Community) -> Self {
        value.label().to_string()
    }
}

/// Canonical, fully defaulted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub community: Community,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub all_day: bool,
    pub location: Option<String>,
    pub description: String,
    pub organizer: String,
}

impl Event {
    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn date_key(&self) -> String {
        date_key(self.start_date())
    }

    pub fn spans_multiple_days(&self) -> bool {
        self.end.date() > self.start.date()
    }

    pub fn time_display(&self) -> String {
        if self.all_day {
            if self.spans_multiple_days() {
                format!("All day until {}", self.end.format("%b %-d"))
            } else {
                "All day".to_string()
            }
        } else if self.end == self.start {
            self.start.format("%H:%M").to_string()
        } else if self.spans_multiple_days() {
            format!(
                "{} - {}",
                self.start.format("%H:%M"),
                self.end.format("%b %-d %H:%M")
            )
        } else {
            format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
        }
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Community, Event, NO_DESCRIPTION, UNKNOWN_ORGANIZER};

    fn sample(start: (u32, u32), end: (u32, u32), all_day: bool) -> Event {
        let day = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        Event {
            id: "a".to_string(),
            title: "Fest".to_string(),
            community: Community::Latino,
            start: day.and_hms_opt(start.0, start.1, 0).unwrap(),
            end: day.and_hms_opt(end.0, end.1, 0).unwrap(),
            all_day,
            location: None,
            description: NO_DESCRIPTION.to_string(),
            organizer: UNKNOWN_ORGANIZER.to_string(),
        }
    }

    #[test]
    fn known_communities_match_case_insensitively() {
        assert_eq!(Community::from_raw(Some(" pacific islander ")), Community::PacificIslander);
        assert_eq!(Community::from_raw(Some("LATINO")), Community::Latino);
    }

    #[test]
    fn unknown_communities_are_preserved() {
        let community = Community::from_raw(Some("  Hmong "));
        assert_eq!(community, Community::Other("Hmong".to_string()));
        assert_eq!(community.to_string(), "Hmong");
    }

    #[test]
    fn blank_community_is_unclassified() {
        assert_eq!(Community::from_raw(None), Community::Unclassified);
        assert_eq!(Community::from_raw(Some("   ")), Community::Unclassified);
    }

    #[test]
    fn community_serializes_as_label() {
        let json = serde_json::to_string(&Community::PacificIslander).unwrap();
        assert_eq!(json, "\"Pacific Islander\"");
        let decoded: Community = serde_json::from_str("\"latino\"").unwrap();
        assert_eq!(decoded, Community::Latino);
    }

    #[test]
    fn time_display_covers_event_shapes() {
        assert_eq!(sample((0, 0), (0, 0), true).time_display(), "All day");
        assert_eq!(sample((9, 0), (9, 0), false).time_display(), "09:00");
        assert_eq!(sample((9, 0), (10, 30), false).time_display(), "09:00 - 10:30");
    }
}

//! Conversion of raw stored event records into canonical [`Event`] values.
//!
//! Raw records come from the event source as loosely shaped JSON: any optional
//! field may be missing, and dates arrive as strings. A record that cannot be
//! placed on the calendar is skipped and reported; it never fails the batch.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{Community, Event, NO_DESCRIPTION, UNKNOWN_ORGANIZER, UNTITLED_EVENT};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];
const TIME_FORMATS: [&str; 4] = ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

/// A batch as handed over by the event source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEventBatch {
    List(Vec<Value>),
    ByDate(BTreeMap<String, Vec<Value>>),
}

impl RawEventBatch {
    pub fn len(&self) -> usize {
        match self {
            RawEventBatch::List(records) => records.len(),
            RawEventBatch::ByDate(days) => days.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Record shape accepted from storage. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub community: Option<String>,
    #[serde(default)]
    pub organizer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecord {
    #[error("record {position} is not an event object: {reason}")]
    Shape { position: String, reason: String },
    #[error("record {position} has no date")]
    MissingDate { position: String },
    #[error("record {position} has an unparseable date `{value}`")]
    InvalidDate { position: String, value: String },
    #[error("record {position} has an unparseable time `{value}`")]
    InvalidTime { position: String, value: String },
}

impl MalformedRecord {
    pub fn position(&self) -> &str {
        match self {
            MalformedRecord::Shape { position, .. }
            | MalformedRecord::MissingDate { position }
            | MalformedRecord::InvalidDate { position, .. }
            | MalformedRecord::InvalidTime { position, .. } => position,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub events: Vec<Event>,
    pub skipped: Vec<MalformedRecord>,
}

/// Normalizes every record of a batch, keeping input order.
///
/// Date-keyed batches are walked in ascending key order, and records in them
/// fall back to their key when they carry no `date` of their own.
pub fn normalize_batch(batch: &RawEventBatch) -> Normalized {
    let mut normalized = Normalized::default();

    match batch {
        RawEventBatch::List(records) => {
            for (index, record) in records.iter().enumerate() {
                let position = format!("list#{index}");
                push_record(&mut normalized, record, position, None);
            }
        }
        RawEventBatch::ByDate(days) => {
            for (day, records) in days {
                for (index, record) in records.iter().enumerate() {
                    let position = format!("{day}#{index}");
                    push_record(&mut normalized, record, position, Some(day.as_str()));
                }
            }
        }
    }

    if !normalized.skipped.is_empty() {
        warn!(
            "event=batch_normalized module=normalize kept={} skipped={}",
            normalized.events.len(),
            normalized.skipped.len()
        );
    }

    normalized
}

fn push_record(
    normalized: &mut Normalized,
    record: &Value,
    position: String,
    fallback_date: Option<&str>,
) {
    match normalize_record(record, &position, fallback_date) {
        Ok(event) => normalized.events.push(event),
        Err(err) => {
            warn!(
                "event=record_skipped module=normalize position={} reason=\"{}\"",
                err.position(),
                err
            );
            normalized.skipped.push(err);
        }
    }
}

/// Normalizes one record. `position` doubles as the id of records without one.
pub fn normalize_record(
    record: &Value,
    position: &str,
    fallback_date: Option<&str>,
) -> Result<Event, MalformedRecord> {
    let raw = RawEvent::deserialize(record).map_err(|err| MalformedRecord::Shape {
        position: position.to_string(),
        reason: err.to_string(),
    })?;

    let date_text = non_blank(raw.date.as_deref())
        .or_else(|| non_blank(fallback_date))
        .ok_or_else(|| MalformedRecord::MissingDate {
            position: position.to_string(),
        })?;
    let (date, embedded_time) =
        parse_date_field(date_text).ok_or_else(|| MalformedRecord::InvalidDate {
            position: position.to_string(),
            value: date_text.to_string(),
        })?;

    let time = match non_blank(raw.time.as_deref()) {
        Some(text) => Some(parse_time(text).ok_or_else(|| MalformedRecord::InvalidTime {
            position: position.to_string(),
            value: text.to_string(),
        })?),
        None => embedded_time,
    };

    let all_day = time.is_none();
    let start = date.and_time(time.unwrap_or(NaiveTime::MIN));
    let end = resolve_end(&raw, date, start, all_day, position);

    Ok(Event {
        id: non_blank(raw.id.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| position.to_string()),
        title: non_blank(raw.title.as_deref())
            .unwrap_or(UNTITLED_EVENT)
            .to_string(),
        community: Community::from_raw(raw.community.as_deref()),
        start,
        end,
        all_day,
        location: non_blank(raw.location.as_deref()).map(str::to_string),
        description: non_blank(raw.description.as_deref())
            .unwrap_or(NO_DESCRIPTION)
            .to_string(),
        organizer: non_blank(raw.organizer.as_deref())
            .unwrap_or(UNKNOWN_ORGANIZER)
            .to_string(),
    })
}

fn resolve_end(
    raw: &RawEvent,
    start_date: NaiveDate,
    start: NaiveDateTime,
    all_day: bool,
    position: &str,
) -> NaiveDateTime {
    let end_date = match non_blank(raw.end_date.as_deref()).map(|text| (text, parse_date_field(text))) {
        Some((_, Some(parsed))) => Some(parsed),
        Some((text, None)) => {
            warn!(
                "event=end_ignored module=normalize position={} field=end_date value=\"{}\"",
                position, text
            );
            return start;
        }
        None => None,
    };

    let end_time = match non_blank(raw.end_time.as_deref()) {
        Some(text) => match parse_time(text) {
            Some(parsed) => Some(parsed),
            None => {
                warn!(
                    "event=end_ignored module=normalize position={} field=end_time value=\"{}\"",
                    position, text
                );
                return start;
            }
        },
        None => end_date.and_then(|(_, embedded)| embedded),
    };

    let end = match (end_date.map(|(date, _)| date), end_time) {
        (None, None) => start,
        (None, Some(time)) => start_date.and_time(time),
        (Some(date), Some(time)) => date.and_time(time),
        (Some(date), None) if all_day => date.and_time(NaiveTime::MIN),
        (Some(date), None) => date.and_time(last_second_of_day()),
    };

    if end < start {
        debug!(
            "event=end_clamped module=normalize position={} start={} end={}",
            position, start, end
        );
        return start;
    }

    end
}

/// Parses a date field: either a bare date or a naive date-time whose time
/// component then counts as the event time.
pub fn parse_date_field(text: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        return Some((date, None));
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|date_time| (date_time.date(), Some(date_time.time())))
}

/// Parses a clock time in 24-hour or 12-hour notation (`18:30`, `6:30 PM`, `6 pm`).
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim().to_ascii_uppercase();
    if let Some(time) = TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&text, format).ok())
    {
        return Some(time);
    }

    // "6 PM" carries no minutes, which chrono will not parse on its own.
    if text.contains(':') {
        return None;
    }
    let meridiem_at = text.find(['A', 'P'])?;
    let (hour, meridiem) = text.split_at(meridiem_at);
    let padded = format!("{}:00 {}", hour.trim(), meridiem);
    NaiveTime::parse_from_str(&padded, "%I:%M %p").ok()
}

fn last_second_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, NaiveTime};
    use serde_json::json;

    use crate::domain::{Community, NO_DESCRIPTION, UNKNOWN_ORGANIZER, UNTITLED_EVENT};

    use super::{MalformedRecord, RawEventBatch, normalize_batch, normalize_record, parse_time};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn date_only_record_becomes_all_day_at_midnight() {
        let event = normalize_record(&json!({"title": "X", "date": "2024-07-04"}), "list#0", None)
            .expect("record should normalize");
        assert!(event.all_day);
        assert_eq!(event.start, at(2024, 7, 4, 0, 0, 0));
        assert_eq!(event.end, event.start);
        assert_eq!(event.start.format("%Y-%m-%dT%H:%M:%S").to_string(), "2024-07-04T00:00:00");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let event = normalize_record(&json!({"date": "2024-07-04"}), "list#3", None).unwrap();
        assert_eq!(event.id, "list#3");
        assert_eq!(event.title, UNTITLED_EVENT);
        assert_eq!(event.description, NO_DESCRIPTION);
        assert_eq!(event.organizer, UNKNOWN_ORGANIZER);
        assert_eq!(event.community, Community::Unclassified);
        assert_eq!(event.location, None);
    }

    #[test]
    fn name_alias_and_numeric_id_are_accepted() {
        let record = json!({"id": 42, "name": "Luau", "date": "2024-08-01", "time": "6:30 PM"});
        let event = normalize_record(&record, "list#0", None).unwrap();
        assert_eq!(event.id, "42");
        assert_eq!(event.title, "Luau");
        assert!(!event.all_day);
        assert_eq!(event.start, at(2024, 8, 1, 18, 30, 0));
    }

    #[test]
    fn end_time_applies_to_start_date() {
        let record = json!({"date": "2024-08-01", "time": "09:00", "end_time": "11:15"});
        let event = normalize_record(&record, "list#0", None).unwrap();
        assert_eq!(event.end, at(2024, 8, 1, 11, 15, 0));
    }

    #[test]
    fn end_date_without_time_covers_the_whole_day() {
        let timed = json!({"date": "2024-03-30", "time": "10:00", "end_date": "2024-04-02"});
        let event = normalize_record(&timed, "list#0", None).unwrap();
        assert_eq!(event.end, at(2024, 4, 2, 23, 59, 59));

        let all_day = json!({"date": "2024-03-30", "end_date": "2024-04-02"});
        let event = normalize_record(&all_day, "list#1", None).unwrap();
        assert_eq!(event.end, at(2024, 4, 2, 0, 0, 0));
    }

    #[test]
    fn reversed_end_is_clamped_to_start() {
        let record = json!({"date": "2024-08-01", "time": "15:00", "end_time": "14:00"});
        let event = normalize_record(&record, "list#0", None).unwrap();
        assert_eq!(event.end, event.start);
    }

    #[test]
    fn unparseable_end_is_ignored() {
        let record = json!({"date": "2024-08-01", "time": "15:00", "end_time": "late"});
        let event = normalize_record(&record, "list#0", None).unwrap();
        assert_eq!(event.end, event.start);
    }

    #[test]
    fn date_time_in_date_field_sets_time() {
        let event = normalize_record(&json!({"date": "2024-08-01T07:45"}), "list#0", None).unwrap();
        assert!(!event.all_day);
        assert_eq!(event.start, at(2024, 8, 1, 7, 45, 0));
    }

    #[test]
    fn malformed_records_are_skipped_without_failing_the_batch() {
        let batch = RawEventBatch::List(vec![
            json!({"title": "Good", "date": "2024-07-04"}),
            json!({"title": "Bad", "date": "July fourth"}),
            json!("not an object"),
            json!({"title": "No date"}),
            json!({"title": "Bad time", "date": "2024-07-04", "time": "noonish"}),
            json!({"title": "Also good", "date": "2024-07-05"}),
        ]);

        let normalized = normalize_batch(&batch);
        let titles = normalized
            .events
            .iter()
            .map(|event| event.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["Good", "Also good"]);
        assert_eq!(normalized.skipped.len(), 4);
        assert!(matches!(normalized.skipped[0], MalformedRecord::InvalidDate { .. }));
        assert!(matches!(normalized.skipped[1], MalformedRecord::Shape { .. }));
        assert!(matches!(normalized.skipped[2], MalformedRecord::MissingDate { .. }));
        assert!(matches!(normalized.skipped[3], MalformedRecord::InvalidTime { .. }));
    }

    #[test]
    fn date_keyed_batch_inherits_key_and_keeps_ids_stable() {
        let mut days = BTreeMap::new();
        days.insert(
            "2024-07-05".to_string(),
            vec![json!({"title": "Later"})],
        );
        days.insert(
            "2024-07-04".to_string(),
            vec![json!({"title": "First"}), json!({"title": "Second", "community": "Latino"})],
        );
        let batch = RawEventBatch::ByDate(days);

        let first = normalize_batch(&batch);
        let second = normalize_batch(&batch);
        assert_eq!(first, second);

        let ids = first
            .events
            .iter()
            .map(|event| event.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["2024-07-04#0", "2024-07-04#1", "2024-07-05#0"]);
        assert_eq!(first.events[1].community, Community::Latino);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn parses_common_clock_notations() {
        assert_eq!(parse_time("18:30"), NaiveTime::from_hms_opt(18, 30, 0));
        assert_eq!(parse_time("6:30 pm"), NaiveTime::from_hms_opt(18, 30, 0));
        assert_eq!(parse_time("6 PM"), NaiveTime::from_hms_opt(18, 0, 0));
        assert_eq!(parse_time("12 am"), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("noon"), None);
    }
}

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{Community, Event};

pub const DEFAULT_MARKER_COLOR: &str = "white";

/// Colors to draw on one calendar date, one per distinct resolved color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarMarker {
    pub date: String,
    pub colors: Vec<String>,
}

/// Groups events by the date of their start and derives the marker colors.
///
/// Multi-day events are attributed to their start date only. `resolve` maps a
/// community to a color token; `None` falls back to [`DEFAULT_MARKER_COLOR`].
pub fn aggregate_markers<F>(events: &[Event], resolve: F) -> BTreeMap<String, CalendarMarker>
where
    F: Fn(&Community) -> Option<String>,
{
    let mut markers: BTreeMap<String, CalendarMarker> = BTreeMap::new();

    for event in events {
        let date = event.date_key();
        let color = resolve(&event.community).unwrap_or_else(|| DEFAULT_MARKER_COLOR.to_string());
        let marker = markers
            .entry(date.clone())
            .or_insert_with(|| CalendarMarker {
                date,
                colors: Vec::new(),
            });
        if !marker.colors.contains(&color) {
            marker.colors.push(color);
        }
    }

    markers
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::domain::{Community, Event};

    use super::{DEFAULT_MARKER_COLOR, aggregate_markers};

    fn event(day: u32, community: Community) -> Event {
        let start = NaiveDate::from_ymd_opt(2024, 7, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Event {
            id: format!("{day}-{community}"),
            title: "e".to_string(),
            community,
            start,
            end: start,
            all_day: true,
            location: None,
            description: String::new(),
            organizer: "unknown".to_string(),
        }
    }

    fn palette(community: &Community) -> Option<String> {
        match community {
            Community::Latino => Some("yellow".to_string()),
            Community::PacificIslander => Some("cyan".to_string()),
            Community::Other(label) if label == "Chamorro" => Some("cyan".to_string()),
            _ => None,
        }
    }

    #[test]
    fn one_color_per_community_in_first_seen_order() {
        let markers = aggregate_markers(
            &[event(4, Community::Latino), event(4, Community::PacificIslander)],
            palette,
        );
        assert_eq!(markers.len(), 1);
        assert_eq!(markers["2024-07-04"].colors, vec!["yellow", "cyan"]);
        assert_eq!(markers["2024-07-04"].date, "2024-07-04");
    }

    #[test]
    fn communities_sharing_a_color_produce_one_dot() {
        let markers = aggregate_markers(
            &[
                event(4, Community::PacificIslander),
                event(4, Community::Other("Chamorro".to_string())),
                event(4, Community::PacificIslander),
            ],
            palette,
        );
        assert_eq!(markers["2024-07-04"].colors, vec!["cyan"]);
    }

    #[test]
    fn unknown_communities_use_default_color() {
        let markers = aggregate_markers(&[event(9, Community::Other("Hmong".to_string()))], palette);
        assert_eq!(markers["2024-07-09"].colors, vec![DEFAULT_MARKER_COLOR]);
    }

    #[test]
    fn multi_day_events_mark_start_date_only() {
        let mut long = event(30, Community::Latino);
        long.end = NaiveDate::from_ymd_opt(2024, 8, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let markers = aggregate_markers(&[long], palette);
        assert_eq!(markers.keys().collect::<Vec<_>>(), vec!["2024-07-30"]);
    }

    #[test]
    fn dates_without_events_are_absent() {
        assert!(aggregate_markers(&[], palette).is_empty());
    }
}

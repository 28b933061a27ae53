use crate::domain::Event;

/// Orders events by start instant. The sort is stable, so events sharing an
/// instant keep their input order across repeated renders.
pub fn sort_chronologically(events: &mut [Event]) {
    events.sort_by_key(|event| event.start);
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::domain::{Community, Event};

    use super::sort_chronologically;

    fn event(id: &str, day: u32, hour: u32, all_day: bool) -> Event {
        let start = NaiveDate::from_ymd_opt(2024, 7, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        Event {
            id: id.to_string(),
            title: id.to_string(),
            community: Community::Latino,
            start,
            end: start,
            all_day,
            location: None,
            description: String::new(),
            organizer: "unknown".to_string(),
        }
    }

    fn sorted(mut events: Vec<Event>) -> Vec<Event> {
        sort_chronologically(&mut events);
        events
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|event| event.id.as_str()).collect()
    }

    #[test]
    fn orders_by_start_instant() {
        let sorted = sorted(vec![
            event("c", 6, 9, false),
            event("a", 4, 18, false),
            event("b", 5, 0, true),
        ]);
        assert_eq!(ids(&sorted), vec!["a", "b", "c"]);
    }

    #[test]
    fn equal_instants_keep_input_order() {
        let sorted = sorted(vec![
            event("second", 4, 10, false),
            event("early", 4, 8, false),
            event("third", 4, 10, false),
            event("fourth", 4, 10, false),
        ]);
        assert_eq!(ids(&sorted), vec!["early", "second", "third", "fourth"]);
    }

    #[test]
    fn all_day_events_sort_by_their_midnight_instant() {
        let sorted = sorted(vec![
            event("timed", 4, 0, false),
            event("all_day", 4, 0, true),
            event("morning", 4, 7, false),
        ]);
        assert_eq!(ids(&sorted), vec!["timed", "all_day", "morning"]);
    }
}

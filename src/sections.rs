use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::Event;
use crate::sort::sort_chronologically;
use crate::window::{TemporalWindow, ViewMode, VisibleWindow};

pub const UPCOMING_BANNER: &str = "Upcoming events";
const HIDING_PAST_SUFFIX: &str = " (hiding past events)";

/// A titled run of list items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub items: Vec<Event>,
}

/// Which list the user is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListMode {
    #[default]
    Month,
    Upcoming,
}

/// Builds the month list: events overlapping `window`, optionally without the
/// ones that ended before `reference`, in chronological order.
///
/// Returns one section titled with the month label, or none when nothing is left.
pub fn build_month_sections(
    events: &[Event],
    window: VisibleWindow,
    hide_past: bool,
    reference: NaiveDateTime,
) -> Vec<Section> {
    let bounds = TemporalWindow::for_mode(ViewMode::Month(window), reference);
    let mut items = events
        .iter()
        .filter(|event| bounds.admits(event))
        .filter(|event| !hide_past || event.end >= reference)
        .cloned()
        .collect::<Vec<_>>();

    if items.is_empty() {
        return Vec::new();
    }

    sort_chronologically(&mut items);
    vec![Section {
        title: window.label(),
        items,
    }]
}

/// Builds the upcoming list: everything ending today or later, one section per
/// month of the event start.
pub fn build_upcoming_sections(events: &[Event], reference: NaiveDateTime) -> Vec<Section> {
    let bounds = TemporalWindow::for_mode(ViewMode::Upcoming, reference);
    let mut items = events
        .iter()
        .filter(|event| bounds.admits(event))
        .cloned()
        .collect::<Vec<_>>();
    sort_chronologically(&mut items);

    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<VisibleWindow> = None;
    for event in items {
        let month = VisibleWindow::containing(event.start_date());
        if current == Some(month) {
            if let Some(section) = sections.last_mut() {
                section.items.push(event);
                continue;
            }
        }

        current = Some(month);
        sections.push(Section {
            title: month.label(),
            items: vec![event],
        });
    }

    sections
}

/// Banner shown above the list, e.g. `Events for July 2024`.
pub fn banner_label(mode: ListMode, window: VisibleWindow, hide_past: bool) -> String {
    match mode {
        ListMode::Upcoming => UPCOMING_BANNER.to_string(),
        ListMode::Month if hide_past => format!("Events for {}{}", window.label(), HIDING_PAST_SUFFIX),
        ListMode::Month => format!("Events for {}", window.label()),
    }
}

use std::collections::BTreeSet;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::domain::{Community, Event};

pub const NO_CALENDAR_SELECTED_MESSAGE: &str = "Please select a calendar to view events.";
pub const NO_EVENTS_MESSAGE: &str = "No events available.";

/// Why a derived view came out empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    NoCalendarSelected,
    NoEvents,
}

impl EmptyState {
    /// Stable machine-readable tag.
    pub fn kind(self) -> &'static str {
        match self {
            EmptyState::NoCalendarSelected => "no_calendar_selected",
            EmptyState::NoEvents => "no_events",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            EmptyState::NoCalendarSelected => NO_CALENDAR_SELECTED_MESSAGE,
            EmptyState::NoEvents => NO_EVENTS_MESSAGE,
        }
    }
}

// Serialized as `{ "kind": ..., "message": ... }` so JSON readers get both.
impl Serialize for EmptyState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EmptyState", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", self.message())?;
        state.end()
    }
}

/// Keeps the events whose community is selected.
///
/// An empty selection yields no events at all; it does not mean "show all".
pub fn filter_by_community(events: &[Event], selection: &BTreeSet<Community>) -> Vec<Event> {
    if selection.is_empty() {
        return Vec::new();
    }

    events
        .iter()
        .filter(|event| selection.contains(&event.community))
        .cloned()
        .collect()
}

/// Classifies an empty result; `None` when there is something to show.
pub fn classify_empty(selection: &BTreeSet<Community>, shown: usize) -> Option<EmptyState> {
    if selection.is_empty() {
        Some(EmptyState::NoCalendarSelected)
    } else if shown == 0 {
        Some(EmptyState::NoEvents)
    } else {
        None
    }
}

/// Distinct communities present in `events`, sorted.
pub fn communities_in(events: &[Event]) -> BTreeSet<Community> {
    events.iter().map(|event| event.community.clone()).collect()
}

//! Derived views over the current inputs.
//!
//! A [`ViewState`] holds everything the user can change. Each recomputation
//! takes the canonical events plus one state and returns freshly owned views;
//! nothing is cached between calls.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::{Community, Event};
use crate::filter::{EmptyState, classify_empty, filter_by_community};
use crate::markers::{CalendarMarker, aggregate_markers};
use crate::navigator::MonthNavigator;
use crate::sections::{ListMode, Section, banner_label, build_month_sections, build_upcoming_sections};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub selection: BTreeSet<Community>,
    pub navigator: MonthNavigator,
    pub hide_past: bool,
    pub list_mode: ListMode,
}

impl ViewState {
    pub fn new(selection: BTreeSet<Community>, navigator: MonthNavigator) -> Self {
        Self {
            selection,
            navigator,
            hide_past: false,
            list_mode: ListMode::Month,
        }
    }

    pub fn with_hide_past(self, hide_past: bool) -> Self {
        Self { hide_past, ..self }
    }

    pub fn with_list_mode(self, list_mode: ListMode) -> Self {
        Self { list_mode, ..self }
    }

    pub fn previous_month(self) -> Self {
        Self {
            navigator: self.navigator.previous(),
            ..self
        }
    }

    pub fn next_month(self) -> Self {
        Self {
            navigator: self.navigator.next(),
            ..self
        }
    }

    pub fn toggle_hide_past(self) -> Self {
        let hide_past = !self.hide_past;
        self.with_hide_past(hide_past)
    }

    pub fn toggle_list_mode(self) -> Self {
        let list_mode = match self.list_mode {
            ListMode::Month => ListMode::Upcoming,
            ListMode::Upcoming => ListMode::Month,
        };
        self.with_list_mode(list_mode)
    }

    pub fn toggle_community(mut self, community: &Community) -> Self {
        if !self.selection.remove(community) {
            self.selection.insert(community.clone());
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarView {
    pub markers: BTreeMap<String, CalendarMarker>,
    pub empty_state: Option<EmptyState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListView {
    pub banner: String,
    pub sections: Vec<Section>,
    pub empty_state: Option<EmptyState>,
}

impl ListView {
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|section| section.items.len()).sum()
    }
}

/// Calendar mode: every selected event is eligible for a marker.
pub fn derive_calendar_view<F>(
    events: &[Event],
    selection: &BTreeSet<Community>,
    resolve: F,
) -> CalendarView
where
    F: Fn(&Community) -> Option<String>,
{
    let selected = filter_by_community(events, selection);
    let markers = aggregate_markers(&selected, resolve);
    let empty_state = classify_empty(selection, markers.len());
    CalendarView {
        markers,
        empty_state,
    }
}

/// List mode: the navigator month, or the upcoming list.
pub fn derive_list_view(events: &[Event], state: &ViewState, reference: NaiveDateTime) -> ListView {
    let selected = filter_by_community(events, &state.selection);
    let window = state.navigator.window();
    let sections = match state.list_mode {
        ListMode::Month => build_month_sections(&selected, window, state.hide_past, reference),
        ListMode::Upcoming => build_upcoming_sections(&selected, reference),
    };
    let banner = banner_label(state.list_mode, window, state.hide_past);

    let mut view = ListView {
        banner,
        sections,
        empty_state: None,
    };
    view.empty_state = classify_empty(&state.selection, view.item_count());
    view
}

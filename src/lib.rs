//! Event aggregation and temporal filtering for community calendars.
//!
//! Raw records are normalized into [`Event`]s once; every view (calendar
//! markers, month list, upcoming list) is then derived from the events plus an
//! explicit [`ViewState`] and an injected reference instant.

pub mod config;
pub mod domain;
pub mod filter;
pub mod logging;
pub mod markers;
pub mod navigator;
pub mod normalize;
pub mod sections;
pub mod sort;
pub mod storage;
pub mod view;
pub mod window;

pub use config::{Config, ConfigError, Palette, load_config};
pub use domain::{Community, Event};
pub use filter::{EmptyState, communities_in, filter_by_community};
pub use markers::{CalendarMarker, DEFAULT_MARKER_COLOR, aggregate_markers};
pub use navigator::MonthNavigator;
pub use normalize::{MalformedRecord, Normalized, RawEventBatch, normalize_batch};
pub use sections::{ListMode, Section, banner_label, build_month_sections, build_upcoming_sections};
pub use sort::sort_chronologically;
pub use storage::{LoadedBatch, StorageError, load_events, load_raw_events};
pub use view::{CalendarView, ListView, ViewState, derive_calendar_view, derive_list_view};
pub use window::{TemporalWindow, ViewMode, VisibleWindow, WindowError};

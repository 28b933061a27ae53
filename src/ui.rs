use std::collections::BTreeSet;
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use crossterm::{ExecutableCommand, execute};
use log::{info, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use community_calendar::MonthNavigator;
use community_calendar::config::Palette;
use community_calendar::domain::{Community, Event, date_key};
use community_calendar::filter::communities_in;
use community_calendar::storage::load_events;
use community_calendar::view::{CalendarView, ListView, ViewState, derive_calendar_view, derive_list_view};
use community_calendar::window::days_in_month;

const MAX_DOTS_PER_DAY: usize = 3;
const DAY_CELL_WIDTH: usize = 6;
const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);

/// Inputs the dashboard starts from.
pub struct Dashboard {
	pub events_path: PathBuf,
	pub events: Vec<Event>,
	pub palette: Palette,
	pub state: ViewState,
	/// Pinned reference instant; the local clock is read every frame when `None`.
	pub fixed_now: Option<NaiveDateTime>,
}

pub fn run_dashboard(dashboard: Dashboard) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, App::new(dashboard));

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	mut app: App,
) -> Result<(), Box<dyn Error>> {
	loop {
		let now = app.fixed_now.unwrap_or_else(|| Local::now().naive_local());
		let view = build_view(&app, now);
		terminal.draw(|frame| draw_dashboard(frame, &app, &view))?;

		if event::poll(StdDuration::from_millis(250))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				if handle_key(&mut app, key.code, now) {
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(12), Constraint::Length(4)])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Length(46), Constraint::Min(30)])
		.split(layout[0]);

	let left = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(11), Constraint::Min(5)])
		.split(body[0]);

	render_calendar_panel(frame, left[0], app, view);
	render_communities_panel(frame, left[1], app);
	render_list_panel(frame, body[1], app, &view.list);
	render_footer(frame, layout[1], app);
}

fn render_calendar_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let window = app.state.navigator.window();
	let first = window.first_day();
	let mut lines = Vec::new();
	lines.push(Line::from(window.label()));
	lines.push(Line::from(
		["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"]
			.iter()
			.map(|name| format!("{name:<width$}", width = DAY_CELL_WIDTH))
			.collect::<String>(),
	));

	let first_weekday = first.weekday().number_from_monday() as usize - 1;
	let days = days_in_month(window.year(), window.month());
	let mut day_counter = 1u32;
	for week in 0..6 {
		if day_counter > days {
			break;
		}
		let mut spans = Vec::new();
		for weekday_index in 0..7 {
			let before_first = week == 0 && weekday_index < first_weekday;
			if before_first || day_counter > days {
				spans.push(Span::raw(" ".repeat(DAY_CELL_WIDTH)));
				continue;
			}

			let Some(date) = NaiveDate::from_ymd_opt(window.year(), window.month(), day_counter) else {
				break;
			};
			spans.extend(render_day_cell(date, view));
			day_counter += 1;
		}
		lines.push(Line::from(spans));
	}

	if let Some(empty) = view.calendar.empty_state {
		lines.push(Line::from(Span::styled(
			empty.message(),
			Style::default().fg(Color::DarkGray),
		)));
	}

	let block = Block::default()
		.borders(Borders::ALL)
		.title("Calendar")
		.border_style(border_style(false));
	frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_day_cell(date: NaiveDate, view: &ViewModel) -> Vec<Span<'static>> {
	let mut number_style = Style::default();
	if date == view.today {
		number_style = number_style.fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD);
	}

	let mut spans = vec![Span::styled(format!("{:>2}", date.day()), number_style)];
	let colors = view
		.calendar
		.markers
		.get(&date_key(date))
		.map(|marker| marker.colors.as_slice())
		.unwrap_or_default();

	let mut used = 2;
	for color in colors.iter().take(MAX_DOTS_PER_DAY) {
		spans.push(Span::styled("•", color_style(color)));
		used += 1;
	}
	if colors.len() > MAX_DOTS_PER_DAY {
		spans.push(Span::raw("+"));
		used += 1;
	}
	spans.push(Span::raw(" ".repeat(DAY_CELL_WIDTH.saturating_sub(used))));
	spans
}

fn render_communities_panel(frame: &mut Frame, area: Rect, app: &App) {
	let items = app
		.communities
		.iter()
		.map(|community| {
			let mark = if app.state.selection.contains(community) { "[x]" } else { "[ ]" };
			let color = app.palette.community_color_or_default(community);
			ListItem::new(Line::from(vec![
				Span::raw(format!("{mark} ")),
				Span::styled("● ", color_style(&color)),
				Span::raw(community.to_string()),
			]))
		})
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !app.communities.is_empty() {
		state.select(Some(app.community_index.min(app.communities.len() - 1)));
	}

	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(no communities)")]
	} else {
		items
	})
	.block(
		Block::default()
			.borders(Borders::ALL)
			.title("Communities")
			.border_style(border_style(true)),
	)
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_list_panel(frame: &mut Frame, area: Rect, app: &App, list: &ListView) {
	let mut lines = Vec::new();
	if let Some(empty) = list.empty_state {
		lines.push(Line::from(Span::styled(
			empty.message(),
			Style::default().fg(Color::DarkGray),
		)));
	}

	for section in &list.sections {
		lines.push(Line::from(Span::styled(
			section.title.clone(),
			Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
		)));
		for event in &section.items {
			lines.push(render_event_line(event, &app.palette));
		}
		lines.push(Line::from(""));
	}

	let panel = Paragraph::new(lines).block(
		Block::default()
			.borders(Borders::ALL)
			.title(list.banner.clone())
			.border_style(border_style(false)),
	);
	frame.render_widget(panel, area);
}

fn render_event_line(event: &Event, palette: &Palette) -> Line<'static> {
	let community_color = palette.community_color_or_default(&event.community);
	let organizer_style = palette
		.organizer_color(&event.organizer)
		.map(|color| color_style(&color))
		.unwrap_or_default();

	let mut spans = vec![
		Span::raw(format!("{} ", event.start.format("%a %d"))),
		Span::styled(format!("{:<14}", event.time_display()), Style::default().fg(Color::Gray)),
		Span::styled("● ", color_style(&community_color)),
		Span::styled(event.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
		Span::raw(" | "),
		Span::styled(event.organizer.clone(), organizer_style),
	];

	if let Some(location) = &event.location {
		spans.push(Span::raw(format!(" @ {location}")));
	}

	Line::from(spans)
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = vec![
		Line::from("←/→ or N/n month | t today | j/k move | space toggle community | a all/none | q quit"),
		Line::from("p hide/show past events | u month/upcoming list | r reload events"),
		Line::from(app.status.clone()),
	];

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn handle_key(app: &mut App, code: KeyCode, now: NaiveDateTime) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => return true,
		KeyCode::Left | KeyCode::Char('N') | KeyCode::Char('h') => {
			app.update(ViewState::previous_month);
		}
		KeyCode::Right | KeyCode::Char('n') | KeyCode::Char('l') => {
			app.update(ViewState::next_month);
		}
		KeyCode::Char('t') => {
			let today = MonthNavigator::starting_at(now.date());
			app.update(|state| ViewState {
				navigator: today,
				..state
			});
		}
		KeyCode::Up | KeyCode::Char('k') => {
			app.community_index = app.community_index.saturating_sub(1);
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if !app.communities.is_empty() {
				app.community_index = (app.community_index + 1).min(app.communities.len() - 1);
			}
		}
		KeyCode::Char(' ') => {
			if let Some(community) = app.communities.get(app.community_index).cloned() {
				app.update(|state| state.toggle_community(&community));
				app.status = format!("Toggled {community}");
			}
		}
		KeyCode::Char('a') => {
			let everything: BTreeSet<Community> = app.communities.iter().cloned().collect();
			let selection = if app.state.selection == everything {
				BTreeSet::new()
			} else {
				everything
			};
			app.update(|state| ViewState { selection, ..state });
		}
		KeyCode::Char('p') => {
			app.update(ViewState::toggle_hide_past);
			app.status = if app.state.hide_past {
				"Hiding past events".to_string()
			} else {
				"Showing past events".to_string()
			};
		}
		KeyCode::Char('u') => {
			app.update(ViewState::toggle_list_mode);
		}
		KeyCode::Char('r') => {
			app.reload();
		}
		_ => {}
	}

	false
}

fn build_view(app: &App, now: NaiveDateTime) -> ViewModel {
	ViewModel {
		calendar: derive_calendar_view(&app.events, &app.state.selection, app.palette.resolver()),
		list: derive_list_view(&app.events, &app.state, now),
		today: now.date(),
	}
}

fn color_style(color_name: &str) -> Style {
	color_from_name(color_name)
		.map(|color| Style::default().fg(color))
		.unwrap_or_default()
}

fn color_from_name(color_name: &str) -> Option<Color> {
	match color_name {
		"black" => Some(Color::Black),
		"red" => Some(Color::Red),
		"green" => Some(Color::Green),
		"yellow" => Some(Color::Yellow),
		"blue" => Some(Color::Blue),
		"magenta" => Some(Color::Magenta),
		"cyan" => Some(Color::Cyan),
		"gray" => Some(Color::Gray),
		"dark_gray" => Some(Color::DarkGray),
		"light_red" => Some(Color::LightRed),
		"light_green" => Some(Color::LightGreen),
		"light_yellow" => Some(Color::LightYellow),
		"light_blue" => Some(Color::LightBlue),
		"light_magenta" => Some(Color::LightMagenta),
		"light_cyan" => Some(Color::LightCyan),
		"white" => Some(Color::White),
		_ => None,
	}
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}

/// Selector rows: the known communities, whatever the data carries, and
/// anything already selected.
fn community_rows(events: &[Event], state: &ViewState) -> Vec<Community> {
	let mut rows = communities_in(events);
	rows.extend(Community::known());
	rows.extend(state.selection.iter().cloned());
	rows.into_iter().collect()
}

struct App {
	events_path: PathBuf,
	events: Vec<Event>,
	palette: Palette,
	state: ViewState,
	fixed_now: Option<NaiveDateTime>,
	communities: Vec<Community>,
	community_index: usize,
	status: String,
}

impl App {
	fn new(dashboard: Dashboard) -> Self {
		let communities = community_rows(&dashboard.events, &dashboard.state);
		Self {
			events_path: dashboard.events_path,
			events: dashboard.events,
			palette: dashboard.palette,
			state: dashboard.state,
			fixed_now: dashboard.fixed_now,
			communities,
			community_index: 0,
			status: "Ready".to_string(),
		}
	}

	/// Replaces the view state with the result of `transition`.
	fn update(&mut self, transition: impl FnOnce(ViewState) -> ViewState) {
		self.state = transition(self.state.clone());
	}

	fn reload(&mut self) {
		match load_events(&self.events_path) {
			Ok(normalized) => {
				info!(
					"event=events_reloaded module=ui events={} skipped={}",
					normalized.events.len(),
					normalized.skipped.len()
				);
				self.status = if normalized.skipped.is_empty() {
					format!("Reloaded {} events", normalized.events.len())
				} else {
					format!(
						"Reloaded {} events, skipped {} malformed records",
						normalized.events.len(),
						normalized.skipped.len()
					)
				};
				self.events = normalized.events;
				self.communities = community_rows(&self.events, &self.state);
				if !self.communities.is_empty() {
					self.community_index = self.community_index.min(self.communities.len() - 1);
				}
			}
			Err(err) => {
				warn!("event=events_reload_failed module=ui reason=\"{}\"", err);
				self.status = format!("Reload failed: {err}");
			}
		}
	}
}

struct ViewModel {
	calendar: CalendarView,
	list: ListView,
	today: NaiveDate,
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;
	use std::path::PathBuf;

	use chrono::NaiveDate;
	use crossterm::event::KeyCode;

	use community_calendar::MonthNavigator;
	use community_calendar::config::Config;
	use community_calendar::domain::{Community, Event};
	use community_calendar::sections::ListMode;
	use community_calendar::view::ViewState;

	use super::{App, Dashboard, build_view, color_from_name, handle_key};

	fn app() -> App {
		let start = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap().and_hms_opt(0, 0, 0).unwrap();
		let events = vec![Event {
			id: "fest".to_string(),
			title: "Fest".to_string(),
			community: Community::Latino,
			start,
			end: start,
			all_day: true,
			location: None,
			description: String::new(),
			organizer: "unknown".to_string(),
		}];
		App::new(Dashboard {
			events_path: PathBuf::from("unused.json"),
			events,
			palette: Config::default().palette(),
			state: ViewState::new(
				BTreeSet::from([Community::Latino]),
				MonthNavigator::at(2024, 7).unwrap(),
			),
			fixed_now: Some(start),
		})
	}

	#[test]
	fn keys_drive_the_view_state() {
		let mut app = app();
		let now = app.fixed_now.unwrap();

		assert!(!handle_key(&mut app, KeyCode::Right, now));
		assert_eq!(app.state.navigator.current(), (2024, 8));
		handle_key(&mut app, KeyCode::Char('t'), now);
		assert_eq!(app.state.navigator.current(), (2024, 7));

		handle_key(&mut app, KeyCode::Char('p'), now);
		assert!(app.state.hide_past);
		handle_key(&mut app, KeyCode::Char('u'), now);
		assert_eq!(app.state.list_mode, ListMode::Upcoming);
		assert!(handle_key(&mut app, KeyCode::Char('q'), now));
	}

	#[test]
	fn toggling_the_only_selection_empties_the_calendar() {
		let mut app = app();
		let now = app.fixed_now.unwrap();
		let latino_row = app
			.communities
			.iter()
			.position(|community| *community == Community::Latino)
			.unwrap();
		app.community_index = latino_row;

		assert_eq!(build_view(&app, now).calendar.markers.len(), 1);
		handle_key(&mut app, KeyCode::Char(' '), now);
		let view = build_view(&app, now);
		assert!(view.calendar.markers.is_empty());
		assert!(view.list.empty_state.is_some());
	}

	#[test]
	fn selector_lists_known_communities() {
		let app = app();
		assert!(app.communities.contains(&Community::PacificIslander));
		assert!(app.communities.contains(&Community::Latino));
	}

	#[test]
	fn maps_palette_names_to_terminal_colors() {
		assert!(color_from_name("light_cyan").is_some());
		assert!(color_from_name("chartreuse").is_none());
	}
}

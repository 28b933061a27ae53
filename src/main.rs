mod ui;

use std::collections::BTreeSet;
use std::error::Error;
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use log::info;

use community_calendar::MonthNavigator;
use community_calendar::config::{
	Config, Palette, load_config, resolve_config_path, resolve_events_path, state_dir,
};
use community_calendar::domain::{Community, Event};
use community_calendar::filter::communities_in;
use community_calendar::logging::{LogTarget, default_log_level, init_logging};
use community_calendar::normalize::parse_date_field;
use community_calendar::sections::ListMode;
use community_calendar::storage::load_events;
use community_calendar::view::{ListView, ViewState, derive_calendar_view, derive_list_view};

use crate::ui::{Dashboard, run_dashboard};

#[derive(Debug, Parser)]
#[command(name = "community-calendar", about = "Community event calendar for the terminal")]
struct Cli {
	/// Event file (.json list or date-keyed object, or .jsonl)
	#[arg(long, global = true)]
	events: Option<PathBuf>,
	#[arg(long, global = true)]
	config: Option<PathBuf>,
	/// Community to show; repeat for several. Overrides the configured selection.
	#[arg(long = "community", global = true)]
	communities: Vec<String>,
	/// Reference instant, YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]. Defaults to the local clock.
	#[arg(long, global = true)]
	now: Option<String>,
	#[arg(long, global = true)]
	log_level: Option<String>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Dashboard,
	Markers {
		#[arg(long)]
		json: bool,
	},
	List {
		#[arg(long, allow_negative_numbers = true)]
		year: Option<i32>,
		#[arg(long, allow_negative_numbers = true)]
		month: Option<i64>,
		#[arg(long, conflicts_with = "show_past")]
		hide_past: bool,
		#[arg(long)]
		show_past: bool,
		#[arg(long)]
		json: bool,
	},
	Upcoming {
		#[arg(long)]
		json: bool,
	},
	Communities,
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let command = cli.command.unwrap_or(Command::Dashboard);

	let target = match command {
		Command::Dashboard => LogTarget::Directory(state_dir().join("logs")),
		_ => LogTarget::Stderr,
	};
	let level = cli.log_level.as_deref().unwrap_or(default_log_level());
	let _logger = init_logging(level, &target)?;

	let config = load_config(&resolve_config_path(cli.config))?;
	let palette = config.palette();
	let events_path = resolve_events_path(cli.events)?;
	let normalized = load_events(&events_path)?;
	if !normalized.skipped.is_empty() {
		info!(
			"event=malformed_records module=main skipped={} path={}",
			normalized.skipped.len(),
			events_path.display()
		);
	}
	let events = normalized.events;

	let fixed_now = cli.now.as_deref().map(parse_reference).transpose()?;
	let reference = fixed_now.unwrap_or_else(|| Local::now().naive_local());
	let selection = initial_selection(&config, &cli.communities, &events);
	let state = ViewState::new(selection, MonthNavigator::starting_at(reference.date()))
		.with_hide_past(config.hide_past);

	match command {
		Command::Dashboard => {
			run_dashboard(Dashboard {
				events_path,
				events,
				palette,
				state,
				fixed_now,
			})?;
		}
		Command::Markers { json } => {
			print_markers(&events, &state, &palette, json)?;
		}
		Command::List {
			year,
			month,
			hide_past,
			show_past,
			json,
		} => {
			let navigator = if year.is_some() || month.is_some() {
				MonthNavigator::at(
					year.unwrap_or(state.navigator.year()),
					month.unwrap_or(i64::from(state.navigator.month())),
				)?
			} else {
				state.navigator
			};
			let hide_past = (state.hide_past || hide_past) && !show_past;
			let state = ViewState { navigator, ..state }.with_hide_past(hide_past);
			print_list_view(&derive_list_view(&events, &state, reference), json)?;
		}
		Command::Upcoming { json } => {
			let state = state.with_list_mode(ListMode::Upcoming);
			print_list_view(&derive_list_view(&events, &state, reference), json)?;
		}
		Command::Communities => {
			print_communities(&events, &state, &palette);
		}
	}

	Ok(())
}

fn parse_reference(input: &str) -> Result<NaiveDateTime, Box<dyn Error>> {
	let (date, time) = parse_date_field(input).ok_or_else(|| {
		format!("invalid --now value `{input}`; expected YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]")
	})?;
	Ok(date.and_time(time.unwrap_or(NaiveTime::MIN)))
}

fn initial_selection(config: &Config, cli_communities: &[String], events: &[Event]) -> BTreeSet<Community> {
	if !cli_communities.is_empty() {
		return cli_communities
			.iter()
			.map(|label| Community::from(label.as_str()))
			.collect();
	}
	config.initial_selection(&communities_in(events))
}

fn print_markers(events: &[Event], state: &ViewState, palette: &Palette, json: bool) -> Result<(), Box<dyn Error>> {
	let view = derive_calendar_view(events, &state.selection, palette.resolver());
	if json {
		println!("{}", serde_json::to_string_pretty(&view)?);
		return Ok(());
	}

	if let Some(empty) = view.empty_state {
		println!("{}", empty.message());
		return Ok(());
	}

	for marker in view.markers.values() {
		println!("{} | {}", marker.date, marker.colors.join(", "));
	}

	Ok(())
}

fn print_list_view(view: &ListView, json: bool) -> Result<(), Box<dyn Error>> {
	if json {
		println!("{}", serde_json::to_string_pretty(view)?);
		return Ok(());
	}

	println!("{}", view.banner);
	if let Some(empty) = view.empty_state {
		println!("{}", empty.message());
		return Ok(());
	}

	for section in &view.sections {
		println!("\n{}:", section.title);
		for event in &section.items {
			println!(
				"{} | {} | {} | {} | {}",
				event.start.format("%a %d %b"),
				event.time_display(),
				event.title,
				event.community,
				event.location.as_deref().unwrap_or("(no location)")
			);
		}
	}

	Ok(())
}

fn print_communities(events: &[Event], state: &ViewState, palette: &Palette) {
	let mut rows = communities_in(events);
	rows.extend(state.selection.iter().cloned());
	if rows.is_empty() {
		println!("no communities yet");
		return;
	}

	for community in rows {
		let count = events.iter().filter(|event| event.community == community).count();
		let mark = if state.selection.contains(&community) { "x" } else { " " };
		println!(
			"[{}] {} | {} | {} events",
			mark,
			community,
			palette.community_color_or_default(&community),
			count
		);
	}
}

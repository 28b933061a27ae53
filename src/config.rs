use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Community;
use crate::markers::DEFAULT_MARKER_COLOR;

const APP_DIR: &str = "community_calendar";
const CONFIG_FILE: &str = "config.toml";
const CONFIG_ENV: &str = "COMMUNITY_CALENDAR_CONFIG";
const EVENTS_ENV: &str = "COMMUNITY_CALENDAR_EVENTS";
const STATE_ENV: &str = "COMMUNITY_CALENDAR_STATE_DIR";

pub const COLOR_NAMES: [&str; 16] = [
	"black",
	"red",
	"green",
	"yellow",
	"blue",
	"magenta",
	"cyan",
	"gray",
	"dark_gray",
	"light_red",
	"light_green",
	"light_yellow",
	"light_blue",
	"light_magenta",
	"light_cyan",
	"white",
];

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("io error reading {path}: {source}")]
	Io { path: String, source: std::io::Error },
	#[error("failed to parse config {path}: {source}")]
	TomlDecode { path: String, source: toml::de::Error },
	#[error("unknown color `{color}` for {key}; expected one of: {}", COLOR_NAMES.join(", "))]
	UnknownColor { key: String, color: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub default_color: String,
	pub hide_past: bool,
	/// Communities selected at startup. `None` selects every community in the data.
	pub selected: Option<Vec<String>>,
	pub community_colors: BTreeMap<String, String>,
	pub organizer_colors: BTreeMap<String, String>,
}

impl Default for Config {
	fn default() -> Self {
		let community_colors = [
			(Community::Latino, "yellow"),
			(Community::PacificIslander, "cyan"),
			(Community::Unclassified, "gray"),
		]
		.into_iter()
		.map(|(community, color)| (community.to_string(), color.to_string()))
		.collect();

		Self {
			default_color: DEFAULT_MARKER_COLOR.to_string(),
			hide_past: false,
			selected: None,
			community_colors,
			organizer_colors: BTreeMap::new(),
		}
	}
}

impl Config {
	pub fn palette(&self) -> Palette {
		Palette {
			default_color: self.default_color.clone(),
			community_colors: self
				.community_colors
				.iter()
				.map(|(community, color)| (Community::from(community.as_str()), color.clone()))
				.collect(),
			organizer_colors: self.organizer_colors.clone(),
		}
	}

	/// Startup selection; falls back to `available` when none is configured.
	pub fn initial_selection(&self, available: &BTreeSet<Community>) -> BTreeSet<Community> {
		match &self.selected {
			Some(selected) => selected.iter().map(|label| Community::from(label.as_str())).collect(),
			None => available.clone(),
		}
	}

	fn validate(&self) -> Result<(), ConfigError> {
		check_color("default_color", &self.default_color)?;
		for (community, color) in &self.community_colors {
			check_color(&format!("community `{community}`"), color)?;
		}
		for (organizer, color) in &self.organizer_colors {
			check_color(&format!("organizer `{organizer}`"), color)?;
		}
		Ok(())
	}
}

/// Color resolution for communities and organizers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
	default_color: String,
	community_colors: BTreeMap<Community, String>,
	organizer_colors: BTreeMap<String, String>,
}

impl Palette {
	pub fn community_color(&self, community: &Community) -> Option<String> {
		self.community_colors.get(community).cloned()
	}

	/// Like [`Palette::community_color`] but never empty-handed.
	pub fn community_color_or_default(&self, community: &Community) -> String {
		self.community_color(community)
			.unwrap_or_else(|| self.default_color.clone())
	}

	pub fn organizer_color(&self, organizer: &str) -> Option<String> {
		self.organizer_colors.get(organizer).cloned()
	}

	/// Resolver for marker aggregation; unknown communities get this palette's default.
	pub fn resolver(&self) -> impl Fn(&Community) -> Option<String> + '_ {
		move |community: &Community| Some(self.community_color_or_default(community))
	}
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
	let raw = match fs::read_to_string(path) {
		Ok(content) => content,
		Err(err) if err.kind() == ErrorKind::NotFound => {
			debug!("event=config_defaults module=config path={}", path.display());
			return Ok(Config::default());
		}
		Err(source) => {
			return Err(ConfigError::Io {
				path: path.display().to_string(),
				source,
			});
		}
	};

	let config: Config = toml::from_str(&raw).map_err(|source| ConfigError::TomlDecode {
		path: path.display().to_string(),
		source,
	})?;
	config.validate()?;
	Ok(config)
}

pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
	if let Some(path) = cli_path {
		return path;
	}

	if let Some(path) = non_empty_env(CONFIG_ENV) {
		return path;
	}

	config_dir().join(CONFIG_FILE)
}

pub fn resolve_events_path(cli_path: Option<PathBuf>) -> Result<PathBuf, std::io::Error> {
	if let Some(path) = cli_path {
		return Ok(path);
	}

	if let Some(path) = non_empty_env(EVENTS_ENV) {
		return Ok(path);
	}

	Err(std::io::Error::new(
		ErrorKind::NotFound,
		"no event file selected: pass --events <path> or set COMMUNITY_CALENDAR_EVENTS",
	))
}

pub fn state_dir() -> PathBuf {
	if let Some(path) = non_empty_env(STATE_ENV) {
		return path;
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".local").join("state").join(APP_DIR);
	}

	PathBuf::from(".community_calendar")
}

fn config_dir() -> PathBuf {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("APPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_CONFIG_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".config").join(APP_DIR);
	}

	PathBuf::from(".community_calendar")
}

fn non_empty_env(key: &str) -> Option<PathBuf> {
	env::var_os(key)
		.filter(|value| !value.is_empty())
		.map(PathBuf::from)
}

fn check_color(key: &str, color: &str) -> Result<(), ConfigError> {
	if COLOR_NAMES.contains(&color) {
		return Ok(());
	}
	Err(ConfigError::UnknownColor {
		key: key.to_string(),
		color: color.to_string(),
	})
}

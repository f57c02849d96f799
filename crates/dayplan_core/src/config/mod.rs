use crate::error::AppError;
use crate::filter::TypeFilter;
use crate::model::EventType;
use crate::reminder::DEFAULT_LEAD_MINUTES;
use crate::storage::app_file;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "DAYPLAN_CONFIG_PATH";
pub const MAX_LEAD_MINUTES: u32 = 7 * 24 * 60;
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI colours for CLI output; `None` leaves text unstyled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Palette {
    pub accent: Option<&'static str>,
    pub muted: Option<&'static str>,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        paint(self.accent, text)
    }

    pub fn mutedize(&self, text: &str) -> String {
        paint(self.muted, text)
    }
}

fn paint(code: Option<&str>, text: &str) -> String {
    match code {
        Some(code) => format!("{code}{text}{ANSI_RESET}"),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Noir,
    Solarized,
}

impl Theme {
    /// Loose lookup: any casing or separators, a few aliases, unknown names
    /// fall back to `Default`.
    pub fn from_name(raw: &str) -> Self {
        match canonicalize_key(raw).as_str() {
            "noir" | "dark" | "dark_mode" | "darkmode" => Theme::Noir,
            "solarized" => Theme::Solarized,
            _ => Theme::Default,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Default => Palette::default(),
            Theme::Noir => Palette {
                accent: Some("\x1b[38;5;208m"),
                muted: Some("\x1b[38;5;250m"),
            },
            Theme::Solarized => Palette {
                accent: Some("\x1b[38;5;108m"),
                muted: Some("\x1b[38;5;246m"),
            },
        }
    }
}

impl<'de> Deserialize<'de> for Theme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Theme::from_name(&raw))
    }
}

/// Lowercases ASCII alphanumerics and collapses every other run into `_`.
pub fn canonicalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            key.push(ch.to_ascii_lowercase());
        } else if !key.is_empty() && !key.ends_with('_') {
            key.push('_');
        }
    }
    key.trim_end_matches('_').to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_lead_minutes")]
    pub reminder_lead_minutes: u32,
    #[serde(default = "default_types")]
    pub default_types: Vec<EventType>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::Default,
            reminder_lead_minutes: DEFAULT_LEAD_MINUTES,
            default_types: default_types(),
        }
    }
}

impl Config {
    pub fn type_filter(&self) -> TypeFilter {
        TypeFilter::only(self.default_types.iter().copied())
    }

    pub fn palette(&self) -> Palette {
        self.theme.palette()
    }
}

fn default_lead_minutes() -> u32 {
    DEFAULT_LEAD_MINUTES
}

fn default_types() -> Vec<EventType> {
    EventType::ALL.to_vec()
}

/// A usable config plus the error that forced defaults, if any.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

impl ConfigLoad {
    fn from_result(result: Result<Config, AppError>) -> Self {
        match result {
            Ok(config) => Self {
                config,
                error: None,
            },
            Err(err) => Self {
                config: Config::default(),
                error: Some(err),
            },
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<Theme>,
    pub reminder_lead_minutes: Option<u32>,
    pub default_types: Option<Vec<EventType>>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    app_file(CONFIG_ENV_VAR, CONFIG_FILE_NAME)
}

/// Never fails: a missing file yields defaults, a broken one yields defaults
/// plus the error for the caller to report.
pub fn load_config_with_fallback() -> ConfigLoad {
    ConfigLoad::from_result(config_path().and_then(|path| load_optional_config(&path)))
}

fn load_optional_config(path: &Path) -> Result<Config, AppError> {
    if path.exists() {
        load_config_from_path(path)
    } else {
        Ok(Config::default())
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;

    if config.reminder_lead_minutes > MAX_LEAD_MINUTES {
        return Err(AppError::invalid_data(format!(
            "reminder_lead_minutes must be at most {MAX_LEAD_MINUTES}"
        )));
    }
    Ok(normalize(config))
}

fn normalize(mut config: Config) -> Config {
    config.default_types.sort();
    config.default_types.dedup();
    config
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme {
        merged.theme = theme;
    }
    if let Some(minutes) = overrides.reminder_lead_minutes {
        merged.reminder_lead_minutes = minutes;
    }
    if let Some(types) = &overrides.default_types {
        merged.default_types = types.clone();
    }
    normalize(merged)
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use autopad_core::calendar::{CalendarDate, CalendarState};
use autopad_core::model::{Locale, RangeId};
use autopad_core::session::{Scenario, SessionConfig};
use serde::Deserialize;

use crate::preset;

pub const DEFAULT_CONFIG_FILE: &str = "autopad.toml";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub calendar: CalendarSettings,
    pub session: SessionSettings,
    pub transport: TransportSettings,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CalendarSettings {
    pub day: u8,
    pub month: u8,
    pub year: u16,
    pub skips: u32,
    pub locale: String,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            day: 1,
            month: 1,
            year: 2020,
            skips: 3,
            locale: Locale::Jp.token().into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionSettings {
    pub echo_count: u32,
    pub poll_interval_ms: u64,
    pub preset: String,
    // Table file in the storage text format; the bundled preset when unset.
    pub table: Option<PathBuf>,
    // Range tokens played in order after setup instead of the calendar.
    pub script: Option<Vec<String>>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            echo_count: 0,
            poll_interval_ms: 8,
            preset: preset::DAY_SKIPPER.into(),
            table: None,
            script: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransportSettings {
    pub device: PathBuf,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/hidg0"),
        }
    }
}

impl Settings {
    pub fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let calendar = &self.calendar;
        let locale = Locale::from_token(&calendar.locale)
            .ok_or_else(|| anyhow!("unknown locale `{}`, expected jp, eu or us", calendar.locale))?;
        let date = CalendarDate::new(calendar.day, calendar.month, calendar.year)
            .context("invalid start date")?;

        let scenario = match &self.session.script {
            Some(tokens) => Scenario::Script(parse_script(tokens)?),
            None if self.session.preset == preset::AUTO_HOST => {
                Scenario::Script(preset::AUTO_HOST_SCRIPT.to_vec())
            }
            None => Scenario::Calendar,
        };

        Ok(SessionConfig {
            calendar: CalendarState::new(date, calendar.skips, locale),
            echo_count: self.session.echo_count,
            scenario,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.session.poll_interval_ms.max(1))
    }
}

fn parse_script(tokens: &[String]) -> anyhow::Result<Vec<RangeId>> {
    tokens
        .iter()
        .map(|token| {
            RangeId::from_token(token).ok_or_else(|| anyhow!("unknown range `{token}` in script"))
        })
        .collect()
}

pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = match path {
        Some(path) => parse_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                parse_file(default_path)?
            } else {
                Settings::default()
            }
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn parse_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_settings(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

pub fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str::<Settings>(raw)?)
}

pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("AUTOPAD__DAY") {
        settings.calendar.day = parse_env(&v, "AUTOPAD__DAY")?;
    }
    if let Some(v) = lookup("AUTOPAD__MONTH") {
        settings.calendar.month = parse_env(&v, "AUTOPAD__MONTH")?;
    }
    if let Some(v) = lookup("AUTOPAD__YEAR") {
        settings.calendar.year = parse_env(&v, "AUTOPAD__YEAR")?;
    }
    if let Some(v) = lookup("AUTOPAD__SKIPS") {
        settings.calendar.skips = parse_env(&v, "AUTOPAD__SKIPS")?;
    }
    if let Some(v) = lookup("AUTOPAD__LOCALE") {
        settings.calendar.locale = v;
    }
    if let Some(v) = lookup("AUTOPAD__PRESET") {
        settings.session.preset = v;
    }
    if let Some(v) = lookup("AUTOPAD__ECHO_COUNT") {
        settings.session.echo_count = parse_env(&v, "AUTOPAD__ECHO_COUNT")?;
    }
    if let Some(v) = lookup("AUTOPAD__DEVICE") {
        settings.transport.device = PathBuf::from(v);
    }

    Ok(())
}

fn parse_env<T: std::str::FromStr>(value: &str, key: &str) -> anyhow::Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| anyhow!("cannot parse {key}={value}"))
}

// src/piggyback/timesettings.rs

//! [`PiggybackTimeSettings`]: how long piggyback data stays usable.
//!
//! Settings are given as `[HOST:]KEY=VALUE`. Without `HOST` a setting is
//! global. For a (source, target) pair the most specific setting wins:
//! one for the target, then one for the source, then the global one.
//!
//! | key               | meaning                                              |
//! |-------------------|------------------------------------------------------|
//! | `max_cache_age`   | seconds a payload stays usable, default 3600         |
//! | `validity_period` | seconds an abandoned payload stays usable            |
//! | `validity_state`  | status reported while an abandoned payload is usable |

use crate::piggyback::Seconds;

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Error, ErrorKind, Result};
use std::str::FromStr;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Default global `max_cache_age`, in seconds.
pub const MAX_CACHE_AGE_DEFAULT: i64 = 3600;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TimeSettingKey {
    MaxCacheAge,
    ValidityPeriod,
    ValidityState,
}

impl TimeSettingKey {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TimeSettingKey::MaxCacheAge => "max_cache_age",
            TimeSettingKey::ValidityPeriod => "validity_period",
            TimeSettingKey::ValidityState => "validity_state",
        }
    }
}

impl FromStr for TimeSettingKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<TimeSettingKey> {
        match s {
            "max_cache_age" => Ok(TimeSettingKey::MaxCacheAge),
            "validity_period" => Ok(TimeSettingKey::ValidityPeriod),
            "validity_state" => Ok(TimeSettingKey::ValidityState),
            _ => Err(Error::new(ErrorKind::InvalidInput, format!("Unknown piggyback time setting: {:?}", s))),
        }
    }
}

impl fmt::Display for TimeSettingKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One parsed `[HOST:]KEY=VALUE` setting.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimeSetting {
    /// `None` for a global setting
    pub host: Option<String>,
    pub key: TimeSettingKey,
    pub value: i64,
}

impl FromStr for TimeSetting {
    type Err = Error;

    fn from_str(s: &str) -> Result<TimeSetting> {
        let invalid = |msg: &str| Error::new(ErrorKind::InvalidInput, format!("{} in setting {:?}, expected [HOST:]KEY=VALUE", msg, s));
        let (name, value) = s.split_once('=').ok_or_else(|| invalid("missing '='"))?;
        let (host, key) = match name.rsplit_once(':') {
            Some((host, key)) if !host.is_empty() => (Some(host.to_string()), key),
            Some((_, key)) => (None, key),
            None => (None, name),
        };
        let key: TimeSettingKey = key.trim().parse()?;
        let value: i64 = value.trim().parse().map_err(|_| invalid("invalid number"))?;
        if value < 0 && key != TimeSettingKey::ValidityState {
            return Err(invalid("negative number"));
        }

        Ok(TimeSetting { host, key, value })
    }
}

/// All time settings, see the module documentation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PiggybackTimeSettings {
    global: BTreeMap<TimeSettingKey, i64>,
    per_host: BTreeMap<(String, TimeSettingKey), i64>,
}

impl Default for PiggybackTimeSettings {
    fn default() -> Self {
        let mut global = BTreeMap::new();
        global.insert(TimeSettingKey::MaxCacheAge, MAX_CACHE_AGE_DEFAULT);
        PiggybackTimeSettings {
            global,
            per_host: BTreeMap::new(),
        }
    }
}

impl PiggybackTimeSettings {
    pub fn new() -> PiggybackTimeSettings {
        PiggybackTimeSettings::default()
    }

    /// Settings from `settings`, later settings overriding earlier ones.
    pub fn from_settings<I: IntoIterator<Item = TimeSetting>>(settings: I) -> PiggybackTimeSettings {
        let mut time_settings = PiggybackTimeSettings::new();
        for setting in settings {
            time_settings.insert(setting);
        }

        time_settings
    }

    /// Parse `[HOST:]KEY=VALUE` strings.
    pub fn from_strs<S: AsRef<str>>(settings: &[S]) -> Result<PiggybackTimeSettings> {
        let parsed: Vec<TimeSetting> = settings
            .iter()
            .map(|s| s.as_ref().parse::<TimeSetting>())
            .collect::<Result<Vec<TimeSetting>>>()?;

        Ok(PiggybackTimeSettings::from_settings(parsed))
    }

    pub fn insert(
        &mut self,
        setting: TimeSetting,
    ) {
        defñ!("{:?}", setting);
        match setting.host {
            Some(host) => {
                self.per_host.insert((host, setting.key), setting.value);
            }
            None => {
                self.global.insert(setting.key, setting.value);
            }
        }
    }

    fn host_value(
        &self,
        host: &str,
        key: TimeSettingKey,
    ) -> Option<i64> {
        self.per_host.get(&(host.to_string(), key)).copied()
    }

    /// The most specific value of `key` for the pair (`source`, `target`).
    pub fn get(
        &self,
        source: &str,
        target: &str,
        key: TimeSettingKey,
    ) -> Option<i64> {
        self.host_value(target, key)
            .or_else(|| self.host_value(source, key))
            .or_else(|| self.global.get(&key).copied())
    }

    pub fn max_cache_age(
        &self,
        source: &str,
        target: &str,
    ) -> Seconds {
        self.get(source, target, TimeSettingKey::MaxCacheAge)
            .unwrap_or(MAX_CACHE_AGE_DEFAULT) as Seconds
    }

    pub fn validity_period(
        &self,
        source: &str,
        target: &str,
    ) -> Option<Seconds> {
        self.get(source, target, TimeSettingKey::ValidityPeriod)
            .map(|v| v as Seconds)
    }

    pub fn validity_state(
        &self,
        source: &str,
        target: &str,
    ) -> i64 {
        self.get(source, target, TimeSettingKey::ValidityState)
            .unwrap_or(0)
    }

    /// The global `max_cache_age`.
    pub fn global_max_cache_age(&self) -> Seconds {
        self.global
            .get(&TimeSettingKey::MaxCacheAge)
            .copied()
            .unwrap_or(MAX_CACHE_AGE_DEFAULT) as Seconds
    }

    /// The greatest `max_cache_age` of `source` for any of `targets`, or the
    /// source's own (else global) value if `targets` is empty.
    pub fn max_cache_age_of_source<S: AsRef<str>>(
        &self,
        source: &str,
        targets: &[S],
    ) -> Seconds {
        targets
            .iter()
            .map(|target| self.max_cache_age(source, target.as_ref()))
            .fold(None, |acc: Option<Seconds>, age| Some(acc.map_or(age, |a| a.max(age))))
            .unwrap_or_else(|| {
                self.host_value(source, TimeSettingKey::MaxCacheAge)
                    .map(|v| v as Seconds)
                    .unwrap_or_else(|| self.global_max_cache_age())
            })
    }
}

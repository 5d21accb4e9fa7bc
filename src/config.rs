use crate::errors::ConfigError;
use crate::timezone::{TargetZone, ZoneDeriver};
use chrono::FixedOffset;
use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// UTC+05:30.
pub const DEFAULT_SOURCE_OFFSET_MINUTES: i32 = 330;
pub const DEFAULT_TARGET_ZONES: &str =
    "EST=America/New_York,PDT=America/Los_Angeles,BST=Europe/London";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub remote_endpoint: String,
    pub remote_timeout: Duration,
    pub source_offset: FixedOffset,
    pub target_zones: Vec<TargetZone>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;

        let remote_endpoint = lookup("REMOTE_ENDPOINT")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing("REMOTE_ENDPOINT"))?;

        let timeout_secs = parse_or(
            "REMOTE_TIMEOUT_SECS",
            lookup("REMOTE_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;

        let offset_raw = lookup("SOURCE_UTC_OFFSET_MINUTES");
        let offset_minutes = parse_or(
            "SOURCE_UTC_OFFSET_MINUTES",
            offset_raw.clone(),
            DEFAULT_SOURCE_OFFSET_MINUTES,
        )?;
        let source_offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
            ConfigError::Invalid {
                name: "SOURCE_UTC_OFFSET_MINUTES",
                value: offset_raw.unwrap_or_default(),
            }
        })?;

        let target_zones = lookup("TARGET_ZONES")
            .unwrap_or_else(|| DEFAULT_TARGET_ZONES.to_string())
            .split(',')
            .filter(|spec| !spec.trim().is_empty())
            .map(TargetZone::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            port,
            remote_endpoint,
            remote_timeout: Duration::from_secs(timeout_secs),
            source_offset,
            target_zones,
        })
    }

    pub fn deriver(&self) -> ZoneDeriver {
        ZoneDeriver::new(self.source_offset, self.target_zones.clone())
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

use crate::errors::{ConfigError, TimestampError};
use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;

/// Format of `localDateTime` values, as produced by a datetime-local input.
pub const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

const ZONE_TIME_FORMAT: &str = "%-I:%M %p %Z";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetZone {
    pub label: String,
    pub tz: Tz,
}

impl TargetZone {
    /// Parses `LABEL=Area/City`, e.g. `EST=America/New_York`.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let (label, name) = spec
            .split_once('=')
            .map(|(label, name)| (label.trim(), name.trim()))
            .filter(|(label, name)| !label.is_empty() && !name.is_empty())
            .ok_or_else(|| ConfigError::Invalid {
                name: "TARGET_ZONES",
                value: spec.to_string(),
            })?;
        let tz = name
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownZone(name.to_string()))?;

        Ok(Self {
            label: label.to_string(),
            tz,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedTimes {
    pub weekday: String,
    pub zone_times: BTreeMap<String, String>,
}

/// Converts wall-clock timestamps of the source zone into the target zones.
#[derive(Debug, Clone)]
pub struct ZoneDeriver {
    source_offset: FixedOffset,
    targets: Vec<TargetZone>,
}

impl ZoneDeriver {
    pub fn new(source_offset: FixedOffset, targets: Vec<TargetZone>) -> Self {
        Self {
            source_offset,
            targets,
        }
    }

    pub fn source_offset(&self) -> FixedOffset {
        self.source_offset
    }

    pub fn targets(&self) -> &[TargetZone] {
        &self.targets
    }

    pub fn derive(&self, local: &str) -> Result<DerivedTimes, TimestampError> {
        if local.trim().is_empty() {
            return Ok(DerivedTimes::default());
        }

        let naive = parse_local(local)
            .ok_or_else(|| TimestampError::InvalidTimestamp(local.to_string()))?;
        // A fixed offset has exactly one mapping for every local time.
        let instant = self
            .source_offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| TimestampError::InvalidTimestamp(local.to_string()))?;

        let zone_times = self
            .targets
            .iter()
            .map(|zone| {
                let there = instant.with_timezone(&zone.tz);
                (zone.label.clone(), there.format(ZONE_TIME_FORMAT).to_string())
            })
            .collect();

        Ok(DerivedTimes {
            weekday: naive.format("%A").to_string(),
            zone_times,
        })
    }
}

pub fn parse_local(local: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(local.trim(), LOCAL_FORMAT).ok()
}

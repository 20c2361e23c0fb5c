//! Load shapes
//!
//! A run either holds a constant number of virtual users for a fixed time or
//! ramps through a list of stages, interpolating linearly between targets.

use std::time::Duration;
use thiserror::Error;

/// Errors produced while parsing durations and stage lists
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseLoadError {
    #[error("invalid duration '{0}', expected e.g. 500ms, 30s, 1m or 1h")]
    Duration(String),

    #[error("invalid stage '{0}', expected <duration>:<target>")]
    Stage(String),

    #[error("at least one stage is required")]
    NoStages,
}

/// One ramping segment: move to `target` VUs over `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: u32,
}

impl Stage {
    pub fn new(duration: Duration, target: u32) -> Self {
        Self { duration, target }
    }
}

/// How many virtual users should be active over time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadProfile {
    Constant { vus: u32, duration: Duration },
    Ramping { stages: Vec<Stage> },
}

impl LoadProfile {
    /// Parses a stage list such as `30s:5,1m:10,30s:0`
    pub fn parse_stages(input: &str) -> Result<Self, ParseLoadError> {
        let stages = input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|raw| {
                let (duration, target) = raw
                    .split_once(':')
                    .ok_or_else(|| ParseLoadError::Stage(raw.to_string()))?;
                let target = target
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ParseLoadError::Stage(raw.to_string()))?;
                Ok(Stage::new(parse_duration(duration.trim())?, target))
            })
            .collect::<Result<Vec<_>, ParseLoadError>>()?;

        if stages.is_empty() {
            return Err(ParseLoadError::NoStages);
        }

        Ok(LoadProfile::Ramping { stages })
    }

    /// Total wall-clock length of the profile
    pub fn total_duration(&self) -> Duration {
        match self {
            LoadProfile::Constant { duration, .. } => *duration,
            LoadProfile::Ramping { stages } => stages.iter().map(|s| s.duration).sum(),
        }
    }

    /// Highest number of concurrent VUs the profile asks for
    pub fn max_vus(&self) -> u32 {
        match self {
            LoadProfile::Constant { vus, .. } => *vus,
            LoadProfile::Ramping { stages } => stages.iter().map(|s| s.target).max().unwrap_or(0),
        }
    }

    /// Target VU count at `elapsed` since the start of the run
    ///
    /// Ramping profiles start from zero and interpolate towards each stage's
    /// target, rounding to the nearest user. Past the end the target is zero.
    pub fn target_at(&self, elapsed: Duration) -> u32 {
        match self {
            LoadProfile::Constant { vus, duration } => {
                if elapsed < *duration {
                    *vus
                } else {
                    0
                }
            }
            LoadProfile::Ramping { stages } => {
                let mut from = 0u32;
                let mut stage_start = Duration::ZERO;

                for stage in stages {
                    let stage_end = stage_start + stage.duration;
                    if elapsed < stage_end {
                        let progress = (elapsed - stage_start).as_secs_f64()
                            / stage.duration.as_secs_f64();
                        let value =
                            from as f64 + (stage.target as f64 - from as f64) * progress;
                        return value.round().max(0.0) as u32;
                    }
                    from = stage.target;
                    stage_start = stage_end;
                }

                0
            }
        }
    }
}

/// Parses `500ms`, `30s`, `1m`, `2h`, or a bare number of seconds
pub fn parse_duration(input: &str) -> Result<Duration, ParseLoadError> {
    let err = || ParseLoadError::Duration(input.to_string());
    let input = input.trim();

    let (number, unit) = match input.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => input.split_at(idx),
        None => (input, "s"),
    };

    let value = number.parse::<u64>().map_err(|_| err())?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs).ok_or_else(err),
        "h" => value.checked_mul(3600).map(Duration::from_secs).ok_or_else(err),
        _ => Err(err()),
    }
}

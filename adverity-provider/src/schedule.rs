//! Datastream schedules and randomised start times

use adverity_core::provider::ProviderError;
use chrono::{NaiveTime, Timelike};
use rand::Rng;
use regex::Regex;
use thiserror::Error;

use crate::client::types::Schedule;

/// Accepted format of start time bounds (`hh:mm`, 24h)
pub const START_BOUND_PATTERN: &str = "^(0[0-9]|1[0-9]|2[0-3]):([0-5][0-9])$";

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("The expected format for start time bounds is hh:mm, got '{0}'")]
    InvalidBound(String),
}

impl From<ScheduleError> for ProviderError {
    fn from(err: ScheduleError) -> Self {
        ProviderError::new(err.to_string()).with_cause(err)
    }
}

/// Bounds for randomised schedule start times
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomiseConfig {
    pub randomise_start_time: bool,
    pub min_start: String,
    pub max_start: String,
}

impl Default for RandomiseConfig {
    fn default() -> Self {
        Self {
            randomise_start_time: false,
            min_start: "00:00".to_string(),
            max_start: "23:59".to_string(),
        }
    }
}

fn parse_bound(bound: &str) -> Result<NaiveTime, ScheduleError> {
    let pattern =
        Regex::new(START_BOUND_PATTERN).map_err(|_| ScheduleError::InvalidBound(bound.to_string()))?;
    if !pattern.is_match(bound) {
        return Err(ScheduleError::InvalidBound(bound.to_string()));
    }
    NaiveTime::parse_from_str(bound, "%H:%M").map_err(|_| ScheduleError::InvalidBound(bound.to_string()))
}

/// Random `HH:MM:SS` between `min` and `max`
///
/// A `max` earlier than `min` wraps past midnight.
pub fn random_start_time<R: Rng>(
    min: &str,
    max: &str,
    rng: &mut R,
) -> Result<String, ScheduleError> {
    let min = i64::from(parse_bound(min)?.num_seconds_from_midnight());
    let max = i64::from(parse_bound(max)?.num_seconds_from_midnight());

    let mut delta = max - min;
    if delta < 0 {
        delta += SECONDS_PER_DAY;
    }
    let seconds = if delta == 0 {
        min
    } else {
        (min + rng.gen_range(0..delta)) % SECONDS_PER_DAY
    };

    Ok(format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    ))
}

/// Give every schedule a random start time when the config asks for it
pub fn randomise_start_times<R: Rng>(
    schedules: &mut [Schedule],
    config: &RandomiseConfig,
    rng: &mut R,
) -> Result<(), ScheduleError> {
    if !config.randomise_start_time {
        return Ok(());
    }
    for schedule in schedules {
        schedule.start_time = Some(random_start_time(
            &config.min_start,
            &config.max_start,
            rng,
        )?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seconds(time: &str) -> i64 {
        let t = NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap();
        i64::from(t.num_seconds_from_midnight())
    }

    #[test]
    fn equal_bounds_return_the_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(random_start_time("06:30", "06:30", &mut rng).unwrap(), "06:30:00");
    }

    #[test]
    fn start_time_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let t = seconds(&random_start_time("02:00", "04:00", &mut rng).unwrap());
            assert!((7200..14400).contains(&t), "{} out of range", t);
        }
    }

    #[test]
    fn inverted_bounds_wrap_past_midnight() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let t = seconds(&random_start_time("23:00", "01:00", &mut rng).unwrap());
            assert!(t >= 82_800 || t < 3600, "{} out of range", t);
        }
    }

    #[test]
    fn malformed_bounds_are_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        for bad in ["24:00", "7:00", "07:60", "07-00"] {
            assert_eq!(
                random_start_time(bad, "08:00", &mut rng),
                Err(ScheduleError::InvalidBound(bad.to_string()))
            );
        }
    }

    #[test]
    fn randomising_is_opt_in() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut schedules = vec![Schedule {
            cron_preset: "CRON_EVERY_DAY".to_string(),
            time_range_preset: 2,
            start_time: None,
        }];

        randomise_start_times(&mut schedules, &RandomiseConfig::default(), &mut rng).unwrap();
        assert_eq!(schedules[0].start_time, None);

        let config = RandomiseConfig {
            randomise_start_time: true,
            min_start: "05:00".to_string(),
            max_start: "05:00".to_string(),
        };
        randomise_start_times(&mut schedules, &config, &mut rng).unwrap();
        assert_eq!(schedules[0].start_time.as_deref(), Some("05:00:00"));
    }
}

use std::env;
use std::time::Duration;

use hound_core::{AppError, AppResult};
use hound_domain::{RetentionLimit, TrackingDefaults};

#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub limit: Option<RetentionLimit>,
    pub interval: Option<Duration>,
}

impl SweeperConfig {
    pub fn load() -> AppResult<Self> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let limit =
            TrackingDefaults::parse(None, env::var("HOUND_DEFAULT_LIMIT").ok().as_deref())?.limit;
        let interval =
            parse_interval(env::var("HOUND_SWEEP_INTERVAL_SECONDS").ok().as_deref())?;

        Ok(Self {
            migrate_only,
            database_url,
            limit,
            interval,
        })
    }

    pub fn sweep_limit(&self) -> AppResult<RetentionLimit> {
        self.limit.ok_or_else(|| {
            AppError::Validation("HOUND_DEFAULT_LIMIT is required to sweep".to_owned())
        })
    }
}

fn parse_interval(value: Option<&str>) -> AppResult<Option<Duration>> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    let seconds = value.parse::<u64>().map_err(|error| {
        AppError::Validation(format!(
            "invalid HOUND_SWEEP_INTERVAL_SECONDS value '{value}': {error}"
        ))
    })?;
    if seconds == 0 {
        return Err(AppError::Validation(
            "HOUND_SWEEP_INTERVAL_SECONDS must be greater than zero".to_owned(),
        ));
    }

    Ok(Some(Duration::from_secs(seconds)))
}

fn required_env(name: &str) -> AppResult<String> {
    let value = env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

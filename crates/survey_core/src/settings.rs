use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::error::SurveyError;
use tracing::warn;

use crate::notification::DEFAULT_NOTIFICATION_TTL;

pub const DEFAULT_SETTINGS_FILE: &str = "survey.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint_url: Option<String>,
    pub notification_ttl_secs: u64,
    /// Client-side deadline for remote calls; `None` waits for the transport.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            notification_ttl_secs: DEFAULT_NOTIFICATION_TTL.as_secs(),
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    endpoint_url: Option<String>,
    notification_ttl_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then `path` (or `survey.toml` when present), then environment.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SurveyError> {
    let mut settings = Settings::default();

    let explicit = path.is_some();
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw).map_err(|err| {
            SurveyError::Configuration(format!(
                "invalid settings file '{}': {}",
                path.display(),
                err.message()
            ))
        })?,
        Err(err) if explicit => {
            return Err(SurveyError::Configuration(format!(
                "failed to read settings file '{}': {err}",
                path.display()
            )));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> Result<(), SurveyError> {
    let file_cfg: FileSettings = toml::from_str(raw)
        .map_err(|err| SurveyError::Configuration(err.message().to_string()))?;
    if let Some(v) = file_cfg.endpoint_url {
        settings.endpoint_url = Some(v);
    }
    if let Some(v) = file_cfg.notification_ttl_secs {
        settings.notification_ttl_secs = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SURVEY_ENDPOINT_URL") {
        settings.endpoint_url = Some(v);
    }
    if let Some(v) = lookup("APP__ENDPOINT_URL") {
        settings.endpoint_url = Some(v);
    }

    if let Some(v) = lookup("APP__NOTIFICATION_TTL_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.notification_ttl_secs = parsed,
            Err(_) => warn!("settings: ignoring APP__NOTIFICATION_TTL_SECS={v}"),
        }
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = Some(parsed),
            Err(_) => warn!("settings: ignoring APP__REQUEST_TIMEOUT_SECS={v}"),
        }
    }
}

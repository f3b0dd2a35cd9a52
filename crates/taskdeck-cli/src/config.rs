use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub database_path: String,
    /// IANA timezone whose wall clock defines "today" for recurring tasks.
    pub timezone: String,
    #[serde(default)]
    pub sweep: SweepConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between sweep passes.
    pub tick_seconds: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { tick_seconds: 60 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "taskdeck.db".to_string(),
            timezone: detect_system_timezone(),
            sweep: SweepConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("taskdeck.toml"))
            .merge(Env::prefixed("TASKDECK_").split("__"))
            .extract()
    }
}

/// Detects the system timezone, falling back to UTC if detection fails.
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if tz.parse::<chrono_tz::Tz>().is_ok() {
            return tz;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(tz) = std::fs::read_to_string("/etc/timezone") {
            let tz = tz.trim();
            if tz.parse::<chrono_tz::Tz>().is_ok() {
                return tz.to_string();
            }
        }
    }

    if let Ok(tz) = iana_time_zone::get_timezone() {
        if tz.parse::<chrono_tz::Tz>().is_ok() {
            return tz;
        }
    }

    "UTC".to_string()
}

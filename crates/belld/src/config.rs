use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub discord: DiscordConfig,
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DiscordConfig {
    pub token: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: "YOUR_DISCORD_BOT_TOKEN".to_string(),
        }
    }
}

/// Target channel per broadcast. Every id is required; a missing one is a
/// parse error and stops startup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ChannelsConfig {
    pub year_progress: u64,
    pub christmas: u64,
    pub new_year: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Reference timezone for the daily broadcasts and their midnight
    /// trigger.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> String {
    "Europe/London".to_string()
}

pub fn open_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
    let config: Config = toml::from_str(&content).context("Failed to parse configuration file")?;
    Ok(config)
}

pub fn write_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let config = Config::default();
    let content = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_example_config() {
        let content = include_str!("../../../config.example.toml");
        let config: Config = toml::from_str(content).expect("Failed to parse config.example.toml");

        let expected = Config {
            discord: DiscordConfig {
                token: "YOUR_DISCORD_BOT_TOKEN".to_string(),
            },
            channels: ChannelsConfig {
                year_progress: 111111111111111111,
                christmas: 222222222222222222,
                new_year: 333333333333333333,
            },
            schedule: ScheduleConfig {
                timezone: "Europe/London".to_string(),
            },
        };

        assert_eq!(config, expected);
    }

    #[test]
    fn missing_channel_id_is_a_parse_error() {
        let content = r#"
            [discord]
            token = "t"

            [channels]
            year_progress = 1
            christmas = 2
        "#;
        assert!(toml::from_str::<Config>(content).is_err());
    }

    #[test]
    fn schedule_defaults_to_london() {
        let content = r#"
            [discord]
            token = "t"

            [channels]
            year_progress = 1
            christmas = 2
            new_year = 3
        "#;
        let config: Config = toml::from_str(content).unwrap();
        assert_eq!(config.schedule.timezone, "Europe/London");
    }

    #[test]
    fn default_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        write_default_config(&path).unwrap();
        let config = open_config(&path).unwrap();
        assert_eq!(config, Config::default());
    }
}

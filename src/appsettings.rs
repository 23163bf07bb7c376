use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn timezone(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| anyhow::anyhow!("invalid timezone {:?}: {err}", self.timezone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_timezone_parses() {
        let settings = AppSettings {
            timezone: "Europe/Istanbul".to_string(),
        };
        assert_eq!(settings.timezone().unwrap(), chrono_tz::Europe::Istanbul);
    }

    #[test]
    fn bogus_timezone_is_an_error() {
        let settings = AppSettings {
            timezone: "Mars/Olympus_Mons".to_string(),
        };
        assert!(settings.timezone().is_err());
    }
}

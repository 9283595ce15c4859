use crate::{
    Config, WeatherError,
    model::{Coordinate, WeatherReading},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Gateway to a current-conditions weather service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current weather for a city name. Empty names fail without a request.
    async fn by_name(&self, city: &str) -> Result<WeatherReading, WeatherError>;

    async fn by_coordinate(&self, coordinate: Coordinate) -> Result<WeatherReading, WeatherError>;
}

/// Construct the weather gateway from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    let provider = OpenWeatherProvider::new(api_key.to_owned(), &config.api_base_url)?;

    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn provider_from_config_errors_on_bad_base_url() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());
        cfg.api_base_url = "not a url".to_string();

        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("Invalid weather API base URL"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        assert!(provider_from_config(&cfg).is_ok());
    }
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    WeatherError,
    http::{HttpFetcher, redact},
    model::{Condition, Coordinate, WeatherReading},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    endpoint: Url,
    http: HttpFetcher,
}

impl OpenWeatherProvider {
    /// `base_url` is the API root, e.g. `https://api.openweathermap.org/data/2.5`.
    pub fn new(api_key: String, base_url: &str) -> Result<Self> {
        Self::with_fetcher(api_key, base_url, HttpFetcher::new())
    }

    pub fn with_fetcher(api_key: String, base_url: &str, http: HttpFetcher) -> Result<Self> {
        let endpoint = Url::parse(&format!("{}/weather", base_url.trim_end_matches('/')))
            .with_context(|| format!("Invalid weather API base URL: {base_url}"))?;

        Ok(Self { api_key, endpoint, http })
    }

    fn city_url(&self, city: &str) -> Url {
        self.url_with(&[("q", city)])
    }

    fn coordinate_url(&self, coordinate: Coordinate) -> Url {
        let lat = coordinate.latitude().to_string();
        let lon = coordinate.longitude().to_string();
        self.url_with(&[("lat", lat.as_str()), ("lon", lon.as_str())])
    }

    fn url_with(&self, query: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .extend_pairs(query)
            .append_pair("units", "imperial")
            .append_pair("appid", &self.api_key);
        url
    }

    async fn fetch(&self, url: Url) -> Result<WeatherReading, WeatherError> {
        debug!(url = %redact(&url), "requesting current weather");
        let parsed: OwCurrentResponse = self.http.fetch(&url).await?;
        parsed.try_into()
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: i64,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    id: i64,
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    sys: OwSys,
}

impl TryFrom<OwCurrentResponse> for WeatherReading {
    type Error = WeatherError;

    fn try_from(parsed: OwCurrentResponse) -> Result<Self, Self::Error> {
        if parsed.weather.is_empty() {
            return Err(WeatherError::Decode("response contained no weather conditions".into()));
        }

        let conditions = parsed
            .weather
            .into_iter()
            .map(|w| Condition {
                code: w.id,
                category: w.main,
                description: w.description,
                icon: w.icon,
            })
            .collect();

        Ok(WeatherReading {
            id: parsed.id,
            name: parsed.name,
            country: parsed.sys.country,
            temperature_f: parsed.main.temp,
            feels_like_f: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            conditions,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn by_name(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::empty_city());
        }

        self.fetch(self.city_url(city)).await
    }

    #[instrument(skip_all)]
    async fn by_coordinate(&self, coordinate: Coordinate) -> Result<WeatherReading, WeatherError> {
        self.fetch(self.coordinate_url(coordinate)).await
    }
}

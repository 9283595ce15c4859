//! Core library for the `weather` app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - An HTTP fetcher and the OpenWeather gateway built on it
//! - A bounded cache of decoded condition icons
//! - Device location behind a platform abstraction
//! - The orchestrator that turns all of the above into one observable state
//!
//! It is used by `weather-cli`, but the orchestrator can be driven by any UI
//! that renders [`WeatherState`].

pub mod config;
pub mod error;
pub mod http;
pub mod icon;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod store;

pub use config::{Config, IconCacheConfig};
pub use error::WeatherError;
pub use http::{AssetSource, HttpFetcher};
pub use icon::{Icon, IconCache, IconCacheStats};
pub use location::{AuthorizationState, LocationDelegate, LocationPlatform, LocationProvider};
pub use model::{Condition, Coordinate, WeatherReading};
pub use orchestrator::{LAST_CITY_KEY, WeatherOrchestrator, WeatherState};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use store::{FileStore, KeyValueStore, MemoryStore};

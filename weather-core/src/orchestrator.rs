//! Sequences permission, location, weather fetch and the last-city fallback
//! into one observable [`WeatherState`].
//!
//! Every intent takes a fresh generation number. Completions from an older
//! generation are dropped, so a slow response can never overwrite the result
//! of a newer request.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
    WeatherError,
    icon::{Icon, IconCache},
    location::{AuthorizationState, LocationProvider},
    model::WeatherReading,
    provider::WeatherProvider,
    store::KeyValueStore,
};

/// Store key holding the last city fetched successfully by name.
pub const LAST_CITY_KEY: &str = "lastCity";

/// What the UI renders.
///
/// After a completed operation exactly one of `reading` and `error_message`
/// is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherState {
    pub query: String,
    pub reading: Option<WeatherReading>,
    pub error_message: Option<String>,
    pub is_loading: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct WeatherOrchestrator {
    provider: Arc<dyn WeatherProvider>,
    location: LocationProvider,
    icons: IconCache,
    store: Arc<dyn KeyValueStore>,
    state: watch::Sender<WeatherState>,
    generation: AtomicU64,
}

impl WeatherOrchestrator {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        location: LocationProvider,
        icons: IconCache,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let (state, _) = watch::channel(WeatherState::default());

        Self { provider, location, icons, store, state, generation: AtomicU64::new(0) }
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WeatherState {
        self.state.borrow().clone()
    }

    /// Update the query text. Typing something new clears a stale error.
    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_modify(|s| {
            if !text.is_empty() {
                s.error_message = None;
            }
            s.query = text;
        });
    }

    /// Ask for location permission and fetch weather for wherever the device
    /// is, falling back to the last city.
    ///
    /// Waits while the authorization state is undetermined and acts on the
    /// first decisive state.
    #[instrument(skip(self))]
    pub async fn start_with_location(&self) {
        let mut authorization = self.location.subscribe();
        self.location.request_permission();

        loop {
            let state = *authorization.borrow_and_update();
            match state {
                AuthorizationState::Undetermined => {
                    if authorization.changed().await.is_err() {
                        debug!("authorization channel closed before a decision");
                        return;
                    }
                }
                AuthorizationState::GrantedWhileInUse | AuthorizationState::GrantedAlways => {
                    return self.load_from_location().await;
                }
                AuthorizationState::Denied | AuthorizationState::Restricted => {
                    info!(?state, "location not permitted, using last city");
                    let generation = self.next_generation();
                    return self.fall_back(generation, WeatherError::NotAuthorized).await;
                }
            }
        }
    }

    /// Fetch weather for the persisted last city, if any.
    pub async fn load_last_city(&self) {
        let Some(city) = self.last_city() else {
            debug!("no last city persisted");
            return;
        };

        self.set_query(city);
        self.fetch_by_name().await;
    }

    /// Fetch weather for the current query text.
    #[instrument(skip(self))]
    pub async fn fetch_by_name(&self) {
        let city = self.state.borrow().query.trim().to_string();
        let generation = self.next_generation();

        if city.is_empty() {
            return self.publish(generation, Err(WeatherError::empty_city()));
        }

        self.run_by_name(generation, city).await;
    }

    pub async fn fetch_city(&self, city: &str) {
        self.set_query(city);
        self.fetch_by_name().await;
    }

    /// Decoded icon, or `None` on any failure. Icon problems never touch the
    /// published reading.
    pub async fn resolve_icon(&self, icon_code: &str) -> Option<Icon> {
        match self.icons.resolve(icon_code).await {
            Ok(icon) => Some(icon),
            Err(err) => {
                warn!(icon_code, error = %err, "failed to load weather icon");
                None
            }
        }
    }

    async fn load_from_location(&self) {
        let generation = self.next_generation();
        self.mark_loading(generation);

        let outcome = match self.location.current_location().await {
            Ok(coordinate) => self.provider.by_coordinate(coordinate).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(reading) => self.publish(generation, Ok(reading)),
            Err(err) => {
                warn!(error = %err, "location-based weather failed, using last city");
                self.fall_back(generation, err).await;
            }
        }
    }

    async fn fall_back(&self, generation: u64, cause: WeatherError) {
        match self.last_city() {
            Some(city) => {
                if self.update_if_current(generation, |s| s.query = city.clone()) {
                    self.run_by_name(generation, city).await;
                } else {
                    debug!(generation, "skipping fallback for superseded request");
                }
            }
            None => self.publish(generation, Err(cause)),
        }
    }

    async fn run_by_name(&self, generation: u64, city: String) {
        self.mark_loading(generation);
        info!(city = %city, generation, "fetching weather by name");

        let outcome = self.provider.by_name(&city).await;

        if outcome.is_ok() && self.is_current(generation) {
            if let Err(err) = self.store.set(LAST_CITY_KEY, &city) {
                warn!(city = %city, error = %err, "failed to persist last city");
            }
        }

        self.publish(generation, outcome);
    }

    fn last_city(&self) -> Option<String> {
        match self.store.get(LAST_CITY_KEY) {
            Ok(city) => city.filter(|c| !c.trim().is_empty()),
            Err(err) => {
                warn!(error = %err, "failed to read last city");
                None
            }
        }
    }

    fn next_generation(&self) -> u64 {
        // Bumped under the state lock so `update_if_current` never sees it move.
        let mut generation = 0;
        self.state.send_if_modified(|_| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            false
        });
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Applies `change` only while `generation` is the newest intent.
    fn update_if_current(&self, generation: u64, change: impl FnOnce(&mut WeatherState)) -> bool {
        self.state.send_if_modified(|s| {
            if !self.is_current(generation) {
                return false;
            }
            change(s);
            true
        })
    }

    fn mark_loading(&self, generation: u64) {
        self.update_if_current(generation, |s| s.is_loading = true);
    }

    fn publish(&self, generation: u64, outcome: Result<WeatherReading, WeatherError>) {
        let published = self.update_if_current(generation, |s| {
            match outcome {
                Ok(reading) => {
                    s.reading = Some(reading);
                    s.error_message = None;
                }
                Err(err) => {
                    s.reading = None;
                    s.error_message = Some(err.to_string());
                }
            }
            s.is_loading = false;
            s.updated_at = Some(Utc::now());
        });

        if !published {
            debug!(generation, "discarding stale weather result");
        }
    }
}

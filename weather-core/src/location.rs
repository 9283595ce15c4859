//! Device geolocation behind a platform abstraction.
//!
//! The platform answers through a [`LocationDelegate`]: authorization changes
//! are mirrored into a watch channel, and a location request settles the
//! single pending slot. At most one location request may be outstanding.

use std::{fmt::Debug, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use crate::{WeatherError, model::Coordinate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationState {
    Undetermined,
    Denied,
    Restricted,
    GrantedWhileInUse,
    GrantedAlways,
}

impl AuthorizationState {
    pub fn is_granted(self) -> bool {
        matches!(self, Self::GrantedWhileInUse | Self::GrantedAlways)
    }
}

/// The platform geolocation service.
///
/// Requests are fire-and-forget; results come back through the delegate,
/// possibly before the call returns.
pub trait LocationPlatform: Send + Sync + Debug {
    fn authorization_state(&self) -> AuthorizationState;

    /// Show the permission prompt if the state is still undetermined.
    fn request_authorization(&self, delegate: LocationDelegate);

    /// Deliver exactly one of `did_update_locations` or `did_fail`.
    fn request_location(&self, delegate: LocationDelegate);
}

type LocationOutcome = Result<Coordinate, WeatherError>;

#[derive(Debug)]
enum RequestSlot {
    Idle,
    Pending(oneshot::Sender<LocationOutcome>),
}

#[derive(Debug)]
struct Shared {
    slot: Mutex<RequestSlot>,
    authorization: watch::Sender<AuthorizationState>,
}

/// Callback handle given to the platform.
#[derive(Debug, Clone)]
pub struct LocationDelegate {
    shared: Arc<Shared>,
}

impl LocationDelegate {
    pub fn did_change_authorization(&self, state: AuthorizationState) {
        info!(?state, "location authorization changed");
        self.shared.authorization.send_replace(state);
    }

    pub fn did_update_locations(&self, locations: &[Coordinate]) {
        match locations.first() {
            Some(coordinate) => {
                debug!(
                    lat = coordinate.latitude(),
                    lon = coordinate.longitude(),
                    "location update received"
                );
                self.settle(Ok(*coordinate));
            }
            None => self.settle(Err(WeatherError::LocationUnavailable)),
        }
    }

    pub fn did_fail(&self, error: WeatherError) {
        warn!(error = %error, "location request failed");
        self.settle(Err(error));
    }

    fn settle(&self, outcome: LocationOutcome) {
        // Empty the slot before resolving so a repeated callback finds nothing.
        let slot = std::mem::replace(&mut *self.shared.slot.lock(), RequestSlot::Idle);

        match slot {
            RequestSlot::Pending(tx) => {
                if tx.send(outcome).is_err() {
                    debug!("location caller went away before the result arrived");
                }
            }
            RequestSlot::Idle => debug!("ignoring location callback with no pending request"),
        }
    }
}

#[derive(Debug)]
pub struct LocationProvider {
    platform: Arc<dyn LocationPlatform>,
    delegate: LocationDelegate,
}

impl LocationProvider {
    pub fn new(platform: Arc<dyn LocationPlatform>) -> Self {
        let (authorization, _) = watch::channel(platform.authorization_state());
        let shared = Arc::new(Shared { slot: Mutex::new(RequestSlot::Idle), authorization });

        Self { platform, delegate: LocationDelegate { shared } }
    }

    pub fn authorization_state(&self) -> AuthorizationState {
        *self.delegate.shared.authorization.borrow()
    }

    /// Observe authorization changes; the receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<AuthorizationState> {
        self.delegate.shared.authorization.subscribe()
    }

    pub fn request_permission(&self) {
        info!(state = ?self.authorization_state(), "requesting location permission");
        self.platform.request_authorization(self.delegate.clone());
    }

    /// One-shot current position.
    ///
    /// Fails with `RequestInProgress` while another request is outstanding.
    pub async fn current_location(&self) -> Result<Coordinate, WeatherError> {
        if !self.authorization_state().is_granted() {
            return Err(WeatherError::NotAuthorized);
        }

        let rx = {
            let mut slot = self.delegate.shared.slot.lock();
            // Held until the platform answers, even if the caller has gone away.
            if matches!(*slot, RequestSlot::Pending(_)) {
                return Err(WeatherError::RequestInProgress);
            }

            let (tx, rx) = oneshot::channel();
            *slot = RequestSlot::Pending(tx);
            rx
        };

        self.platform.request_location(self.delegate.clone());

        rx.await.unwrap_or_else(|_| {
            Err(WeatherError::Unknown("location request was abandoned by the platform".into()))
        })
    }
}

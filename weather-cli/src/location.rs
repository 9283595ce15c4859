use weather_core::{AuthorizationState, Coordinate, LocationDelegate, LocationPlatform};

/// Location "hardware" for a terminal: a position given on the command line.
///
/// With a coordinate the permission prompt is granted at once; without one
/// it is denied, which sends the orchestrator to the last city.
#[derive(Debug)]
pub struct FixedLocation {
    coordinate: Option<Coordinate>,
}

impl FixedLocation {
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self { coordinate }
    }
}

impl LocationPlatform for FixedLocation {
    fn authorization_state(&self) -> AuthorizationState {
        AuthorizationState::Undetermined
    }

    fn request_authorization(&self, delegate: LocationDelegate) {
        let state = if self.coordinate.is_some() {
            AuthorizationState::GrantedWhileInUse
        } else {
            AuthorizationState::Denied
        };
        delegate.did_change_authorization(state);
    }

    fn request_location(&self, delegate: LocationDelegate) {
        match self.coordinate {
            Some(coordinate) => delegate.did_update_locations(&[coordinate]),
            None => delegate.did_update_locations(&[]),
        }
    }
}

use async_trait::async_trait;
use std::time::Duration;

use super::{Accuracy, LocationProvider, PermissionState};
use crate::models::Location;

/// Always reports the same position
#[derive(Debug, Clone)]
pub struct StaticLocation {
    location: Location,
}

impl StaticLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            location: Location::new(latitude, longitude),
        }
    }
}

#[async_trait]
impl LocationProvider for StaticLocation {
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    async fn is_enabled(&self) -> bool {
        true
    }

    async fn current_fix(&self, _accuracy: Accuracy, _timeout: Duration) -> Option<Location> {
        Some(self.location)
    }
}

//! Geolocation sample: one validated location reading.

use serde::{Deserialize, Serialize};

/// A single location reading attached to an attendance event.
///
/// Pure value — it has no lifecycle of its own and is embedded in assignment,
/// break, and report records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoSample {
    /// Degrees north of the equator, in [-90, 90].
    pub latitude: f64,

    /// Degrees east of the prime meridian, in [-180, 180].
    pub longitude: f64,

    /// Reported accuracy radius in meters.
    pub accuracy_meters: f64,

    /// Reverse-geocoded address, when the device provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl GeoSample {
    /// Checks that the reading is physically plausible.
    ///
    /// Coordinates must be finite and within range, accuracy must be finite
    /// and non-negative, and an address (when present) must not be blank.
    pub fn validate(&self) -> Result<(), String> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude out of range: {}", self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude out of range: {}", self.longitude));
        }
        if !self.accuracy_meters.is_finite() || self.accuracy_meters < 0.0 {
            return Err(format!("invalid accuracy: {}", self.accuracy_meters));
        }
        if let Some(address) = &self.address
            && address.trim().is_empty()
        {
            return Err("address cannot be blank".to_string());
        }
        Ok(())
    }
}

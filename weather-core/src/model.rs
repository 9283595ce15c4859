use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// One current-conditions reading, replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub temperature_f: f64,
    pub feels_like_f: f64,
    pub humidity_pct: u8,
    /// Never empty; the gateway rejects readings without conditions.
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub code: i64,
    pub category: String,
    pub description: String,
    pub icon: String,
}

impl WeatherReading {
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.conditions.first()
    }

    pub fn icon_code(&self) -> Option<&str> {
        self.primary_condition().map(|c| c.icon.as_str())
    }

    /// Description of the primary condition, capitalized word by word.
    pub fn summary(&self) -> String {
        self.primary_condition()
            .map(|c| capitalize_words(&c.description))
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WeatherError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::InvalidQuery(format!(
                "Invalid coordinates ({latitude}, {longitude}): latitude must be -90 to 90, \
                 longitude must be -180 to 180"
            )));
        }

        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

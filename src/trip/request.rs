//! Inbound request types
//!
//! Validation is enforced during deserialization, so a `TripRequest` or
//! `ShuffleRequest` that exists has already passed the HTTP boundary checks.

use serde::{Deserialize, Deserializer, Serialize};

/// Longest itinerary we will ask the model for
pub const MAX_TRIP_DAYS: u32 = 30;

/// Maximum length of free-text fields such as destination or place names
const MAX_NAME_LENGTH: usize = 200;

/// Who is travelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelStyle {
    Solo,
    Couple,
    Family,
    Friends,
}

impl TravelStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelStyle::Solo => "solo",
            TravelStyle::Couple => "couple",
            TravelStyle::Family => "family",
            TravelStyle::Friends => "friends",
        }
    }
}

/// How densely each day should be packed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Relaxed,
    #[default]
    Moderate,
    Packed,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Relaxed => "relaxed",
            Pace::Moderate => "moderate",
            Pace::Packed => "packed",
        }
    }
}

/// Current weather at the destination, temperature in °C
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature: f64,
    pub condition: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Location and preference context shared by trip and shuffle requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelContext {
    pub destination: String,
    /// Total budget in INR
    pub budget: f64,
    pub interests: Vec<String>,
    pub travel_style: TravelStyle,
    #[serde(default)]
    pub pace: Pace,
    #[serde(default)]
    pub food_preferences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Weather>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geotag: Option<GeoPoint>,
}

impl TravelContext {
    /// Check field-level invariants, returning a client-facing message on failure
    pub fn validate(&self) -> Result<(), String> {
        check_name("destination", &self.destination)?;

        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(format!(
                "budget must be a non-negative number, got {}",
                self.budget
            ));
        }

        if self.interests.is_empty() {
            return Err("interests must contain at least one entry".to_string());
        }
        check_entries("interests", &self.interests)?;
        check_entries("foodPreferences", &self.food_preferences)?;

        if let Some(weather) = &self.weather {
            if !weather.temperature.is_finite() {
                return Err("weather.temperature must be a finite number".to_string());
            }
            if weather.condition.trim().is_empty() {
                return Err("weather.condition cannot be empty".to_string());
            }
        }

        if let Some(geo) = &self.geotag {
            if !(-90.0..=90.0).contains(&geo.latitude) {
                return Err(format!(
                    "geotag.latitude must be between -90 and 90, got {}",
                    geo.latitude
                ));
            }
            if !(-180.0..=180.0).contains(&geo.longitude) {
                return Err(format!(
                    "geotag.longitude must be between -180 and 180, got {}",
                    geo.longitude
                ));
            }
        }

        Ok(())
    }
}

fn check_name(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    let char_count = value.chars().count();
    if char_count > MAX_NAME_LENGTH {
        return Err(format!(
            "{field} exceeds maximum length of {MAX_NAME_LENGTH} characters (got {char_count})"
        ));
    }
    Ok(())
}

fn check_entries(field: &str, entries: &[String]) -> Result<(), String> {
    for (index, entry) in entries.iter().enumerate() {
        check_name(&format!("{field}[{index}]"), entry)?;
    }
    Ok(())
}

/// Request for a full day-by-day itinerary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    #[serde(flatten)]
    context: TravelContext,
    days: u32,
    visited: Vec<String>,
    previously_shown: Vec<String>,
}

impl TripRequest {
    /// Build a validated request
    pub fn new(
        context: TravelContext,
        days: u32,
        visited: Vec<String>,
        previously_shown: Vec<String>,
    ) -> Result<Self, String> {
        context.validate()?;
        if days == 0 || days > MAX_TRIP_DAYS {
            return Err(format!(
                "days must be between 1 and {MAX_TRIP_DAYS}, got {days}"
            ));
        }
        check_entries("visited", &visited)?;
        check_entries("previouslyShown", &previously_shown)?;

        Ok(Self {
            context,
            days,
            visited,
            previously_shown,
        })
    }

    pub fn context(&self) -> &TravelContext {
        &self.context
    }

    pub fn destination(&self) -> &str {
        &self.context.destination
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    pub fn previously_shown(&self) -> &[String] {
        &self.previously_shown
    }
}

impl<'de> Deserialize<'de> for TripRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RawTripRequest {
            #[serde(flatten)]
            context: TravelContext,
            days: u32,
            #[serde(default)]
            visited: Vec<String>,
            #[serde(default)]
            previously_shown: Vec<String>,
        }

        let raw = RawTripRequest::deserialize(deserializer)?;
        TripRequest::new(raw.context, raw.days, raw.visited, raw.previously_shown)
            .map_err(serde::de::Error::custom)
    }
}

/// Request to replace one recommended place with an alternative
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffleRequest {
    place_name: String,
    place_type: String,
    #[serde(flatten)]
    context: TravelContext,
    visited: Vec<String>,
    previously_shown: Vec<String>,
}

impl ShuffleRequest {
    /// Build a validated request
    pub fn new(
        place_name: String,
        place_type: String,
        context: TravelContext,
        visited: Vec<String>,
        previously_shown: Vec<String>,
    ) -> Result<Self, String> {
        check_name("placeName", &place_name)?;
        check_name("placeType", &place_type)?;
        context.validate()?;
        check_entries("visited", &visited)?;
        check_entries("previouslyShown", &previously_shown)?;

        Ok(Self {
            place_name,
            place_type,
            context,
            visited,
            previously_shown,
        })
    }

    pub fn place_name(&self) -> &str {
        &self.place_name
    }

    pub fn place_type(&self) -> &str {
        &self.place_type
    }

    pub fn context(&self) -> &TravelContext {
        &self.context
    }

    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    pub fn previously_shown(&self) -> &[String] {
        &self.previously_shown
    }

    /// Every name the replacement must differ from, original place first
    pub fn excluded_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.place_name.as_str())
            .chain(self.visited.iter().map(String::as_str))
            .chain(self.previously_shown.iter().map(String::as_str))
    }
}

impl<'de> Deserialize<'de> for ShuffleRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RawShuffleRequest {
            place_name: String,
            place_type: String,
            #[serde(flatten)]
            context: TravelContext,
            #[serde(default)]
            visited: Vec<String>,
            #[serde(default)]
            previously_shown: Vec<String>,
        }

        let raw = RawShuffleRequest::deserialize(deserializer)?;
        ShuffleRequest::new(
            raw.place_name,
            raw.place_type,
            raw.context,
            raw.visited,
            raw.previously_shown,
        )
        .map_err(serde::de::Error::custom)
    }
}

/// Maximum chat message length in characters
pub const MAX_CHAT_MESSAGE_LENGTH: usize = 4_000;

/// Free-form chat with the travel assistant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<serde_json::Value>,
}

impl ChatRequest {
    pub fn new(message: String, context: Option<serde_json::Value>) -> Result<Self, String> {
        if message.trim().is_empty() {
            return Err("message cannot be empty or contain only whitespace".to_string());
        }
        let char_count = message.chars().count();
        if char_count > MAX_CHAT_MESSAGE_LENGTH {
            return Err(format!(
                "message exceeds maximum length of {MAX_CHAT_MESSAGE_LENGTH} characters (got {char_count})"
            ));
        }
        // An explicit `null` context is the same as none
        let context = context.filter(|value| !value.is_null());
        Ok(Self { message, context })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> Option<&serde_json::Value> {
        self.context.as_ref()
    }
}

impl<'de> Deserialize<'de> for ChatRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawChatRequest {
            message: String,
            #[serde(default)]
            context: Option<serde_json::Value>,
        }

        let raw = RawChatRequest::deserialize(deserializer)?;
        ChatRequest::new(raw.message, raw.context).map_err(serde::de::Error::custom)
    }
}

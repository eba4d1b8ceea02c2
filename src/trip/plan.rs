//! Model output types
//!
//! The model is asked for a fixed JSON shape but routinely deviates in small
//! ways (numbers where strings were requested, objects where a list of names
//! was requested). Text fields therefore accept any JSON scalar and unknown
//! keys are kept in `extra` rather than rejected.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A generated itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    pub days: Vec<Day>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cafes: Vec<Cafe>,
    #[serde(default, deserialize_with = "lenient_text_list")]
    pub medical: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text_list")]
    pub tips: Vec<String>,
}

impl TripPlan {
    /// Total number of places across all days
    pub fn place_count(&self) -> usize {
        self.days.iter().map(|day| day.places.len()).sum()
    }

    /// Place names that appear more than once (case-insensitive), in first-seen order
    pub fn duplicate_place_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();

        for place in self.days.iter().flat_map(|day| day.places.iter()) {
            let key = place.name.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            if !seen.insert(key.clone()) && reported.insert(key) {
                duplicates.push(place.name.clone());
            }
        }

        duplicates
    }
}

/// One day of the itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    #[serde(default, deserialize_with = "lenient_day_number")]
    pub day: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub places: Vec<Place>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single recommended stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub timing: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub transport: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub distance: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A café or restaurant recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cafe {
    pub name: String,
    pub vibe: String,
    pub price_range: String,
    pub best_dishes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for Cafe {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct CafeFields {
            #[serde(default, deserialize_with = "lenient_text")]
            name: String,
            #[serde(default, deserialize_with = "lenient_text")]
            vibe: String,
            #[serde(
                default,
                alias = "priceRange",
                alias = "price",
                deserialize_with = "lenient_text"
            )]
            price_range: String,
            #[serde(
                default,
                alias = "bestDishes",
                alias = "dishes",
                deserialize_with = "lenient_text_list"
            )]
            best_dishes: Vec<String>,
            #[serde(flatten)]
            extra: Map<String, Value>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum CafeRepr {
            Name(String),
            Fields(CafeFields),
        }

        Ok(match CafeRepr::deserialize(deserializer)? {
            CafeRepr::Name(name) => Cafe {
                name,
                vibe: String::new(),
                price_range: String::new(),
                best_dishes: Vec::new(),
                extra: Map::new(),
            },
            CafeRepr::Fields(fields) => Cafe {
                name: fields.name,
                vibe: fields.vibe,
                price_range: fields.price_range,
                best_dishes: fields.best_dishes,
                extra: fields.extra,
            },
        })
    }
}

/// Replacement suggestion for a single place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffleResult {
    pub new_place: String,
    #[serde(default)]
    pub description: String,
}

impl ShuffleResult {
    /// True if the suggestion repeats one of `names` (case-insensitive)
    pub fn repeats_any<'a>(&self, mut names: impl Iterator<Item = &'a str>) -> bool {
        let candidate = self.new_place.trim().to_lowercase();
        names.any(|name| name.trim().to_lowercase() == candidate)
    }
}

/// Render any JSON value as display text
///
/// Objects with a `name` are reduced to the name, optionally followed by an
/// address-like field, so `{"name": "Apollo Pharmacy", "address": "MG Road"}`
/// becomes `Apollo Pharmacy - MG Road`.
fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        Value::Object(map) => {
            let name = map.get("name").and_then(Value::as_str);
            let detail = ["address", "location", "description"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str));
            match (name, detail) {
                (Some(name), Some(detail)) => format!("{name} - {detail}"),
                (Some(name), None) => name.to_string(),
                _ => Value::Object(map).to_string(),
            }
        }
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

/// Render a JSON list (or a lone value) as display strings, dropping blanks
pub(crate) fn text_list(value: Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .map(value_to_text)
            .filter(|text| !text.is_empty())
            .collect(),
        single => vec![value_to_text(single)],
    }
}

fn lenient_text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_list(Value::deserialize(deserializer)?))
}

/// Day numbers arrive as `1`, `"1"` or `1.0`; anything else becomes 0
fn lenient_day_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let whole = |f: f64| (f.is_finite() && f >= 0.0).then_some(f as u64);
    let number = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole)),
        Value::String(text) => text.trim().parse::<f64>().ok().and_then(whole),
        _ => None,
    };
    Ok(number.and_then(|n| u32::try_from(n).ok()).unwrap_or_default())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

//! Shape validation of parsed model output
//!
//! A parsed value is checked against the expected shape before it is
//! converted into typed data. Checks are coarse: the containers and required
//! keys must be there, while the content of individual places is accepted
//! leniently by the typed conversion.

use crate::trip::plan::text_list;
use crate::trip::{Cafe, Day, ShuffleResult, TripPlan};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

/// Shape the model was asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedShape {
    TripPlan,
    ShuffleResult,
}

impl ExpectedShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpectedShape::TripPlan => "trip_plan",
            ExpectedShape::ShuffleResult => "shuffle_result",
        }
    }
}

impl fmt::Display for ExpectedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed JSON did not have the expected shape
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Model output does not match {shape}: field '{field}' {problem}")]
pub struct SchemaMismatchError {
    shape: ExpectedShape,
    field: String,
    problem: String,
}

impl SchemaMismatchError {
    pub fn missing(shape: ExpectedShape, field: impl Into<String>) -> Self {
        Self::invalid(shape, field, "is missing")
    }

    pub fn invalid(
        shape: ExpectedShape,
        field: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self {
            shape,
            field: field.into(),
            problem: problem.into(),
        }
    }

    pub fn shape(&self) -> ExpectedShape {
        self.shape
    }

    /// The offending field (`$root` for the top-level value)
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn problem(&self) -> &str {
        &self.problem
    }
}

const ROOT: &str = "$root";

/// Check that `value` has the containers and required keys of `shape`
pub fn validate(value: &Value, shape: ExpectedShape) -> Result<(), SchemaMismatchError> {
    let object = root_object(value, shape)?;

    match shape {
        ExpectedShape::TripPlan => {
            match object.get("days") {
                None | Some(Value::Null) => {
                    return Err(SchemaMismatchError::missing(shape, "days"));
                }
                Some(Value::Array(_)) => {}
                Some(other) => {
                    return Err(SchemaMismatchError::invalid(
                        shape,
                        "days",
                        format!("must be an array, got {}", kind_of(other)),
                    ));
                }
            }
            for field in ["cafes", "medical", "tips"] {
                match object.get(field) {
                    None | Some(Value::Null) | Some(Value::Array(_)) => {}
                    Some(other) => {
                        return Err(SchemaMismatchError::invalid(
                            shape,
                            field,
                            format!("must be an array, got {}", kind_of(other)),
                        ));
                    }
                }
            }
        }
        ExpectedShape::ShuffleResult => {
            match object.get("new_place") {
                None | Some(Value::Null) => {
                    return Err(SchemaMismatchError::missing(shape, "new_place"));
                }
                Some(Value::String(name)) if name.trim().is_empty() => {
                    return Err(SchemaMismatchError::invalid(
                        shape,
                        "new_place",
                        "must not be empty",
                    ));
                }
                Some(Value::String(_)) => {}
                Some(other) => {
                    return Err(SchemaMismatchError::invalid(
                        shape,
                        "new_place",
                        format!("must be a string, got {}", kind_of(other)),
                    ));
                }
            }
            match object.get("description") {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(other) => {
                    return Err(SchemaMismatchError::invalid(
                        shape,
                        "description",
                        format!("must be a string, got {}", kind_of(other)),
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Validate and convert a parsed value into a [`TripPlan`]
///
/// Fields are converted one at a time so a conversion failure names the field
/// it came from.
pub fn into_trip_plan(value: Value) -> Result<TripPlan, SchemaMismatchError> {
    let shape = ExpectedShape::TripPlan;
    validate(&value, shape)?;

    let Value::Object(mut object) = value else {
        return Err(not_an_object(shape, &value));
    };

    let days: Vec<Day> = convert_field(&mut object, shape, "days")?;
    let cafes: Vec<Cafe> = convert_field(&mut object, shape, "cafes")?;
    let medical = text_list(object.remove("medical").unwrap_or(Value::Null));
    let tips = text_list(object.remove("tips").unwrap_or(Value::Null));

    Ok(TripPlan {
        days,
        cafes,
        medical,
        tips,
    })
}

/// Validate and convert a parsed value into a [`ShuffleResult`]
pub fn into_shuffle_result(value: Value) -> Result<ShuffleResult, SchemaMismatchError> {
    let shape = ExpectedShape::ShuffleResult;
    validate(&value, shape)?;

    let Value::Object(object) = value else {
        return Err(not_an_object(shape, &value));
    };

    let new_place = object
        .get("new_place")
        .and_then(Value::as_str)
        .map(|name| name.trim().to_string())
        .unwrap_or_default();
    let description = object
        .get("description")
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    Ok(ShuffleResult {
        new_place,
        description,
    })
}

fn root_object(value: &Value, shape: ExpectedShape) -> Result<&Map<String, Value>, SchemaMismatchError> {
    value.as_object().ok_or_else(|| not_an_object(shape, value))
}

fn not_an_object(shape: ExpectedShape, value: &Value) -> SchemaMismatchError {
    SchemaMismatchError::invalid(
        shape,
        ROOT,
        format!("must be a JSON object, got {}", kind_of(value)),
    )
}

fn convert_field<T>(
    object: &mut Map<String, Value>,
    shape: ExpectedShape,
    field: &str,
) -> Result<T, SchemaMismatchError>
where
    T: DeserializeOwned + Default,
{
    match object.remove(field) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| SchemaMismatchError::invalid(shape, field, format!("is malformed: {e}"))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

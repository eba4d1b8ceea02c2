//! Trip domain types
//!
//! Requests coming in from the client and the structured data the model is
//! expected to produce.

pub mod plan;
pub mod request;

pub use plan::{Cafe, Day, Place, ShuffleResult, TripPlan};
pub use request::{
    ChatRequest, GeoPoint, Pace, ShuffleRequest, TravelContext, TravelStyle, TripRequest, Weather,
};

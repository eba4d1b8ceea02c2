//! TripGenie - travel-planning API backed by a text-generation model
//!
//! Builds prompts from trip preferences, calls the configured provider and
//! turns the model's loosely formatted output into validated itineraries.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
pub mod storage;
pub mod telemetry;
pub mod trip;

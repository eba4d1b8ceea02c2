//! Saved trips
//!
//! Handlers depend on the [`TripRepository`] trait only; the in-memory
//! implementation is injected at startup.

pub mod memory;

pub use memory::InMemoryTripRepository;

use crate::trip::{TripPlan, TripRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub type TripId = u64;

/// A trip the user chose to keep
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTrip {
    pub id: TripId,
    pub request: TripRequest,
    pub plan: TripPlan,
    /// Unix seconds
    pub created_at: u64,
}

/// Body of `POST /trips`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTrip {
    pub request: TripRequest,
    pub plan: TripPlan,
}

#[async_trait]
pub trait TripRepository: Send + Sync {
    /// Store a trip and return it with its assigned id
    async fn save(&self, trip: NewTrip) -> SavedTrip;

    async fn get(&self, id: TripId) -> Option<SavedTrip>;

    /// All saved trips, oldest first
    async fn list(&self) -> Vec<SavedTrip>;

    /// Remove a trip, returning whether it existed
    async fn delete(&self, id: TripId) -> bool;
}

/// Seconds since the Unix epoch, or 0 if the system clock is before it
pub(crate) fn unix_now() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs(),
        Err(e) => {
            tracing::error!(error = %e, "System clock is before the Unix epoch");
            0
        }
    }
}

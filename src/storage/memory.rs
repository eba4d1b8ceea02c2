use super::{NewTrip, SavedTrip, TripId, TripRepository, unix_now};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Default number of trips kept before the oldest are evicted
pub const DEFAULT_MAX_TRIPS: usize = 1_000;

/// Process-local trip storage; contents are lost on restart
///
/// Holds at most `max_trips` entries. Saving beyond that evicts the oldest
/// trip (lowest id).
#[derive(Debug)]
pub struct InMemoryTripRepository {
    trips: RwLock<BTreeMap<TripId, SavedTrip>>,
    next_id: AtomicU64,
    max_trips: usize,
}

impl InMemoryTripRepository {
    pub fn new() -> Self {
        Self::with_max_trips(DEFAULT_MAX_TRIPS)
    }

    /// Repository holding at most `max_trips` entries (at least one)
    pub fn with_max_trips(max_trips: usize) -> Self {
        Self {
            trips: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            max_trips: max_trips.max(1),
        }
    }
}

impl Default for InMemoryTripRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TripRepository for InMemoryTripRepository {
    async fn save(&self, trip: NewTrip) -> SavedTrip {
        let saved = SavedTrip {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            request: trip.request,
            plan: trip.plan,
            created_at: unix_now(),
        };

        let mut trips = self.trips.write().await;
        while trips.len() >= self.max_trips {
            if let Some((evicted, _)) = trips.pop_first() {
                tracing::warn!(
                    trip_id = evicted,
                    max_trips = self.max_trips,
                    "Trip storage full, evicting oldest trip"
                );
            }
        }
        trips.insert(saved.id, saved.clone());
        tracing::debug!(trip_id = saved.id, "Trip saved");
        saved
    }

    async fn get(&self, id: TripId) -> Option<SavedTrip> {
        self.trips.read().await.get(&id).cloned()
    }

    async fn list(&self) -> Vec<SavedTrip> {
        self.trips.read().await.values().cloned().collect()
    }

    async fn delete(&self, id: TripId) -> bool {
        self.trips.write().await.remove(&id).is_some()
    }
}

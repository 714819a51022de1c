use super::trip::{Trip, TripId, TripTransition};
use super::user::{Driver, DriverId, Rider, RiderId};
use crate::error::Result;
use async_trait::async_trait;

/// Owner of record for riders, drivers and trips.
///
/// Inserts fail with `DuplicateId` when the identifier is taken; the check
/// and the insert happen atomically. Trips change only through
/// [`EntityStore::transition_trip`], which applies the state machine under a
/// lock scoped to that one trip.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn insert_rider(&self, rider: Rider) -> Result<()>;
    async fn get_rider(&self, id: &RiderId) -> Result<Option<Rider>>;
    async fn append_rider_history(&self, id: &RiderId, trip: TripId) -> Result<()>;

    async fn insert_driver(&self, driver: Driver) -> Result<()>;
    async fn get_driver(&self, id: &DriverId) -> Result<Option<Driver>>;
    async fn append_driver_history(&self, id: &DriverId, trip: TripId) -> Result<()>;

    async fn insert_trip(&self, trip: Trip) -> Result<()>;
    async fn get_trip(&self, id: TripId) -> Result<Option<Trip>>;
    /// Returns the trips that exist among `ids`, in the order given.
    async fn get_trips(&self, ids: &[TripId]) -> Result<Vec<Trip>>;
    /// Applies `transitions` atomically and returns the updated trip.
    async fn transition_trip(&self, id: TripId, transitions: &[TripTransition]) -> Result<Trip>;
    /// Every trip, ordered by id.
    async fn all_trips(&self) -> Result<Vec<Trip>>;
}

pub type EntityStoreBox = Box<dyn EntityStore>;

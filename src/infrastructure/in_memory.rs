use crate::domain::ports::EntityStore;
use crate::domain::trip::{Trip, TripId, TripTransition};
use crate::domain::user::{Driver, DriverId, Rider, RiderId};
use crate::error::{DispatchError, EntityKind, Result};
use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type TripCell = Arc<Mutex<Trip>>;

/// A thread-safe in-memory entity store.
///
/// Riders and drivers live in `Arc<RwLock<HashMap<..>>>` maps. Each trip sits
/// behind its own `Mutex`, so the map lock is only held long enough to find
/// the trip and transitions on different trips never contend.
#[derive(Default, Clone)]
pub struct InMemoryEntityStore {
    riders: Arc<RwLock<HashMap<RiderId, Rider>>>,
    drivers: Arc<RwLock<HashMap<DriverId, Driver>>>,
    trips: Arc<RwLock<BTreeMap<TripId, TripCell>>>,
}

impl InMemoryEntityStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn trip_cell(&self, id: TripId) -> Option<TripCell> {
        let trips = self.trips.read().await;
        trips.get(&id).cloned()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn insert_rider(&self, rider: Rider) -> Result<()> {
        let mut riders = self.riders.write().await;
        match riders.entry(rider.id().clone()) {
            Entry::Occupied(entry) => Err(DispatchError::duplicate(EntityKind::Rider, entry.key())),
            Entry::Vacant(entry) => {
                entry.insert(rider);
                Ok(())
            }
        }
    }

    async fn get_rider(&self, id: &RiderId) -> Result<Option<Rider>> {
        let riders = self.riders.read().await;
        Ok(riders.get(id).cloned())
    }

    async fn append_rider_history(&self, id: &RiderId, trip: TripId) -> Result<()> {
        let mut riders = self.riders.write().await;
        let rider = riders
            .get_mut(id)
            .ok_or_else(|| DispatchError::not_found(EntityKind::Rider, id))?;
        rider.record_trip(trip);
        Ok(())
    }

    async fn insert_driver(&self, driver: Driver) -> Result<()> {
        let mut drivers = self.drivers.write().await;
        match drivers.entry(driver.id().clone()) {
            Entry::Occupied(entry) => {
                Err(DispatchError::duplicate(EntityKind::Driver, entry.key()))
            }
            Entry::Vacant(entry) => {
                entry.insert(driver);
                Ok(())
            }
        }
    }

    async fn get_driver(&self, id: &DriverId) -> Result<Option<Driver>> {
        let drivers = self.drivers.read().await;
        Ok(drivers.get(id).cloned())
    }

    async fn append_driver_history(&self, id: &DriverId, trip: TripId) -> Result<()> {
        let mut drivers = self.drivers.write().await;
        let driver = drivers
            .get_mut(id)
            .ok_or_else(|| DispatchError::not_found(EntityKind::Driver, id))?;
        driver.record_trip(trip);
        Ok(())
    }

    async fn insert_trip(&self, trip: Trip) -> Result<()> {
        let mut trips = self.trips.write().await;
        if trips.contains_key(&trip.id()) {
            return Err(DispatchError::duplicate(EntityKind::Trip, trip.id()));
        }
        trips.insert(trip.id(), Arc::new(Mutex::new(trip)));
        Ok(())
    }

    async fn get_trip(&self, id: TripId) -> Result<Option<Trip>> {
        match self.trip_cell(id).await {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn get_trips(&self, ids: &[TripId]) -> Result<Vec<Trip>> {
        let cells: Vec<TripCell> = {
            let trips = self.trips.read().await;
            ids.iter().filter_map(|id| trips.get(id).cloned()).collect()
        };

        let mut snapshots = Vec::with_capacity(cells.len());
        for cell in cells {
            snapshots.push(cell.lock().await.clone());
        }
        Ok(snapshots)
    }

    async fn transition_trip(&self, id: TripId, transitions: &[TripTransition]) -> Result<Trip> {
        let cell = self
            .trip_cell(id)
            .await
            .ok_or_else(|| DispatchError::not_found(EntityKind::Trip, id))?;

        let mut trip = cell.lock().await;
        trip.apply_all(transitions)?;
        Ok(trip.clone())
    }

    async fn all_trips(&self) -> Result<Vec<Trip>> {
        let cells: Vec<TripCell> = {
            let trips = self.trips.read().await;
            trips.values().cloned().collect()
        };

        let mut snapshots = Vec::with_capacity(cells.len());
        for cell in cells {
            snapshots.push(cell.lock().await.clone());
        }
        Ok(snapshots)
    }
}

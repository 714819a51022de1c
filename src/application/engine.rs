use super::dispatcher::{DispatchOutcome, Dispatcher};
use super::queue::DispatchQueue;
use super::registry::DriverRegistry;
use crate::config::EngineConfig;
use crate::domain::fare::{FarePolicy, FlatFare};
use crate::domain::ports::EntityStoreBox;
use crate::domain::selection::{DriverSelectionPolicy, LowestRegistrationOrder};
use crate::domain::trip::{Trip, TripId, TripStatus, TripTransition, validate_locations};
use crate::domain::user::{Driver, DriverId, DriverSnapshot, Profile, Rider, RiderId, User};
use crate::error::{DispatchError, EntityKind, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// The entry point for the dispatch engine.
///
/// `RideEngine` owns the entity store, the dispatch queue and the driver
/// registry, and exposes the operations a presentation layer (CLI, web
/// handler) calls. All methods take `&self`; wrap the engine in an `Arc` to
/// share it between tasks.
pub struct RideEngine {
    store: EntityStoreBox,
    queue: DispatchQueue,
    registry: DriverRegistry,
    fare_policy: Box<dyn FarePolicy>,
    next_trip_id: AtomicU64,
}

impl RideEngine {
    /// Creates an engine with a flat fare and lowest-registration-order
    /// driver selection.
    pub fn new(store: EntityStoreBox) -> Self {
        Self::with_policies(
            store,
            Box::new(FlatFare::default()),
            Box::new(LowestRegistrationOrder),
        )
    }

    /// Creates an engine with explicit fare and driver-selection policies.
    ///
    /// # Arguments
    ///
    /// * `store` - Owner of record for riders, drivers and trips.
    /// * `fare_policy` - Prices each trip when it is requested.
    /// * `selection` - Chooses a driver for [`RideEngine::dispatch_next`].
    pub fn with_policies(
        store: EntityStoreBox,
        fare_policy: Box<dyn FarePolicy>,
        selection: Box<dyn DriverSelectionPolicy>,
    ) -> Self {
        Self {
            store,
            queue: DispatchQueue::new(),
            registry: DriverRegistry::new(selection),
            fare_policy,
            next_trip_id: AtomicU64::new(1),
        }
    }

    pub fn from_config(store: EntityStoreBox, config: &EngineConfig) -> Result<Self> {
        Ok(Self::with_policies(
            store,
            config.fare_policy()?,
            config.selection_policy(),
        ))
    }

    pub async fn register_rider(
        &self,
        id: impl Into<RiderId>,
        name: &str,
        phone_number: &str,
    ) -> Result<RiderId> {
        let rider = Rider::new(id.into(), Profile::new(name, phone_number)?)?;
        let id = rider.id().clone();
        self.store.insert_rider(rider).await?;
        info!(rider = %id, "rider registered");
        Ok(id)
    }

    /// Registers a driver and makes it available for dispatch.
    pub async fn register_driver(
        &self,
        id: impl Into<DriverId>,
        name: &str,
        phone_number: &str,
        vehicle: &str,
    ) -> Result<DriverId> {
        let driver = Driver::new(id.into(), Profile::new(name, phone_number)?, vehicle)?;
        let id = driver.id().clone();
        self.store.insert_driver(driver).await?;
        self.registry.register(id.clone()).await?;
        info!(driver = %id, "driver registered");
        Ok(id)
    }

    pub async fn get_rider(&self, id: &RiderId) -> Result<Rider> {
        self.store
            .get_rider(id)
            .await?
            .ok_or_else(|| DispatchError::not_found(EntityKind::Rider, id))
    }

    /// Looks up a driver along with its current availability.
    pub async fn get_driver(&self, id: &DriverId) -> Result<DriverSnapshot> {
        let driver = self.find_driver(id).await?;
        let available = self.registry.is_available(id).await;
        Ok(DriverSnapshot { driver, available })
    }

    /// Looks up a rider or driver by id, riders first.
    pub async fn get_profile(&self, id: &str) -> Result<User> {
        if let Some(rider) = self.store.get_rider(&RiderId::new(id)).await? {
            return Ok(User::Rider(rider));
        }
        self.store
            .get_driver(&DriverId::new(id))
            .await?
            .map(User::Driver)
            .ok_or_else(|| DispatchError::not_found(EntityKind::User, id))
    }

    pub async fn get_trip(&self, id: TripId) -> Result<Trip> {
        self.store
            .get_trip(id)
            .await?
            .ok_or_else(|| DispatchError::not_found(EntityKind::Trip, id))
    }

    /// Prices and queues a new trip for `rider`.
    ///
    /// The fare is computed here, once, and is part of the returned trip.
    pub async fn request_ride(
        &self,
        rider: &RiderId,
        start_location: &str,
        destination: &str,
    ) -> Result<Trip> {
        self.get_rider(rider).await?;
        validate_locations(start_location, destination)?;

        let fare = self.fare_policy.compute_fare(start_location, destination);
        let id = TripId(self.next_trip_id.fetch_add(1, Ordering::Relaxed));
        let trip = Trip::request(id, rider.clone(), start_location, destination, fare)?;

        self.store.insert_trip(trip.clone()).await?;
        self.queue.enqueue(id).await;
        info!(trip = %id, rider = %rider, fare = %fare, "ride requested");
        Ok(trip)
    }

    /// Assigns the oldest pending trip to `driver`.
    pub async fn driver_accept_next(&self, driver: &DriverId) -> Result<DispatchOutcome> {
        self.find_driver(driver).await?;
        self.dispatcher().attempt_assign_to(driver).await
    }

    /// Assigns the oldest pending trip to whichever driver the selection
    /// policy picks.
    pub async fn dispatch_next(&self) -> Result<DispatchOutcome> {
        self.dispatcher().attempt_assign().await
    }

    /// Completes the driver's trip in progress and frees the driver.
    pub async fn complete_trip(&self, driver: &DriverId) -> Result<Trip> {
        let record = self.find_driver(driver).await?;
        let trip_id = record
            .current_trip()
            .ok_or_else(|| DispatchError::NoActiveTrip(driver.clone()))?;

        let trip = match self
            .store
            .transition_trip(trip_id, &[TripTransition::Complete])
            .await
        {
            Ok(trip) => trip,
            Err(DispatchError::IllegalTransition { .. }) => {
                return Err(DispatchError::NoActiveTrip(driver.clone()));
            }
            Err(e) => return Err(e),
        };

        self.registry.release(driver).await;
        info!(trip = %trip_id, driver = %driver, fare = %trip.fare(), "trip completed");
        Ok(trip)
    }

    /// Withdraws a trip that is still waiting for a driver.
    ///
    /// The trip's own lock decides between a cancel and a concurrent
    /// assignment; whichever transitions first wins. A trip that a
    /// dispatcher holds out of the queue at that moment is dropped by the
    /// dispatcher when it sees the cancellation.
    pub async fn cancel_ride(&self, trip: TripId) -> Result<Trip> {
        let cancelled = self
            .store
            .transition_trip(trip, &[TripTransition::Cancel])
            .await?;
        self.queue.remove(trip).await;
        info!(trip = %trip, "ride cancelled");
        Ok(cancelled)
    }

    /// Signs a driver on (`true`) or off (`false`).
    pub async fn set_driver_availability(&self, driver: &DriverId, online: bool) -> Result<()> {
        self.find_driver(driver).await?;
        if online {
            self.registry.mark_available(driver).await?;
        } else {
            self.registry.mark_offline(driver).await?;
        }
        info!(driver = %driver, online, "driver availability changed");
        Ok(())
    }

    pub async fn get_ride_history(&self, rider: &RiderId) -> Result<Vec<Trip>> {
        let rider = self.get_rider(rider).await?;
        self.store.get_trips(rider.ride_history()).await
    }

    pub async fn get_trip_history(&self, driver: &DriverId) -> Result<Vec<Trip>> {
        let driver = self.find_driver(driver).await?;
        self.store.get_trips(driver.trip_history()).await
    }

    /// Trips waiting for a driver, oldest first.
    pub async fn list_pending_trips(&self) -> Result<Vec<Trip>> {
        let pending = self.queue.snapshot().await;
        let mut trips = self.store.get_trips(&pending).await?;
        trips.retain(|trip| trip.status() == TripStatus::Requested);
        Ok(trips)
    }

    /// Every trip the engine has seen, by id.
    pub async fn all_trips(&self) -> Result<Vec<Trip>> {
        self.store.all_trips().await
    }

    pub async fn available_drivers(&self) -> Vec<DriverId> {
        self.registry.available_drivers().await
    }

    async fn find_driver(&self, id: &DriverId) -> Result<Driver> {
        self.store
            .get_driver(id)
            .await?
            .ok_or_else(|| DispatchError::not_found(EntityKind::Driver, id))
    }

    fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(self.store.as_ref(), &self.queue, &self.registry)
    }
}

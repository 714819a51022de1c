use super::queue::{DispatchQueue, PendingEntry};
use super::registry::DriverRegistry;
use crate::domain::ports::EntityStore;
use crate::domain::trip::{Trip, TripId, TripStatus, TripTransition};
use crate::domain::user::DriverId;
use crate::error::{DispatchError, EntityKind, Result};
use tracing::{debug, info, warn};

/// The result of one dispatch attempt.
///
/// Running out of drivers or of pending trips is a normal steady state, so
/// both are reported here rather than as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Assigned(Trip),
    NoAvailableDriver,
    NoPendingTrip,
}

impl DispatchOutcome {
    pub fn assigned(self) -> Option<Trip> {
        match self {
            DispatchOutcome::Assigned(trip) => Some(trip),
            _ => None,
        }
    }
}

/// Who gets claimed for the next pending trip.
#[derive(Debug, Clone, Copy)]
enum Claim<'a> {
    Policy,
    Driver(&'a DriverId),
}

/// Matches the oldest pending trip with a driver.
///
/// This is the only place that dequeues a trip and claims a driver as one
/// compound step. Each step takes its own lock (queue, registry, then the
/// trip). A failure that a retry could fix hands both the driver and the
/// trip back before returning. Entries whose trip was cancelled while out
/// of the queue are dropped and the next entry is tried.
pub struct Dispatcher<'a> {
    store: &'a dyn EntityStore,
    queue: &'a DispatchQueue,
    registry: &'a DriverRegistry,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        store: &'a dyn EntityStore,
        queue: &'a DispatchQueue,
        registry: &'a DriverRegistry,
    ) -> Self {
        Self {
            store,
            queue,
            registry,
        }
    }

    /// Assigns the oldest pending trip to the driver the selection policy
    /// picks.
    pub async fn attempt_assign(&self) -> Result<DispatchOutcome> {
        self.dispatch(Claim::Policy).await
    }

    /// Assigns the oldest pending trip to `driver`, if that driver is free.
    pub async fn attempt_assign_to(&self, driver: &DriverId) -> Result<DispatchOutcome> {
        self.dispatch(Claim::Driver(driver)).await
    }

    async fn dispatch(&self, claim: Claim<'_>) -> Result<DispatchOutcome> {
        // A named driver is claimed before touching the queue, so a busy
        // driver's attempt never holds the oldest trip out of line.
        let mut held = match claim {
            Claim::Driver(id) => {
                if !self.registry.claim(id).await {
                    return Ok(DispatchOutcome::NoAvailableDriver);
                }
                Some(id.clone())
            }
            Claim::Policy => None,
        };

        loop {
            let Some(entry) = self.queue.dequeue_next().await else {
                if let Some(driver) = &held {
                    self.registry.release(driver).await;
                }
                return Ok(DispatchOutcome::NoPendingTrip);
            };

            let driver = match held.take() {
                Some(driver) => driver,
                None => match self.registry.claim_driver().await {
                    Some(driver) => driver,
                    None => {
                        self.return_to_queue(entry).await;
                        debug!(trip = %entry.trip, "no driver available, trip requeued");
                        return Ok(DispatchOutcome::NoAvailableDriver);
                    }
                },
            };

            match self.bind(entry, &driver).await {
                Ok(trip) => {
                    // The binding is committed at this point; a history
                    // failure is a store fault and is reported without
                    // undoing the assignment.
                    self.record_history(&trip, &driver).await?;
                    info!(
                        trip = %trip.id(),
                        driver = %driver,
                        rider = %trip.rider(),
                        "trip assigned"
                    );
                    return Ok(DispatchOutcome::Assigned(trip));
                }
                Err(e) if is_stale(&e) => {
                    // Cancelled or gone: drop the entry, keep the driver for
                    // the next one.
                    debug!(trip = %entry.trip, error = %e, "stale queue entry dropped");
                    held = Some(driver);
                }
                Err(e) => {
                    self.registry.release(&driver).await;
                    self.queue.requeue(entry).await;
                    warn!(
                        trip = %entry.trip,
                        driver = %driver,
                        error = %e,
                        "assignment failed, claim reverted"
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn bind(&self, entry: PendingEntry, driver: &DriverId) -> Result<Trip> {
        self.store
            .transition_trip(
                entry.trip,
                &[TripTransition::Assign(driver.clone()), TripTransition::Start],
            )
            .await
    }

    /// Requeues an entry that could not be served, unless its trip was
    /// cancelled while it was out of the queue.
    ///
    /// A failed lookup keeps the entry.
    async fn return_to_queue(&self, entry: PendingEntry) {
        match self.store.get_trip(entry.trip).await {
            Ok(Some(trip)) if trip.status() != TripStatus::Requested => {
                debug!(trip = %entry.trip, "stale queue entry dropped");
            }
            Ok(None) => debug!(trip = %entry.trip, "stale queue entry dropped"),
            _ => self.queue.requeue(entry).await,
        }
    }

    async fn record_history(&self, trip: &Trip, driver: &DriverId) -> Result<()> {
        let id: TripId = trip.id();
        // Driver first: completing a trip looks it up through this history.
        self.store.append_driver_history(driver, id).await?;
        self.store.append_rider_history(trip.rider(), id).await
    }
}

/// Errors that no retry can fix: the trip left `Requested` or never existed.
fn is_stale(error: &DispatchError) -> bool {
    matches!(
        error,
        DispatchError::IllegalTransition { .. }
            | DispatchError::NotFound {
                kind: EntityKind::Trip,
                ..
            }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trip::Fare;
    use crate::domain::user::{Driver, Profile, Rider, RiderId};
    use crate::infrastructure::in_memory::InMemoryEntityStore;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Fixture {
        store: InMemoryEntityStore,
        queue: DispatchQueue,
        registry: DriverRegistry,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = InMemoryEntityStore::new();
            let profile = Profile::new("Amara", "555-0100").unwrap();
            store
                .insert_rider(Rider::new(RiderId::new("R1"), profile).unwrap())
                .await
                .unwrap();
            Self {
                store,
                queue: DispatchQueue::new(),
                registry: DriverRegistry::default(),
            }
        }

        async fn add_driver(&self, id: &str) {
            let profile = Profile::new("Kofi", "555-0199").unwrap();
            let driver = Driver::new(DriverId::new(id), profile, "Prius").unwrap();
            self.store.insert_driver(driver).await.unwrap();
            self.registry.register(DriverId::new(id)).await.unwrap();
        }

        async fn add_trip(&self, id: u64) {
            let trip = Trip::request(
                TripId(id),
                RiderId::new("R1"),
                "A",
                "B",
                Fare::new(dec!(70)).unwrap(),
            )
            .unwrap();
            self.store.insert_trip(trip).await.unwrap();
            self.queue.enqueue(TripId(id)).await;
        }

        fn dispatcher(&self) -> Dispatcher<'_> {
            Dispatcher::new(&self.store, &self.queue, &self.registry)
        }
    }

    #[tokio::test]
    async fn test_no_pending_trip() {
        let fixture = Fixture::new().await;
        fixture.add_driver("D1").await;

        let outcome = fixture.dispatcher().attempt_assign().await.unwrap();
        assert_eq!(outcome, DispatchOutcome::NoPendingTrip);
        assert!(fixture.registry.is_available(&DriverId::new("D1")).await);
    }

    #[tokio::test]
    async fn test_no_driver_requeues_at_front() {
        let fixture = Fixture::new().await;
        fixture.add_trip(1).await;
        fixture.add_trip(2).await;

        let outcome = fixture.dispatcher().attempt_assign().await.unwrap();
        assert_eq!(outcome, DispatchOutcome::NoAvailableDriver);
        assert_eq!(fixture.queue.snapshot().await, vec![TripId(1), TripId(2)]);
    }

    #[tokio::test]
    async fn test_successful_assignment_binds_everything() {
        let fixture = Fixture::new().await;
        fixture.add_driver("D1").await;
        fixture.add_trip(1).await;

        let trip = fixture
            .dispatcher()
            .attempt_assign()
            .await
            .unwrap()
            .assigned()
            .unwrap();
        assert_eq!(trip.status(), TripStatus::InProgress);
        assert_eq!(trip.driver(), Some(&DriverId::new("D1")));
        assert!(fixture.queue.is_empty().await);
        assert!(!fixture.registry.is_available(&DriverId::new("D1")).await);

        let rider = fixture.store.get_rider(&RiderId::new("R1")).await.unwrap().unwrap();
        let driver = fixture.store.get_driver(&DriverId::new("D1")).await.unwrap().unwrap();
        assert_eq!(rider.ride_history(), &[TripId(1)]);
        assert_eq!(driver.trip_history(), &[TripId(1)]);
    }

    #[tokio::test]
    async fn test_directed_claim_ignores_other_free_drivers() {
        let fixture = Fixture::new().await;
        fixture.add_driver("D1").await;
        fixture.add_driver("D2").await;
        fixture.add_trip(1).await;

        let trip = fixture
            .dispatcher()
            .attempt_assign_to(&DriverId::new("D2"))
            .await
            .unwrap()
            .assigned()
            .unwrap();
        assert_eq!(trip.driver(), Some(&DriverId::new("D2")));
        assert!(fixture.registry.is_available(&DriverId::new("D1")).await);

        fixture.add_trip(2).await;
        let outcome = fixture
            .dispatcher()
            .attempt_assign_to(&DriverId::new("D2"))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::NoAvailableDriver);
        assert_eq!(fixture.queue.snapshot().await, vec![TripId(2)]);
    }

    #[tokio::test]
    async fn test_stale_entry_is_dropped_not_requeued() {
        let fixture = Fixture::new().await;
        fixture.add_driver("D1").await;
        // Queued, but never stored.
        fixture.queue.enqueue(TripId(99)).await;
        fixture.add_trip(1).await;
        fixture
            .store
            .transition_trip(TripId(1), &[TripTransition::Cancel])
            .await
            .unwrap();
        fixture.add_trip(2).await;

        let trip = fixture
            .dispatcher()
            .attempt_assign()
            .await
            .unwrap()
            .assigned()
            .unwrap();
        assert_eq!(trip.id(), TripId(2));
        assert!(fixture.queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_stale_entries_only_release_the_driver() {
        let fixture = Fixture::new().await;
        fixture.add_driver("D1").await;
        fixture.queue.enqueue(TripId(99)).await;

        let outcome = fixture
            .dispatcher()
            .attempt_assign_to(&DriverId::new("D1"))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::NoPendingTrip);
        assert!(fixture.registry.is_available(&DriverId::new("D1")).await);
        assert!(fixture.queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_busy_driver_leaves_the_queue_alone() {
        let fixture = Fixture::new().await;
        fixture.add_driver("D1").await;
        fixture.add_trip(1).await;
        fixture.add_trip(2).await;
        fixture.registry.claim(&DriverId::new("D1")).await;

        let outcome = fixture
            .dispatcher()
            .attempt_assign_to(&DriverId::new("D1"))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::NoAvailableDriver);
        assert_eq!(fixture.queue.len().await, 2);
    }

    #[tokio::test]
    async fn test_cancelled_while_no_driver_is_not_requeued() {
        let fixture = Fixture::new().await;
        fixture.add_trip(1).await;
        let entry = fixture.queue.dequeue_next().await.unwrap();
        fixture
            .store
            .transition_trip(TripId(1), &[TripTransition::Cancel])
            .await
            .unwrap();

        fixture.dispatcher().return_to_queue(entry).await;
        assert!(fixture.queue.is_empty().await);
    }

    /// Wraps the in-memory store and fails selected calls on demand.
    #[derive(Default)]
    struct FaultyStore {
        inner: InMemoryEntityStore,
        fail_transitions: AtomicBool,
        fail_rider_history: AtomicBool,
    }

    fn store_fault() -> DispatchError {
        DispatchError::IoError(std::io::Error::other("store unavailable"))
    }

    #[async_trait]
    impl EntityStore for FaultyStore {
        async fn insert_rider(&self, rider: Rider) -> Result<()> {
            self.inner.insert_rider(rider).await
        }
        async fn get_rider(&self, id: &RiderId) -> Result<Option<Rider>> {
            self.inner.get_rider(id).await
        }
        async fn append_rider_history(&self, id: &RiderId, trip: TripId) -> Result<()> {
            if self.fail_rider_history.load(Ordering::SeqCst) {
                return Err(store_fault());
            }
            self.inner.append_rider_history(id, trip).await
        }
        async fn insert_driver(&self, driver: Driver) -> Result<()> {
            self.inner.insert_driver(driver).await
        }
        async fn get_driver(&self, id: &DriverId) -> Result<Option<Driver>> {
            self.inner.get_driver(id).await
        }
        async fn append_driver_history(&self, id: &DriverId, trip: TripId) -> Result<()> {
            self.inner.append_driver_history(id, trip).await
        }
        async fn insert_trip(&self, trip: Trip) -> Result<()> {
            self.inner.insert_trip(trip).await
        }
        async fn get_trip(&self, id: TripId) -> Result<Option<Trip>> {
            self.inner.get_trip(id).await
        }
        async fn get_trips(&self, ids: &[TripId]) -> Result<Vec<Trip>> {
            self.inner.get_trips(ids).await
        }
        async fn transition_trip(
            &self,
            id: TripId,
            transitions: &[TripTransition],
        ) -> Result<Trip> {
            if self.fail_transitions.load(Ordering::SeqCst) {
                return Err(store_fault());
            }
            self.inner.transition_trip(id, transitions).await
        }
        async fn all_trips(&self) -> Result<Vec<Trip>> {
            self.inner.all_trips().await
        }
    }

    async fn faulty_fixture() -> (FaultyStore, DispatchQueue, DriverRegistry) {
        let store = FaultyStore::default();
        let profile = Profile::new("Amara", "555-0100").unwrap();
        store
            .insert_rider(Rider::new(RiderId::new("R1"), profile.clone()).unwrap())
            .await
            .unwrap();
        store
            .insert_driver(Driver::new(DriverId::new("D1"), profile, "Prius").unwrap())
            .await
            .unwrap();
        let trip = Trip::request(
            TripId(1),
            RiderId::new("R1"),
            "A",
            "B",
            Fare::new(dec!(70)).unwrap(),
        )
        .unwrap();
        store.insert_trip(trip).await.unwrap();

        let queue = DispatchQueue::new();
        queue.enqueue(TripId(1)).await;
        let registry = DriverRegistry::default();
        registry.register(DriverId::new("D1")).await.unwrap();
        (store, queue, registry)
    }

    #[tokio::test]
    async fn test_failed_binding_is_compensated() {
        let (store, queue, registry) = faulty_fixture().await;
        store.fail_transitions.store(true, Ordering::SeqCst);

        let result = Dispatcher::new(&store, &queue, &registry)
            .attempt_assign()
            .await;
        assert!(matches!(result, Err(DispatchError::IoError(_))));
        assert!(registry.is_available(&DriverId::new("D1")).await);
        assert_eq!(queue.snapshot().await, vec![TripId(1)]);
    }

    #[tokio::test]
    async fn test_driver_history_is_recorded_before_rider_history() {
        let (store, queue, registry) = faulty_fixture().await;
        store.fail_rider_history.store(true, Ordering::SeqCst);

        let result = Dispatcher::new(&store, &queue, &registry)
            .attempt_assign()
            .await;
        assert!(result.is_err());

        let driver = store.get_driver(&DriverId::new("D1")).await.unwrap().unwrap();
        assert_eq!(driver.current_trip(), Some(TripId(1)));
        let trip = store.get_trip(TripId(1)).await.unwrap().unwrap();
        assert_eq!(trip.status(), TripStatus::InProgress);
    }
}

use rideshare_dispatch::application::engine::RideEngine;
use rideshare_dispatch::domain::fare::{FarePolicy, FlatFare};
use rideshare_dispatch::domain::ports::{EntityStore, EntityStoreBox};
use rideshare_dispatch::domain::selection::MostRecentlyRegistered;
use rideshare_dispatch::domain::trip::{Fare, Trip, TripId, TripTransition};
use rideshare_dispatch::domain::user::{DriverId, Profile, Rider, RiderId};
use rideshare_dispatch::infrastructure::in_memory::InMemoryEntityStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn test_store_as_trait_object() {
    let store: Arc<EntityStoreBox> = Arc::new(Box::new(InMemoryEntityStore::new()));

    let rider = Rider::new(RiderId::new("R1"), Profile::new("Amara", "555").unwrap()).unwrap();
    let trip = Trip::request(
        TripId(1),
        RiderId::new("R1"),
        "A",
        "B",
        Fare::new(dec!(70)).unwrap(),
    )
    .unwrap();

    // Verify Send + Sync by spawning tasks
    let riders = Arc::clone(&store);
    let rider_handle = tokio::spawn(async move {
        riders.insert_rider(rider).await.unwrap();
        riders.get_rider(&RiderId::new("R1")).await.unwrap().unwrap()
    });

    let trips = Arc::clone(&store);
    let trip_handle = tokio::spawn(async move {
        trips.insert_trip(trip).await.unwrap();
        trips
            .transition_trip(TripId(1), &[TripTransition::Cancel])
            .await
            .unwrap()
    });

    assert_eq!(rider_handle.await.unwrap().id(), &RiderId::new("R1"));
    assert_eq!(trip_handle.await.unwrap().id(), TripId(1));
}

/// Charges by how long the location names are; stands in for a distance model.
struct NameLengthFare;

impl FarePolicy for NameLengthFare {
    fn compute_fare(&self, start_location: &str, destination: &str) -> Fare {
        let units = Decimal::from(start_location.len() + destination.len());
        Fare::new(units * dec!(2.5)).unwrap_or(Fare::ZERO)
    }
}

#[tokio::test]
async fn test_custom_policies_plug_into_the_engine() {
    let engine = RideEngine::with_policies(
        Box::new(InMemoryEntityStore::new()),
        Box::new(NameLengthFare),
        Box::new(MostRecentlyRegistered),
    );
    let rider = engine.register_rider("R1", "Amara", "555").await.unwrap();
    engine.register_driver("D1", "Kofi", "556", "Prius").await.unwrap();
    engine.register_driver("D2", "Esi", "557", "Golf").await.unwrap();

    let trip = engine.request_ride(&rider, "Port", "Mall").await.unwrap();
    assert_eq!(trip.fare().value(), dec!(20));

    let assigned = engine.dispatch_next().await.unwrap().assigned().unwrap();
    assert_eq!(assigned.driver(), Some(&DriverId::new("D2")));
    assert_ne!(
        assigned.fare(),
        FlatFare::default().compute_fare("Port", "Mall")
    );
}

use rideshare_dispatch::application::engine::RideEngine;
use rideshare_dispatch::domain::user::{DriverId, RiderId};
use rideshare_dispatch::infrastructure::in_memory::InMemoryEntityStore;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub fn engine() -> Arc<RideEngine> {
    Arc::new(RideEngine::new(Box::new(InMemoryEntityStore::new())))
}

pub async fn register_riders(engine: &RideEngine, count: usize) -> Vec<RiderId> {
    let mut riders = Vec::with_capacity(count);
    for i in 1..=count {
        let id = engine
            .register_rider(format!("R{i}"), &format!("Rider {i}"), "555-0100")
            .await
            .unwrap();
        riders.push(id);
    }
    riders
}

pub async fn register_drivers(engine: &RideEngine, count: usize) -> Vec<DriverId> {
    let mut drivers = Vec::with_capacity(count);
    for i in 1..=count {
        let id = engine
            .register_driver(format!("D{i}"), &format!("Driver {i}"), "555-0199", "Sedan")
            .await
            .unwrap();
        drivers.push(id);
    }
    drivers
}

pub fn write_script(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

use crate::domain::trip::{Trip, TripStatus};
use crate::domain::user::DriverId;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

const HEADER: [&str; 7] = [
    "trip",
    "rider",
    "driver",
    "start",
    "destination",
    "fare",
    "status",
];

#[derive(Serialize)]
struct TripRecord<'a> {
    trip: u64,
    rider: &'a str,
    driver: &'a str,
    start: &'a str,
    destination: &'a str,
    fare: String,
    status: TripStatus,
}

impl<'a> From<&'a Trip> for TripRecord<'a> {
    fn from(trip: &'a Trip) -> Self {
        Self {
            trip: trip.id().0,
            rider: trip.rider().as_str(),
            driver: trip.driver().map(DriverId::as_str).unwrap_or_default(),
            start: trip.start_location(),
            destination: trip.destination(),
            fare: trip.fare().to_string(),
            status: trip.status(),
        }
    }
}

/// Writes trip snapshots as CSV, one row per trip, header first.
pub struct TripWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TripWriter<W> {
    pub fn new(destination: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(destination);
        Self { writer }
    }

    pub fn write_trips(&mut self, trips: &[Trip]) -> Result<()> {
        self.writer.write_record(HEADER)?;
        for trip in trips {
            self.writer.serialize(TripRecord::from(trip))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trip::{Fare, TripId};
    use crate::domain::user::RiderId;
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_trips() {
        let mut assigned = Trip::request(
            TripId(1),
            RiderId::new("R1"),
            "A",
            "B",
            Fare::new(dec!(70.00)).unwrap(),
        )
        .unwrap();
        assigned.assign(DriverId::new("D1")).unwrap();
        assigned.start().unwrap();
        let pending = Trip::request(
            TripId(2),
            RiderId::new("R2"),
            "Airport",
            "Harbour Street",
            Fare::new(dec!(12.5)).unwrap(),
        )
        .unwrap();

        let mut buffer = Vec::new();
        TripWriter::new(&mut buffer)
            .write_trips(&[assigned, pending])
            .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "trip,rider,driver,start,destination,fare,status\n\
             1,R1,D1,A,B,70,in_progress\n\
             2,R2,,Airport,Harbour Street,12.5,requested\n"
        );
    }
}

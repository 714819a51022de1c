//! Scripted commands a presentation layer feeds into the engine.

use crate::application::dispatcher::DispatchOutcome;
use crate::application::engine::RideEngine;
use crate::domain::trip::{Trip, TripId};
use crate::domain::user::{DriverId, RiderId};
use crate::error::{DispatchError, Result};
use csv::StringRecord;

/// One line of a command script, e.g. `request_ride,R1,Airport,Downtown`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    RegisterRider {
        id: RiderId,
        name: String,
        phone: String,
    },
    RegisterDriver {
        id: DriverId,
        name: String,
        phone: String,
        vehicle: String,
    },
    RequestRide {
        rider: RiderId,
        start: String,
        destination: String,
    },
    Accept {
        driver: DriverId,
    },
    Dispatch,
    Complete {
        driver: DriverId,
    },
    Cancel {
        trip: TripId,
    },
    Online {
        driver: DriverId,
    },
    Offline {
        driver: DriverId,
    },
    RideHistory {
        rider: RiderId,
    },
    TripHistory {
        driver: DriverId,
    },
    Pending,
    Profile {
        id: String,
    },
}

fn field(record: &StringRecord, index: usize, name: &str) -> Result<String> {
    record
        .get(index)
        .map(str::to_string)
        .ok_or_else(|| DispatchError::InvalidArgument(format!("missing field `{name}`")))
}

impl TryFrom<&StringRecord> for Command {
    type Error = DispatchError;

    fn try_from(record: &StringRecord) -> Result<Self> {
        let verb = field(record, 0, "command")?;
        let command = match verb.to_ascii_lowercase().as_str() {
            "register_rider" => Command::RegisterRider {
                id: field(record, 1, "id")?.into(),
                name: field(record, 2, "name")?,
                phone: field(record, 3, "phone")?,
            },
            "register_driver" => Command::RegisterDriver {
                id: field(record, 1, "id")?.into(),
                name: field(record, 2, "name")?,
                phone: field(record, 3, "phone")?,
                vehicle: field(record, 4, "vehicle")?,
            },
            "request_ride" => Command::RequestRide {
                rider: field(record, 1, "rider")?.into(),
                start: field(record, 2, "start")?,
                destination: field(record, 3, "destination")?,
            },
            "accept" => Command::Accept {
                driver: field(record, 1, "driver")?.into(),
            },
            "dispatch" => Command::Dispatch,
            "complete" => Command::Complete {
                driver: field(record, 1, "driver")?.into(),
            },
            "cancel" => {
                let raw = field(record, 1, "trip")?;
                let trip = raw.parse::<u64>().map_err(|_| {
                    DispatchError::InvalidArgument(format!("`{raw}` is not a trip id"))
                })?;
                Command::Cancel { trip: TripId(trip) }
            }
            "online" => Command::Online {
                driver: field(record, 1, "driver")?.into(),
            },
            "offline" => Command::Offline {
                driver: field(record, 1, "driver")?.into(),
            },
            "ride_history" => Command::RideHistory {
                rider: field(record, 1, "rider")?.into(),
            },
            "trip_history" => Command::TripHistory {
                driver: field(record, 1, "driver")?.into(),
            },
            "pending" => Command::Pending,
            "profile" => Command::Profile {
                id: field(record, 1, "id")?,
            },
            other => {
                return Err(DispatchError::InvalidArgument(format!(
                    "unknown command `{other}`"
                )));
            }
        };
        Ok(command)
    }
}

fn describe(trips: &[Trip]) -> String {
    if trips.is_empty() {
        return "no trips".to_string();
    }
    trips
        .iter()
        .map(Trip::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Command {
    /// Runs the command and returns a one-line summary of what happened.
    pub async fn execute(self, engine: &RideEngine) -> Result<String> {
        let summary = match self {
            Command::RegisterRider { id, name, phone } => {
                let id = engine.register_rider(id, &name, &phone).await?;
                format!("Rider {id} registered")
            }
            Command::RegisterDriver {
                id,
                name,
                phone,
                vehicle,
            } => {
                let id = engine.register_driver(id, &name, &phone, &vehicle).await?;
                format!("Driver {id} registered")
            }
            Command::RequestRide {
                rider,
                start,
                destination,
            } => engine.request_ride(&rider, &start, &destination).await?.to_string(),
            Command::Accept { driver } => match engine.driver_accept_next(&driver).await? {
                DispatchOutcome::Assigned(trip) => trip.to_string(),
                DispatchOutcome::NoAvailableDriver => format!("Driver {driver} is not available"),
                DispatchOutcome::NoPendingTrip => "No pending trips".to_string(),
            },
            Command::Dispatch => match engine.dispatch_next().await? {
                DispatchOutcome::Assigned(trip) => trip.to_string(),
                DispatchOutcome::NoAvailableDriver => "No drivers available".to_string(),
                DispatchOutcome::NoPendingTrip => "No pending trips".to_string(),
            },
            Command::Complete { driver } => engine.complete_trip(&driver).await?.to_string(),
            Command::Cancel { trip } => engine.cancel_ride(trip).await?.to_string(),
            Command::Online { driver } => {
                engine.set_driver_availability(&driver, true).await?;
                format!("Driver {driver} is online")
            }
            Command::Offline { driver } => {
                engine.set_driver_availability(&driver, false).await?;
                format!("Driver {driver} is offline")
            }
            Command::RideHistory { rider } => describe(&engine.get_ride_history(&rider).await?),
            Command::TripHistory { driver } => {
                describe(&engine.get_trip_history(&driver).await?)
            }
            Command::Pending => describe(&engine.list_pending_trips().await?),
            Command::Profile { id } => engine.get_profile(&id).await?.to_string(),
        };
        Ok(summary)
    }
}

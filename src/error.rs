use crate::domain::trip::{TripId, TripStatus};
use crate::domain::user::DriverId;
use std::fmt;
use thiserror::Error;

/// The kind of record a lookup or registration refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Rider,
    Driver,
    Trip,
    /// Either a rider or a driver.
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Rider => "rider",
            EntityKind::Driver => "driver",
            EntityKind::Trip => "trip",
            EntityKind::User => "user",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{kind} `{id}` not found")]
    NotFound { kind: EntityKind, id: String },
    #[error("{kind} `{id}` is already registered")]
    DuplicateId { kind: EntityKind, id: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Trip {trip} cannot {action} while {from}")]
    IllegalTransition {
        trip: TripId,
        from: TripStatus,
        action: &'static str,
    },
    #[error("Driver `{0}` has no trip in progress")]
    NoActiveTrip(DriverId),
    #[error("Driver `{0}` is busy with a trip")]
    DriverBusy(DriverId),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DispatchError {
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        DispatchError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn duplicate(kind: EntityKind, id: impl fmt::Display) -> Self {
        DispatchError::DuplicateId {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T, E = DispatchError> = std::result::Result<T, E>;

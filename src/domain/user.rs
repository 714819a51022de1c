use crate::domain::trip::TripId;
use crate::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier a rider registers under. Matched exactly, never fuzzily.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiderId(String);

/// Identifier a driver registers under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(RiderId);
string_id!(DriverId);

/// Fields every user carries regardless of role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub phone_number: String,
}

impl Profile {
    pub fn new(name: impl Into<String>, phone_number: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DispatchError::InvalidArgument(
                "name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name,
            phone_number: phone_number.into(),
        })
    }
}

/// A registered rider and the trips they have taken, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rider {
    id: RiderId,
    pub profile: Profile,
    ride_history: Vec<TripId>,
}

impl Rider {
    pub fn new(id: RiderId, profile: Profile) -> Result<Self> {
        if id.is_blank() {
            return Err(DispatchError::InvalidArgument(
                "rider id must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            profile,
            ride_history: Vec::new(),
        })
    }

    pub fn id(&self) -> &RiderId {
        &self.id
    }

    pub fn ride_history(&self) -> &[TripId] {
        &self.ride_history
    }

    pub(crate) fn record_trip(&mut self, trip: TripId) {
        self.ride_history.push(trip);
    }
}

/// A registered driver and the trips they have serviced, oldest first.
///
/// Availability is not stored here; the availability registry is the
/// single owner of that flag and reports it through [`DriverSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    id: DriverId,
    pub profile: Profile,
    pub vehicle: String,
    trip_history: Vec<TripId>,
}

impl Driver {
    pub fn new(id: DriverId, profile: Profile, vehicle: impl Into<String>) -> Result<Self> {
        if id.is_blank() {
            return Err(DispatchError::InvalidArgument(
                "driver id must not be empty".to_string(),
            ));
        }
        let vehicle = vehicle.into();
        if vehicle.trim().is_empty() {
            return Err(DispatchError::InvalidArgument(
                "vehicle details must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            profile,
            vehicle,
            trip_history: Vec::new(),
        })
    }

    pub fn id(&self) -> &DriverId {
        &self.id
    }

    pub fn trip_history(&self) -> &[TripId] {
        &self.trip_history
    }

    /// The most recent trip this driver was bound to, if any.
    pub fn current_trip(&self) -> Option<TripId> {
        self.trip_history.last().copied()
    }

    pub(crate) fn record_trip(&mut self, trip: TripId) {
        self.trip_history.push(trip);
    }
}

/// A driver record together with its availability at read time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverSnapshot {
    #[serde(flatten)]
    pub driver: Driver,
    pub available: bool,
}

/// Either kind of user, for code that only needs the shared capabilities.
#[derive(Debug, Clone, PartialEq)]
pub enum User {
    Rider(Rider),
    Driver(Driver),
}

impl User {
    pub fn id(&self) -> &str {
        match self {
            User::Rider(rider) => rider.id.as_str(),
            User::Driver(driver) => driver.id.as_str(),
        }
    }

    pub fn profile(&self) -> &Profile {
        match self {
            User::Rider(rider) => &rider.profile,
            User::Driver(driver) => &driver.profile,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile = self.profile();
        write!(
            f,
            "User ID: {}, Name: {}, Phone: {}",
            self.id(),
            profile.name,
            profile.phone_number
        )?;
        if let User::Driver(driver) = self {
            write!(f, ", Vehicle: {}", driver.vehicle)?;
        }
        Ok(())
    }
}

impl From<Rider> for User {
    fn from(rider: Rider) -> Self {
        User::Rider(rider)
    }
}

impl From<Driver> for User {
    fn from(driver: Driver) -> Self {
        User::Driver(driver)
    }
}

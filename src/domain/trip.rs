use crate::domain::user::{DriverId, RiderId};
use crate::error::{DispatchError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonically assigned trip identifier; the first trip is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(pub u64);

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative fare amount.
///
/// Wraps `rust_decimal::Decimal` so that fares can never be negative and
/// arithmetic on them stays exact.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fare(Decimal);

impl Fare {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(DispatchError::InvalidArgument(
                "Fare must not be negative".to_string(),
            ))
        }
    }

    /// For amounts already known to be non-negative.
    pub(crate) const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Fare {
    type Error = DispatchError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Fare> for Decimal {
    fn from(fare: Fare) -> Self {
        fare.0
    }
}

impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Requested,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    /// Whether a trip in this state must carry a driver.
    pub fn has_driver(self) -> bool {
        matches!(
            self,
            TripStatus::Assigned | TripStatus::InProgress | TripStatus::Completed
        )
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TripStatus::Requested => "requested",
            TripStatus::Assigned => "assigned",
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Rejects blank start or destination strings.
pub fn validate_locations(start_location: &str, destination: &str) -> Result<()> {
    if start_location.trim().is_empty() || destination.trim().is_empty() {
        return Err(DispatchError::InvalidArgument(
            "Start location and destination cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// A lifecycle step applied to a trip through [`Trip::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum TripTransition {
    Assign(DriverId),
    Start,
    Complete,
    Cancel,
}

/// A single ride from request to completion or cancellation.
///
/// Fields are private: once constructed a trip changes only through the
/// transition methods below, which keep `driver` present exactly when the
/// status requires one and never touch the fare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    id: TripId,
    rider: RiderId,
    driver: Option<DriverId>,
    start_location: String,
    destination: String,
    fare: Fare,
    status: TripStatus,
}

impl Trip {
    /// Creates a trip in the `Requested` state.
    ///
    /// Both locations must be non-empty; the fare is fixed from here on.
    pub fn request(
        id: TripId,
        rider: RiderId,
        start_location: impl Into<String>,
        destination: impl Into<String>,
        fare: Fare,
    ) -> Result<Self> {
        let start_location = start_location.into();
        let destination = destination.into();
        validate_locations(&start_location, &destination)?;
        Ok(Self {
            id,
            rider,
            driver: None,
            start_location,
            destination,
            fare,
            status: TripStatus::Requested,
        })
    }

    pub fn id(&self) -> TripId {
        self.id
    }

    pub fn rider(&self) -> &RiderId {
        &self.rider
    }

    pub fn driver(&self) -> Option<&DriverId> {
        self.driver.as_ref()
    }

    pub fn start_location(&self) -> &str {
        &self.start_location
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn fare(&self) -> Fare {
        self.fare
    }

    pub fn status(&self) -> TripStatus {
        self.status
    }

    /// Binds a driver to a requested trip.
    pub fn assign(&mut self, driver: DriverId) -> Result<()> {
        if driver.is_blank() {
            return Err(DispatchError::InvalidArgument(
                "driver id must not be empty".to_string(),
            ));
        }
        self.expect_status(TripStatus::Requested, "assign")?;
        self.driver = Some(driver);
        self.status = TripStatus::Assigned;
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.expect_status(TripStatus::Assigned, "start")?;
        self.status = TripStatus::InProgress;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<()> {
        self.expect_status(TripStatus::InProgress, "complete")?;
        self.status = TripStatus::Completed;
        Ok(())
    }

    /// Cancels a trip that has not been assigned yet.
    pub fn cancel(&mut self) -> Result<()> {
        self.expect_status(TripStatus::Requested, "cancel")?;
        self.status = TripStatus::Cancelled;
        Ok(())
    }

    pub fn apply(&mut self, transition: TripTransition) -> Result<()> {
        match transition {
            TripTransition::Assign(driver) => self.assign(driver),
            TripTransition::Start => self.start(),
            TripTransition::Complete => self.complete(),
            TripTransition::Cancel => self.cancel(),
        }
    }

    /// Applies `transitions` in order, leaving the trip untouched if any
    /// step is rejected.
    pub fn apply_all(&mut self, transitions: &[TripTransition]) -> Result<()> {
        let mut next = self.clone();
        for transition in transitions {
            next.apply(transition.clone())?;
        }
        *self = next;
        Ok(())
    }

    fn expect_status(&self, expected: TripStatus, action: &'static str) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(DispatchError::IllegalTransition {
                trip: self.id,
                from: self.status,
                action,
            })
        }
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trip ID: {}, Rider: {}, Driver: {}, Start: {}, Destination: {}, Fare: {}, Status: {}",
            self.id,
            self.rider,
            self.driver.as_ref().map(DriverId::as_str).unwrap_or("-"),
            self.start_location,
            self.destination,
            self.fare,
            self.status
        )
    }
}

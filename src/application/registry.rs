use crate::domain::selection::{DriverSelectionPolicy, LowestRegistrationOrder};
use crate::domain::user::DriverId;
use crate::error::{DispatchError, EntityKind, Result};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Eligible for the next claim.
    Available,
    /// Claimed for a trip.
    Busy,
    /// Signed off by the driver.
    Offline,
}

#[derive(Debug)]
struct DriverSlot {
    order: u64,
    availability: Availability,
}

#[derive(Debug, Default)]
struct RegistryState {
    next_order: u64,
    slots: HashMap<DriverId, DriverSlot>,
    // Available drivers keyed by registration order.
    available: BTreeMap<u64, DriverId>,
}

impl RegistryState {
    fn set(&mut self, id: &DriverId, availability: Availability) {
        if let Some(slot) = self.slots.get_mut(id) {
            if availability == Availability::Available {
                self.available.insert(slot.order, id.clone());
            } else {
                self.available.remove(&slot.order);
            }
            slot.availability = availability;
        }
    }
}

/// Tracks which drivers can take a trip.
///
/// A claim selects a driver and flips it to [`Availability::Busy`] inside
/// one critical section, so concurrent claims never return the same driver.
pub struct DriverRegistry {
    state: Mutex<RegistryState>,
    policy: Box<dyn DriverSelectionPolicy>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new(Box::new(LowestRegistrationOrder))
    }
}

impl DriverRegistry {
    pub fn new(policy: Box<dyn DriverSelectionPolicy>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            policy,
        }
    }

    /// Records the driver's registration order and marks it available.
    pub async fn register(&self, id: DriverId) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.slots.contains_key(&id) {
            return Err(DispatchError::duplicate(EntityKind::Driver, &id));
        }
        let order = state.next_order;
        state.next_order += 1;
        state.slots.insert(
            id.clone(),
            DriverSlot {
                order,
                availability: Availability::Available,
            },
        );
        state.available.insert(order, id);
        Ok(())
    }

    /// Brings an offline driver back into the pool.
    pub async fn mark_available(&self, id: &DriverId) -> Result<()> {
        let mut state = self.state.lock().await;
        match Self::availability_of(&state, id)? {
            Availability::Busy => Err(DispatchError::DriverBusy(id.clone())),
            Availability::Available => Ok(()),
            Availability::Offline => {
                state.set(id, Availability::Available);
                Ok(())
            }
        }
    }

    /// Takes an idle driver out of the pool. Busy drivers must finish first.
    pub async fn mark_offline(&self, id: &DriverId) -> Result<()> {
        let mut state = self.state.lock().await;
        match Self::availability_of(&state, id)? {
            Availability::Busy => Err(DispatchError::DriverBusy(id.clone())),
            Availability::Offline => Ok(()),
            Availability::Available => {
                state.set(id, Availability::Offline);
                Ok(())
            }
        }
    }

    /// Claims whichever available driver the selection policy picks.
    pub async fn claim_driver(&self) -> Option<DriverId> {
        let mut state = self.state.lock().await;
        if state.available.is_empty() {
            return None;
        }
        let candidates: Vec<DriverId> = state.available.values().cloned().collect();
        let chosen = candidates.get(self.policy.select(&candidates)?)?.clone();
        state.set(&chosen, Availability::Busy);
        Some(chosen)
    }

    /// Claims `id` if, and only if, it is currently available.
    pub async fn claim(&self, id: &DriverId) -> bool {
        let mut state = self.state.lock().await;
        let available = state
            .slots
            .get(id)
            .is_some_and(|slot| slot.availability == Availability::Available);
        if available {
            state.set(id, Availability::Busy);
        }
        available
    }

    /// Returns a claimed driver to the pool.
    pub async fn release(&self, id: &DriverId) {
        let mut state = self.state.lock().await;
        match state.slots.get(id).map(|slot| slot.availability) {
            Some(Availability::Busy) => state.set(id, Availability::Available),
            other => {
                warn!(driver = %id, state = ?other, "release of a driver that was not claimed")
            }
        }
    }

    pub async fn availability(&self, id: &DriverId) -> Option<Availability> {
        let state = self.state.lock().await;
        state.slots.get(id).map(|slot| slot.availability)
    }

    pub async fn is_available(&self, id: &DriverId) -> bool {
        self.availability(id).await == Some(Availability::Available)
    }

    /// Available drivers in registration order.
    pub async fn available_drivers(&self) -> Vec<DriverId> {
        let state = self.state.lock().await;
        state.available.values().cloned().collect()
    }

    fn availability_of(state: &RegistryState, id: &DriverId) -> Result<Availability> {
        state
            .slots
            .get(id)
            .map(|slot| slot.availability)
            .ok_or_else(|| DispatchError::not_found(EntityKind::Driver, id))
    }
}

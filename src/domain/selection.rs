//! Driver selection policies used when a claim does not name a driver.

use crate::domain::user::DriverId;

/// Chooses which available driver a policy-driven claim should take.
///
/// `candidates` holds every currently available driver ordered by
/// registration, oldest first, and is never empty. The returned index must
/// point into it; `None` declines the claim.
pub trait DriverSelectionPolicy: Send + Sync {
    fn select(&self, candidates: &[DriverId]) -> Option<usize>;
}

/// Picks the driver that registered first.
#[derive(Debug, Default, Clone, Copy)]
pub struct LowestRegistrationOrder;

impl DriverSelectionPolicy for LowestRegistrationOrder {
    fn select(&self, _candidates: &[DriverId]) -> Option<usize> {
        Some(0)
    }
}

/// Picks the driver that registered last.
#[derive(Debug, Default, Clone, Copy)]
pub struct MostRecentlyRegistered;

impl DriverSelectionPolicy for MostRecentlyRegistered {
    fn select(&self, candidates: &[DriverId]) -> Option<usize> {
        candidates.len().checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drivers() -> Vec<DriverId> {
        ["D1", "D2", "D3"].into_iter().map(DriverId::from).collect()
    }

    #[test]
    fn test_lowest_registration_order_takes_first() {
        assert_eq!(LowestRegistrationOrder.select(&drivers()), Some(0));
    }

    #[test]
    fn test_most_recently_registered_takes_last() {
        assert_eq!(MostRecentlyRegistered.select(&drivers()), Some(2));
        assert_eq!(MostRecentlyRegistered.select(&[]), None);
    }
}

//! Registry of navigators keyed by vehicle id.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{NavigationSnapshot, VehicleNavigator};

/// Shared set of [`VehicleNavigator`]s.
///
/// A fleet is constructed by the host and handed to whatever needs it;
/// clones share the same registry. Vehicles never share state with each
/// other, so the registry lock only guards membership.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    vehicles: Arc<RwLock<BTreeMap<String, VehicleNavigator>>>,
}

impl Fleet {
    /// Create an empty fleet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `navigator` under its vehicle id, returning any navigator it
    /// replaced.
    pub fn insert(&self, navigator: VehicleNavigator) -> Option<VehicleNavigator> {
        self.write()
            .insert(navigator.vehicle_id().to_owned(), navigator)
    }

    /// Look up a vehicle.
    #[must_use]
    pub fn get(&self, vehicle_id: &str) -> Option<VehicleNavigator> {
        self.read().get(vehicle_id).cloned()
    }

    /// Unregister a vehicle.
    pub fn remove(&self, vehicle_id: &str) -> Option<VehicleNavigator> {
        self.write().remove(vehicle_id)
    }

    /// Number of registered vehicles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no vehicle is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Snapshot every vehicle, ordered by vehicle id.
    #[must_use]
    pub fn snapshots(&self) -> Vec<NavigationSnapshot> {
        let navigators: Vec<VehicleNavigator> = self.read().values().cloned().collect();
        navigators
            .iter()
            .map(VehicleNavigator::snapshot)
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, VehicleNavigator>> {
        self.vehicles.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, VehicleNavigator>> {
        self.vehicles.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NavigatorConfig, Phase};
    use rstest::{fixture, rstest};
    use schoolrun_core::StraightLineResolver;
    use schoolrun_core::geodesy::lat_lng;

    fn navigator(id: &str) -> VehicleNavigator {
        VehicleNavigator::new(
            id,
            NavigatorConfig::new(lat_lng(0.0, 0.03), "School"),
            StraightLineResolver::default(),
        )
    }

    #[fixture]
    fn fleet() -> Fleet {
        let fleet = Fleet::new();
        assert!(fleet.insert(navigator("van-2")).is_none());
        assert!(fleet.insert(navigator("van-1")).is_none());
        fleet
    }

    #[rstest]
    fn snapshots_are_ordered_by_vehicle(fleet: Fleet) {
        let snapshots = fleet.snapshots();
        let ids: Vec<_> = snapshots.iter().map(|s| s.vehicle_id.as_str()).collect();
        assert_eq!(ids, ["van-1", "van-2"]);
        assert!(snapshots.iter().all(|s| s.phase == Phase::Idle));
    }

    #[rstest]
    fn clones_share_membership(fleet: Fleet) {
        let handle = fleet.clone();
        assert!(handle.remove("van-1").is_some());
        assert_eq!(fleet.len(), 1);
        assert!(fleet.get("van-1").is_none());
        let remaining = fleet.get("van-2").expect("van-2 stays registered");
        assert_eq!(remaining.vehicle_id(), "van-2");
    }

    #[rstest]
    fn inserting_twice_replaces(fleet: Fleet) {
        assert!(fleet.insert(navigator("van-1")).is_some());
        assert_eq!(fleet.len(), 2);
        assert!(!fleet.is_empty());
    }
}

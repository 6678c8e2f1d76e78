use super::point::GeoPoint;
use super::shape::Region;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionTransition {
    Entered(String),
    Exited(String),
}

/// Tracks which regions the last observed point was inside.
#[derive(Debug, Clone, Default)]
pub struct GeofenceTracker {
    regions: Vec<Region>,
    inside: HashSet<String>,
}

impl GeofenceTracker {
    pub fn new(regions: Vec<Region>) -> Self {
        Self {
            regions,
            inside: HashSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn is_inside(&self, region_id: &str) -> bool {
        self.inside.contains(region_id)
    }

    /// Transitions caused by moving to `point`, in region declaration order.
    pub fn observe(&mut self, point: &GeoPoint) -> Vec<RegionTransition> {
        let mut transitions = Vec::new();
        for region in &self.regions {
            let now_inside = region.contains(point);
            let was_inside = self.inside.contains(&region.id);
            match (was_inside, now_inside) {
                (false, true) => {
                    self.inside.insert(region.id.clone());
                    transitions.push(RegionTransition::Entered(region.id.clone()));
                }
                (true, false) => {
                    self.inside.remove(&region.id);
                    transitions.push(RegionTransition::Exited(region.id.clone()));
                }
                _ => {}
            }
        }
        transitions
    }
}

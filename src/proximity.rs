//! Proximity checks of the vehicle against points of interest

use crate::data::Poi;
use tracing::debug;

/// Entering this distance of a POI requests narration
pub const NARRATION_RADIUS: f32 = 800.0;

/// Within this distance the POI can be interacted with
pub const INTERACTION_RADIUS: f32 = 300.0;

/// Result of one proximity pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProximityUpdate {
    /// Indices of POIs that need narration this tick
    pub announce: Vec<usize>,
    /// Nearest POI inside the interaction radius
    pub nearby: Option<usize>,
    pub nearby_changed: bool,
}

/// Announcement and interaction state across ticks
#[derive(Debug, Clone, Default)]
pub struct ProximityTracker {
    last_announced: Option<String>,
    /// Narrating POIs that were inside the radius on the previous pass
    inside: Vec<String>,
    nearby: Option<usize>,
}

impl ProximityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every POI against the vehicle position.
    ///
    /// Narration fires for a non-history POI only on the pass that enters
    /// its radius, and a re-entry stays silent until a different POI has
    /// been announced in between. Overlapping radii announce each POI once.
    pub fn update(&mut self, vehicle_x: f32, pois: &[Poi]) -> ProximityUpdate {
        let mut announce = Vec::new();
        let mut inside = Vec::new();
        for (idx, poi) in pois.iter().enumerate() {
            if !poi.category.triggers_narration() {
                continue;
            }
            let dist = (vehicle_x - poi.x_position).abs();
            if dist >= NARRATION_RADIUS {
                continue;
            }
            let entered = !self.inside.contains(&poi.id);
            if entered && self.last_announced.as_deref() != Some(poi.id.as_str()) {
                debug!(poi = %poi.id, dist, "Entered narration radius");
                self.last_announced = Some(poi.id.clone());
                announce.push(idx);
            }
            inside.push(poi.id.clone());
        }
        self.inside = inside;

        let nearby = nearest_within(vehicle_x, pois, INTERACTION_RADIUS);
        let nearby_changed = nearby != self.nearby;
        if nearby_changed {
            debug!(
                poi = nearby.map(|i| pois[i].id.as_str()).unwrap_or("none"),
                "Interaction target changed"
            );
        }
        self.nearby = nearby;

        ProximityUpdate {
            announce,
            nearby,
            nearby_changed,
        }
    }

    pub fn last_announced(&self) -> Option<&str> {
        self.last_announced.as_deref()
    }

    pub fn nearby(&self) -> Option<usize> {
        self.nearby
    }

    pub fn reset(&mut self) {
        self.last_announced = None;
        self.inside.clear();
        self.nearby = None;
    }
}

/// Index of the POI closest to `x` within `radius` (first one wins ties)
pub fn nearest_within(x: f32, pois: &[Poi], radius: f32) -> Option<usize> {
    pois.iter()
        .enumerate()
        .map(|(idx, poi)| (idx, (x - poi.x_position).abs()))
        .filter(|(_, dist)| *dist < radius)
        .fold(None, |best: Option<(usize, f32)>, (idx, dist)| match best {
            Some((_, best_dist)) if best_dist <= dist => best,
            _ => Some((idx, dist)),
        })
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PoiCategory;

    fn create_test_pois() -> Vec<Poi> {
        vec![
            Poi::new("champ", PoiCategory::Project, "Champ", 7000.0),
            Poi::new("hackathon", PoiCategory::Link, "Hackathon", 9500.0),
            Poi::new("asu", PoiCategory::History, "ASU", 15000.0),
        ]
    }

    #[test]
    fn test_announce_once_per_dwell() {
        let pois = create_test_pois();
        let mut tracker = ProximityTracker::new();

        assert!(tracker.update(6000.0, &pois).announce.is_empty());

        let update = tracker.update(6300.0, &pois);
        assert_eq!(update.announce, vec![0]);
        assert_eq!(tracker.last_announced(), Some("champ"));

        // Lingering inside the radius does not repeat
        for x in [6500.0, 7000.0, 7500.0, 7700.0] {
            assert!(tracker.update(x, &pois).announce.is_empty());
        }
    }

    #[test]
    fn test_reentry_without_other_poi_stays_silent() {
        let pois = create_test_pois();
        let mut tracker = ProximityTracker::new();
        tracker.update(7000.0, &pois);
        tracker.update(5000.0, &pois);
        assert!(tracker.update(7000.0, &pois).announce.is_empty());
    }

    #[test]
    fn test_different_poi_clears_announcement() {
        let pois = create_test_pois();
        let mut tracker = ProximityTracker::new();

        assert_eq!(tracker.update(7000.0, &pois).announce, vec![0]);
        assert_eq!(tracker.update(9500.0, &pois).announce, vec![1]);
        assert_eq!(tracker.update(7000.0, &pois).announce, vec![0]);
    }

    #[test]
    fn test_overlapping_radii_announce_each_once() {
        let pois = vec![
            Poi::new("rover", PoiCategory::Project, "Rover", 1000.0),
            Poi::new("tea", PoiCategory::Project, "Tea Stall", 2000.0),
        ];
        let mut tracker = ProximityTracker::new();

        let mut total = 0;
        for tick in 0..10 {
            let update = tracker.update(1500.0, &pois);
            if tick == 0 {
                assert_eq!(update.announce, vec![0, 1], "Both POIs are entered on the first pass");
            } else {
                assert!(update.announce.is_empty(), "Parked between POIs must stay quiet");
            }
            total += update.announce.len();
        }
        assert_eq!(total, 2);

        // Leaving one radius and coming back is not a new POI
        tracker.update(2700.0, &pois);
        assert_eq!(tracker.update(1500.0, &pois).announce, vec![0]);
    }

    #[test]
    fn test_reset_forgets_inside_set() {
        let pois = create_test_pois();
        let mut tracker = ProximityTracker::new();
        assert_eq!(tracker.update(7000.0, &pois).announce, vec![0]);
        tracker.reset();
        assert_eq!(tracker.update(7000.0, &pois).announce, vec![0]);
    }

    #[test]
    fn test_history_never_announces() {
        let pois = create_test_pois();
        let mut tracker = ProximityTracker::new();
        assert!(tracker.update(15000.0, &pois).announce.is_empty());
        assert_eq!(tracker.last_announced(), None);
    }

    #[test]
    fn test_nearby_enter_and_exit() {
        let pois = create_test_pois();
        let mut tracker = ProximityTracker::new();

        let update = tracker.update(6800.0, &pois);
        assert_eq!(update.nearby, Some(0));
        assert!(update.nearby_changed);

        let update = tracker.update(6900.0, &pois);
        assert_eq!(update.nearby, Some(0));
        assert!(!update.nearby_changed);

        let update = tracker.update(7400.0, &pois);
        assert_eq!(update.nearby, None);
        assert!(update.nearby_changed);
    }

    #[test]
    fn test_history_is_interactable() {
        let pois = create_test_pois();
        let mut tracker = ProximityTracker::new();
        assert_eq!(tracker.update(15100.0, &pois).nearby, Some(2));
    }

    #[test]
    fn test_nearest_wins() {
        let pois = vec![
            Poi::new("a", PoiCategory::Project, "A", 1000.0),
            Poi::new("b", PoiCategory::Project, "B", 1400.0),
        ];
        assert_eq!(nearest_within(1150.0, &pois, INTERACTION_RADIUS), Some(0));
        assert_eq!(nearest_within(1250.0, &pois, INTERACTION_RADIUS), Some(1));
        assert_eq!(nearest_within(1200.0, &pois, INTERACTION_RADIUS), Some(0));
        assert_eq!(nearest_within(2000.0, &pois, INTERACTION_RADIUS), None);
    }
}

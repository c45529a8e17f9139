//! Terrain height field for the journey road

use crate::data::Poi;

/// Elevation the sine layers oscillate around
pub const BASE_ELEVATION: f32 = 400.0;

/// Deck height of the flattened "bridge" zone around a POI
pub const BRIDGE_ELEVATION: f32 = 350.0;

/// Distance from a POI within which terrain is reshaped
pub const FLATTEN_RADIUS: f32 = 800.0;

/// Distance from a POI within which terrain is completely flat
pub const FLAT_CORE_RADIUS: f32 = 500.0;

/// (amplitude, frequency) pairs, from large hills down to surface texture
const WAVE_LAYERS: [(f32, f32); 4] = [(200.0, 0.001), (80.0, 0.003), (15.0, 0.01), (4.0, 0.05)];

/// Rolling landscape before any POI flattening.
///
/// Continuous everywhere and extends infinitely in both directions.
pub fn base_height(x: f32) -> f32 {
    WAVE_LAYERS
        .iter()
        .fold(BASE_ELEVATION, |h, &(amplitude, frequency)| {
            h + (x * frequency).sin() * amplitude
        })
}

/// Height field with flattening zones around terrain-shaping POIs.
///
/// Only the x positions of POIs that flatten terrain are kept, in the
/// order they appear in the route. When zones overlap the first anchor in
/// that order wins.
#[derive(Debug, Clone, Default)]
pub struct Terrain {
    anchors: Vec<f32>,
}

impl Terrain {
    pub fn new(pois: &[Poi]) -> Self {
        let anchors = pois
            .iter()
            .filter(|p| p.category.flattens_terrain())
            .map(|p| p.x_position)
            .collect();
        Self { anchors }
    }

    /// Terrain without any flattening zones
    pub fn unflattened() -> Self {
        Self::default()
    }

    /// Ground height at world x.
    pub fn height(&self, x: f32) -> f32 {
        match self.flattening_anchor(x) {
            Some(anchor) => {
                let dist = (x - anchor).abs();
                if dist < FLAT_CORE_RADIUS {
                    return BRIDGE_ELEVATION;
                }
                // Linear blend over the remaining ring keeps the surface C0
                let t = (dist - FLAT_CORE_RADIUS) / (FLATTEN_RADIUS - FLAT_CORE_RADIUS);
                BRIDGE_ELEVATION * (1.0 - t) + base_height(x) * t
            }
            None => base_height(x),
        }
    }

    /// First anchor (in route order) whose zone contains x
    pub fn flattening_anchor(&self, x: f32) -> Option<f32> {
        self.anchors
            .iter()
            .copied()
            .find(|anchor| (x - anchor).abs() < FLATTEN_RADIUS)
    }

    pub fn is_flattened(&self, x: f32) -> bool {
        self.flattening_anchor(x).is_some()
    }

    /// Sample the ground silhouette on a regular grid covering [start, end].
    ///
    /// The last sample is always at `end` or beyond so a filled polygon
    /// reaches the right edge of the requested span.
    pub fn sample_range(&self, start: f32, end: f32, step: f32) -> Vec<(f32, f32)> {
        let step = if step > 0.0 { step } else { 1.0 };
        let count = (((end - start) / step).ceil().max(0.0)) as usize + 1;
        (0..count)
            .map(|i| {
                let x = start + i as f32 * step;
                (x, self.height(x))
            })
            .collect()
    }
}

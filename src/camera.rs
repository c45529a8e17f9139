//! Smoothed camera follow

use crate::data::{CameraState, VehicleState, Viewport};

/// Fraction of the viewport width left of the vehicle (forward visibility bias)
pub const ANCHOR_X: f32 = 0.4;

/// Fraction of the viewport height above the vehicle
pub const ANCHOR_Y: f32 = 0.65;

/// Horizontal smoothing rate per tick
pub const SMOOTHING_X: f32 = 0.1;

/// Vertical smoothing rate per tick; slower so bumps don't jolt the view
pub const SMOOTHING_Y: f32 = 0.05;

/// Camera offset that places the vehicle at the anchor point
pub fn target_for(vehicle: &VehicleState, viewport: &Viewport) -> CameraState {
    CameraState {
        x: vehicle.x - viewport.width * ANCHOR_X,
        y: vehicle.y - viewport.height * ANCHOR_Y,
    }
}

impl CameraState {
    /// Move a fraction of the way towards the vehicle's camera target.
    pub fn follow(&mut self, vehicle: &VehicleState, viewport: &Viewport) {
        let target = target_for(vehicle, viewport);
        self.x += (target.x - self.x) * SMOOTHING_X;
        self.y += (target.y - self.y) * SMOOTHING_Y;

        if !self.x.is_finite() || !self.y.is_finite() {
            *self = target;
        }
    }

    /// Jump straight to the target (session start / restart).
    pub fn snap_to(&mut self, vehicle: &VehicleState, viewport: &Viewport) {
        *self = target_for(vehicle, viewport);
    }

    /// World to screen conversion for a layer with the given parallax factor
    pub fn to_screen(&self, world_x: f32, world_y: f32, parallax: f32) -> (f32, f32) {
        (world_x - self.x * parallax, world_y - self.y * parallax)
    }
}

//! Vehicle physics for the side-scrolling journey
//!
//! One call to [`update_vehicle`] advances the truck by a single tick:
//! - Throttle/reverse input with passive drag (no active braking)
//! - Hard speed clamp and world-bound clamps
//! - Chassis pitch from two axle contact samples, smoothed
//! - Cosmetic bounce, suspension sway and wheel spin
//!
//! Physics never fails. Every quantity is clamped so even rapidly toggled
//! or replayed input cannot diverge or produce NaN.

use crate::data::{ControlInput, VehicleState};
use crate::procgen::Terrain;

/// Velocity added per tick while a pedal is held (world units/tick²)
pub const ACCEL: f32 = 0.5;

/// Maximum speed magnitude (world units/tick)
pub const MAX_SPEED: f32 = 35.0;

/// Passive drag applied every tick
pub const FRICTION: f32 = 0.98;

/// Left edge of the drivable world
pub const LOWER_BOUND: f32 = 100.0;

/// Distance before the world edge at which the finish fires
pub const FINISH_MARGIN: f32 = 200.0;

/// Distance between rear and front axle contact points
pub const WHEELBASE: f32 = 70.0;

/// Body lift above the averaged wheel contact height
pub const RIDE_HEIGHT: f32 = 65.0;

const THROTTLE_STEP: f32 = 0.1;
const THROTTLE_DECAY: f32 = 0.9;
const SQUAT_FACTOR: f32 = -0.25;
const ANGLE_SMOOTHING: f32 = 0.2;
const WHEEL_SPIN_FACTOR: f32 = 0.15;

/// Horizontal extent of the drivable world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub lower: f32,
    pub width: f32,
}

impl WorldBounds {
    pub fn new(width: f32) -> Self {
        Self {
            lower: LOWER_BOUND,
            width: width.max(LOWER_BOUND),
        }
    }

    pub fn finish_x(&self) -> f32 {
        self.width - FINISH_MARGIN
    }
}

/// Terrain samples under both axles for the tick just simulated
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelContact {
    pub rear_x: f32,
    pub rear_y: f32,
    pub front_y: f32,
}

/// One-shot finish notification guard
#[derive(Debug, Clone, Copy, Default)]
pub struct FinishLatch {
    fired: bool,
}

impl FinishLatch {
    /// Returns true exactly once: the first time `x` is past the finish.
    pub fn check(&mut self, x: f32, bounds: &WorldBounds) -> bool {
        if !self.fired && x > bounds.finish_x() {
            self.fired = true;
            return true;
        }
        false
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// Advance the vehicle by one tick.
///
/// `elapsed` is the session clock (advanced by `TIME_STEP` per tick) and
/// only feeds the cosmetic bounce terms.
pub fn update_vehicle(
    state: &mut VehicleState,
    input: &ControlInput,
    terrain: &Terrain,
    bounds: &WorldBounds,
    elapsed: f32,
) -> WheelContact {
    // 1. Pedals
    if input.forward {
        state.velocity += ACCEL;
        state.throttle = (state.throttle + THROTTLE_STEP).min(1.0);
    } else if input.backward {
        state.velocity -= ACCEL;
        state.throttle = (state.throttle - THROTTLE_STEP).max(-1.0);
    } else {
        state.throttle *= THROTTLE_DECAY;
    }

    // 2. Drag and speed clamp
    state.velocity *= FRICTION;
    if !state.velocity.is_finite() {
        state.velocity = 0.0;
    }
    state.velocity = state.velocity.clamp(-MAX_SPEED, MAX_SPEED);

    // 3. Integrate and clamp to the world
    state.x += state.velocity;
    if !state.x.is_finite() || state.x < bounds.lower {
        state.x = bounds.lower;
        state.velocity = 0.0;
    }
    if state.x > bounds.width {
        state.x = bounds.width;
        state.velocity = 0.0;
    }

    // 4. Chassis pitch from the two axle samples
    let contact = sample_axles(terrain, state.x);
    let target_angle = (contact.front_y - contact.rear_y).atan2(WHEELBASE);
    let squat = state.throttle * SQUAT_FACTOR;
    state.chassis_angle = smooth_angle(state.chassis_angle, target_angle + squat);

    // 5. Body height with bounce and suspension sway
    let speed = state.velocity.abs();
    let bounce = (elapsed * 8.0).sin() * speed * 0.05;
    let sway = (elapsed * 2.0).sin() * speed * 0.1;
    state.y = (contact.rear_y + contact.front_y) / 2.0 + bounce + sway - RIDE_HEIGHT;

    // 6. Wheel spin
    state.wheel_angle += state.velocity * WHEEL_SPIN_FACTOR;

    contact
}

/// Sample terrain under the rear and front axle of a vehicle at `x`
pub fn sample_axles(terrain: &Terrain, x: f32) -> WheelContact {
    let rear_x = x - WHEELBASE / 2.0;
    let front_x = x + WHEELBASE / 2.0;
    WheelContact {
        rear_x,
        rear_y: terrain.height(rear_x),
        front_y: terrain.height(front_x),
    }
}

/// Place a vehicle at rest on the ground at its current x
pub fn settle_on_ground(state: &mut VehicleState, terrain: &Terrain) {
    let contact = sample_axles(terrain, state.x);
    state.chassis_angle = (contact.front_y - contact.rear_y).atan2(WHEELBASE);
    state.y = (contact.rear_y + contact.front_y) / 2.0 - RIDE_HEIGHT;
}

/// Exponential blend of the chassis angle towards its target
fn smooth_angle(current: f32, target: f32) -> f32 {
    let next = current * (1.0 - ANGLE_SMOOTHING) + target * ANGLE_SMOOTHING;
    if next.is_finite() {
        next
    } else {
        0.0
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Ephemeral particles (exhaust, dust) and ambient clouds

use crate::data::{Cloud, Particle, ParticleKind, VehicleState};
use crate::physics::WheelContact;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Particles only spawn above this speed (world units/tick)
pub const SPAWN_SPEED_THRESHOLD: f32 = 1.0;

/// Life lost per tick; exhaust lasts ~50 ticks, dust ~30
pub const LIFE_DECAY: f32 = 0.02;

/// Multiplicative size growth per tick
pub const SIZE_GROWTH: f32 = 1.02;

/// Safety bound on live particles
pub const DEFAULT_MAX_PARTICLES: usize = 512;

pub const CLOUD_COUNT: usize = 25;

/// Clouds drift this far past the world edge before wrapping
pub const CLOUD_MARGIN: f32 = 4000.0;

/// Where a wrapped cloud re-enters
pub const CLOUD_RESET_X: f32 = -500.0;

const DUST_CHANCE: f64 = 0.5;
const EXHAUST_OFFSET_X: f32 = -65.0;
const EXHAUST_OFFSET_Y: f32 = -15.0;
const DUST_OFFSET_X: f32 = -40.0;
const DUST_LIFE: f32 = 0.6;

// Seeds the cloud stream apart from the particle stream
const CLOUD_SEED_SALT: u64 = 0xC10D_5EED;

/// Live particle set, exclusively owned by the session
pub struct ParticleSystem {
    particles: Vec<Particle>,
    max_particles: usize,
    rng: SmallRng,
    at_capacity: bool,
}

impl ParticleSystem {
    pub fn new(seed: u64, max_particles: usize) -> Self {
        Self {
            particles: Vec::new(),
            max_particles,
            rng: SmallRng::seed_from_u64(seed),
            at_capacity: false,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Spawn exhaust every tick and dust about half the ticks while moving.
    pub fn emit_for_vehicle(&mut self, vehicle: &VehicleState, contact: &WheelContact) {
        if vehicle.velocity.abs() <= SPAWN_SPEED_THRESHOLD {
            return;
        }
        self.spawn(ParticleKind::Exhaust, vehicle, contact);
        if self.rng.gen_bool(DUST_CHANCE) {
            self.spawn(ParticleKind::Dust, vehicle, contact);
        }
    }

    /// Spawn a single particle of `kind` relative to the vehicle.
    ///
    /// Returns false when the safety bound is reached and nothing was added.
    pub fn spawn(&mut self, kind: ParticleKind, vehicle: &VehicleState, contact: &WheelContact) -> bool {
        if self.particles.len() >= self.max_particles {
            if !self.at_capacity {
                debug!(max = self.max_particles, "Particle cap reached, skipping spawns");
                self.at_capacity = true;
            }
            return false;
        }
        self.at_capacity = false;

        let particle = match kind {
            ParticleKind::Exhaust => Particle {
                x: vehicle.x + EXHAUST_OFFSET_X,
                y: vehicle.y + EXHAUST_OFFSET_Y,
                vx: -vehicle.velocity * 0.5 - 2.0,
                vy: -1.0 + self.rng.gen::<f32>() * 2.0,
                life: 1.0,
                size: 5.0 + self.rng.gen::<f32>() * 5.0,
                kind,
            },
            ParticleKind::Dust => Particle {
                x: vehicle.x + DUST_OFFSET_X,
                y: contact.rear_y,
                vx: -vehicle.velocity * 0.2,
                vy: -self.rng.gen::<f32>() * 3.0,
                life: DUST_LIFE,
                size: 2.0 + self.rng.gen::<f32>() * 4.0,
                kind,
            },
        };
        self.particles.push(particle);
        true
    }

    /// Age every particle by `dt` ticks.
    pub fn advance(&mut self, dt: f32) {
        let growth = SIZE_GROWTH.powf(dt);
        for p in &mut self.particles {
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.life -= LIFE_DECAY * dt;
            p.size *= growth;
        }
    }

    /// Remove particles whose life ran out, returning how many were removed.
    pub fn prune_dead(&mut self) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| p.life > 0.0);
        before - self.particles.len()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.at_capacity = false;
    }
}

/// Fixed set of decorative clouds on a wrapping horizontal domain
pub struct CloudField {
    clouds: Vec<Cloud>,
    wrap_at: f32,
}

impl CloudField {
    pub fn new(seed: u64, world_width: f32) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed ^ CLOUD_SEED_SALT);
        let clouds = (0..CLOUD_COUNT)
            .map(|_| Cloud {
                x: rng.gen::<f32>() * 4000.0,
                y: 50.0 + rng.gen::<f32>() * 300.0,
                scale: 0.5 + rng.gen::<f32>() * 2.0,
                speed: 0.1 + rng.gen::<f32>() * 0.4,
                opacity: 0.4 + rng.gen::<f32>() * 0.6,
            })
            .collect();
        Self {
            clouds,
            wrap_at: world_width + CLOUD_MARGIN,
        }
    }

    pub fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    pub fn wrap_at(&self) -> f32 {
        self.wrap_at
    }

    /// Drift every cloud and wrap the ones past the far edge.
    pub fn advance(&mut self, dt: f32) {
        for cloud in &mut self.clouds {
            cloud.x += cloud.speed * dt;
            if cloud.x > self.wrap_at {
                cloud.x = CLOUD_RESET_X;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moving_vehicle(velocity: f32) -> VehicleState {
        let mut v = VehicleState::new(1000.0);
        v.y = 300.0;
        v.velocity = velocity;
        v
    }

    fn contact() -> WheelContact {
        WheelContact {
            rear_x: 965.0,
            rear_y: 365.0,
            front_y: 365.0,
        }
    }

    #[test]
    fn test_no_spawn_when_slow() {
        let mut system = ParticleSystem::new(1, DEFAULT_MAX_PARTICLES);
        system.emit_for_vehicle(&moving_vehicle(0.5), &contact());
        system.emit_for_vehicle(&moving_vehicle(-1.0), &contact());
        assert!(system.is_empty());
    }

    #[test]
    fn test_exhaust_every_tick_dust_sometimes() {
        let mut system = ParticleSystem::new(7, DEFAULT_MAX_PARTICLES);
        let vehicle = moving_vehicle(20.0);
        for _ in 0..200 {
            system.emit_for_vehicle(&vehicle, &contact());
        }

        let exhaust = system.particles().iter().filter(|p| p.kind == ParticleKind::Exhaust).count();
        let dust = system.particles().iter().filter(|p| p.kind == ParticleKind::Dust).count();
        assert_eq!(exhaust, 200);
        assert!(dust > 60 && dust < 140, "Dust count {} should be about half", dust);
    }

    #[test]
    fn test_spawn_positions_and_velocity_bias() {
        let mut system = ParticleSystem::new(3, DEFAULT_MAX_PARTICLES);
        let vehicle = moving_vehicle(10.0);
        system.spawn(ParticleKind::Exhaust, &vehicle, &contact());
        system.spawn(ParticleKind::Dust, &vehicle, &contact());

        let exhaust = system.particles()[0];
        assert_eq!(exhaust.x, 935.0);
        assert_eq!(exhaust.y, 285.0);
        assert_eq!(exhaust.vx, -7.0);
        assert!(exhaust.vy >= -1.0 && exhaust.vy <= 1.0);
        assert_eq!(exhaust.life, 1.0);

        let dust = system.particles()[1];
        assert_eq!(dust.x, 960.0);
        assert_eq!(dust.y, 365.0);
        assert_eq!(dust.vx, -2.0);
        assert!(dust.vy <= 0.0);
        assert_eq!(dust.life, DUST_LIFE);
    }

    #[test]
    fn test_life_decreases_and_size_grows() {
        let mut system = ParticleSystem::new(3, DEFAULT_MAX_PARTICLES);
        system.spawn(ParticleKind::Exhaust, &moving_vehicle(10.0), &contact());
        let before = system.particles()[0];

        system.advance(1.0);
        let after = system.particles()[0];
        assert!(after.life < before.life);
        assert!(after.size > before.size);
        assert_eq!(after.x, before.x + before.vx);
    }

    #[test]
    fn test_removed_first_tick_life_not_positive() {
        let mut system = ParticleSystem::new(3, DEFAULT_MAX_PARTICLES);
        system.spawn(ParticleKind::Dust, &moving_vehicle(10.0), &contact());

        let mut ticks = 0;
        loop {
            system.advance(1.0);
            let alive_life = system.particles().first().map(|p| p.life);
            system.prune_dead();
            ticks += 1;
            match alive_life {
                Some(life) if life <= 0.0 => {
                    assert!(system.is_empty(), "Dead particle must be pruned the same tick");
                    break;
                }
                Some(_) => assert_eq!(system.len(), 1),
                None => panic!("Particle vanished while alive"),
            }
        }
        assert!((29..=31).contains(&ticks), "Dust lasted {} ticks", ticks);
    }

    #[test]
    fn test_capacity_bound() {
        let mut system = ParticleSystem::new(3, 10);
        let vehicle = moving_vehicle(30.0);
        for _ in 0..100 {
            system.emit_for_vehicle(&vehicle, &contact());
        }
        assert_eq!(system.len(), 10);
        assert!(!system.spawn(ParticleKind::Exhaust, &vehicle, &contact()));
    }

    #[test]
    fn test_cloud_field_initialization() {
        let field = CloudField::new(42, 34000.0);
        assert_eq!(field.clouds().len(), CLOUD_COUNT);
        for cloud in field.clouds() {
            assert!((0.0..=4000.0).contains(&cloud.x));
            assert!((50.0..=350.0).contains(&cloud.y));
            assert!((0.1..=0.5).contains(&cloud.speed));
            assert!((0.4..=1.0).contains(&cloud.opacity));
        }
    }

    #[test]
    fn test_cloud_wraps_past_margin() {
        let mut field = CloudField::new(42, 1000.0);
        let wrap_at = field.wrap_at();
        assert_eq!(wrap_at, 5000.0);

        let mut saw_wrap = false;
        for _ in 0..100_000 {
            let before: Vec<f32> = field.clouds().iter().map(|c| c.x).collect();
            field.advance(1.0);
            for (prev, cloud) in before.iter().zip(field.clouds()) {
                assert!(cloud.x <= wrap_at, "Cloud escaped: {}", cloud.x);
                if cloud.x < *prev {
                    assert_eq!(cloud.x, CLOUD_RESET_X);
                    assert!(prev + cloud.speed > wrap_at, "Wrapped early");
                    saw_wrap = true;
                }
            }
        }
        assert!(saw_wrap, "Clouds should have wrapped at least once");
    }

    #[test]
    fn test_same_seed_same_clouds() {
        let a = CloudField::new(9, 34000.0);
        let b = CloudField::new(9, 34000.0);
        assert_eq!(a.clouds(), b.clouds());
    }
}

//! Session orchestration: one owned struct holding all simulation state
//!
//! Per tick, in order:
//! - deliver narrations that resolved since the previous tick
//! - unless paused: vehicle physics, particle spawn/aging, cloud drift,
//!   camera follow and the finish latch
//! - proximity scan (narration triggers and the interaction report)
//!
//! Rendering is separate and read-only, see [`GameSession::render`].

use crate::config::SimConfig;
use crate::content::Route;
use crate::data::{CameraState, Cloud, ControlInput, Particle, Poi, PoiCategory, VehicleState, Viewport, START_X, TIME_STEP};
use crate::narration::{NarrationDispatcher, NarrationRequest, RESTART_MESSAGE};
use crate::particles::{CloudField, ParticleSystem, DEFAULT_MAX_PARTICLES};
use crate::physics::{self, FinishLatch, WorldBounds};
use crate::procgen::Terrain;
use crate::proximity::ProximityTracker;
use crate::render::{render_scene, SceneView, Surface};
use tracing::{debug, info};

/// Callbacks from the session to the presentation layer
pub trait SessionObserver {
    /// Called every tick with the nearest POI in interaction range
    fn on_proximity_change(&mut self, _poi: Option<&Poi>) {}

    fn on_narration(&mut self, _text: &str) {}

    /// Called exactly once per session, on the first finish crossing
    fn on_finish(&mut self) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Observer that keeps every callback it receives
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub proximity: Vec<Option<String>>,
    pub narrations: Vec<String>,
    pub finishes: usize,
}

impl SessionObserver for RecordingObserver {
    fn on_proximity_change(&mut self, poi: Option<&Poi>) {
        self.proximity.push(poi.map(|p| p.id.clone()));
    }

    fn on_narration(&mut self, text: &str) {
        self.narrations.push(text.to_string());
    }

    fn on_finish(&mut self) {
        self.finishes += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Driving,
    /// Detail view of the POI at this route index is open
    Details { poi: usize },
    Finished,
}

/// Outcome of pressing the interact key
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    OpenLink(String),
    ShowDetails(Poi),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub seed: u64,
    pub max_particles: usize,
    pub viewport: Viewport,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            max_particles: DEFAULT_MAX_PARTICLES,
            viewport: Viewport::default(),
        }
    }
}

impl From<&SimConfig> for SessionOptions {
    fn from(config: &SimConfig) -> Self {
        Self {
            seed: config.session.seed,
            max_particles: config.session.max_particles,
            viewport: config.viewport(),
        }
    }
}

pub struct GameSession {
    route: Route,
    terrain: Terrain,
    bounds: WorldBounds,
    options: SessionOptions,

    vehicle: VehicleState,
    camera: CameraState,
    particles: ParticleSystem,
    clouds: CloudField,
    proximity: ProximityTracker,
    finish: FinishLatch,
    nearby: Option<usize>,

    phase: SessionPhase,
    external_pause: bool,
    elapsed: f32,
    ticks: u64,

    /// Bumped on restart; narrations from older generations are dropped
    generation: u64,
    narration: NarrationDispatcher,
}

impl GameSession {
    pub fn new(route: Route, options: SessionOptions, narration: NarrationDispatcher) -> Self {
        let terrain = Terrain::new(&route.pois);
        let bounds = WorldBounds::new(route.world_width);
        let mut session = Self {
            particles: ParticleSystem::new(options.seed, options.max_particles),
            clouds: CloudField::new(options.seed, route.world_width),
            route,
            terrain,
            bounds,
            options,
            vehicle: VehicleState::new(START_X),
            camera: CameraState::default(),
            proximity: ProximityTracker::new(),
            finish: FinishLatch::default(),
            nearby: None,
            phase: SessionPhase::Driving,
            external_pause: false,
            elapsed: 0.0,
            ticks: 0,
            generation: 0,
            narration,
        };
        session.reset_world();
        info!(
            "Session started: {} POIs, world width {}, seed {}",
            session.route.pois.len(),
            session.route.world_width,
            session.options.seed
        );
        session.narration.request(session.generation, NarrationRequest::Welcome);
        session
    }

    /// Session over the built-in route with offline narration
    pub fn offline(options: SessionOptions) -> Self {
        Self::new(Route::builtin(), options, NarrationDispatcher::offline())
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self, input: ControlInput, observer: &mut dyn SessionObserver) {
        self.deliver_narrations(observer);

        if !self.is_paused() {
            let contact =
                physics::update_vehicle(&mut self.vehicle, &input, &self.terrain, &self.bounds, self.elapsed);
            self.particles.emit_for_vehicle(&self.vehicle, &contact);
            self.particles.advance(1.0);
            self.particles.prune_dead();
            self.clouds.advance(1.0);
            self.camera.follow(&self.vehicle, &self.options.viewport);
            self.elapsed += TIME_STEP;
            self.ticks += 1;

            if self.finish.check(self.vehicle.x, &self.bounds) {
                info!("Finish reached at x={:.0} after {} ticks", self.vehicle.x, self.ticks);
                self.phase = SessionPhase::Finished;
                observer.on_finish();
            }
        }

        let update = self.proximity.update(self.vehicle.x, &self.route.pois);
        for idx in update.announce {
            let poi = &self.route.pois[idx];
            self.narration.request(
                self.generation,
                NarrationRequest::Poi {
                    id: poi.id.clone(),
                    title: poi.title.clone(),
                    description: poi.description.clone(),
                },
            );
        }
        self.nearby = update.nearby;
        observer.on_proximity_change(self.nearby_poi());
    }

    /// Draw the current state. Never mutates the session.
    pub fn render(&self, surface: &mut dyn Surface) {
        let view = SceneView {
            viewport: self.options.viewport,
            camera: self.camera,
            vehicle: &self.vehicle,
            terrain: &self.terrain,
            route: &self.route,
            particles: self.particles.particles(),
            clouds: self.clouds.clouds(),
            elapsed: self.elapsed,
        };
        render_scene(&view, surface);
    }

    /// Act on the POI currently in interaction range.
    pub fn interact(&mut self) -> Option<Interaction> {
        if self.phase != SessionPhase::Driving {
            return None;
        }
        let idx = self.nearby?;
        let poi = &self.route.pois[idx];

        if poi.category == PoiCategory::Link {
            if let Some(url) = &poi.link {
                info!("Opening link for {}", poi.id);
                return Some(Interaction::OpenLink(url.clone()));
            }
        }

        debug!(poi = %poi.id, "Showing details");
        self.phase = SessionPhase::Details { poi: idx };
        Some(Interaction::ShowDetails(poi.clone()))
    }

    pub fn close_details(&mut self) {
        if matches!(self.phase, SessionPhase::Details { .. }) {
            self.phase = SessionPhase::Driving;
        }
    }

    /// Start over from the beginning of the route.
    pub fn restart(&mut self) {
        self.generation += 1;
        self.reset_world();
        self.phase = SessionPhase::Driving;
        self.finish = FinishLatch::default();
        self.proximity.reset();
        self.nearby = None;
        info!("Session restarted (generation {})", self.generation);
        self.narration.announce(self.generation, RESTART_MESSAGE);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.external_pause = paused;
    }

    /// Paused by the shell, by an open detail view or by the finish
    pub fn is_paused(&self) -> bool {
        self.external_pause || self.phase != SessionPhase::Driving
    }

    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn particles(&self) -> &[Particle] {
        self.particles.particles()
    }

    pub fn clouds(&self) -> &[Cloud] {
        self.clouds.clouds()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    pub fn viewport(&self) -> Viewport {
        self.options.viewport
    }

    /// Change the logical viewport (window resize)
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.options.viewport = viewport;
    }

    pub fn nearby_poi(&self) -> Option<&Poi> {
        self.nearby.and_then(|idx| self.route.pois.get(idx))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Simulated (unpaused) ticks since the last start
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn reset_world(&mut self) {
        self.vehicle = VehicleState::new(START_X);
        physics::settle_on_ground(&mut self.vehicle, &self.terrain);
        self.camera.snap_to(&self.vehicle, &self.options.viewport);
        self.particles = ParticleSystem::new(self.options.seed, self.options.max_particles);
        self.clouds = CloudField::new(self.options.seed, self.route.world_width);
        self.elapsed = 0.0;
        self.ticks = 0;
    }

    fn deliver_narrations(&mut self, observer: &mut dyn SessionObserver) {
        for narration in self.narration.drain() {
            if narration.generation != self.generation {
                debug!(
                    generation = narration.generation,
                    current = self.generation,
                    "Dropping stale narration"
                );
                continue;
            }
            observer.on_narration(&narration.text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::{RESTART_MESSAGE, WELCOME_FALLBACK};

    fn create_test_session() -> GameSession {
        GameSession::offline(SessionOptions::default())
    }

    /// Drive forward just long enough that coasting stops the vehicle near `target_x`
    fn park_at(session: &mut GameSession, target_x: f32, observer: &mut RecordingObserver) {
        let coast_distance = |v: f32| v * FRICTION_COAST;
        for _ in 0..20_000 {
            let vehicle = session.vehicle();
            if vehicle.x + coast_distance(vehicle.velocity) >= target_x {
                break;
            }
            session.tick(ControlInput::FORWARD, observer);
        }
        for _ in 0..600 {
            session.tick(ControlInput::IDLE, observer);
        }
    }

    /// Sum of f^n for n >= 1 with the per-tick drag factor f = 0.98
    const FRICTION_COAST: f32 = 49.0;

    #[test]
    fn test_session_creation() {
        let session = create_test_session();
        assert_eq!(session.vehicle().x, START_X);
        assert_eq!(session.phase(), SessionPhase::Driving);
        assert!(!session.is_paused());
        assert_eq!(session.ticks(), 0);
        assert!(session.particles().is_empty());
        assert_eq!(session.clouds().len(), crate::particles::CLOUD_COUNT);
    }

    #[test]
    fn test_welcome_narration_on_first_tick() {
        let mut session = create_test_session();
        let mut observer = RecordingObserver::default();
        session.tick(ControlInput::IDLE, &mut observer);
        assert_eq!(observer.narrations, vec![WELCOME_FALLBACK.to_string()]);
    }

    #[test]
    fn test_proximity_reported_every_tick() {
        let mut session = create_test_session();
        let mut observer = RecordingObserver::default();
        for _ in 0..10 {
            session.tick(ControlInput::IDLE, &mut observer);
        }
        assert_eq!(observer.proximity.len(), 10);
        assert!(observer.proximity.iter().all(Option::is_none));
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut session = create_test_session();
        let mut observer = RecordingObserver::default();
        for _ in 0..30 {
            session.tick(ControlInput::FORWARD, &mut observer);
        }

        session.set_paused(true);
        let vehicle = *session.vehicle();
        let camera = *session.camera();
        let particles = session.particles().to_vec();
        let clouds = session.clouds().to_vec();
        let elapsed = session.elapsed();

        for _ in 0..50 {
            session.tick(ControlInput::FORWARD, &mut observer);
        }
        assert_eq!(*session.vehicle(), vehicle);
        assert_eq!(*session.camera(), camera);
        assert_eq!(session.particles(), particles.as_slice());
        assert_eq!(session.clouds(), clouds.as_slice());
        assert_eq!(session.elapsed(), elapsed);
        assert_eq!(observer.proximity.len(), 80, "Proximity still reported while paused");

        session.set_paused(false);
        session.tick(ControlInput::FORWARD, &mut observer);
        assert!(session.vehicle().x > vehicle.x);
    }

    #[test]
    fn test_details_pause_until_closed() {
        let mut session = create_test_session();
        let mut observer = RecordingObserver::default();
        park_at(&mut session, 7000.0, &mut observer);

        let nearby = session.nearby_poi().map(|p| p.id.clone());
        assert_eq!(nearby.as_deref(), Some("p_champ"), "Should coast to a stop by the first project");

        match session.interact() {
            Some(Interaction::ShowDetails(poi)) => assert_eq!(poi.id, "p_champ"),
            other => panic!("Expected details, got {:?}", other),
        }
        assert!(session.is_paused());
        assert!(session.interact().is_none(), "No interaction while details are open");

        session.close_details();
        assert!(!session.is_paused());
    }

    #[test]
    fn test_link_interaction_opens_url() {
        let mut session = create_test_session();
        let mut observer = RecordingObserver::default();
        park_at(&mut session, 9500.0, &mut observer);

        assert_eq!(session.nearby_poi().map(|p| p.id.as_str()), Some("link_honeywell"));
        match session.interact() {
            Some(Interaction::OpenLink(url)) => assert!(url.starts_with("https://www.linkedin.com/")),
            other => panic!("Expected link, got {:?}", other),
        }
        assert!(!session.is_paused(), "Opening a link does not pause");
    }

    #[test]
    fn test_interact_with_nothing_nearby() {
        let mut session = create_test_session();
        assert!(session.interact().is_none());
        assert_eq!(session.phase(), SessionPhase::Driving);
    }

    #[test]
    fn test_parked_between_close_pois_narrates_each_once() {
        let route = Route {
            world_width: crate::data::DEFAULT_WORLD_WIDTH,
            title_sign: Default::default(),
            pois: vec![
                Poi::new("rover", PoiCategory::Project, "Rover", 1000.0),
                Poi::new("tea", PoiCategory::Project, "Tea Stall", 2000.0),
            ],
        };
        let mut session = GameSession::new(route, SessionOptions::default(), NarrationDispatcher::offline());
        let mut observer = RecordingObserver::default();

        park_at(&mut session, 1500.0, &mut observer);
        for _ in 0..600 {
            session.tick(ControlInput::IDLE, &mut observer);
        }

        assert_eq!(observer.narrations[0], WELCOME_FALLBACK);
        assert!(
            observer.narrations.len() <= 3,
            "Each POI should be narrated at most once: {:?}",
            observer.narrations
        );
    }

    #[test]
    fn test_restart_resets_state_and_drops_stale_narration() {
        let mut session = create_test_session();
        let mut observer = RecordingObserver::default();
        for _ in 0..100 {
            session.tick(ControlInput::FORWARD, &mut observer);
        }
        assert_eq!(observer.narrations.len(), 1);

        // Resolved for the old generation but not yet delivered
        session.narration.request(
            0,
            NarrationRequest::Poi {
                id: "p_champ".to_string(),
                title: "Champ".to_string(),
                description: String::new(),
            },
        );

        session.restart();
        assert_eq!(session.generation(), 1);
        assert_eq!(session.vehicle().x, START_X);
        assert_eq!(session.vehicle().velocity, 0.0);
        assert!(session.particles().is_empty());
        assert_eq!(session.ticks(), 0);
        assert_eq!(session.elapsed(), 0.0);

        session.tick(ControlInput::IDLE, &mut observer);
        assert_eq!(
            &observer.narrations[1..],
            [RESTART_MESSAGE.to_string()],
            "Only the restart notice should arrive"
        );
    }

    #[test]
    fn test_render_leaves_state_untouched() {
        let mut session = create_test_session();
        let mut observer = RecordingObserver::default();
        for _ in 0..40 {
            session.tick(ControlInput::FORWARD, &mut observer);
        }
        let vehicle = *session.vehicle();
        let mut list = crate::render::DisplayList::new();
        session.render(&mut list);
        assert!(!list.is_empty());
        assert_eq!(*session.vehicle(), vehicle);
    }
}

//! Layered scene composition
//!
//! [`render_scene`] is a pure function of the state in a [`SceneView`]: it
//! draws the whole frame back to front and never mutates anything.

use super::sprites::{
    draw_back_railing, draw_billboard, draw_castle, draw_cloud, draw_finish_line, draw_grass_tuft,
    draw_guardrail, draw_poster, draw_rock, draw_tea_stall, draw_title_sign, draw_tree, draw_truck,
};
use super::{GradientStop, Layer, Paint, Surface};
use crate::content::Route;
use crate::data::{CameraState, Cloud, Color, Particle, PoiCategory, VehicleState, Viewport};
use crate::procgen::terrain::BRIDGE_ELEVATION;
use crate::procgen::{props_in_range, PropKind, Terrain};

/// Camera multiplier for mountains and posters
pub const BACKGROUND_PARALLAX: f32 = 0.1;

/// Clouds move at half the background rate
pub const CLOUD_PARALLAX: f32 = 0.5;

/// Vehicle distance within which the foreground guardrail of a bridge shows
pub const GUARDRAIL_RADIUS: f32 = 600.0;

/// The finish marker stands this far before the world edge
pub const FINISH_MARKER_OFFSET: f32 = 800.0;

const GROUND_STEP: f32 = 20.0;
const GROUND_FLOOR: f32 = 5000.0;
const MOUNTAIN_FLOOR: f32 = 1000.0;
const POSTER_Y: f32 = 150.0;

// POIs further than this outside the viewport are not drawn
const CULL_MARGIN: f32 = 1200.0;

const SKY_TOP: Color = Color::rgb(0x02, 0x88, 0xD1);
const SKY_BOTTOM: Color = Color::rgb(0xB3, 0xE5, 0xFC);
const SUN: Color = Color::rgb(0xFF, 0xEB, 0x3B);
const FAR_MOUNTAINS: Color = Color::rgb(0x5C, 0x6B, 0xC0);
const NEAR_MOUNTAINS: Color = Color::rgb(0x42, 0xA5, 0xF5);
const GRASS_EDGE: Color = Color::rgb(0x33, 0x69, 0x1E);

/// Everything a frame is drawn from
pub struct SceneView<'a> {
    pub viewport: Viewport,
    pub camera: CameraState,
    pub vehicle: &'a VehicleState,
    pub terrain: &'a Terrain,
    pub route: &'a Route,
    pub particles: &'a [Particle],
    pub clouds: &'a [Cloud],
    /// Session clock, drives swinging signs
    pub elapsed: f32,
}

pub fn render_scene(view: &SceneView, surface: &mut dyn Surface) {
    let para_x = view.camera.x * BACKGROUND_PARALLAX;
    let para_y = view.camera.y * BACKGROUND_PARALLAX;

    draw_sky(view, surface);
    draw_clouds(view, surface, para_x, para_y);
    draw_background(view, surface, para_x, para_y);
    draw_world(view, surface);
}

fn draw_sky(view: &SceneView, surface: &mut dyn Surface) {
    let Viewport { width, height } = view.viewport;
    surface.begin_layer(Layer::Sky);
    let sky = Paint::vertical(0.0, height, &[GradientStop::new(0.0, SKY_TOP), GradientStop::new(1.0, SKY_BOTTOM)]);
    surface.fill_rect(0.0, 0.0, width, height, &sky);

    // Glow then disc
    surface.fill_circle(width - 150.0, 100.0, 110.0, SUN.with_alpha(0.25));
    surface.fill_circle(width - 150.0, 100.0, 70.0, SUN);
}

/// Where a cloud is drawn in the cloud layer's frame.
///
/// Clouds far from the view are folded into the 4000-unit band around the
/// camera so the sky never runs empty.
pub fn cloud_draw_x(cloud_x: f32, para_x: f32, viewport_width: f32) -> f32 {
    let relative = cloud_x - para_x * CLOUD_PARALLAX;
    if relative > -500.0 && relative < viewport_width + 500.0 {
        cloud_x
    } else {
        cloud_x.rem_euclid(4000.0) + (para_x / 4000.0).floor() * 4000.0
    }
}

fn draw_clouds(view: &SceneView, surface: &mut dyn Surface, para_x: f32, para_y: f32) {
    surface.begin_layer(Layer::Clouds);
    surface.save();
    surface.translate(-para_x * CLOUD_PARALLAX, -para_y * CLOUD_PARALLAX);
    for cloud in view.clouds {
        let placed = Cloud {
            x: cloud_draw_x(cloud.x, para_x, view.viewport.width),
            ..*cloud
        };
        draw_cloud(surface, &placed);
    }
    surface.restore();
}

fn mountain_ridge(start: f32, end: f32, step: f32, height: impl Fn(f32) -> f32) -> Vec<(f32, f32)> {
    let mut points = vec![(start, MOUNTAIN_FLOOR)];
    let mut x = start;
    while x < end {
        points.push((x, height(x)));
        x += step;
    }
    points.push((end, MOUNTAIN_FLOOR));
    points
}

pub fn far_mountain_height(x: f32) -> f32 {
    (x * 0.005).sin() * 400.0 - 150.0 + ((x * 0.015).sin() * 80.0).abs()
}

pub fn near_mountain_height(x: f32) -> f32 {
    (x * 0.008 + 100.0).sin() * 200.0 + 50.0 + ((x * 0.03).sin() * 30.0).abs()
}

/// Poster position in the background layer's frame.
///
/// Scaled by the background parallax so the poster passes behind the scene
/// slowly and sits mid-screen while the vehicle is at its POI.
pub fn poster_anchor_x(poi_x: f32, viewport_width: f32) -> f32 {
    poi_x * BACKGROUND_PARALLAX + viewport_width * 0.5
}

fn draw_background(view: &SceneView, surface: &mut dyn Surface, para_x: f32, para_y: f32) {
    surface.begin_layer(Layer::Mountains);
    surface.save();
    surface.translate(-para_x, -para_y + 150.0);

    let start = (para_x / 1000.0).floor() * 1000.0 - 1000.0;
    let end = start + view.viewport.width + 1000.0 + 2000.0;
    surface.fill_polygon(&mountain_ridge(start, end, 80.0, far_mountain_height), &Paint::solid(FAR_MOUNTAINS));
    surface.fill_polygon(&mountain_ridge(start, end, 40.0, near_mountain_height), &Paint::solid(NEAR_MOUNTAINS));

    surface.begin_layer(Layer::Posters);
    for poi in view.route.pois.iter().filter(|p| p.is_poster()) {
        let x = poster_anchor_x(poi.x_position, view.viewport.width);
        let screen_x = x - para_x;
        if screen_x < -CULL_MARGIN || screen_x > view.viewport.width + CULL_MARGIN {
            continue;
        }
        draw_poster(surface, x, POSTER_Y, poi);
    }
    surface.restore();
}

fn draw_world(view: &SceneView, surface: &mut dyn Surface) {
    let camera = view.camera;
    let terrain = view.terrain;
    let visible_min = camera.x - CULL_MARGIN;
    let visible_max = camera.x + view.viewport.width + CULL_MARGIN;
    let in_view = |x: f32| x >= visible_min && x <= visible_max;

    surface.begin_layer(Layer::World);
    surface.save();
    surface.translate(-camera.x, -camera.y);

    // Ground silhouette
    let start = (camera.x / GROUND_STEP).floor() * GROUND_STEP - 100.0;
    let end = start + view.viewport.width + 300.0;
    let ridge = terrain.sample_range(start, end, GROUND_STEP);
    let mut ground = Vec::with_capacity(ridge.len() + 2);
    ground.push((start, GROUND_FLOOR));
    ground.extend_from_slice(&ridge);
    ground.push((ridge.last().map(|p| p.0).unwrap_or(end), GROUND_FLOOR));
    let soil = Paint::vertical(
        camera.y,
        camera.y + view.viewport.height,
        &[
            GradientStop::new(0.0, Color::rgb(0x68, 0x9F, 0x38)),
            GradientStop::new(0.3, GRASS_EDGE),
            GradientStop::new(1.0, Color::rgb(0x1B, 0x5E, 0x20)),
        ],
    );
    surface.fill_polygon(&ground, &soil);
    surface.stroke_polyline(&ridge, GRASS_EDGE, 6.0);

    let sign = &view.route.title_sign;
    if in_view(sign.x) {
        draw_title_sign(surface, sign.x, terrain.height(sign.x), &sign.text);
    }

    for prop in props_in_range(terrain, (start / 50.0).floor() * 50.0, end) {
        match prop.kind {
            PropKind::GrassTuft => draw_grass_tuft(surface, prop.x, prop.ground_y),
            PropKind::Tree { scale } => draw_tree(surface, prop.x, prop.ground_y, scale),
            PropKind::Rock { variant } => draw_rock(surface, prop.x, prop.ground_y, variant),
        }
    }

    for p in view.particles {
        surface.fill_circle(p.x, p.y, p.size, p.kind.color().with_alpha(p.life));
    }

    for poi in view.route.pois.iter().filter(|p| in_view(p.x_position)) {
        let x = poi.x_position;
        if poi.is_poster() {
            draw_billboard(surface, x, terrain.height(x), "INFO POINT", "Stop & Look Up", poi.color, false);
        } else if poi.category == PoiCategory::History {
            draw_billboard(surface, x, terrain.height(x), &poi.title, &poi.description, poi.color, true);
        } else if poi.has_bridge() {
            draw_back_railing(surface, x, BRIDGE_ELEVATION);
            if poi.category == PoiCategory::TeaStall {
                draw_tea_stall(surface, x, BRIDGE_ELEVATION, view.elapsed);
            } else {
                draw_castle(surface, x, BRIDGE_ELEVATION, poi);
            }
        }
    }

    let finish_x = view.route.world_width - FINISH_MARKER_OFFSET;
    if in_view(finish_x) {
        draw_finish_line(surface, finish_x, terrain.height(finish_x));
    }

    let vehicle = view.vehicle;
    surface.save();
    surface.translate(vehicle.x, vehicle.y);
    surface.rotate(vehicle.chassis_angle);
    draw_truck(surface, vehicle.wheel_angle);
    surface.restore();

    surface.begin_layer(Layer::Foreground);
    for poi in view.route.pois.iter().filter(|p| p.has_bridge()) {
        if (vehicle.x - poi.x_position).abs() < GUARDRAIL_RADIUS {
            draw_guardrail(surface, poi.x_position, BRIDGE_ELEVATION);
        }
    }

    surface.restore();
}

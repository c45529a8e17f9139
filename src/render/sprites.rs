//! Sprite drawing routines for world entities
//!
//! Every sprite draws in its own local frame through save/translate/restore
//! so callers only place it.

use super::{GradientStop, Paint, Surface, TextAlign};
use crate::data::{Cloud, Color, Poi};
use crate::procgen::RockVariant;
use std::f32::consts::{PI, TAU};

// --- Palette ---
const WOOD_DARK: Color = Color::rgb(0x4E, 0x34, 0x2E);
const WOOD: Color = Color::rgb(0x8D, 0x6E, 0x63);
const WOOD_TRIM: Color = Color::rgb(0x5D, 0x40, 0x37);
const PAPER: Color = Color::rgb(0xFF, 0xF3, 0xE0);
const PIN: Color = Color::rgb(0xB7, 0x1C, 0x1C);
const SLATE: Color = Color::rgb(0x26, 0x32, 0x38);
const TIRE: Color = Color::rgb(0x21, 0x21, 0x21);

/// Approximate glyph advance relative to the font size
const GLYPH_WIDTH: f32 = 0.55;

/// Greedy word wrap using an estimated glyph width
pub fn wrap_text(text: &str, max_width: f32, size: f32) -> Vec<String> {
    let max_chars = ((max_width / (size * GLYPH_WIDTH)).floor() as usize).max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn draw_wrapped(
    surface: &mut dyn Surface,
    text: &str,
    x: f32,
    y: f32,
    max_width: f32,
    line_height: f32,
    size: f32,
    color: Color,
) {
    for (i, line) in wrap_text(text, max_width, size).iter().enumerate() {
        surface.fill_text(line, x, y + i as f32 * line_height, size, color, TextAlign::Center);
    }
}

pub fn draw_cloud(surface: &mut dyn Surface, cloud: &Cloud) {
    let color = Color::WHITE.with_alpha(cloud.opacity);
    surface.save();
    surface.translate(cloud.x, cloud.y);
    surface.scale(cloud.scale, cloud.scale);
    for (cx, cy, r) in [(0.0, 0.0, 30.0), (40.0, 0.0, 40.0), (80.0, 0.0, 30.0), (40.0, -30.0, 40.0)] {
        surface.fill_circle(cx, cy, r, color);
    }
    surface.restore();
}

pub fn draw_tree(surface: &mut dyn Surface, x: f32, y: f32, scale: f32) {
    surface.save();
    surface.translate(x, y);
    surface.scale(scale, scale);
    surface.fill_rect(-6.0, -25.0, 12.0, 25.0, &Paint::solid(WOOD_DARK));
    let foliage = Color::rgb(0x2E, 0x7D, 0x32);
    surface.fill_circle(0.0, -30.0, 15.0, foliage);
    surface.fill_circle(-10.0, -25.0, 12.0, foliage);
    surface.fill_circle(10.0, -25.0, 12.0, foliage);
    surface.fill_circle(0.0, -35.0, 10.0, Color::rgb(0x38, 0x8E, 0x3C));
    surface.restore();
}

pub fn draw_grass_tuft(surface: &mut dyn Surface, x: f32, y: f32) {
    let color = Color::rgb(0x1B, 0x5E, 0x20);
    for (dx, dy) in [(-3.0, -8.0), (0.0, -10.0), (3.0, -8.0)] {
        surface.stroke_line(x, y, x + dx, y + dy, color, 2.0);
    }
}

pub fn draw_rock(surface: &mut dyn Surface, x: f32, y: f32, variant: RockVariant) {
    let paint = Paint::solid(Color::rgb(0x78, 0x90, 0x9C));
    match variant {
        RockVariant::Dome => {
            // Upper half disc sitting on the ground
            let points: Vec<(f32, f32)> = (0..=12)
                .map(|i| {
                    let angle = PI + PI * i as f32 / 12.0;
                    (x + angle.cos() * 10.0, y + 5.0 + angle.sin() * 10.0)
                })
                .collect();
            surface.fill_polygon(&points, &paint);
        }
        RockVariant::Shard => {
            let points = [(x, y), (x + 10.0, y), (x + 15.0, y - 8.0), (x + 5.0, y - 12.0), (x - 5.0, y - 5.0)];
            surface.fill_polygon(&points, &paint);
        }
    }
}

/// Roadside title sign: struts under large lettering
pub fn draw_title_sign(surface: &mut dyn Surface, x: f32, y: f32, text: &str) {
    let size = 100.0;
    let width = text.chars().count() as f32 * size * GLYPH_WIDTH;

    surface.save();
    surface.translate(x, y - 150.0);
    let strut = Color::rgb(0xDD, 0xDD, 0xDD);
    let mut sx = 20.0;
    while sx < width {
        surface.stroke_line(sx, 20.0, sx, 150.0, strut, 8.0);
        sx += 60.0;
    }
    surface.fill_text(text, 5.0, 5.0, size, Color::rgb(0xCC, 0xCC, 0xCC), TextAlign::Left);
    surface.fill_text(text, 0.0, 0.0, size, Color::WHITE, TextAlign::Left);
    surface.restore();
}

/// Oversized background billboard for posters and links
pub fn draw_poster(surface: &mut dyn Surface, x: f32, y: f32, poi: &Poi) {
    surface.save();
    surface.translate(x, y - 400.0);
    surface.scale(2.0, 2.0);

    let metal = SLATE;
    surface.stroke_line(-100.0, 150.0, -100.0, 600.0, metal, 14.0);
    surface.stroke_line(100.0, 150.0, 100.0, 600.0, metal, 14.0);
    surface.stroke_line(-100.0, 250.0, 100.0, 450.0, metal, 6.0);
    surface.stroke_line(100.0, 250.0, -100.0, 450.0, metal, 6.0);

    surface.fill_rect(-180.0, -120.0, 360.0, 280.0, &Paint::solid(Color::rgb(0x10, 0x20, 0x27)));
    surface.fill_rect(-165.0, -105.0, 330.0, 250.0, &Paint::solid(Color::WHITE));
    surface.fill_rect(-165.0, -105.0, 330.0, 60.0, &Paint::solid(Color::rgb(0x02, 0x77, 0xBD)));
    surface.fill_text("★ SHOWCASE ★", 0.0, -68.0, 24.0, Color::WHITE, TextAlign::Center);

    // Spotlight wash
    surface.fill_polygon(
        &[(-140.0, 145.0), (-100.0, 50.0), (100.0, 50.0), (140.0, 145.0)],
        &Paint::solid(Color::rgba(255, 255, 255, 0.1)),
    );

    draw_wrapped(surface, &poi.title.to_uppercase(), 0.0, -10.0, 310.0, 36.0, 32.0, Color::rgb(0x21, 0x21, 0x21));
    draw_wrapped(surface, &poi.description, 0.0, 80.0, 290.0, 26.0, 20.0, Color::rgb(0x42, 0x42, 0x42));
    surface.restore();
}

/// Pinned notice board on a post, in big or small size
pub fn draw_billboard(surface: &mut dyn Surface, x: f32, y: f32, title: &str, sub: &str, color: Color, big: bool) {
    let (post_h, board_w, board_h) = if big { (180.0, 240.0, 150.0) } else { (120.0, 160.0, 90.0) };
    let board_x = x - board_w / 2.0;
    let board_y = y - post_h - board_h + 20.0;

    surface.fill_rect(x - 6.0, y - post_h, 12.0, post_h, &Paint::solid(WOOD_DARK));
    surface.fill_rect(board_x, board_y, board_w, board_h, &Paint::solid(WOOD));
    surface.stroke_polyline(
        &[
            (board_x, board_y),
            (board_x + board_w, board_y),
            (board_x + board_w, board_y + board_h),
            (board_x, board_y + board_h),
            (board_x, board_y),
        ],
        WOOD_TRIM,
        4.0,
    );
    surface.fill_rect(board_x + 10.0, board_y + 10.0, board_w - 20.0, board_h - 20.0, &Paint::solid(PAPER));
    surface.fill_circle(board_x + 10.0, board_y + 10.0, 4.0, PIN);
    surface.fill_circle(board_x + board_w - 10.0, board_y + 10.0, 4.0, PIN);

    if big {
        surface.fill_text(title, x, board_y + 45.0, 22.0, color, TextAlign::Center);
        draw_wrapped(surface, sub, x, board_y + 75.0, 200.0, 18.0, 14.0, WOOD_TRIM);
    } else {
        surface.fill_text(title, x, board_y + 40.0, 16.0, WOOD_TRIM, TextAlign::Center);
        draw_wrapped(surface, sub, x, board_y + 60.0, 130.0, 14.0, 12.0, WOOD_TRIM);
    }
}

/// Chai stall with striped awning and a swinging sign
pub fn draw_tea_stall(surface: &mut dyn Surface, x: f32, y: f32, elapsed: f32) {
    surface.save();
    surface.translate(x, y);

    surface.fill_rect(-100.0, -10.0, 200.0, 10.0, &Paint::solid(WOOD));
    surface.fill_rect(-90.0, -130.0, 10.0, 120.0, &Paint::solid(WOOD_TRIM));
    surface.fill_rect(80.0, -130.0, 10.0, 120.0, &Paint::solid(WOOD_TRIM));
    surface.fill_rect(-90.0, -130.0, 180.0, 120.0, &Paint::solid(Color::rgb(0xD7, 0xCC, 0xC8)));

    // Shelf and jars
    surface.fill_rect(-90.0, -70.0, 180.0, 5.0, &Paint::solid(Color::rgb(0x79, 0x55, 0x48)));
    surface.fill_rect(-70.0, -90.0, 15.0, 20.0, &Paint::solid(Color::rgb(0xF4, 0x43, 0x36)));
    surface.fill_rect(-40.0, -90.0, 15.0, 20.0, &Paint::solid(Color::rgb(0xFF, 0x98, 0x00)));

    surface.fill_rect(-100.0, -50.0, 200.0, 50.0, &Paint::solid(WOOD_DARK));

    // Awning stripes
    let mut i = -120;
    while i < 120 {
        let stripe = if (i / 20) % 2 == 0 { Color::rgb(0xE6, 0x51, 0x00) } else { PAPER };
        surface.fill_rect(i as f32, -130.0, 20.0, 20.0, &Paint::solid(stripe));
        i += 20;
    }

    // Kettle and steam
    surface.fill_circle(0.0, -65.0, 18.0, Color::rgb(0xB0, 0xBE, 0xC5));
    let steam = Color::rgba(255, 255, 255, 0.7);
    surface.stroke_line(10.0, -85.0, 15.0, -100.0, steam, 3.0);
    surface.stroke_line(20.0, -82.0, 25.0, -95.0, steam, 3.0);

    surface.save();
    surface.translate(0.0, -160.0);
    surface.rotate((elapsed * 2.0).sin() * 0.05);
    surface.fill_rect(-70.0, 0.0, 140.0, 40.0, &Paint::solid(Color::rgb(0x3E, 0x27, 0x23)));
    surface.fill_text("GoTapri Chai", 0.0, 27.0, 20.0, Color::rgb(0xFF, 0xB7, 0x4D), TextAlign::Center);
    let string = Color::rgb(0x33, 0x33, 0x33);
    surface.stroke_line(-60.0, 0.0, -60.0, 30.0, string, 2.0);
    surface.stroke_line(60.0, 0.0, 60.0, 30.0, string, 2.0);
    surface.restore();

    surface.restore();
}

/// Castle structure for project POIs, roofed in the POI color
pub fn draw_castle(surface: &mut dyn Surface, x: f32, y: f32, poi: &Poi) {
    surface.save();
    surface.translate(x, y);

    surface.fill_rect(-140.0, 0.0, 280.0, 20.0, &Paint::solid(Color::rgba(0, 0, 0, 0.2)));
    surface.fill_rect(-80.0, -200.0, 160.0, 200.0, &Paint::solid(Color::rgb(0xCF, 0xD8, 0xDC)));

    let stone_dark = Color::rgb(0x90, 0xA4, 0xAE);
    let stone_light = Color::rgb(0xB0, 0xBE, 0xC5);
    let tower = Paint::vertical(
        -150.0,
        0.0,
        &[GradientStop::new(0.0, stone_light), GradientStop::new(1.0, stone_dark)],
    );
    surface.fill_rect(-150.0, -150.0, 70.0, 150.0, &tower);
    surface.fill_rect(80.0, -150.0, 70.0, 150.0, &tower);

    let roof = Paint::solid(poi.color);
    surface.fill_polygon(&[(-155.0, -150.0), (-115.0, -200.0), (-75.0, -150.0)], &roof);
    surface.fill_polygon(&[(75.0, -150.0), (115.0, -200.0), (155.0, -150.0)], &roof);

    // Arched door
    let door: Vec<(f32, f32)> = (0..=12)
        .map(|i| {
            let angle = PI + PI * i as f32 / 12.0;
            (angle.cos() * 40.0, angle.sin() * 40.0)
        })
        .collect();
    surface.fill_polygon(&door, &Paint::solid(Color::rgb(0x3E, 0x27, 0x23)));
    surface.stroke_line(0.0, 0.0, 0.0, -40.0, WOOD_TRIM, 4.0);

    // Banner
    surface.fill_rect(-20.0, -260.0, 40.0, 60.0, &roof);
    surface.fill_polygon(&[(-20.0, -200.0), (0.0, -180.0), (20.0, -200.0)], &roof);
    surface.stroke_line(0.0, -260.0, 0.0, -220.0, Color::rgb(0x33, 0x33, 0x33), 2.0);

    let label = poi.title.split_whitespace().next().unwrap_or_default();
    surface.fill_text(label, 0.0, -280.0, 20.0, SLATE, TextAlign::Center);

    surface.restore();
}

/// Railing behind a bridge deck
pub fn draw_back_railing(surface: &mut dyn Surface, center_x: f32, deck_y: f32) {
    let rail_y = deck_y - 40.0;
    surface.stroke_line(center_x - 400.0, rail_y, center_x + 400.0, rail_y, WOOD_TRIM, 4.0);
    let mut post = center_x - 400.0;
    while post <= center_x + 400.0 {
        surface.stroke_line(post, deck_y, post, rail_y, WOOD_TRIM, 4.0);
        post += 50.0;
    }
}

/// Guardrail drawn in front of the vehicle on a bridge deck
pub fn draw_guardrail(surface: &mut dyn Surface, center_x: f32, deck_y: f32) {
    let rail_y = deck_y + 20.0;
    surface.stroke_line(center_x - 400.0, rail_y, center_x + 400.0, rail_y, WOOD, 6.0);
    let mut post = center_x - 400.0;
    while post <= center_x + 400.0 {
        surface.stroke_line(post, deck_y + 50.0, post, rail_y, WOOD, 6.0);
        post += 60.0;
    }
}

pub fn draw_finish_line(surface: &mut dyn Surface, x: f32, y: f32) {
    surface.fill_rect(x, y - 300.0, 10.0, 300.0, &Paint::solid(Color::WHITE));
    let mut i = 0.0;
    while i < 300.0 {
        surface.fill_rect(x, y - 300.0 + i, 10.0, 10.0, &Paint::solid(Color::BLACK));
        i += 40.0;
    }

    surface.fill_rect(x, y - 300.0, 250.0, 50.0, &Paint::solid(Color::rgb(0xD3, 0x2F, 0x2F)));
    surface.fill_text("FUTURE: ROBOTICS CO.", x + 10.0, y - 265.0, 24.0, Color::WHITE, TextAlign::Left);
    surface.fill_text("Building the Future.", x + 125.0, y - 180.0, 32.0, SLATE, TextAlign::Center);
    surface.fill_text("Prajval Arora - 2025", x + 125.0, y - 140.0, 20.0, SLATE, TextAlign::Center);
}

/// Monster truck in its own frame: origin at body center, wheels at y = 35.
pub fn draw_truck(surface: &mut dyn Surface, wheel_angle: f32) {
    // Suspension springs
    let spring = Color::rgb(0x37, 0x47, 0x4F);
    for sx in [-45.0, 45.0] {
        let mut points = vec![(sx, 0.0)];
        for step in 0..=5 {
            let t = step as f32 * 0.2;
            let offset = if step % 2 == 1 { 5.0 } else { -5.0 };
            points.push((sx + offset, 30.0 * t));
        }
        points.push((sx, 30.0));
        surface.stroke_polyline(&points, spring, 3.0);
    }

    let body = [
        (-60.0, 0.0),
        (65.0, 0.0),
        (70.0, -25.0),
        (65.0, -45.0),
        (25.0, -50.0),
        (5.0, -80.0),
        (-55.0, -80.0),
        (-65.0, -40.0),
    ];
    surface.fill_polygon(&body, &Paint::solid(Color::rgb(0xC6, 0x28, 0x28)));
    let mut outline = body.to_vec();
    outline.push(body[0]);
    surface.stroke_polyline(&outline, TIRE, 2.0);

    // Roof rack
    let rack = Paint::solid(SLATE);
    surface.fill_rect(-50.0, -85.0, 50.0, 5.0, &rack);
    surface.fill_rect(-50.0, -95.0, 5.0, 10.0, &rack);
    surface.fill_rect(-5.0, -95.0, 5.0, 10.0, &rack);

    surface.fill_polygon(
        &[(-30.0, -20.0), (40.0, -20.0), (30.0, -40.0), (-40.0, -40.0)],
        &Paint::solid(Color::rgb(0xFF, 0xC1, 0x07)),
    );
    surface.fill_polygon(
        &[(-45.0, -45.0), (-45.0, -72.0), (0.0, -72.0), (20.0, -50.0)],
        &Paint::solid(Color::rgb(0x45, 0x5A, 0x64)),
    );
    surface.fill_circle(-20.0, -55.0, 8.0, Color::BLACK);
    surface.fill_rect(-70.0, -30.0, 10.0, 40.0, &Paint::solid(TIRE));
    surface.fill_circle(68.0, -30.0, 8.0, Color::rgb(0xFF, 0xF5, 0x9D));

    draw_wheel(surface, -45.0, wheel_angle);
    draw_wheel(surface, 45.0, wheel_angle);
}

fn draw_wheel(surface: &mut dyn Surface, offset_x: f32, wheel_angle: f32) {
    surface.save();
    surface.translate(offset_x, 35.0);
    surface.rotate(wheel_angle);
    surface.fill_circle(0.0, 0.0, 32.0, TIRE);

    for i in 0..8 {
        surface.save();
        surface.rotate(i as f32 * TAU / 8.0);
        surface.fill_rect(28.0, -5.0, 6.0, 10.0, &Paint::solid(Color::BLACK));
        surface.restore();
    }

    surface.fill_circle(0.0, 0.0, 16.0, Color::rgb(0x54, 0x6E, 0x7A));
    surface.fill_circle(0.0, 0.0, 8.0, Color::rgb(0xB0, 0xBE, 0xC5));
    for i in 0..5 {
        let angle = i as f32 * 1.25;
        surface.fill_circle(angle.cos() * 11.0, angle.sin() * 11.0, 2.0, Color::rgb(0x37, 0x47, 0x4F));
    }
    surface.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PoiCategory;
    use crate::render::{DisplayList, DrawCommand};

    fn balanced(list: &DisplayList) -> bool {
        let mut depth: i32 = 0;
        for cmd in &list.commands {
            match cmd {
                DrawCommand::Save => depth += 1,
                DrawCommand::Restore => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return false;
            }
        }
        depth == 0
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let lines = wrap_text("Control your screen with your eyes.", 100.0, 10.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.len() <= 18, "Line too long: {}", line);
        }
        assert_eq!(lines.join(" "), "Control your screen with your eyes.");
    }

    #[test]
    fn test_wrap_keeps_long_word() {
        let lines = wrap_text("Supercalifragilistic", 20.0, 10.0);
        assert_eq!(lines, vec!["Supercalifragilistic".to_string()]);
    }

    #[test]
    fn test_sprites_balance_save_restore() {
        let poi = Poi::new("p", PoiCategory::Project, "Autonomous Blimp", 0.0).with_description("Aerial football");
        let mut list = DisplayList::new();

        draw_truck(&mut list, 1.3);
        draw_castle(&mut list, 0.0, 350.0, &poi);
        draw_tea_stall(&mut list, 0.0, 350.0, 2.0);
        draw_poster(&mut list, 0.0, 150.0, &poi);
        draw_tree(&mut list, 0.0, 400.0, 1.0);
        draw_title_sign(&mut list, 1000.0, 400.0, "THE JOURNEY");

        assert!(balanced(&list), "Every save must have a matching restore");
    }

    #[test]
    fn test_castle_label_is_first_word() {
        let poi = Poi::new("p", PoiCategory::Project, "Autonomous Blimp", 0.0);
        let mut list = DisplayList::new();
        draw_castle(&mut list, 0.0, 350.0, &poi);
        assert_eq!(list.texts(), vec!["Autonomous"]);
    }

    #[test]
    fn test_poster_uppercases_title() {
        let poi = Poi::new("l", PoiCategory::Link, "My LinkedIn", 0.0).with_description("Let's connect.");
        let mut list = DisplayList::new();
        draw_poster(&mut list, 0.0, 150.0, &poi);

        let texts = list.texts();
        assert!(texts.contains(&"★ SHOWCASE ★"));
        assert!(texts.contains(&"MY LINKEDIN"));
        assert!(texts.contains(&"Let's connect."));
    }

    #[test]
    fn test_guardrail_post_spacing() {
        let mut list = DisplayList::new();
        draw_guardrail(&mut list, 1000.0, 350.0);
        // One rail plus posts every 60 over 800 units
        assert_eq!(list.len(), 1 + 14);
    }
}

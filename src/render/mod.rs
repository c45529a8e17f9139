//! Immediate-mode drawing surface and scene rendering
//!
//! The scene is issued as draw calls against the [`Surface`] trait so the
//! same frame can be:
//! - recorded into a [`DisplayList`] (tests, frame dumps)
//! - rasterized onto a terminal grid ([`terminal::TerminalSurface`])
//!
//! Coordinates follow the usual canvas convention: x grows right, y grows
//! down, angles in radians clockwise.

pub mod scene;
pub mod sprites;
pub mod terminal;

pub use scene::{render_scene, SceneView};

use crate::data::Color;
use serde::{Deserialize, Serialize};

/// Depth layers, back to front
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Sky,
    Clouds,
    Mountains,
    Posters,
    World,
    Foreground,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Fill style for shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Paint {
    Solid { color: Color },
    /// Vertical gradient between two y values in local coordinates
    Vertical {
        top: f32,
        bottom: f32,
        stops: Vec<GradientStop>,
    },
}

impl Paint {
    pub fn solid(color: Color) -> Self {
        Paint::Solid { color }
    }

    pub fn vertical(top: f32, bottom: f32, stops: &[GradientStop]) -> Self {
        Paint::Vertical {
            top,
            bottom,
            stops: stops.to_vec(),
        }
    }

    /// Color of this paint at local height `y`.
    pub fn color_at(&self, y: f32) -> Color {
        match self {
            Paint::Solid { color } => *color,
            Paint::Vertical { top, bottom, stops } => {
                let span = bottom - top;
                let t = if span.abs() > f32::EPSILON {
                    ((y - top) / span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                sample_gradient(stops, t)
            }
        }
    }
}

fn sample_gradient(stops: &[GradientStop], t: f32) -> Color {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Color::BLACK,
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = (b.offset - a.offset).max(f32::EPSILON);
            return a.color.lerp(b.color, (t - a.offset) / span);
        }
    }
    last.color
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// 2D affine transform `[a c e; b d f; 0 0 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Post-multiply, so `other` is applied to points first.
    pub fn then(&self, other: &Transform) -> Transform {
        Transform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Transform {
        self.then(&Transform {
            e: dx,
            f: dy,
            ..Self::IDENTITY
        })
    }

    pub fn rotate(&self, radians: f32) -> Transform {
        let (sin, cos) = radians.sin_cos();
        self.then(&Transform {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        })
    }

    pub fn scale(&self, sx: f32, sy: f32) -> Transform {
        self.then(&Transform {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        })
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    /// Average linear scale factor, used for radii and line widths
    pub fn mean_scale(&self) -> f32 {
        let sx = (self.a * self.a + self.b * self.b).sqrt();
        let sy = (self.c * self.c + self.d * self.d).sqrt();
        (sx + sy) / 2.0
    }
}

/// Target of all scene drawing.
///
/// Mirrors a 2D canvas API: a transform and alpha stack plus a handful of
/// filled and stroked primitives.
pub trait Surface {
    /// Marks the start of a depth layer. Purely informational.
    fn begin_layer(&mut self, _layer: Layer) {}

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    fn rotate(&mut self, radians: f32);
    fn scale(&mut self, sx: f32, sy: f32);

    /// Multiplies the current global alpha
    fn set_alpha(&mut self, alpha: f32);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint);
    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: Color);
    fn fill_polygon(&mut self, points: &[(f32, f32)], paint: &Paint);
    fn stroke_polyline(&mut self, points: &[(f32, f32)], color: Color, width: f32);
    fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Color, align: TextAlign);

    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Color, width: f32) {
        self.stroke_polyline(&[(x0, y0), (x1, y1)], color, width);
    }
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    BeginLayer {
        layer: Layer,
    },
    Save,
    Restore,
    Translate {
        dx: f32,
        dy: f32,
    },
    Rotate {
        radians: f32,
    },
    Scale {
        sx: f32,
        sy: f32,
    },
    SetAlpha {
        alpha: f32,
    },
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        paint: Paint,
    },
    FillCircle {
        cx: f32,
        cy: f32,
        r: f32,
        color: Color,
    },
    FillPolygon {
        points: Vec<(f32, f32)>,
        paint: Paint,
    },
    StrokePolyline {
        points: Vec<(f32, f32)>,
        color: Color,
        width: f32,
    },
    FillText {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        color: Color,
        align: TextAlign,
    },
}

/// Surface that records every call for later inspection or replay
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Layers in the order they were started
    pub fn layers(&self) -> Vec<Layer> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::BeginLayer { layer } => Some(*layer),
                _ => None,
            })
            .collect()
    }

    /// Commands issued while `layer` was the active layer
    pub fn commands_in(&self, layer: Layer) -> Vec<&DrawCommand> {
        let mut current = None;
        let mut out = Vec::new();
        for cmd in &self.commands {
            if let DrawCommand::BeginLayer { layer: next } = cmd {
                current = Some(*next);
                continue;
            }
            if current == Some(layer) {
                out.push(cmd);
            }
        }
        out
    }

    /// All text strings drawn, in order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Issue the recorded calls against another surface
    pub fn replay(&self, surface: &mut dyn Surface) {
        for cmd in &self.commands {
            match cmd {
                DrawCommand::BeginLayer { layer } => surface.begin_layer(*layer),
                DrawCommand::Save => surface.save(),
                DrawCommand::Restore => surface.restore(),
                DrawCommand::Translate { dx, dy } => surface.translate(*dx, *dy),
                DrawCommand::Rotate { radians } => surface.rotate(*radians),
                DrawCommand::Scale { sx, sy } => surface.scale(*sx, *sy),
                DrawCommand::SetAlpha { alpha } => surface.set_alpha(*alpha),
                DrawCommand::FillRect { x, y, w, h, paint } => surface.fill_rect(*x, *y, *w, *h, paint),
                DrawCommand::FillCircle { cx, cy, r, color } => surface.fill_circle(*cx, *cy, *r, *color),
                DrawCommand::FillPolygon { points, paint } => surface.fill_polygon(points, paint),
                DrawCommand::StrokePolyline { points, color, width } => {
                    surface.stroke_polyline(points, *color, *width)
                }
                DrawCommand::FillText {
                    text,
                    x,
                    y,
                    size,
                    color,
                    align,
                } => surface.fill_text(text, *x, *y, *size, *color, *align),
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Surface for DisplayList {
    fn begin_layer(&mut self, layer: Layer) {
        self.commands.push(DrawCommand::BeginLayer { layer });
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.commands.push(DrawCommand::Translate { dx, dy });
    }

    fn rotate(&mut self, radians: f32) {
        self.commands.push(DrawCommand::Rotate { radians });
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.commands.push(DrawCommand::Scale { sx, sy });
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.commands.push(DrawCommand::SetAlpha { alpha });
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint) {
        self.commands.push(DrawCommand::FillRect {
            x,
            y,
            w,
            h,
            paint: paint.clone(),
        });
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: Color) {
        self.commands.push(DrawCommand::FillCircle { cx, cy, r, color });
    }

    fn fill_polygon(&mut self, points: &[(f32, f32)], paint: &Paint) {
        self.commands.push(DrawCommand::FillPolygon {
            points: points.to_vec(),
            paint: paint.clone(),
        });
    }

    fn stroke_polyline(&mut self, points: &[(f32, f32)], color: Color, width: f32) {
        self.commands.push(DrawCommand::StrokePolyline {
            points: points.to_vec(),
            color,
            width,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Color, align: TextAlign) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            size,
            color,
            align,
        });
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

// --- World ---
pub const DEFAULT_WORLD_WIDTH: f32 = 34000.0;
pub const START_X: f32 = 200.0;

/// Elapsed-time increment per simulation tick (drives bounce and suspension).
pub const TIME_STEP: f32 = 0.05;

// --- Points of Interest ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoiCategory {
    Project,
    TeaStall,
    History,
    Link,
}

impl PoiCategory {
    /// History markers are background decorations and never reshape terrain.
    pub fn flattens_terrain(self) -> bool {
        self != PoiCategory::History
    }

    pub fn triggers_narration(self) -> bool {
        self != PoiCategory::History
    }
}

impl fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PoiCategory::Project => "project",
            PoiCategory::TeaStall => "tea-stall",
            PoiCategory::History => "history",
            PoiCategory::Link => "link",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    #[serde(alias = "type")]
    pub category: PoiCategory,
    pub title: String,
    pub description: String,
    #[serde(alias = "xPosition")]
    pub x_position: f32,
    pub color: Color,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub stats: Option<String>,
    #[serde(default)]
    pub tech: Vec<String>,
    /// Drawn as a large background poster instead of a roadside structure
    #[serde(default)]
    pub poster: bool,
}

impl Poi {
    pub fn new(id: &str, category: PoiCategory, title: &str, x_position: f32) -> Self {
        Self {
            id: id.to_string(),
            category,
            title: title.to_string(),
            description: String::new(),
            x_position,
            color: Color::rgb(0x60, 0x7D, 0x8B),
            details: None,
            link: None,
            stats: None,
            tech: Vec::new(),
            poster: false,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }

    pub fn with_link(mut self, link: &str) -> Self {
        self.link = Some(link.to_string());
        self
    }

    pub fn with_stats(mut self, stats: &str) -> Self {
        self.stats = Some(stats.to_string());
        self
    }

    pub fn with_tech(mut self, tech: &[&str]) -> Self {
        self.tech = tech.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn as_poster(mut self) -> Self {
        self.poster = true;
        self
    }

    /// Links and flagged POIs are shown as background posters.
    pub fn is_poster(&self) -> bool {
        self.category == PoiCategory::Link || self.poster
    }

    /// Project and tea-stall POIs get a bridge deck with railings.
    pub fn has_bridge(&self) -> bool {
        matches!(self.category, PoiCategory::Project | PoiCategory::TeaStall) && !self.poster
    }
}

// --- Colors ---
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        let a = if digits.len() == 8 { channel(6)? as f32 / 255.0 } else { 1.0 };
        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// `#RRGGBB`, with an alpha byte appended when not fully opaque
    pub fn to_hex(self) -> String {
        if self.a >= 1.0 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, a)
        }
    }

    /// Linear blend towards `other` (t = 0 keeps self).
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid color '{}', expected #RRGGBB or #RRGGBBAA", value))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

// --- Control Input ---
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInput {
    pub forward: bool,
    pub backward: bool,
}

impl ControlInput {
    pub const IDLE: ControlInput = ControlInput {
        forward: false,
        backward: false,
    };
    pub const FORWARD: ControlInput = ControlInput {
        forward: true,
        backward: false,
    };
    pub const BACKWARD: ControlInput = ControlInput {
        forward: false,
        backward: true,
    };
}

// --- Vehicle State ---
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub x: f32,
    pub y: f32,
    pub velocity: f32,      // World units per tick, signed along x
    pub chassis_angle: f32, // Smoothed body tilt (rad)
    pub wheel_angle: f32,   // Accumulated wheel spin (rad), unbounded
    pub throttle: f32,      // [-1, 1], cosmetic squat/dive only
}

impl VehicleState {
    pub fn new(x: f32) -> Self {
        Self {
            x,
            y: 0.0,
            velocity: 0.0,
            chassis_angle: 0.0,
            wheel_angle: 0.0,
            throttle: 0.0,
        }
    }
}

impl Default for VehicleState {
    fn default() -> Self {
        Self::new(START_X)
    }
}

// --- Camera ---
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

// --- Particles & Ambient ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Exhaust,
    Dust,
}

impl ParticleKind {
    /// Color template; alpha is taken from the particle's remaining life.
    pub fn color(self) -> Color {
        match self {
            ParticleKind::Exhaust => Color::rgb(150, 150, 150),
            ParticleKind::Dust => Color::rgb(93, 64, 55),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: f32, // 1.0 fresh, removed at <= 0
    pub size: f32,
    pub kind: ParticleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cloud {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub speed: f32,
    pub opacity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_parsing() {
        let color = Color::from_hex("#0077B5").unwrap();
        assert_eq!((color.r, color.g, color.b), (0x00, 0x77, 0xB5));
        assert_eq!(color.to_hex(), "#0077B5");

        assert!(Color::from_hex("0077b5").is_some(), "Leading # is optional");
        assert!(Color::from_hex("#07B5").is_none());
        assert!(Color::from_hex("#GGGGGG").is_none());

        let translucent = Color::from_hex("#FFFFFF80").unwrap();
        assert!((translucent.a - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(translucent.to_hex(), "#FFFFFF80");
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&PoiCategory::TeaStall).unwrap();
        assert_eq!(json, "\"tea-stall\"");

        let parsed: PoiCategory = serde_json::from_str("\"link\"").unwrap();
        assert_eq!(parsed, PoiCategory::Link);
    }

    #[test]
    fn test_poi_accepts_original_field_names() {
        let json = r##"{
            "id": "p_meta",
            "type": "project",
            "title": "Meta-Glasses",
            "description": "Control your screen with your eyes.",
            "xPosition": 30000,
            "color": "#607D8B"
        }"##;
        let poi: Poi = serde_json::from_str(json).unwrap();
        assert_eq!(poi.category, PoiCategory::Project);
        assert_eq!(poi.x_position, 30000.0);
        assert!(poi.has_bridge());
        assert!(!poi.is_poster());
    }

    #[test]
    fn test_poster_and_bridge_classification() {
        let link = Poi::new("l", PoiCategory::Link, "Link", 0.0);
        assert!(link.is_poster());
        assert!(!link.has_bridge());

        let mut history = Poi::new("h", PoiCategory::History, "History", 0.0);
        assert!(!history.is_poster());
        history.poster = true;
        assert!(history.is_poster());
        assert!(!PoiCategory::History.flattens_terrain());
    }
}

//! Route content: the POI list and world extent the journey is built from

use crate::data::{Color, Poi, PoiCategory, DEFAULT_WORLD_WIDTH, START_X};
use crate::physics::FINISH_MARGIN;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_TITLE_TEXT: &str = "THE JOURNEY OF PRAJ";
pub const DEFAULT_TITLE_X: f32 = 1000.0;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid route: {0}")]
    Invalid(String),
}

/// Large lettering planted on the terrain near the start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleSign {
    pub text: String,
    pub x: f32,
}

impl Default for TitleSign {
    fn default() -> Self {
        Self {
            text: DEFAULT_TITLE_TEXT.to_string(),
            x: DEFAULT_TITLE_X,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default = "default_world_width")]
    pub world_width: f32,
    #[serde(default)]
    pub title_sign: TitleSign,
    pub pois: Vec<Poi>,
}

fn default_world_width() -> f32 {
    DEFAULT_WORLD_WIDTH
}

impl Default for Route {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Route {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ContentError> {
        let content = fs::read_to_string(path)?;
        Self::load_from_string(&content)
    }

    /// Parse JSON (leading `{`) or YAML, then validate.
    pub fn load_from_string(content: &str) -> Result<Self, ContentError> {
        let route: Route = if content.trim_start().starts_with('{') {
            serde_json::from_str(content)?
        } else {
            serde_yaml::from_str(content)?
        };
        route.validate()?;
        Ok(route)
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        // The finish line has to sit ahead of the spawn point
        let min_width = START_X + FINISH_MARGIN;
        if !self.world_width.is_finite() || self.world_width <= min_width {
            return Err(ContentError::Invalid(format!(
                "world_width must be greater than {}, got {}",
                min_width, self.world_width
            )));
        }

        let mut seen = HashSet::new();
        for poi in &self.pois {
            if poi.id.trim().is_empty() {
                return Err(ContentError::Invalid(format!("POI '{}' has an empty id", poi.title)));
            }
            if !seen.insert(poi.id.as_str()) {
                return Err(ContentError::Invalid(format!("Duplicate POI id '{}'", poi.id)));
            }
            if !poi.x_position.is_finite() || poi.x_position < 0.0 || poi.x_position > self.world_width {
                return Err(ContentError::Invalid(format!(
                    "POI '{}' x position {} is outside [0, {}]",
                    poi.id, poi.x_position, self.world_width
                )));
            }
        }
        Ok(())
    }

    pub fn poi(&self, id: &str) -> Option<&Poi> {
        self.pois.iter().find(|p| p.id == id)
    }

    /// The journey shipped with the binary
    pub fn builtin() -> Self {
        let pois = vec![
            poi(
                "h1_poster",
                PoiCategory::History,
                "Grade 3: The Spark",
                "Started Robotics! RC Cars, LED Banks, Coolers.",
                3500.0,
                "#FF5722",
            )
            .as_poster(),
            poi(
                "h2",
                PoiCategory::History,
                "Grade 7-9: Deep Dive",
                "IoT, Microcontrollers, coding, & breaking things.",
                5000.0,
                "#5D4037",
            ),
            poi(
                "p_champ",
                PoiCategory::Project,
                "Intl. Robotics Champ",
                "Grade 11: Omni-directional robot with a robotic arm.",
                7000.0,
                "#FFD700",
            )
            .with_details(
                "I created my first full robot in Grade 11. It was an omnidirectional robot with a robotic \
                 arm mounted on top. It hosted a local WiFi server and could be controlled via any \
                 smartphone. I won 1st Place National Level at the International Robotics Championship.",
            )
            .with_tech(&["C++", "WiFi Server", "Omni-Wheels", "Robotic Arm"]),
            poi(
                "link_honeywell",
                PoiCategory::Link,
                "Honeywell Hackathon",
                "WINNER: Engineering Rocket Science Hackathon.",
                9500.0,
                "#0077B5",
            )
            .with_details("Check out the post on LinkedIn.")
            .with_tech(&["Hackathon Winner", "Engineering"])
            .with_link(
                "https://www.linkedin.com/posts/prajvaldesignsmachines_engineering-hackathon-rocketscience-activity-7382467243932086272-1mfM",
            ),
            poi(
                "p_gotapri",
                PoiCategory::TeaStall,
                "GoTapri.com",
                "A startup connecting entrepreneurs over chai.",
                12500.0,
                "#795548",
            )
            .with_details(
                "Before coming to the US, I launched GoTapri.com. It helped new entrepreneurs find team \
                 members through active networking events globally. Over 40 startups registered, 2,200 \
                 people joined, and we hit 22k+ impressions. Partnered with Conquer the Crown for funding.",
            )
            .with_tech(&["Startup", "Community", "Networking"])
            .with_stats("2,200+ Members"),
            poi(
                "p_asu_start",
                PoiCategory::History,
                "Arizona State Univ.",
                "2025: Moved to US to pursue Robotics & Autonomous Systems.",
                15000.0,
                "#8C1D40",
            ),
            poi(
                "p_tic_tac",
                PoiCategory::Project,
                "AI Tic-Tac-Toe",
                "A robot arm that plays against you on paper.",
                17500.0,
                "#F44336",
            )
            .with_details(
                "A robot with arms that plays Tic-Tac-Toe with you physically on paper using AI vision \
                 detection to see your moves and counter them.",
            )
            .with_tech(&["Computer Vision", "Inverse Kinematics", "AI"]),
            poi(
                "p_air_guitar",
                PoiCategory::Project,
                "The Air Guitar",
                "Viral Project: Strum in the air, hear the music.",
                20000.0,
                "#9C27B0",
            )
            .with_details(
                "A tiny device held like a pick. When you strum in the air, it plays actual guitar chords \
                 based on your movement. This went viral with 108,000+ views and high demand for the repo.",
            )
            .with_tech(&["Accelerometers", "Sound Synthesis", "Viral Engineering"])
            .with_stats("108k Views"),
            poi(
                "p_celia",
                PoiCategory::Project,
                "CeliaLife & Kalki",
                "AI Medical history prediction & Social Change platform.",
                22500.0,
                "#00BCD4",
            )
            .with_details(
                "CeliaLife: Upload medical history, AI predicts potential diseases for doctors. Kalki: A \
                 platform for users to raise concerns about local problems and gather support for change.",
            )
            .with_tech(&["AI Prediction", "Web Dev", "Social Impact"]),
            poi(
                "p_spider",
                PoiCategory::Project,
                "AI Hardware Link",
                "Controlling a Spider Robot with ChatGPT.",
                25000.0,
                "#212121",
            )
            .with_details(
                "I found a way to link LLMs directly to hardware. I built a system where AI analyzes \
                 natural language commands and autonomously controls a spider robot's complex movements.",
            )
            .with_tech(&["LLM", "Robotics", "Hardware Interface"]),
            poi(
                "h4",
                PoiCategory::History,
                "The Network",
                "Mentored by Harvard Startups. Met Mark Cuban. Spotify Podcast feature.",
                26000.0,
                "#5D4037",
            )
            .as_poster(),
            poi(
                "p_blimp",
                PoiCategory::Project,
                "Autonomous Blimp",
                "Playing football in the air with Dr. Shiyu.",
                27500.0,
                "#FF9800",
            )
            .with_details(
                "Working at the ASU Lab to create an autonomous flying blimp that plays aerial football. \
                 It detects balloons, catches them, and pushes them into a goal.",
            )
            .with_tech(&["Aerial Robotics", "Autonomous Systems", "ASU Lab"]),
            poi(
                "p_meta",
                PoiCategory::Project,
                "Meta-Glasses",
                "Control your screen with your eyes.",
                30000.0,
                "#607D8B",
            )
            .with_details(
                "A wearable glass interface where the cursor follows your gaze, allowing hands-free \
                 computer control.",
            )
            .with_tech(&["Eye Tracking", "Wearables", "HCI"]),
            poi(
                "link_linkedin",
                PoiCategory::Link,
                "My LinkedIn",
                "Let's connect. I'm always building something new.",
                32500.0,
                "#0077B5",
            )
            .with_details("Visit Profile")
            .with_tech(&["Contact", "Hire Me"])
            .with_link("https://www.linkedin.com/in/prajvaldesignsmachines/"),
        ];

        Self {
            world_width: DEFAULT_WORLD_WIDTH,
            title_sign: TitleSign::default(),
            pois,
        }
    }
}

fn poi(id: &str, category: PoiCategory, title: &str, description: &str, x: f32, color: &str) -> Poi {
    let mut poi = Poi::new(id, category, title, x).with_description(description);
    if let Some(color) = Color::from_hex(color) {
        poi.color = color;
    }
    poi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_route_is_valid() {
        let route = Route::builtin();
        route.validate().expect("Built-in route should validate");
        assert_eq!(route.world_width, DEFAULT_WORLD_WIDTH);
        assert_eq!(route.pois.len(), 14);
        assert!(route.poi("p_gotapri").is_some());
    }

    #[test]
    fn test_builtin_pois_increase_along_route() {
        let route = Route::builtin();
        for pair in route.pois.windows(2) {
            assert!(pair[0].x_position < pair[1].x_position, "{} before {}", pair[0].id, pair[1].id);
        }
    }

    #[test]
    fn test_load_yaml() {
        let yaml = r##"
world_width: 10000
title_sign:
  text: "HELLO ROAD"
  x: 800
pois:
  - id: stall
    category: tea-stall
    title: "Chai"
    description: "Tea time"
    x_position: 4000
    color: "#795548"
    stats: "2,200+ Members"
"##;
        let route = Route::load_from_string(yaml).unwrap();
        assert_eq!(route.world_width, 10000.0);
        assert_eq!(route.title_sign.text, "HELLO ROAD");
        assert_eq!(route.pois[0].category, PoiCategory::TeaStall);
        assert_eq!(route.pois[0].stats.as_deref(), Some("2,200+ Members"));
    }

    #[test]
    fn test_load_json_defaults() {
        let json = r##"{"pois": [{"id": "p", "type": "project", "title": "P", "description": "d", "xPosition": 7000, "color": "#FFD700"}]}"##;
        let route = Route::load_from_string(json).unwrap();
        assert_eq!(route.world_width, DEFAULT_WORLD_WIDTH);
        assert_eq!(route.title_sign, TitleSign::default());
        assert!(route.pois[0].tech.is_empty());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut route = Route::builtin();
        route.pois[1].id = route.pois[0].id.clone();
        let err = route.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate"), "Unexpected error: {}", err);
    }

    #[test]
    fn test_rejects_out_of_world_poi() {
        let mut route = Route::builtin();
        route.pois[0].x_position = route.world_width + 1.0;
        assert!(matches!(route.validate(), Err(ContentError::Invalid(_))));

        route.pois[0].x_position = f32::NAN;
        assert!(route.validate().is_err());
    }

    #[test]
    fn test_rejects_world_without_room_to_finish() {
        let yaml = "world_width: 250\npois: []\n";
        match Route::load_from_string(yaml) {
            Err(ContentError::Invalid(msg)) => assert!(msg.contains("400"), "Message should name the minimum: {}", msg),
            other => panic!("Expected invalid route, got {:?}", other),
        }

        let mut route = Route::builtin();
        route.world_width = START_X + FINISH_MARGIN;
        assert!(route.validate().is_err(), "Finish at the spawn point must be rejected");
        route.world_width = START_X + FINISH_MARGIN + 1.0;
        route.pois.clear();
        assert!(route.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_color() {
        let json = r##"{"pois": [{"id": "p", "category": "project", "title": "P", "description": "d", "x_position": 7000, "color": "gold"}]}"##;
        assert!(matches!(Route::load_from_string(json), Err(ContentError::Json(_))));
    }

    #[test]
    fn test_rejects_empty_id() {
        let mut route = Route::builtin();
        route.pois[2].id = "  ".to_string();
        assert!(route.validate().is_err());
    }
}

pub mod camera;
pub mod config;
pub mod content;
pub mod data;
pub mod game_session;
pub mod narration;
pub mod particles;
pub mod physics;
pub mod procgen;
pub mod proximity;
pub mod render;
pub mod replay;

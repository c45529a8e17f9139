//! Input recording and deterministic playback
//!
//! A recording is a header followed by one frame per simulated tick. Both
//! are MessagePack, each prefixed with its little-endian `u32` length.

use crate::content::Route;
use crate::data::ControlInput;
use crate::game_session::{GameSession, SessionObserver, SessionOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const REPLAY_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Deserialization error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("Unsupported replay version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("Replay recorded on a different route: {0}")]
    RouteMismatch(String),

    #[error("Replay data truncated")]
    Truncated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayHeader {
    pub version: u32,
    pub seed: u64,
    pub world_width: f32,
    pub poi_count: u32,
    pub tick_rate: u16,
    pub recorded_at: u64, // Unix timestamp
    pub frame_count: u32,
}

/// One control input per simulated tick
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecording {
    pub header: ReplayHeader,
    pub inputs: Vec<ControlInput>,
}

impl InputRecording {
    pub fn new(seed: u64, route: &Route, tick_rate: u16) -> Self {
        let recorded_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            header: ReplayHeader {
                version: REPLAY_VERSION,
                seed,
                world_width: route.world_width,
                poi_count: route.pois.len() as u32,
                tick_rate,
                recorded_at,
                frame_count: 0,
            },
            inputs: Vec::new(),
        }
    }

    pub fn record(&mut self, input: ControlInput) {
        self.inputs.push(input);
        self.header.frame_count = self.inputs.len() as u32;
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Check the recording was made against a route of the same shape
    pub fn check_route(&self, route: &Route) -> Result<(), ReplayError> {
        if self.header.world_width != route.world_width || self.header.poi_count as usize != route.pois.len() {
            return Err(ReplayError::RouteMismatch(format!(
                "recorded width {} with {} POIs, route has width {} with {} POIs",
                self.header.world_width,
                self.header.poi_count,
                route.world_width,
                route.pois.len()
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ReplayError> {
        let mut header = self.header.clone();
        header.frame_count = self.inputs.len() as u32;

        let mut out = Vec::new();
        write_chunk(&mut out, &rmp_serde::to_vec(&header)?);
        for input in &self.inputs {
            write_chunk(&mut out, &rmp_serde::to_vec(input)?);
        }
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReplayError> {
        let mut cursor = bytes;
        let header: ReplayHeader = rmp_serde::from_slice(read_chunk(&mut cursor)?)?;
        if header.version != REPLAY_VERSION {
            return Err(ReplayError::Version {
                found: header.version,
                expected: REPLAY_VERSION,
            });
        }

        // Every frame takes at least its 4 byte length prefix
        let mut inputs = Vec::with_capacity((header.frame_count as usize).min(cursor.len() / 4));
        for _ in 0..header.frame_count {
            inputs.push(rmp_serde::from_slice(read_chunk(&mut cursor)?)?);
        }
        Ok(Self { header, inputs })
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ReplayError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.to_bytes()?).await?;
        info!("Saved replay to {:?} ({} frames)", path, self.inputs.len());
        Ok(())
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let recording = Self::from_bytes(&bytes)?;
        info!("Loaded replay from {:?} ({} frames)", path, recording.inputs.len());
        Ok(recording)
    }

    /// Session options that reproduce the recorded run on top of `base`
    pub fn session_options(&self, base: SessionOptions) -> SessionOptions {
        SessionOptions {
            seed: self.header.seed,
            ..base
        }
    }

    /// Feed every recorded input through `session`, one tick each.
    pub fn play(&self, session: &mut GameSession, observer: &mut dyn SessionObserver) {
        for input in &self.inputs {
            session.tick(*input, observer);
        }
    }
}

fn write_chunk(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
}

fn read_chunk<'a>(cursor: &mut &'a [u8]) -> Result<&'a [u8], ReplayError> {
    if cursor.len() < 4 {
        return Err(ReplayError::Truncated);
    }
    let (len_bytes, rest) = cursor.split_at(4);
    let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    if rest.len() < len {
        return Err(ReplayError::Truncated);
    }
    let (chunk, rest) = rest.split_at(len);
    *cursor = rest;
    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_recording() -> InputRecording {
        let mut recording = InputRecording::new(42, &Route::builtin(), 60);
        for i in 0..50 {
            let input = match i % 3 {
                0 => ControlInput::FORWARD,
                1 => ControlInput::IDLE,
                _ => ControlInput::BACKWARD,
            };
            recording.record(input);
        }
        recording
    }

    #[test]
    fn test_bytes_preserve_header_and_inputs() {
        let recording = create_test_recording();
        let bytes = recording.to_bytes().unwrap();
        let loaded = InputRecording::from_bytes(&bytes).unwrap();

        assert_eq!(loaded.header.seed, 42);
        assert_eq!(loaded.header.frame_count, 50);
        assert_eq!(loaded, recording);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut recording = create_test_recording();
        recording.header.version = 99;
        let bytes = recording.to_bytes().unwrap();

        match InputRecording::from_bytes(&bytes) {
            Err(ReplayError::Version { found, expected }) => {
                assert_eq!(found, 99);
                assert_eq!(expected, REPLAY_VERSION);
            }
            other => panic!("Expected version error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_data_rejected() {
        let bytes = create_test_recording().to_bytes().unwrap();
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(InputRecording::from_bytes(cut), Err(ReplayError::Truncated)));
        assert!(matches!(InputRecording::from_bytes(&[1, 0]), Err(ReplayError::Truncated)));
    }

    #[test]
    fn test_oversized_frame_count_is_truncated() {
        let mut header = create_test_recording().header;
        header.frame_count = u32::MAX;
        let mut bytes = Vec::new();
        write_chunk(&mut bytes, &rmp_serde::to_vec(&header).unwrap());

        assert!(matches!(InputRecording::from_bytes(&bytes), Err(ReplayError::Truncated)));
    }

    #[test]
    fn test_session_options_use_recorded_seed() {
        let recording = create_test_recording();
        let base = SessionOptions {
            seed: 7,
            max_particles: 12,
            ..SessionOptions::default()
        };
        let options = recording.session_options(base);
        assert_eq!(options.seed, 42);
        assert_eq!(options.max_particles, 12);
    }

    #[test]
    fn test_replay_reproduces_recorded_run() {
        let recording = create_test_recording();
        let recorded_options = SessionOptions {
            seed: recording.header.seed,
            ..SessionOptions::default()
        };
        let mut original = GameSession::offline(recorded_options);
        recording.play(&mut original, &mut crate::game_session::NoopObserver);

        let base = SessionOptions {
            seed: 1,
            ..SessionOptions::default()
        };
        let mut replayed = GameSession::offline(recording.session_options(base));
        recording.play(&mut replayed, &mut crate::game_session::NoopObserver);

        assert_eq!(replayed.vehicle(), original.vehicle());
        assert_eq!(replayed.particles(), original.particles(), "Particles depend on the recorded seed");
    }

    #[test]
    fn test_route_check() {
        let recording = create_test_recording();
        assert!(recording.check_route(&Route::builtin()).is_ok());

        let mut other = Route::builtin();
        other.pois.pop();
        assert!(matches!(recording.check_route(&other), Err(ReplayError::RouteMismatch(_))));
    }
}

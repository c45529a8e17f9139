//! Deterministic roadside prop placement

use super::terrain::Terrain;

/// Width of a placement cell in world units
pub const PROP_CELL: f32 = 50.0;

/// Grass tufts are placed on every cell whose x is a multiple of this
const GRASS_SPACING: i64 = 100;

const TREE_THRESHOLD: f32 = 0.6;
const ROCK_THRESHOLD: f32 = 0.15;

// Salts separate the independent hash streams for one cell
const SALT_KIND: u64 = 0;
const SALT_SIZE: u64 = 1;
const SALT_VARIANT: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RockVariant {
    Dome,
    Shard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropKind {
    Tree { scale: f32 },
    Rock { variant: RockVariant },
    GrassTuft,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prop {
    pub x: f32,
    pub ground_y: f32,
    pub kind: PropKind,
}

/// Hash a cell coordinate to a value in [0, 1).
///
/// SplitMix64 finalizer over the integer cell x combined with a salt. The
/// output only depends on integer arithmetic, so placement is bit-for-bit
/// reproducible on every platform.
pub fn cell_hash(cell_x: i64, salt: u64) -> f32 {
    let mut z = (cell_x as u64)
        .wrapping_add(salt.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    // Top 24 bits fit an f32 mantissa exactly
    (z >> 40) as f32 / (1u64 << 24) as f32
}

/// Tree or rock selected for a cell, if any
pub fn feature_for_cell(cell_x: i64) -> Option<PropKind> {
    let roll = cell_hash(cell_x, SALT_KIND);
    if roll > TREE_THRESHOLD {
        Some(PropKind::Tree {
            scale: 0.6 + cell_hash(cell_x, SALT_SIZE),
        })
    } else if roll < ROCK_THRESHOLD {
        let variant = if cell_hash(cell_x, SALT_VARIANT) > 0.5 {
            RockVariant::Dome
        } else {
            RockVariant::Shard
        };
        Some(PropKind::Rock { variant })
    } else {
        None
    }
}

/// All props whose cell lies in [start, end), skipping flattened zones.
pub fn props_in_range(terrain: &Terrain, start: f32, end: f32) -> Vec<Prop> {
    let first = (start / PROP_CELL).floor() as i64;
    let last = (end / PROP_CELL).ceil() as i64;
    let mut props = Vec::new();

    for cell in first..last {
        let cell_x = cell * PROP_CELL as i64;
        let x = cell_x as f32;
        if x < start || terrain.is_flattened(x) {
            continue;
        }

        let ground_y = terrain.height(x);
        if cell_x.rem_euclid(GRASS_SPACING) == 0 {
            props.push(Prop {
                x,
                ground_y,
                kind: PropKind::GrassTuft,
            });
        }
        if let Some(kind) = feature_for_cell(cell_x) {
            props.push(Prop { x, ground_y, kind });
        }
    }

    props
}

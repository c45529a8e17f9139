/// Procedural world generation for the journey road
///
/// The terrain height field and roadside prop placement are both pure
/// functions of the world x coordinate, so the same road is reproduced
/// on every session without storing any placement state.

pub mod props;
pub mod terrain;

// Re-export main types for convenience
pub use props::{props_in_range, Prop, PropKind, RockVariant};
pub use terrain::Terrain;

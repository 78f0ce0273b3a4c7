mod camera;
mod data;
pub mod map;

pub use camera::{PLANE_EXTENT, Player};
pub use data::{Enemy, Exit, PlayerStart, WorldData};
pub use map::{DEFAULT_MAP, MapError, Terrain, TileMap};

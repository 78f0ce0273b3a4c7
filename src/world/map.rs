use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fmt;

/* tile codes as the world generator emits them */
pub const TILE_FLOOR: u8 = 0;
pub const TILE_WALL: u8 = 1;
pub const TILE_DOOR: u8 = 2;
pub const TILE_PORTAL: u8 = 3;

/// What a continuous world coordinate resolves to.
///
/// Out-of-bounds is always [`Terrain::Void`] no matter what the grid holds,
/// so the classification is total over all of `(f32, f32)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terrain {
    StoneFloor,
    StoneWall,
    Door,
    Void,
}

impl Terrain {
    #[inline]
    pub fn from_code(code: u8) -> Self {
        match code {
            TILE_WALL => Terrain::StoneWall,
            TILE_DOOR => Terrain::Door,
            TILE_PORTAL => Terrain::Void,
            _ => Terrain::StoneFloor,
        }
    }
}

impl fmt::Display for Terrain {
    /// Wire names used by the telemetry line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Terrain::StoneFloor => "STONE_FLOOR",
            Terrain::StoneWall => "STONE_WALL",
            Terrain::Door => "DOOR",
            Terrain::Void => "VOID",
        })
    }
}

/// Rectangular grid of tile codes, immutable for the lifetime of a level.
///
/// Tile indices are integers; world coordinates are continuous floats in
/// `[0, width) x [0, height)` and are floored to look up a tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileMap {
    rows: Vec<Vec<u8>>,
    width: usize,
    height: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("tile map has no rows")]
    Empty,
    #[error("tile map row {row} has {got} columns, expected {want}")]
    Ragged { row: usize, got: usize, want: usize },
}

impl TileMap {
    /// Build a map from generator output, enforcing rectangularity.
    pub fn new(rows: Vec<Vec<u8>>) -> Result<Self, MapError> {
        let width = rows.first().map(Vec::len).ok_or(MapError::Empty)?;
        if width == 0 {
            return Err(MapError::Empty);
        }
        for (row, r) in rows.iter().enumerate() {
            if r.len() != width {
                return Err(MapError::Ragged {
                    row,
                    got: r.len(),
                    want: width,
                });
            }
        }
        let height = rows.len();
        Ok(Self {
            rows,
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw tile code at integer indices; `None` when off the grid.
    #[inline]
    pub fn tile(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.rows[y as usize][x as usize])
    }

    /// Tile code under a continuous world coordinate.
    #[inline]
    pub fn tile_at(&self, x: f32, y: f32) -> Option<u8> {
        self.tile(x.floor() as i32, y.floor() as i32)
    }

    /// Classify a continuous world coordinate. Total: any input, including
    /// negative or overflowing coordinates, yields a terrain kind.
    #[inline]
    pub fn terrain_at(&self, x: f32, y: f32) -> Terrain {
        match self.tile_at(x, y) {
            Some(code) => Terrain::from_code(code),
            None => Terrain::Void,
        }
    }
}

impl<'de> Deserialize<'de> for TileMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let rows = Vec::<Vec<u8>>::deserialize(deserializer)?;
        TileMap::new(rows).map_err(serde::de::Error::custom)
    }
}

/// Hand-authored 10x10 fallback: wall border, one internal room, a door and
/// a portal. Installed whenever world generation fails, so a level
/// transition can never leave the engine without a defined map.
pub static DEFAULT_MAP: Lazy<TileMap> = Lazy::new(|| {
    TileMap {
        rows: vec![
            vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
            vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 1],
            vec![1, 0, 1, 0, 2, 1, 1, 0, 0, 1],
            vec![1, 0, 1, 0, 0, 0, 1, 0, 0, 1],
            vec![1, 0, 1, 3, 0, 0, 1, 0, 0, 1],
            vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 1],
            vec![1, 0, 0, 0, 1, 1, 1, 1, 0, 1],
            vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 1],
            vec![1, 0, 0, 1, 0, 0, 0, 0, 0, 1],
            vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        ],
        width: 10,
        height: 10,
    }
});

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrain_at_is_total() {
        let map = DEFAULT_MAP.clone();
        // out-of-bounds is always VOID regardless of stored content
        for &(x, y) in &[(-1.0, 5.0), (5.0, -0.001), (10.0, 5.0), (5.0, 10.0), (1e9, -1e9)] {
            assert_eq!(map.terrain_at(x, y), Terrain::Void, "({x},{y})");
        }
        // even degenerate inputs classify to something defined
        let _ = map.terrain_at(f32::NAN, f32::INFINITY);
    }

    #[test]
    fn codes_classify() {
        let map = DEFAULT_MAP.clone();
        assert_eq!(map.terrain_at(5.5, 5.5), Terrain::StoneFloor);
        assert_eq!(map.terrain_at(0.5, 0.5), Terrain::StoneWall);
        assert_eq!(map.terrain_at(4.5, 2.5), Terrain::Door);
        assert_eq!(map.terrain_at(3.5, 4.5), Terrain::Void); // portal code 3
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = TileMap::new(vec![vec![1, 1], vec![1]]).unwrap_err();
        assert!(matches!(err, MapError::Ragged { row: 1, .. }));
        assert!(matches!(TileMap::new(vec![]).unwrap_err(), MapError::Empty));
    }

    #[test]
    fn deserializes_from_generator_grid() {
        let map: TileMap = serde_json::from_str("[[1,1,1],[1,0,1],[1,1,1]]").unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.terrain_at(1.5, 1.5), Terrain::StoneFloor);
    }
}

use glam::{Vec2, vec2};
use serde::Deserialize;

use super::map::{DEFAULT_MAP, TileMap};

/// A generator-placed enemy. Enemies belong to the current level and are
/// dropped wholesale on a level transition; a defeated enemy is flagged
/// dead and culled from the list by the engine.
#[derive(Clone, Debug, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip, default = "alive")]
    pub alive: bool,
}

fn alive() -> bool {
    true
}

impl Enemy {
    #[inline]
    pub fn pos(&self) -> Vec2 {
        vec2(self.x, self.y)
    }
}

/// A tile coordinate the generator marked as an exit portal.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct Exit {
    pub x: u32,
    pub y: u32,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct PlayerStart {
    pub x: f32,
    pub y: f32,
}

/// One generated level as the world generator hands it over: the tile
/// grid, where the player materializes, who lives there, where the exits
/// are and what the narrator says about it.
#[derive(Clone, Debug, Deserialize)]
pub struct WorldData {
    pub map: TileMap,
    #[serde(rename = "playerStart")]
    pub player_start: PlayerStart,
    #[serde(default)]
    pub enemies: Vec<Enemy>,
    #[serde(default)]
    pub exits: Vec<Exit>,
    #[serde(rename = "worldDescription", default)]
    pub description: String,
}

impl WorldData {
    /// Parse the generator's JSON payload.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The fixed hand-authored world used whenever generation fails.
    pub fn fallback() -> Self {
        Self {
            map: DEFAULT_MAP.clone(),
            player_start: PlayerStart { x: 5.5, y: 5.5 },
            enemies: Vec::new(),
            exits: vec![Exit { x: 3, y: 4 }],
            description: "The vision falters, but a small, stone room materializes \
                          around you from the ether. The air is still and silent."
                .into(),
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::map::TILE_PORTAL;

    #[test]
    fn parses_generator_payload() {
        let json = r#"{
            "map": [[1,1,1],[1,0,1],[1,1,1]],
            "playerStart": {"x": 1.5, "y": 1.5},
            "enemies": [{"id": 7, "x": 1.2, "y": 1.2, "type": "goblin"}],
            "exits": [{"x": 1, "y": 1}],
            "worldDescription": "A cramped cell."
        }"#;
        let wd = WorldData::from_json(json).unwrap();
        assert_eq!(wd.map.width(), 3);
        assert_eq!(wd.enemies.len(), 1);
        assert_eq!(wd.enemies[0].kind, "goblin");
        assert!(wd.enemies[0].alive);
        assert_eq!(wd.description, "A cramped cell.");
    }

    #[test]
    fn ragged_map_payload_is_an_error() {
        let json = r#"{"map": [[1,1],[1]], "playerStart": {"x":0.5,"y":0.5}}"#;
        assert!(WorldData::from_json(json).is_err());
    }

    #[test]
    fn fallback_world_is_well_formed() {
        let wd = WorldData::fallback();
        assert_eq!(wd.map.width(), 10);
        assert_eq!(wd.map.height(), 10);
        // the advertised exit really is a portal tile
        let e = wd.exits[0];
        assert_eq!(wd.map.tile(e.x as i32, e.y as i32), Some(TILE_PORTAL));
        // start is on open floor
        assert_eq!(wd.map.tile_at(wd.player_start.x, wd.player_start.y), Some(0));
    }
}

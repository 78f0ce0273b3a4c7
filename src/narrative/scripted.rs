//! Offline narrator: a seeded local dungeon generator plus canned prose,
//! so the client runs without any external service.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{NarrativeError, Narrator};
use crate::world::map::{TILE_DOOR, TILE_FLOOR, TILE_PORTAL, TILE_WALL};
use crate::world::{Enemy, Exit, PlayerStart, TileMap, WorldData};

const WIDTH: usize = 16;
const HEIGHT: usize = 12;

pub struct ScriptedNarrator {
    rng: StdRng,
    depth: u32,
}

impl ScriptedNarrator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            depth: 0,
        }
    }

    /// Bordered grid with a few carved wall slabs, one door, one portal
    /// and a handful of goblins. Valid by construction: the start tile and
    /// the portal tile are always floor before being claimed.
    fn generate(&mut self) -> WorldData {
        let mut rows = vec![vec![TILE_FLOOR; WIDTH]; HEIGHT];
        for x in 0..WIDTH {
            rows[0][x] = TILE_WALL;
            rows[HEIGHT - 1][x] = TILE_WALL;
        }
        for row in rows.iter_mut() {
            row[0] = TILE_WALL;
            row[WIDTH - 1] = TILE_WALL;
        }

        // interior wall slabs, never touching the start area
        for _ in 0..6 {
            let len = self.rng.gen_range(2..5);
            let horizontal = self.rng.gen_bool(0.5);
            let x = self.rng.gen_range(2..WIDTH - 2 - if horizontal { len } else { 0 });
            let y = self.rng.gen_range(2..HEIGHT - 2 - if horizontal { 0 } else { len });
            for i in 0..len {
                let (tx, ty) = if horizontal { (x + i, y) } else { (x, y + i) };
                if (tx, ty) != (2, 2) {
                    rows[ty][tx] = TILE_WALL;
                }
            }
        }
        rows[2][2] = TILE_FLOOR; // player start tile stays open

        // one door somewhere in the middle band
        let (dx, dy) = self.pick_floor(&rows);
        rows[dy][dx] = TILE_DOOR;

        // one exit portal, biased toward the far corner
        let (px, py) = loop {
            let x = self.rng.gen_range(WIDTH / 2..WIDTH - 1);
            let y = self.rng.gen_range(HEIGHT / 2..HEIGHT - 1);
            if rows[y][x] == TILE_FLOOR {
                break (x, y);
            }
        };
        rows[py][px] = TILE_PORTAL;

        let mut enemies = Vec::new();
        for id in 0..self.rng.gen_range(1..4u32) {
            let (x, y) = self.pick_floor(&rows);
            enemies.push(Enemy {
                id,
                x: x as f32 + 0.5,
                y: y as f32 + 0.5,
                kind: "goblin".into(),
                alive: true,
            });
        }

        self.depth += 1;
        WorldData {
            // the grid is rectangular by construction
            map: TileMap::new(rows).unwrap_or_else(|_| crate::world::DEFAULT_MAP.clone()),
            player_start: PlayerStart { x: 2.5, y: 2.5 },
            enemies,
            exits: vec![Exit {
                x: px as u32,
                y: py as u32,
            }],
            description: format!(
                "Level {}: torchlight gutters along damp stone. Somewhere ahead, \
                 a portal hums in the dark.",
                self.depth
            ),
        }
    }

    fn pick_floor(&mut self, rows: &[Vec<u8>]) -> (usize, usize) {
        loop {
            let x = self.rng.gen_range(1..WIDTH - 1);
            let y = self.rng.gen_range(1..HEIGHT - 1);
            if rows[y][x] == TILE_FLOOR && (x, y) != (2, 2) {
                return (x, y);
            }
        }
    }
}

impl Narrator for ScriptedNarrator {
    async fn generate_world(&mut self, _prompt: &str) -> Result<WorldData, NarrativeError> {
        Ok(self.generate())
    }

    async fn send_turn(&mut self, message: &str) -> Result<String, NarrativeError> {
        if message.to_lowercase().starts_with("i attack") {
            Ok("Your blow lands true; the creature crumples into the shadows. \
                [COMBAT_STATUS: {\"enemies\": []}]"
                .into())
        } else {
            Ok("The dungeon swallows your words without an echo.".into())
        }
    }

    async fn send_telemetry(&mut self, line: &str) -> Result<String, NarrativeError> {
        // mostly silent; the occasional ambient line when a wall looms
        if line.contains("obstacle: \"STONE_WALL\"") && self.rng.gen_bool(0.02) {
            Ok("Cold stone bars the way ahead.".into())
        } else {
            Ok(String::new())
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/

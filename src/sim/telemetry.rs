use glam::Vec2;
use std::f32::consts::PI;
use std::fmt;

use super::movement::TickAction;
use crate::world::{Player, Terrain, TileMap};

/// How far ahead of the player the obstacle probe samples the grid.
pub const PROBE_DISTANCE: f32 = 0.6;

/// Facing angle bucketed into a 90 degree arc. Boundaries sit at the
/// 45 degree diagonals; each lower bound is inclusive, so 7pi/4 lands in
/// the same bucket as 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinal {
    North,
    East,
    South,
    West,
}

impl Cardinal {
    pub fn from_angle(rad: f32) -> Self {
        let r = rad.rem_euclid(2.0 * PI);
        if r >= 7.0 * PI / 4.0 || r < PI / 4.0 {
            Cardinal::North
        } else if r < 3.0 * PI / 4.0 {
            Cardinal::East
        } else if r < 5.0 * PI / 4.0 {
            Cardinal::South
        } else {
            Cardinal::West
        }
    }
}

impl fmt::Display for Cardinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cardinal::North => "NORTH",
            Cardinal::East => "EAST",
            Cardinal::South => "SOUTH",
            Cardinal::West => "WEST",
        })
    }
}

/// Compact structured description of one movement/turn tick, fed to the
/// narrative engine as context. Composed after rendering; dispatch is
/// fire-and-forget and never blocks the loop.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub action: TickAction,
    pub from: Terrain,
    pub to: Terrain,
    pub direction: Cardinal,
    pub obstacle: Terrain,
}

impl Summary {
    /// Derive the summary for a finished tick. `from` is the pre-tick
    /// position; the player already holds the post-tick state.
    pub fn compose(map: &TileMap, player: &Player, from: Vec2, action: TickAction) -> Self {
        let probe = player.pos + player.forward() * PROBE_DISTANCE;
        Summary {
            action,
            from: map.terrain_at(from.x, from.y),
            to: map.terrain_at(player.pos.x, player.pos.y),
            direction: Cardinal::from_angle(player.dir()),
            obstacle: map.terrain_at(probe.x, probe.y),
        }
    }
}

impl fmt::Display for Summary {
    /// The exact wire line the narrative engine was instructed to expect.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[TELEMETRY: {{ action: \"{}\", from: \"{}\", to: \"{}\", direction: \"{}\", obstacle: \"{}\" }}]",
            self.action, self.from, self.to, self.direction, self.obstacle
        )
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/

use glam::Vec2;
use std::fmt;

use super::input::Keys;
use crate::world::map::{TILE_PORTAL, TILE_WALL};
use crate::world::{Player, TileMap};

/* fixed per-tick deltas; movement is deliberately not frame-rate independent */
pub const MOVE_SPEED: f32 = 0.05;
pub const ROT_SPEED: f32 = 0.04;

/// What the tick amounted to, for telemetry. Movement keys are checked
/// before rotation keys, so MOVE wins when both are held even though the
/// rotation delta still applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TickAction {
    #[default]
    None,
    Move,
    Turn,
}

impl fmt::Display for TickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TickAction::None => "NONE",
            TickAction::Move => "MOVE",
            TickAction::Turn => "TURN",
        })
    }
}

/// Result of one movement resolution.
#[derive(Clone, Copy, Debug)]
pub struct MoveOutcome {
    pub action: TickAction,
    /// Pre-tick position, kept for the telemetry `from` field.
    pub from: Vec2,
    /// The player ended the tick standing on a portal tile.
    pub portal: bool,
}

/// Apply one tick of input to the player and resolve the destination tile.
///
/// Translation and rotation are applied tentatively and additively; only
/// the combined destination tile is sampled afterwards. A WALL destination
/// rolls the position back to `from` (rotation is never rolled back); an
/// out-of-grid destination is treated the same way, since anything outside
/// the map is impassable void. Intermediate sub-steps are not checked, so
/// cutting a corner diagonally is possible; that approximation is part of
/// the contract.
pub fn resolve(player: &mut Player, keys: Keys, map: &TileMap) -> MoveOutcome {
    let from = player.pos;
    let mut action = TickAction::None;

    if keys.contains(Keys::FORWARD) {
        player.step(MOVE_SPEED);
        action = TickAction::Move;
    }
    if keys.contains(Keys::BACK) {
        player.step(-MOVE_SPEED);
        action = TickAction::Move;
    }
    if keys.contains(Keys::TURN_RIGHT) {
        player.turn(ROT_SPEED);
        if action == TickAction::None {
            action = TickAction::Turn;
        }
    }
    if keys.contains(Keys::TURN_LEFT) {
        player.turn(-ROT_SPEED);
        if action == TickAction::None {
            action = TickAction::Turn;
        }
    }

    let mut portal = false;
    match map.tile_at(player.pos.x, player.pos.y) {
        Some(TILE_WALL) | None => player.pos = from,
        Some(TILE_PORTAL) => portal = true,
        Some(_) => {} // floor and doors are walkable
    }

    MoveOutcome {
        action,
        from,
        portal,
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/

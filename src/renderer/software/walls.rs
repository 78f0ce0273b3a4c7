use glam::Vec2;
use std::f32::consts::FRAC_PI_3;

use super::Software;
use crate::renderer::fog_blend;
use crate::world::map::{TILE_DOOR, TILE_FLOOR, TILE_PORTAL};
use crate::world::{Player, TileMap};

/* march parameters */
pub(super) const FOV: f32 = FRAC_PI_3; // 60 degrees
pub(super) const STEP: f32 = 0.1;
pub(super) const MAX_RANGE: f32 = 20.0;

/// One column's raw march result, before fisheye correction.
#[derive(Clone, Copy, Debug)]
pub(super) struct ColumnHit {
    pub distance: f32,
    /// Tile code of the hit cell; stays 0 when the march ran out of range.
    pub code: u8,
    /// Alternating face flag used for shading only. Derived by comparing
    /// the hit step's integer X against the previous step's, which can
    /// misread near-diagonal hits; kept for visual parity.
    pub side: u8,
}

/// March a ray in fixed steps until a non-floor tile or the range limit.
/// Leaving the grid stops the ray at the range limit, same as a miss.
pub(super) fn march(map: &TileMap, origin: Vec2, ray_angle: f32) -> ColumnHit {
    let (s, c) = ray_angle.sin_cos();
    let eye = Vec2::new(c, s);

    let mut distance = 0.0_f32;
    while distance < MAX_RANGE {
        distance += STEP;
        let p = origin + eye * distance;
        let (tx, ty) = (p.x.floor() as i32, p.y.floor() as i32);

        let Some(code) = map.tile(tx, ty) else {
            return ColumnHit {
                distance: MAX_RANGE,
                code: TILE_FLOOR,
                side: 0,
            };
        };
        if code != TILE_FLOOR {
            let prev = origin + eye * (distance - STEP);
            let side = (prev.x.floor() as i32 != tx) as u8;
            return ColumnHit {
                distance,
                code,
                side,
            };
        }
    }

    ColumnHit {
        distance,
        code: TILE_FLOOR,
        side: 0,
    }
}

/// Remove fisheye distortion: scale the marched distance by the cosine of
/// the angle between the ray and the facing direction. Applied before the
/// distance is mapped to a wall height or written to the depth buffer.
#[inline]
pub(super) fn correct_fisheye(raw: f32, facing: f32, ray_angle: f32) -> f32 {
    raw * (facing - ray_angle).cos()
}

fn wall_color(code: u8, side: u8) -> (u8, u8, u8) {
    match code {
        TILE_DOOR => {
            if side == 1 {
                (110, 53, 13)
            } else {
                (139, 69, 19)
            }
        }
        TILE_PORTAL => (20, 0, 30),
        _ => {
            if side == 1 {
                (128, 128, 128)
            } else {
                (160, 160, 160)
            }
        }
    }
}

impl Software {
    /// Cast one ray per screen column: walls into the scratch buffer,
    /// corrected distances into the depth buffer.
    pub(super) fn cast_walls(&mut self, map: &TileMap, player: &Player) {
        let facing = player.dir();

        for i in 0..self.width {
            let ray = (facing - FOV * 0.5) + (i as f32 / self.width_f) * FOV;
            let hit = march(map, player.pos, ray);
            let distance = correct_fisheye(hit.distance, facing, ray);
            self.zbuffer[i] = distance;

            // projection-plane model: extent inversely proportional to
            // distance, centered vertically
            let ceiling = self.height_f * 0.5 - self.height_f / distance;
            let floor = self.height_f - ceiling;

            let col = fog_blend(wall_color(hit.code, hit.side), distance);
            let y0 = ceiling.max(0.0) as usize;
            let y1 = (floor.max(0.0) as usize).min(self.height);
            for y in y0..y1 {
                self.put(i, y, col);
            }
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/

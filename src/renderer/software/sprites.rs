use glam::Vec2;

use super::Software;
use crate::renderer::fog_blend;
use crate::world::{Enemy, Player};

/// Transformed depths at or below this are behind the camera plane or too
/// close to it; discarding them avoids the projection singularity.
pub(super) const MIN_DEPTH: f32 = 0.5;

/// Base sprite color before fog; every known enemy category is the same
/// goblin-green humanoid glyph for now.
const SPRITE_COLOR: (u8, u8, u8) = (34, 139, 34);

/// Screen-space placement of one sprite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteProjection {
    /// Camera-space depth, compared against the wall depth buffer.
    pub depth: f32,
    /// Column of the sprite center.
    pub screen_x: i32,
    /// Square glyph extent in pixels.
    pub size: i32,
}

/// Project a world position into screen space via the camera transform.
/// Returns `None` when the point is behind or too close to the camera.
pub fn project(player: &Player, world: Vec2, w: f32, h: f32) -> Option<SpriteProjection> {
    let t = player.to_cam(world);
    if t.y <= MIN_DEPTH {
        return None;
    }
    Some(SpriteProjection {
        depth: t.y,
        screen_x: ((w * 0.5) * (1.0 + t.x / t.y)).floor() as i32,
        size: (h / t.y).abs().floor() as i32,
    })
}

/// Depth test for one screen column: on-screen and strictly nearer than
/// the wall the column shows.
#[inline]
pub(super) fn column_visible(zbuffer: &[f32], x: i32, depth: f32) -> bool {
    (0..zbuffer.len() as i32).contains(&x) && depth < zbuffer[x as usize]
}

impl Software {
    /// Draw all alive enemies back-to-front, occluded per column by the
    /// wall depth buffer written by the wall pass of this frame.
    pub(super) fn draw_sprites(&mut self, player: &Player, enemies: &[Enemy]) {
        // painter's algorithm: farthest first so nearer sprites overdraw
        let mut order: Vec<&Enemy> = enemies.iter().filter(|e| e.alive).collect();
        order.sort_by(|a, b| {
            let da = player.pos.distance_squared(a.pos());
            let db = player.pos.distance_squared(b.pos());
            db.total_cmp(&da)
        });

        for enemy in order {
            let Some(spr) = project(player, enemy.pos(), self.width_f, self.height_f) else {
                continue;
            };
            self.draw_glyph(&spr);
        }
    }

    /// A simple humanoid: body rectangle plus head circle, stamped one
    /// column at a time so walls clip it correctly.
    fn draw_glyph(&mut self, spr: &SpriteProjection) {
        let size = spr.size as f32;
        let cx = spr.screen_x;
        let left = cx - spr.size / 2;
        let top = (self.height_f * 0.5 - size * 0.5).floor();

        let body_w = size * 0.3;
        let body_top = top + size * 0.3;
        let body_bot = body_top + size * 0.4;
        let head_r = size * 0.2;
        let head_y = top + size * 0.3;

        let col = fog_blend(SPRITE_COLOR, spr.depth);

        for x in left..left + spr.size {
            if !column_visible(&self.zbuffer, x, spr.depth) {
                continue;
            }
            let dx = (x - cx) as f32;

            if dx.abs() <= body_w * 0.5 {
                self.fill_rows(x as usize, body_top, body_bot, col);
            }
            if dx.abs() <= head_r {
                let half = (head_r * head_r - dx * dx).sqrt();
                self.fill_rows(x as usize, head_y - half, head_y + half, col);
            }
        }
    }

    fn fill_rows(&mut self, x: usize, y0: f32, y1: f32, col: crate::renderer::Rgba) {
        let y0 = y0.max(0.0) as usize;
        let y1 = (y1.max(0.0) as usize).min(self.height);
        for y in y0..y1 {
            self.put(x, y, col);
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{Renderer, Scene};
    use crate::sim::Overlay;
    use crate::world::TileMap;
    use glam::vec2;

    fn enemy(id: u32, x: f32, y: f32) -> Enemy {
        Enemy {
            id,
            x,
            y,
            kind: "goblin".into(),
            alive: true,
        }
    }

    #[test]
    fn behind_camera_is_discarded() {
        let player = Player::new(vec2(5.0, 5.0));
        // facing +X; a point to the west is behind the camera plane
        assert!(project(&player, vec2(2.0, 5.0), 640.0, 480.0).is_none());
    }

    #[test]
    fn too_close_is_discarded() {
        let player = Player::new(vec2(5.0, 5.0));
        assert!(project(&player, vec2(5.2, 5.0), 640.0, 480.0).is_none());
    }

    #[test]
    fn dead_ahead_projects_to_screen_center() {
        let player = Player::new(vec2(5.0, 5.0));
        let spr = project(&player, vec2(9.0, 5.0), 640.0, 480.0).unwrap();
        assert_eq!(spr.screen_x, 320);
        assert!((spr.depth - 4.0).abs() < 1e-4);
        assert_eq!(spr.size, (480.0 / spr.depth) as i32);
    }

    #[test]
    fn occluded_column_fails_the_depth_test() {
        // synthetic depth buffer: wall at 3.0 units in every column
        let zbuffer = vec![3.0_f32; 64];
        assert!(!column_visible(&zbuffer, 10, 5.0)); // sprite behind wall
        assert!(column_visible(&zbuffer, 10, 2.0)); // sprite in front
        assert!(!column_visible(&zbuffer, -1, 1.0)); // off-screen left
        assert!(!column_visible(&zbuffer, 64, 1.0)); // off-screen right
        assert!(!column_visible(&zbuffer, 0, 3.0)); // exactly at wall depth
    }

    #[test]
    fn sprite_behind_wall_leaves_no_green_pixels() {
        // corridor with a wall slice between player and enemy
        let map = TileMap::new(vec![
            vec![1, 1, 1, 1, 1, 1, 1, 1],
            vec![1, 0, 0, 1, 0, 0, 0, 1],
            vec![1, 1, 1, 1, 1, 1, 1, 1],
        ])
        .unwrap();
        let player = Player::new(vec2(1.5, 1.5)); // facing +X, wall at x=3
        let hidden = [enemy(1, 5.5, 1.5)]; // beyond the wall
        let mut sw = Software::default();
        sw.begin_frame(64, 48);
        sw.draw_scene(&Scene {
            map: &map,
            player: &player,
            enemies: &hidden,
            overlay: &Overlay::None,
        });
        let green = fog_blend(SPRITE_COLOR, 4.0);
        for y in 0..48 {
            for x in 0..64 {
                assert_ne!(sw.pixel(x, y), green, "sprite leaked at ({x},{y})");
            }
        }
    }

    #[test]
    fn visible_sprite_is_drawn() {
        let map = TileMap::new(vec![
            vec![1, 1, 1, 1, 1, 1, 1, 1],
            vec![1, 0, 0, 0, 0, 0, 0, 1],
            vec![1, 1, 1, 1, 1, 1, 1, 1],
        ])
        .unwrap();
        let player = Player::new(vec2(1.5, 1.5));
        let visible = [enemy(1, 4.5, 1.5)];
        let mut sw = Software::default();
        sw.begin_frame(64, 48);
        sw.draw_scene(&Scene {
            map: &map,
            player: &player,
            enemies: &visible,
            overlay: &Overlay::None,
        });
        let expected = fog_blend(SPRITE_COLOR, 3.0);
        let mut found = false;
        'scan: for y in 0..48 {
            for x in 0..64 {
                if sw.pixel(x, y) == expected {
                    found = true;
                    break 'scan;
                }
            }
        }
        assert!(found, "expected at least one sprite pixel");
    }
}

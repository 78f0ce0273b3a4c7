use glam::{Vec2, vec2};

use super::Software;
use crate::sim::Overlay;

/// Alpha-blend an RGB color over one pixel of the scratch buffer.
#[inline]
fn blend(px: &mut u32, (r, g, b): (u8, u8, u8), alpha: f32) {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |dst: u32, src: u8| -> u32 {
        (dst as f32 * (1.0 - a) + src as f32 * a) as u32
    };
    let (dr, dg, db) = ((*px >> 16) & 0xFF, (*px >> 8) & 0xFF, *px & 0xFF);
    *px = (mix(dr, r) << 16) | (mix(dg, g) << 8) | mix(db, b);
}

impl Software {
    /// Composite the active animation effect over the finished frame.
    pub(super) fn draw_overlay(&mut self, overlay: &Overlay) {
        match overlay {
            Overlay::None => {}
            Overlay::PlayerAttack { .. } => self.draw_attack_arc(overlay.progress()),
            Overlay::EnemyHit { .. } => self.draw_hit_flash(overlay.progress()),
        }
    }

    /// An arcing swing: a quadratic curve anchored low on both sides whose
    /// apex rises and whose stroke thins and fades as the swing completes.
    fn draw_attack_arc(&mut self, progress: f32) {
        let (w, h) = (self.width_f, self.height_f);
        let p0 = vec2(w * 0.2, h * 0.8);
        let p1 = vec2(w * 0.5, h * (0.8 - progress * 0.6));
        let p2 = vec2(w * 0.8, h * 0.8);

        let alpha = 1.0 - progress;
        let stroke = 5.0 - progress * 4.0;

        let steps = (self.width.max(32)) * 2;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let q = quadratic(p0, p1, p2, t);
            self.stamp_disc(q, stroke * 0.5, (255, 255, 255), alpha);
        }
    }

    /// Full-view red flash fading out over the effect's lifetime.
    fn draw_hit_flash(&mut self, progress: f32) {
        let alpha = 0.4 * (1.0 - progress);
        for px in &mut self.scratch {
            blend(px, (255, 0, 0), alpha);
        }
    }

    fn stamp_disc(&mut self, center: Vec2, radius: f32, color: (u8, u8, u8), alpha: f32) {
        let r = radius.max(0.5);
        let x0 = ((center.x - r).floor() as i32).max(0);
        let x1 = ((center.x + r).ceil() as i32).min(self.width as i32 - 1);
        let y0 = ((center.y - r).floor() as i32).max(0);
        let y1 = ((center.y + r).ceil() as i32).min(self.height as i32 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = vec2(x as f32, y as f32) - center;
                if d.length_squared() <= r * r {
                    blend(&mut self.scratch[y as usize * self.width + x as usize], color, alpha);
                }
            }
        }
    }
}

#[inline]
fn quadratic(p0: Vec2, p1: Vec2, p2: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Renderer;

    #[test]
    fn blend_endpoints() {
        let mut px = 0x00102030;
        blend(&mut px, (255, 0, 0), 0.0);
        assert_eq!(px, 0x00102030); // alpha 0 leaves the pixel alone
        blend(&mut px, (255, 0, 0), 1.0);
        assert_eq!(px, 0x00FF0000); // alpha 1 replaces it
    }

    #[test]
    fn quadratic_hits_its_endpoints() {
        let (a, b, c) = (vec2(0.0, 0.0), vec2(5.0, 10.0), vec2(10.0, 0.0));
        assert_eq!(quadratic(a, b, c, 0.0), a);
        assert_eq!(quadratic(a, b, c, 1.0), c);
        assert_eq!(quadratic(a, b, c, 0.5), vec2(5.0, 5.0));
    }

    #[test]
    fn hit_flash_reddens_the_frame() {
        let mut sw = Software::default();
        sw.begin_frame(16, 8);
        let before = sw.pixel(3, 3);
        sw.draw_overlay(&Overlay::EnemyHit { tics: crate::sim::HIT_TICS });
        let after = sw.pixel(3, 3);
        assert!(after >> 16 > before >> 16, "red channel should increase");
    }

    #[test]
    fn finished_swing_draws_nothing() {
        let mut sw = Software::default();
        sw.begin_frame(16, 8);
        let snapshot: Vec<u32> = (0..8).map(|y| sw.pixel(7, y)).collect();
        sw.draw_overlay(&Overlay::None);
        for (y, was) in snapshot.iter().enumerate() {
            assert_eq!(sw.pixel(7, y), *was);
        }
    }

    #[test]
    fn fresh_swing_stamps_white_near_the_anchors() {
        let mut sw = Software::default();
        sw.begin_frame(100, 50);
        sw.draw_overlay(&Overlay::PlayerAttack { tics: crate::sim::ATTACK_TICS });
        // progress 0: full alpha white along the arc; anchor at (20, 40)
        assert_eq!(sw.pixel(20, 40), 0x00FFFFFF);
    }
}

//! Rendering abstraction layer.
//!
//! The engine never touches a pixel buffer directly: it exposes a
//! [`Scene`] view over its state and hands it to a type implementing
//! [`Renderer`]. The software back-end rasterizes walls by per-column ray
//! marching, depth-composites enemy sprites against the wall depth buffer
//! and stamps the animation overlay on top.

use crate::sim::Overlay;
use crate::world::{Enemy, Player, TileMap};

pub mod software;

pub use software::Software;

/// Pixel format of the software frame-buffer (0x00RRGGBB).
pub type Rgba = u32;

/// Distance fog: linear blend toward the ceiling color, fully fogged
/// twelve units out.
pub const FOG_COLOR: (u8, u8, u8) = (42, 42, 58);

#[inline]
pub fn pack(r: u8, g: u8, b: u8) -> Rgba {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Fog fraction for a corrected wall/sprite distance, clamped to `[0, 1]`.
/// Monotonic in the distance.
#[inline]
pub fn fog_fraction(distance: f32) -> f32 {
    ((distance - 1.0) / 11.0).clamp(0.0, 1.0)
}

/// Blend a base color toward [`FOG_COLOR`] by distance.
#[inline]
pub fn fog_blend(base: (u8, u8, u8), distance: f32) -> Rgba {
    let f = fog_fraction(distance);
    let ch = |b: u8, fog: u8| (b as f32 * (1.0 - f) + fog as f32 * f) as u8;
    pack(
        ch(base.0, FOG_COLOR.0),
        ch(base.1, FOG_COLOR.1),
        ch(base.2, FOG_COLOR.2),
    )
}

/// Everything one frame needs, borrowed from the engine for the duration
/// of the draw. Single writer (the tick) has already run; the renderer is
/// a pure reader.
pub struct Scene<'a> {
    pub map: &'a TileMap,
    pub player: &'a Player,
    pub enemies: &'a [Enemy],
    pub overlay: &'a Overlay,
}

/// A renderer that owns an internal scratch buffer for the whole frame.
///
/// `end_frame` loans the finished buffer to a user-supplied closure;
/// software callers typically forward it to their window manager.
pub trait Renderer {
    /// (Re)allocate internal scratch for the requested resolution and
    /// clear it. Called every frame so the surface tracks window resizes.
    fn begin_frame(&mut self, width: usize, height: usize);

    /// Rasterize one frame: walls, sprites, then the overlay.
    fn draw_scene(&mut self, scene: &Scene);

    /// Finish the frame and hand the buffer to `submit` exactly once.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fog_is_monotonic_and_clamped() {
        let mut last = -1.0;
        let mut d = 0.0;
        while d <= 25.0 {
            let f = fog_fraction(d);
            assert!((0.0..=1.0).contains(&f));
            assert!(f >= last, "fog decreased at d = {d}");
            last = f;
            d += 0.05;
        }
        assert_eq!(fog_fraction(0.0), 0.0);
        assert_eq!(fog_fraction(12.0), 1.0);
        assert_eq!(fog_fraction(500.0), 1.0);
    }

    #[test]
    fn fully_fogged_color_is_the_fog_color() {
        let c = fog_blend((160, 160, 160), 20.0);
        assert_eq!(c, pack(FOG_COLOR.0, FOG_COLOR.1, FOG_COLOR.2));
    }

    #[test]
    fn zero_distance_keeps_the_base_color() {
        assert_eq!(fog_blend((34, 139, 34), 1.0), pack(34, 139, 34));
    }
}

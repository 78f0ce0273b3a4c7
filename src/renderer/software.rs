//! ---------------------------------------------------------------------------
//! Software (CPU) raycast renderer
//!
//! * Fills an `&mut [u32]` frame-buffer in **0x00RRGGBB** format.
//! * One ray march per screen column produces the walls and the per-column
//!   depth buffer; sprites are then depth-tested against that buffer and
//!   drawn back-to-front; the animation overlay is composited last.
//! ---------------------------------------------------------------------------

use crate::renderer::{Renderer, Rgba, Scene};

mod overlay;
mod sprites;
mod walls;

pub use sprites::SpriteProjection;

const CEILING_COLOR: Rgba = 0x002A2A3A;
const FLOOR_COLOR: Rgba = 0x005A4A3A;

/// Per-column raycast renderer.
#[derive(Default)]
pub struct Software {
    scratch: Vec<Rgba>,
    /// Corrected nearest-wall distance per screen column, rebuilt every
    /// frame and consumed only by the sprite pass of the same frame.
    zbuffer: Vec<f32>,

    width: usize,
    height: usize,
    width_f: f32,
    height_f: f32,
}

impl Renderer for Software {
    fn begin_frame(&mut self, w: usize, h: usize) {
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.width_f = w as f32;
            self.height_f = h as f32;
            self.scratch.resize(w * h, 0);
            self.zbuffer.resize(w, f32::MAX);
        }

        /* flat ceiling above, flat floor below */
        let split = w * (h / 2);
        self.scratch[..split].fill(CEILING_COLOR);
        self.scratch[split..].fill(FLOOR_COLOR);

        self.zbuffer.fill(f32::MAX);
    }

    fn draw_scene(&mut self, scene: &Scene) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        self.cast_walls(scene.map, scene.player);
        self.draw_sprites(scene.player, scene.enemies);
        self.draw_overlay(scene.overlay);
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        submit(&self.scratch, self.width, self.height);
    }
}

impl Software {
    #[inline]
    fn put(&mut self, x: usize, y: usize, col: Rgba) {
        self.scratch[y * self.width + x] = col;
    }

    #[cfg(test)]
    pub(crate) fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.scratch[y * self.width + x]
    }

    #[cfg(test)]
    pub(crate) fn depth_at(&self, x: usize) -> f32 {
        self.zbuffer[x]
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/

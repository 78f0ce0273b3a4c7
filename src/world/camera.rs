use glam::{Vec2, vec2};

/// Camera-plane half extent. 0.66 pairs with the 60 degree FOV of the
/// wall caster.
pub const PLANE_EXTENT: f32 = 0.66;

/// Player view-point in world space.
///
/// * Position is continuous; the tile grid is sampled by flooring.
/// * `dir` is the facing angle in radians, kept normalized to `[0, 2pi)`.
/// * The camera plane is a fixed perpendicular offset vector; it only
///   changes when the field of view changes, never with the facing angle.
#[derive(Clone, Copy, Debug)]
pub struct Player {
    pub pos: Vec2,
    dir: f32,
    plane: Vec2,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            dir: 0.0,
            plane: vec2(0.0, PLANE_EXTENT),
        }
    }

    /// Facing angle in radians, guaranteed in `[0, 2pi)`.
    #[inline]
    pub fn dir(&self) -> f32 {
        self.dir
    }

    #[inline]
    pub fn plane(&self) -> Vec2 {
        self.plane
    }

    /// Unit vector pointing where the player looks on the X-Y plane.
    #[inline(always)]
    pub fn forward(&self) -> Vec2 {
        let (s, c) = self.dir.sin_cos();
        Vec2::new(c, s) // 0 rad = +X, CCW positive
    }

    /// Move by `amount` world units along the facing direction.
    pub fn step(&mut self, amount: f32) {
        self.pos += self.forward() * amount;
    }

    /// Rotate around the vertical axis.
    pub fn turn(&mut self, delta: f32) {
        self.dir = (self.dir + delta).rem_euclid(std::f32::consts::TAU);
    }

    /// Reset facing, used when a freshly generated level is entered.
    pub fn reset_facing(&mut self) {
        self.dir = 0.0;
    }

    /// Transform a world point into camera space using the inverse of the
    /// 2x2 matrix formed by the facing direction and the camera plane:
    ///  .x = lateral offset across the screen
    ///  .y = depth in front of the camera plane
    #[inline]
    pub fn to_cam(&self, p: Vec2) -> Vec2 {
        let rel = p - self.pos;
        let (s, c) = self.dir.sin_cos();
        let inv_det = 1.0 / (self.plane.x * s - c * self.plane.y);
        let tx = inv_det * (s * rel.x - c * rel.y);
        let ty = inv_det * (-self.plane.y * rel.x + self.plane.x * rel.y);
        vec2(tx, ty)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/

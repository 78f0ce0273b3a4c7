pub const ATTACK_TICS: u32 = 30;
pub const HIT_TICS: u32 = 15;

/// Short-lived visual effect composited on top of the frame. At most one
/// effect runs at a time; starting a new one overwrites whatever is in
/// progress. Each tick the renderer draws the effect, then the engine
/// counts it down; at zero it returns to `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    None,
    PlayerAttack {
        tics: u32,
    },
    EnemyHit {
        tics: u32,
    },
}

impl Overlay {
    pub fn start_attack(&mut self) {
        *self = Overlay::PlayerAttack { tics: ATTACK_TICS };
    }

    pub fn start_hit(&mut self) {
        *self = Overlay::EnemyHit { tics: HIT_TICS };
    }

    /// Fraction of the effect already elapsed, in `[0, 1)`.
    pub fn progress(&self) -> f32 {
        match *self {
            Overlay::None => 0.0,
            Overlay::PlayerAttack { tics } => 1.0 - tics as f32 / ATTACK_TICS as f32,
            Overlay::EnemyHit { tics } => 1.0 - tics as f32 / HIT_TICS as f32,
        }
    }

    /// Count the active effect down by one tick.
    pub fn tick(&mut self) {
        *self = match *self {
            Overlay::None => Overlay::None,
            Overlay::PlayerAttack { tics } if tics > 1 => Overlay::PlayerAttack { tics: tics - 1 },
            Overlay::EnemyHit { tics } if tics > 1 => Overlay::EnemyHit { tics: tics - 1 },
            _ => Overlay::None,
        };
    }
}

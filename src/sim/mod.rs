mod animation;
mod input;
mod movement;
mod telemetry;

pub use animation::{ATTACK_TICS, HIT_TICS, Overlay};
pub use input::{InputMap, Keys};
pub use movement::{MOVE_SPEED, MoveOutcome, ROT_SPEED, TickAction, resolve};
pub use telemetry::{Cardinal, PROBE_DISTANCE, Summary};

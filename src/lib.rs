//! A first-person dungeon delver rendered by per-column ray marching,
//! with levels and narration produced by a generative collaborator.
//!
//! The crate splits along the same seams the binary uses them:
//!
//! * [`world`] — the tile map model, the player camera and the generated
//!   level payload.
//! * [`sim`] — input sampling, movement/collision resolution, movement
//!   telemetry and the combat animation overlay.
//! * [`renderer`] — the [`renderer::Renderer`] seam and the software
//!   back-end (wall caster, sprite compositor, overlay).
//! * [`narrative`] — the asynchronous narrator boundary: worker thread,
//!   send gate and the HTTP / scripted backends.
//! * [`engine`] — the per-tick orchestrator tying the above together.

pub mod engine;
pub mod narrative;
pub mod renderer;
pub mod sim;
pub mod world;

pub use engine::Engine;

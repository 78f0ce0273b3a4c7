//! Windowed front-end for the dungeon delver.
//!
//! ```bash
//! cargo run --release -- --offline
//! ```
//!
//! Controls: ↑/W forward ↓/S back ←/→ turn Space attack Esc quit
//!
//! With `LLM_API_KEY` set (and no `--offline`) the levels and narration
//! come from a generative endpoint; otherwise a seeded local generator
//! stands in.

use clap::Parser;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use delve_rs::narrative::{LlmNarrator, NarrativeLink, ScriptedNarrator};
use delve_rs::renderer::{Renderer, Software};
use delve_rs::sim::Keys;
use delve_rs::world::WorldData;
use delve_rs::Engine;

#[derive(Parser, Debug)]
#[command(version, about = "First-person dungeon delver with a generative narrator")]
struct Args {
    /// Window width in pixels.
    #[arg(long, default_value_t = 640)]
    width: usize,

    /// Window height in pixels.
    #[arg(long, default_value_t = 480)]
    height: usize,

    /// Use the offline scripted narrator even when an API key is set.
    #[arg(long)]
    offline: bool,

    /// Seed for the offline level generator.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Character the narrator writes for.
    #[arg(long, default_value = "a nameless delver")]
    character: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let link = if args.offline {
        NarrativeLink::spawn(ScriptedNarrator::new(args.seed))
    } else {
        match LlmNarrator::from_env(args.character.clone()) {
            Ok(narrator) => NarrativeLink::spawn(narrator),
            Err(e) => {
                log::warn!("{e}; falling back to the offline narrator");
                NarrativeLink::spawn(ScriptedNarrator::new(args.seed))
            }
        }
    };

    let mut engine = Engine::new(WorldData::fallback(), link, args.character);
    let input = engine.input();
    let mut renderer = Software::default();

    let mut win = Window::new(
        "Delve",
        args.width,
        args.height,
        WindowOptions::default(),
    )?;
    win.set_target_fps(60);

    engine.start();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        /* --------------- mirror held keys into the input map ---------- */
        let held = |down: bool, keys: Keys| {
            if down {
                input.press(keys);
            } else {
                input.release(keys);
            }
        };
        held(win.is_key_down(Key::Up) || win.is_key_down(Key::W), Keys::FORWARD);
        held(win.is_key_down(Key::Down) || win.is_key_down(Key::S), Keys::BACK);
        held(win.is_key_down(Key::Right), Keys::TURN_RIGHT);
        held(win.is_key_down(Key::Left), Keys::TURN_LEFT);
        if win.is_key_pressed(Key::Space, KeyRepeat::No) {
            input.press_attack(); // edge-trigger
        }

        /* --------------- tick, draw, then telemetry ------------------- */
        let report = engine.update();

        let (w, h) = win.get_size();
        renderer.begin_frame(w, h);
        renderer.draw_scene(&engine.scene());

        let mut submit = Ok(());
        renderer.end_frame(|buf, w, h| {
            submit = win.update_with_buffer(buf, w, h);
        });
        submit?;

        engine.after_render(&report);

        for line in engine.take_transcript() {
            println!("{line}");
        }
    }

    engine.stop();
    Ok(())
}

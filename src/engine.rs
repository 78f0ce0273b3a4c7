//! Per-tick orchestration.
//!
//! One cooperative tick per frame: poll narrator responses, snapshot the
//! input, resolve movement/collision, then (after the frame is drawn)
//! dispatch telemetry and count the overlay down. The tick never blocks;
//! every narrator interaction goes through the gated [`NarrativeLink`].

use glam::vec2;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::narrative::{NarrativeLink, Request, Response};
use crate::renderer::Scene;
use crate::sim::{InputMap, MoveOutcome, Overlay, Summary, TickAction, resolve};
use crate::world::{Enemy, Player, TileMap, WorldData};
use crate::narrative::prompts;

/// Enemies farther than this cannot be attacked.
pub const ATTACK_RANGE: f32 = 2.0;

/// Opening of the combat status tag the dungeon master embeds in
/// narrative text. The JSON payload nests objects, so its closing brace
/// is found by depth scanning rather than by pattern.
static COMBAT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[COMBAT_STATUS:\s*\{").expect("combat status pattern"));

/// Locate the combat status tag. Returns the byte span of the whole tag
/// (for stripping it from the displayed text) and the brace-balanced JSON
/// payload inside it, or `None` when no complete tag is present.
fn extract_combat_status(text: &str) -> Option<(std::ops::Range<usize>, &str)> {
    let open = COMBAT_TAG.find(text)?;
    let json_start = open.end() - 1; // the '{' the pattern just matched

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut json_end = None;
    for (i, c) in text[json_start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    json_end = Some(json_start + i + 1);
                    break;
                }
            }
            _ => {}
        }
    }
    let json_end = json_end?;

    // the tag's own closing bracket, allowing stray whitespace
    let tail = &text[json_end..];
    let close = tail.find(|c: char| !c.is_whitespace())?;
    if !tail[close..].starts_with(']') {
        return None;
    }
    Some((open.start()..json_end + close + 1, &text[json_start..json_end]))
}

#[derive(serde::Deserialize)]
struct CombatStatus {
    #[serde(default)]
    enemies: Vec<serde_json::Value>,
}

/// What one `update` amounted to; handed back to the caller so telemetry
/// can be dispatched after the frame is drawn.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickReport {
    pub action: TickAction,
    from: glam::Vec2,
}

/// The game engine: exclusive owner of the live level state.
///
/// Single-writer: only [`Engine::update`] mutates the map, the player and
/// the enemy list. The renderer and the telemetry summarizer read the same
/// state later in the tick via [`Engine::scene`].
pub struct Engine {
    map: TileMap,
    player: Player,
    enemies: Vec<Enemy>,
    description: String,
    input: InputMap,
    overlay: Overlay,
    link: NarrativeLink,

    active: bool,
    in_combat: bool,
    depth: u32,
    character: String,

    /// Narrative lines produced this session, drained by the front-end.
    transcript: Vec<String>,
}

impl Engine {
    pub fn new(world: WorldData, link: NarrativeLink, character: String) -> Self {
        let transcript = if world.description.is_empty() {
            Vec::new()
        } else {
            vec![world.description.clone()]
        };
        Self {
            map: world.map,
            player: Player::new(vec2(world.player_start.x, world.player_start.y)),
            enemies: world.enemies,
            description: world.description,
            input: InputMap::new(),
            overlay: Overlay::None,
            link,
            active: false,
            in_combat: false,
            depth: 0,
            character,
            transcript,
        }
    }

    /// Event-side handle to the shared key state.
    pub fn input(&self) -> InputMap {
        self.input.clone()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn in_combat(&self) -> bool {
        self.in_combat
    }

    /// Engage the 3D view and ask the narrator for the opening level.
    /// Until it resolves, the current (fallback) level is what renders.
    pub fn start(&mut self) {
        self.active = true;
        let prompt = prompts::world_generation(&self.character, self.depth, None);
        if !self.link.request(Request::GenerateWorld { prompt }) {
            warn!("initial world request deferred; narrator is busy");
        }
    }

    /// Leave the 3D view. No further ticks run and responses still in
    /// flight are ignored when they land.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Drain narrative lines accumulated since the last call.
    pub fn take_transcript(&mut self) -> Vec<String> {
        std::mem::take(&mut self.transcript)
    }

    /// Borrow everything the renderer needs for this frame.
    pub fn scene(&self) -> Scene<'_> {
        Scene {
            map: &self.map,
            player: &self.player,
            enemies: &self.enemies,
            overlay: &self.overlay,
        }
    }

    /* ----------------------------- tick ----------------------------- */

    /// Run the pre-render half of one tick: poll async results, consume
    /// the input snapshot, resolve movement and attacks.
    pub fn update(&mut self) -> TickReport {
        self.poll_responses();
        if !self.active {
            return TickReport::default();
        }

        if self.input.take_attack() {
            self.try_attack();
        }

        if self.in_combat {
            // frozen while the dungeon master adjudicates combat
            return TickReport::default();
        }

        let keys = self.input.snapshot(); // one consistent read per tick
        let MoveOutcome {
            action,
            from,
            portal,
        } = resolve(&mut self.player, keys, &self.map);

        if portal {
            self.request_transition();
            // the rest of this tick is skipped; rendering still shows the
            // pre-transition state
            return TickReport::default();
        }

        TickReport { action, from }
    }

    /// Post-render half: dispatch telemetry for the tick and advance the
    /// overlay countdown.
    pub fn after_render(&mut self, report: &TickReport) {
        if self.active && report.action != TickAction::None && self.link.is_idle() {
            let summary = Summary::compose(&self.map, &self.player, report.from, report.action);
            // best-effort: refusal or failure never interrupts gameplay
            self.link.request(Request::Telemetry {
                line: summary.to_string(),
            });
        }
        self.overlay.tick();
    }

    /* ------------------------- attack / combat ----------------------- */

    fn try_attack(&mut self) {
        if !self.active || self.in_combat || !self.link.is_idle() {
            return;
        }
        let Some(idx) = self.closest_enemy_in_range() else {
            return; // nothing in reach: a no-op, not an error
        };

        let target = self.enemies[idx].kind.clone();
        self.enemies[idx].alive = false;
        self.enemies.retain(|e| e.alive);

        self.in_combat = true;
        self.overlay.start_attack();
        info!("attacking the {target}");
        self.link.request(Request::SendTurn {
            message: format!("I attack the {target}."),
        });
    }

    fn closest_enemy_in_range(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, e) in self.enemies.iter().enumerate() {
            if !e.alive {
                continue;
            }
            let d = self.player.pos.distance(e.pos());
            if d < ATTACK_RANGE && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i)
    }

    fn apply_turn(&mut self, text: String) {
        let (still_fighting, display) = match extract_combat_status(&text) {
            Some((span, json)) => {
                let fighting = match serde_json::from_str::<CombatStatus>(json) {
                    Ok(status) => !status.enemies.is_empty(),
                    Err(e) => {
                        // a status we cannot read must not end a fight
                        warn!("unreadable combat status tag: {e}");
                        self.in_combat
                    }
                };
                let stripped = format!("{}{}", &text[..span.start], &text[span.end..]);
                (fighting, stripped)
            }
            // no tag at all means the dungeon master reports combat over
            None => (false, text),
        };

        if still_fighting {
            self.overlay.start_hit();
        } else {
            self.in_combat = false;
        }

        let display = display.trim();
        if !display.is_empty() {
            self.transcript.push(display.to_string());
        }
    }

    /* ------------------------ level transition ----------------------- */

    fn request_transition(&mut self) {
        let prompt = prompts::world_generation(
            &self.character,
            self.depth + 1,
            Some(prompts::EXIT_DESCRIPTION),
        );
        // refused while any request is outstanding; the player is still on
        // the portal tile next tick, so this retries until it goes through
        // and the in-flight guard keeps it from ever doubling up
        if self.link.request(Request::GenerateWorld { prompt }) {
            info!("portal entered; regenerating world (depth {})", self.depth + 1);
        }
    }

    fn install_world(&mut self, world: WorldData) {
        self.map = world.map;
        self.enemies = world.enemies;
        self.player = Player::new(vec2(world.player_start.x, world.player_start.y));
        self.description = world.description;
        self.depth += 1;
        if !self.description.is_empty() {
            self.transcript.push(self.description.clone());
        }
    }

    /* -------------------------- async results ------------------------ */

    fn poll_responses(&mut self) {
        while let Some(res) = self.link.poll() {
            if !self.active {
                // the view was left while this was in flight; the state it
                // would mutate no longer exists
                continue;
            }
            match res {
                Response::World(Ok(world)) => self.install_world(world),
                Response::World(Err(e)) => {
                    error!("world generation failed: {e}; installing fallback map");
                    self.install_world(WorldData::fallback());
                }
                Response::Turn(Ok(text)) => self.apply_turn(text),
                Response::Turn(Err(e)) => {
                    error!("narrative turn failed: {e}");
                    self.in_combat = false; // never leave the player frozen
                }
                Response::Telemetry(Ok(text)) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        self.transcript.push(text.to_string());
                    }
                }
                Response::Telemetry(Err(e)) => warn!("telemetry dropped: {e}"),
            }
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::NarrativeError;
    use crate::sim::Keys;
    use std::sync::mpsc;

    /// Engine wired to hand-driven channels so tests play the narrator.
    fn harness() -> (Engine, mpsc::Receiver<Request>, mpsc::Sender<Response>) {
        let (req_tx, req_rx) = mpsc::channel();
        let (res_tx, res_rx) = mpsc::channel();
        let link = NarrativeLink::from_channels(req_tx, res_rx);
        let mut engine = Engine::new(WorldData::fallback(), link, "a test delver".into());
        engine.active = true; // skip start() so no initial worldgen request
        (engine, req_rx, res_tx)
    }

    fn world_with_enemy_near_start() -> WorldData {
        let mut wd = WorldData::fallback();
        wd.enemies.push(Enemy {
            id: 1,
            x: 6.0,
            y: 5.5,
            kind: "goblin".into(),
            alive: true,
        });
        wd
    }

    fn walk_onto_portal(engine: &mut Engine) {
        // fallback portal is tile (3,4); one northward step from y = 5.0
        // lands on it, so the very first tick is the portal tick and no
        // plain MOVE telemetry precedes it
        engine.player = Player::new(vec2(3.5, 5.0));
        engine.player.turn(3.0 * std::f32::consts::FRAC_PI_2); // face north
        engine.input.press(Keys::FORWARD);
    }

    #[test]
    fn portal_entry_fires_exactly_one_request() {
        let (mut engine, req_rx, res_tx) = harness();
        walk_onto_portal(&mut engine);

        for _ in 0..30 {
            let report = engine.update();
            engine.after_render(&report);
        }
        // standing on the portal for many ticks: one request, not thirty
        let reqs: Vec<_> = req_rx.try_iter().collect();
        assert_eq!(reqs.len(), 1);
        assert!(matches!(reqs[0], Request::GenerateWorld { .. }));

        // resolution repositions the player off the portal
        let mut next = WorldData::fallback();
        next.description = "Deeper.".into();
        res_tx.send(Response::World(Ok(next))).unwrap();
        engine.input.release(Keys::FORWARD);
        let report = engine.update();
        engine.after_render(&report);

        assert_eq!(engine.player.pos, vec2(5.5, 5.5));
        assert_eq!(engine.depth, 1);
        // and no fresh transition request fired
        assert_eq!(req_rx.try_iter().count(), 0);
    }

    #[test]
    fn transition_waits_for_the_outstanding_request() {
        let (mut engine, req_rx, res_tx) = harness();
        // an ordinary move tick whose telemetry occupies the gate
        engine.input.press(Keys::FORWARD);
        let report = engine.update();
        engine.after_render(&report);
        assert_eq!(req_rx.try_iter().count(), 1);

        // stepping onto the portal while the gate is busy defers the
        // transition instead of firing a second request
        walk_onto_portal(&mut engine);
        let report = engine.update();
        engine.after_render(&report);
        assert_eq!(req_rx.try_iter().count(), 0);

        // once the telemetry resolves, the next portal tick retries
        res_tx.send(Response::Telemetry(Ok(String::new()))).unwrap();
        let report = engine.update();
        engine.after_render(&report);
        let reqs: Vec<_> = req_rx.try_iter().collect();
        assert_eq!(reqs.len(), 1);
        assert!(matches!(reqs[0], Request::GenerateWorld { .. }));
    }

    #[test]
    fn failed_generation_installs_the_fallback() {
        let (mut engine, _req_rx, res_tx) = harness();
        res_tx
            .send(Response::World(Err(NarrativeError::Empty)))
            .unwrap();
        engine.update();
        // the fallback level counts as a transition
        assert_eq!(engine.depth, 1);
        assert_eq!(engine.map, WorldData::fallback().map);
        assert_eq!(engine.player.pos, vec2(5.5, 5.5));
    }

    #[test]
    fn attack_hits_closest_enemy_and_enters_combat() {
        let (req_tx, req_rx) = mpsc::channel();
        let (_res_tx, res_rx) = mpsc::channel();
        let link = NarrativeLink::from_channels(req_tx, res_rx);
        let mut engine = Engine::new(world_with_enemy_near_start(), link, "a test delver".into());
        engine.active = true;

        engine.input.press_attack();
        engine.update();

        assert!(engine.in_combat());
        assert!(engine.enemies.is_empty(), "defeated enemy is culled");
        assert_eq!(engine.overlay, Overlay::PlayerAttack { tics: 30 });
        let reqs: Vec<_> = req_rx.try_iter().collect();
        assert_eq!(reqs.len(), 1);
        assert_eq!(
            reqs[0],
            Request::SendTurn {
                message: "I attack the goblin.".into()
            }
        );
    }

    #[test]
    fn attack_with_nothing_in_range_is_a_noop() {
        let (mut engine, req_rx, _res_tx) = harness();
        engine.input.press_attack();
        engine.update();
        assert!(!engine.in_combat());
        assert_eq!(engine.overlay, Overlay::None);
        assert_eq!(req_rx.try_iter().count(), 0);
    }

    #[test]
    fn combat_ends_when_status_reports_no_enemies() {
        let (mut engine, _req_rx, res_tx) = harness();
        engine.in_combat = true;
        res_tx
            .send(Response::Turn(Ok(
                "The goblin falls. [COMBAT_STATUS: {\"enemies\": []}]".into(),
            )))
            .unwrap();
        engine.update();
        assert!(!engine.in_combat());
        let lines = engine.take_transcript();
        assert!(lines.iter().any(|l| l.contains("The goblin falls.")));
        assert!(lines.iter().all(|l| !l.contains("COMBAT_STATUS")));
    }

    #[test]
    fn surviving_enemies_trigger_the_hit_flash() {
        let (mut engine, _req_rx, res_tx) = harness();
        engine.in_combat = true;
        res_tx
            .send(Response::Turn(Ok(
                "It snarls. [COMBAT_STATUS: {\"enemies\": [{\"name\": \"goblin\", \"hp\": 3}]}]"
                    .into(),
            )))
            .unwrap();
        engine.update();
        assert!(engine.in_combat());
        assert_eq!(engine.overlay, Overlay::EnemyHit { tics: 15 });
    }

    #[test]
    fn nested_status_payload_is_captured_whole() {
        let text = "Steel rings out. [COMBAT_STATUS: {\"enemies\": \
                    [{\"name\": \"orc\", \"hp\": 7}, {\"name\": \"rat\", \"hp\": 1}]}] \
                    They circle.";
        let (span, json) = extract_combat_status(text).unwrap();
        let status: CombatStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.enemies.len(), 2);
        assert!(text[span.clone()].starts_with("[COMBAT_STATUS:"));
        assert!(text[span].ends_with("}]"));
    }

    #[test]
    fn malformed_status_tag_keeps_the_fight_going() {
        let (mut engine, _req_rx, res_tx) = harness();
        engine.in_combat = true;
        res_tx
            .send(Response::Turn(Ok(
                "Static crackles. [COMBAT_STATUS: {\"enemies\": oops}]".into(),
            )))
            .unwrap();
        engine.update();
        assert!(engine.in_combat(), "an unreadable status must not end combat");
    }

    #[test]
    fn movement_dispatches_telemetry_after_render() {
        let (mut engine, req_rx, _res_tx) = harness();
        engine.input.press(Keys::FORWARD);
        let report = engine.update();
        // nothing sent before the frame is drawn
        assert_eq!(req_rx.try_iter().count(), 0);
        engine.after_render(&report);
        let reqs: Vec<_> = req_rx.try_iter().collect();
        assert_eq!(reqs.len(), 1);
        match &reqs[0] {
            Request::Telemetry { line } => {
                assert!(line.starts_with("[TELEMETRY: { action: \"MOVE\""))
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn telemetry_is_skipped_while_a_request_is_outstanding() {
        let (mut engine, req_rx, _res_tx) = harness();
        engine.input.press(Keys::FORWARD);
        let r1 = engine.update();
        engine.after_render(&r1); // occupies the gate
        let r2 = engine.update();
        engine.after_render(&r2); // gate still pending: dropped
        assert_eq!(req_rx.try_iter().count(), 1);
    }

    #[test]
    fn stopped_engine_ignores_landing_responses() {
        let (mut engine, _req_rx, res_tx) = harness();
        let mut next = WorldData::fallback();
        next.description = "Too late.".into();
        res_tx.send(Response::World(Ok(next))).unwrap();
        engine.stop();
        engine.update();
        assert_eq!(engine.depth, 0, "stale world must not install");
        assert!(engine.take_transcript().iter().all(|l| l != "Too late."));
    }

    #[test]
    fn combat_freezes_movement_but_not_rendering_state() {
        let (mut engine, _req_rx, _res_tx) = harness();
        engine.in_combat = true;
        engine.input.press(Keys::FORWARD);
        let before = engine.player.pos;
        let report = engine.update();
        assert_eq!(engine.player.pos, before);
        assert_eq!(report.action, TickAction::None);
        // scene is still serviceable for the renderer
        assert_eq!(engine.scene().map.width(), 10);
    }
}

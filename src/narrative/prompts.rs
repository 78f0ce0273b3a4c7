//! Prompt text handed to the generative narrator.

/// System instruction for the dungeon-master channel.
pub const DM_INSTRUCTION: &str = "You are a gritty, descriptive dungeon master. \
    Narrate the consequences of the player's declared action in 2-4 sentences. \
    When combat is in progress, append a machine-readable status tag of the form \
    [COMBAT_STATUS: {\"enemies\": [{\"name\": \"...\", \"hp\": 0}]}] listing the \
    enemies still standing; an empty list means combat has ended.";

/// System instruction for the telemetry channel: terse ambient narration,
/// or silence when nothing is worth saying.
pub const TELEMETRY_INSTRUCTION: &str = "You receive compact movement telemetry \
    lines of the form [TELEMETRY: { action, from, to, direction, obstacle }]. \
    Respond with at most one short atmospheric sentence about what the delver \
    senses, or an empty response when nothing noteworthy happens. Never mention \
    the telemetry itself.";

/// World-generation request. The reply must be a single JSON object:
/// `{ map, playerStart, enemies, exits, worldDescription }` with tile codes
/// 0=floor, 1=wall, 2=door, 3=exit portal.
pub fn world_generation(character: &str, depth: u32, coming_from: Option<&str>) -> String {
    let mut p = String::from(
        "Generate one dungeon level as a single JSON object with keys \
         \"map\" (grid of integers, 0 floor, 1 wall, 2 door, 3 exit portal, \
         rectangular, outer border all 1), \"playerStart\" ({\"x\",\"y\"} floats \
         on a floor tile), \"enemies\" (array of {\"id\",\"x\",\"y\",\"type\"}), \
         \"exits\" (array of {\"x\",\"y\"} tile coordinates of every 3), and \
         \"worldDescription\" (2-3 sentences of scene setting). \
         Reply with JSON only, no prose and no code fences.\n",
    );
    p.push_str(&format!("Character: {character}\n"));
    p.push_str(&format!("Dungeon depth: {depth}\n"));
    if let Some(origin) = coming_from {
        p.push_str(&format!(
            "The player just stepped through {origin}; open the new level near \
             where they emerge.\n"
        ));
    }
    p
}

/// Where the player is coming from when a portal fires.
pub const EXIT_DESCRIPTION: &str = "a shimmering, dark portal in a stone corridor";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_prompt_carries_context() {
        let p = world_generation("Karg, the half-orc barbarian", 3, Some(EXIT_DESCRIPTION));
        assert!(p.contains("Karg"));
        assert!(p.contains("depth: 3"));
        assert!(p.contains("shimmering"));
        assert!(!world_generation("x", 1, None).contains("stepped through"));
    }
}

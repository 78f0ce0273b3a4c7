use bitflags::bitflags;
use std::sync::{Arc, Mutex};

bitflags! {
    /// Held movement keys.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Keys: u8 {
        const FORWARD    = 0b0001;
        const BACK       = 0b0010;
        const TURN_LEFT  = 0b0100;
        const TURN_RIGHT = 0b1000;
    }
}

#[derive(Default)]
struct Held {
    keys: Keys,
    attack: bool,
}

/// Shared key-state written by asynchronous input events and read by the
/// tick. The tick takes exactly one [`InputMap::snapshot`] per frame, so
/// movement and telemetry always see the same key set even while events
/// keep racing in.
///
/// Cloning is cheap and shares the underlying state, which is how the
/// event side and the engine side hold the same map.
#[derive(Clone, Default)]
pub struct InputMap {
    inner: Arc<Mutex<Held>>,
}

impl InputMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn lock(&self) -> std::sync::MutexGuard<'_, Held> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /* ------------------------- event side ------------------------- */

    pub fn press(&self, keys: Keys) {
        self.lock().keys.insert(keys);
    }

    pub fn release(&self, keys: Keys) {
        self.lock().keys.remove(keys);
    }

    /// Edge-triggered attack key; latched until the tick consumes it.
    pub fn press_attack(&self) {
        self.lock().attack = true;
    }

    /* -------------------------- tick side ------------------------- */

    /// One consistent view of the held keys for this tick.
    pub fn snapshot(&self) -> Keys {
        self.lock().keys
    }

    /// Consume a latched attack press, if any.
    pub fn take_attack(&self) -> bool {
        std::mem::take(&mut self.lock().attack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_press_and_release() {
        let input = InputMap::new();
        input.press(Keys::FORWARD | Keys::TURN_LEFT);
        assert_eq!(input.snapshot(), Keys::FORWARD | Keys::TURN_LEFT);
        input.release(Keys::FORWARD);
        assert_eq!(input.snapshot(), Keys::TURN_LEFT);
    }

    #[test]
    fn attack_is_consumed_once() {
        let input = InputMap::new();
        input.press_attack();
        assert!(input.take_attack());
        assert!(!input.take_attack());
    }

    #[test]
    fn clones_share_state() {
        let events = InputMap::new();
        let tick = events.clone();
        events.press(Keys::BACK);
        assert_eq!(tick.snapshot(), Keys::BACK);
    }
}

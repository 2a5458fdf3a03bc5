//! Discrete input actions
//!
//! Raw device events (key codes, button clicks, entity-layer outcomes) are
//! turned into [`Action`]s and queued until the next frame consumes them.

use std::collections::{HashMap, VecDeque};

/// A command consulted by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Jump,
    Pause,
    Resume,
    Start,
    /// Zero-based level index
    SelectLevel(u32),
    Back,
    Continue,
    Restart,
    Menu,
    /// Entity layer: the player died
    PlayerDied,
    /// Entity layer: the level goal was reached
    LevelComplete,
    /// Entity layer: the player picked up a powerup
    PowerUp,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Jump => "jump",
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::Start => "start",
            Action::SelectLevel(_) => "selectLevel",
            Action::Back => "back",
            Action::Continue => "continue",
            Action::Restart => "restart",
            Action::Menu => "menu",
            Action::PlayerDied => "playerDied",
            Action::LevelComplete => "levelComplete",
            Action::PowerUp => "powerUp",
        }
    }

    /// Parse a named action from UI wiring; `payload` feeds `selectLevel`
    pub fn from_name(name: &str, payload: Option<u32>) -> Option<Self> {
        let action = match name {
            "jump" => Action::Jump,
            "pause" => Action::Pause,
            "resume" => Action::Resume,
            "start" => Action::Start,
            "selectLevel" => Action::SelectLevel(payload?),
            "back" => Action::Back,
            "continue" => Action::Continue,
            "restart" => Action::Restart,
            "menu" => Action::Menu,
            "playerDied" => Action::PlayerDied,
            "levelComplete" => Action::LevelComplete,
            "powerUp" => Action::PowerUp,
            _ => return None,
        };
        Some(action)
    }
}

/// Key bindings plus the per-frame action queue
pub struct InputMapper {
    /// Key code (`KeyboardEvent.code`) -> action
    bindings: HashMap<String, Action>,
    pending: VecDeque<Action>,
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl InputMapper {
    pub fn new() -> Self {
        Self {
            bindings: Self::default_bindings(),
            pending: VecDeque::new(),
        }
    }

    fn default_bindings() -> HashMap<String, Action> {
        let mut map = HashMap::new();
        for key in ["Space", "ArrowUp", "KeyW"] {
            map.insert(key.into(), Action::Jump);
        }
        map.insert("Escape".into(), Action::Pause);
        map.insert("KeyP".into(), Action::Pause);
        map.insert("Enter".into(), Action::Start);
        map.insert("KeyR".into(), Action::Restart);
        map.insert("KeyM".into(), Action::Menu);
        map.insert("Backspace".into(), Action::Back);
        for n in 1..=9u32 {
            map.insert(format!("Digit{}", n), Action::SelectLevel(n - 1));
        }
        map
    }

    /// Bind (or rebind) a key
    pub fn bind(&mut self, key: impl Into<String>, action: Action) {
        self.bindings.insert(key.into(), action);
    }

    pub fn unbind(&mut self, key: &str) {
        self.bindings.remove(key);
    }

    pub fn binding(&self, key: &str) -> Option<Action> {
        self.bindings.get(key).copied()
    }

    /// Process a key press; unbound keys are ignored
    pub fn key_down(&mut self, key: &str) -> Option<Action> {
        let action = self.binding(key)?;
        self.pending.push_back(action);
        Some(action)
    }

    /// Queue an action directly (UI buttons, entity outcomes)
    pub fn push(&mut self, action: Action) {
        self.pending.push_back(action);
    }

    /// Take every action queued since the last frame, oldest first
    pub fn drain(&mut self) -> Vec<Action> {
        self.pending.drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

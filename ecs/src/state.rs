//! Simulation state and the per-system state mask.
//!
//! Every system declares a [`GameStateMask`]; the scheduler only runs it
//! while the current [`GameState`] bit is set in that mask.

use bitflags::bitflags;

/// Current simulation state of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Scene is loaded but time does not advance.
    #[default]
    Stopped,
    Running,
    Paused,
}

bitflags! {
    /// Set of game states a system is allowed to run in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GameStateMask: u8 {
        const STOPPED = 1 << 0;
        const RUNNING = 1 << 1;
        const PAUSED = 1 << 2;
        const ALL = Self::STOPPED.bits() | Self::RUNNING.bits() | Self::PAUSED.bits();
    }
}

impl Default for GameStateMask {
    fn default() -> Self {
        Self::RUNNING
    }
}

impl GameState {
    /// The single mask bit for this state.
    pub fn mask(self) -> GameStateMask {
        match self {
            Self::Stopped => GameStateMask::STOPPED,
            Self::Running => GameStateMask::RUNNING,
            Self::Paused => GameStateMask::PAUSED,
        }
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl GameStateMask {
    /// Whether a system with this mask runs in `state`.
    pub fn allows(self, state: GameState) -> bool {
        self.contains(state.mask())
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}

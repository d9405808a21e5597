//! Game states and the two pure transition functions: load-time resolution and
//! choice application. Nothing in here touches storage or time.

use rand::{
    Rng,
    distr::{
        Distribution,
        StandardUniform,
    },
};
use serde::Serialize;
use std::{
    fmt,
    str::FromStr,
    time::Duration,
};

/// Loads spent in `attempted` before the second chance is granted.
pub const SECOND_CHANCE_REFRESHES: u32 = 3;
pub const WIN_REDIRECT_DELAY: Duration = Duration::from_millis(2500);
pub const DISTRACTION_DELAY: Duration = Duration::from_millis(1500);
pub const ADVANCE_DELAY: Duration = Duration::from_millis(3000);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            other => Err(UnknownTag::new("side", other)),
        }
    }
}

impl Distribution<Side> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Side {
        if rng.random_bool(0.5) {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// Ordered along the only legal direction of travel, so `a <= b` reads as
/// "b is reachable from a".
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum GameState {
    #[default]
    Initial,
    Attempted,
    SecondChance,
    GameOver,
}

impl GameState {
    pub fn as_str(self) -> &'static str {
        match self {
            GameState::Initial => "initial",
            GameState::Attempted => "attempted",
            GameState::SecondChance => "second-chance",
            GameState::GameOver => "game-over",
        }
    }

    /// Whether a choice made in this state is compared against the winner.
    pub fn is_interactive(self) -> bool {
        matches!(self, GameState::Initial | GameState::SecondChance)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameState {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(GameState::Initial),
            "attempted" => Ok(GameState::Attempted),
            "second-chance" => Ok(GameState::SecondChance),
            "game-over" => Ok(GameState::GameOver),
            other => Err(UnknownTag::new("game state", other)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownTag {
    kind: &'static str,
    value: String,
}

impl UnknownTag {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for UnknownTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} tag {:?}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownTag {}

/// Progress fields exactly as found in the store, before the load rules run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StoredProgress {
    pub state: Option<GameState>,
    pub refresh_count: u32,
    pub second_chance_granted: bool,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Progress {
    pub state: GameState,
    pub refresh_count: u32,
    pub second_chance_granted: bool,
}

/// Applies the load-time rules to what was persisted. A missing state starts
/// at `initial`; a load in `attempted` before the grant counts as a refresh
/// and the third one promotes to `second-chance`.
pub fn resolve_on_load(stored: StoredProgress) -> Progress {
    let state = stored.state.unwrap_or_default();
    if state == GameState::Attempted && !stored.second_chance_granted {
        let refresh_count = stored.refresh_count.saturating_add(1);
        if refresh_count >= SECOND_CHANCE_REFRESHES {
            return Progress {
                state: GameState::SecondChance,
                refresh_count,
                second_chance_granted: true,
            };
        }
        return Progress {
            state: GameState::Attempted,
            refresh_count,
            second_chance_granted: false,
        };
    }
    Progress {
        state,
        refresh_count: stored.refresh_count,
        second_chance_granted: stored.second_chance_granted,
    }
}

/// State change applied once the post-loss delay elapses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Advance {
    pub to: GameState,
    pub refresh_baseline: Option<u32>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChoiceOutcome {
    GameOver,
    AlreadyPlayed,
    Win,
    Loss(Advance),
}

pub fn apply_choice(state: GameState, winner: Side, pick: Side) -> ChoiceOutcome {
    match state {
        GameState::GameOver => ChoiceOutcome::GameOver,
        GameState::Attempted => ChoiceOutcome::AlreadyPlayed,
        GameState::Initial | GameState::SecondChance if pick == winner => {
            ChoiceOutcome::Win
        }
        // baseline of 1 so the next load's count continues from there
        GameState::Initial => ChoiceOutcome::Loss(Advance {
            to: GameState::Attempted,
            refresh_baseline: Some(1),
        }),
        GameState::SecondChance => ChoiceOutcome::Loss(Advance {
            to: GameState::GameOver,
            refresh_baseline: None,
        }),
    }
}

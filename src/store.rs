use crate::game::{
    GameState,
    Side,
    StoredProgress,
};
use color_eyre::eyre::Result;
use serde::Serialize;
use std::{
    fmt,
    str::FromStr,
};
use tracing::{
    debug,
    warn,
};

pub mod in_memory_store;
pub mod sled_store;

pub use in_memory_store::InMemoryStore;
pub use sled_store::SledStore;

pub const WINNING_CHOICE_KEY: &str = "card-gate-winning-card";
pub const GAME_STATE_KEY: &str = "card-gate-game-state";
pub const REFRESH_COUNT_KEY: &str = "card-gate-refresh-count";
pub const SECOND_CHANCE_KEY: &str = "card-gate-second-chance-shown";
pub const LAST_NOTIFIED_KEY: &str = "card-gate-last-modal-state";

const TRUE: &str = "true";

/// Synchronous key -> string storage that survives restarts.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Write `value` only when `key` is absent and return whatever the key holds
    /// afterwards. The default is a plain read-then-write, so concurrent callers
    /// race and the last writer wins; stores that can do better override it.
    fn set_if_absent(&mut self, key: &str, value: &str) -> Result<String> {
        if let Some(existing) = self.get(key)? {
            return Ok(existing);
        }
        self.set(key, value)?;
        Ok(value.to_string())
    }
}

/// The store a client actually runs against: the configured sled database,
/// or process memory when that database cannot be opened.
#[derive(Clone, Debug)]
pub enum DeviceStore {
    Sled(SledStore),
    Memory(InMemoryStore),
}

impl KeyValueStore for DeviceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            DeviceStore::Sled(store) => store.get(key),
            DeviceStore::Memory(store) => store.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match self {
            DeviceStore::Sled(store) => store.set(key, value),
            DeviceStore::Memory(store) => store.set(key, value),
        }
    }

    fn has(&self, key: &str) -> Result<bool> {
        match self {
            DeviceStore::Sled(store) => store.has(key),
            DeviceStore::Memory(store) => store.has(key),
        }
    }

    fn set_if_absent(&mut self, key: &str, value: &str) -> Result<String> {
        match self {
            DeviceStore::Sled(store) => store.set_if_absent(key, value),
            DeviceStore::Memory(store) => store.set_if_absent(key, value),
        }
    }
}

/// Every persisted field at once, as read right now.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SessionRecord {
    pub winning_choice: Option<Side>,
    pub game_state: Option<GameState>,
    pub refresh_count: u32,
    pub second_chance_granted: bool,
    pub last_notified_state: Option<GameState>,
}

/// Typed view of the session record over a [`KeyValueStore`].
///
/// Storage failures never reach the caller: a failed or unparseable read is
/// treated as absent and a failed write is dropped, both logged at `warn`.
#[derive(Clone, Debug)]
pub struct StateStore<S> {
    inner: S,
}

impl<S: KeyValueStore> StateStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.inner.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "store read failed; treating as absent");
                None
            }
        }
    }

    fn read_parsed<T>(&self, key: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.read(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, %raw, error = %err, "unreadable stored value; treating as absent");
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        match self.inner.set(key, value) {
            Ok(()) => debug!(key, value, "stored"),
            Err(err) => warn!(key, value, error = %err, "store write failed"),
        }
    }

    pub fn winning_choice(&self) -> Option<Side> {
        self.read_parsed(WINNING_CHOICE_KEY)
    }

    /// Persist `candidate` unless a winner is already stored, returning the
    /// winner in effect. An unreadable stored winner is replaced.
    pub fn assign_winner_if_absent(&mut self, candidate: Side) -> Side {
        match self
            .inner
            .set_if_absent(WINNING_CHOICE_KEY, candidate.as_str())
        {
            Ok(stored) => match stored.parse::<Side>() {
                Ok(side) => side,
                Err(err) => {
                    warn!(%stored, error = %err, "replacing unreadable winner");
                    self.write(WINNING_CHOICE_KEY, candidate.as_str());
                    candidate
                }
            },
            Err(err) => {
                warn!(error = %err, "winner could not be persisted; using it for this session only");
                candidate
            }
        }
    }

    pub fn game_state(&self) -> Option<GameState> {
        self.read_parsed(GAME_STATE_KEY)
    }

    pub fn set_game_state(&mut self, state: GameState) {
        self.write(GAME_STATE_KEY, state.as_str());
    }

    pub fn refresh_count(&self) -> u32 {
        self.read_parsed(REFRESH_COUNT_KEY).unwrap_or(0)
    }

    pub fn set_refresh_count(&mut self, count: u32) {
        self.write(REFRESH_COUNT_KEY, &count.to_string());
    }

    pub fn second_chance_granted(&self) -> bool {
        self.read(SECOND_CHANCE_KEY).as_deref() == Some(TRUE)
    }

    pub fn grant_second_chance(&mut self) {
        self.write(SECOND_CHANCE_KEY, TRUE);
    }

    pub fn last_notified(&self) -> Option<GameState> {
        self.read_parsed(LAST_NOTIFIED_KEY)
    }

    pub fn set_last_notified(&mut self, state: GameState) {
        self.write(LAST_NOTIFIED_KEY, state.as_str());
    }

    pub fn stored_progress(&self) -> StoredProgress {
        StoredProgress {
            state: self.game_state(),
            refresh_count: self.refresh_count(),
            second_chance_granted: self.second_chance_granted(),
        }
    }

    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            winning_choice: self.winning_choice(),
            game_state: self.game_state(),
            refresh_count: self.refresh_count(),
            second_chance_granted: self.second_chance_granted(),
            last_notified_state: self.last_notified(),
        }
    }
}

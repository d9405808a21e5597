//! Fakes shared by unit and integration tests.
use crate::{
    config,
    dispatch::{
        Launcher,
        OutcomeDispatcher,
        Targets,
        WindowRequest,
    },
    game::{
        GameState,
        Side,
    },
    schedule::Clock,
    session::Session,
    store::{
        GAME_STATE_KEY,
        InMemoryStore,
        KeyValueStore,
        REFRESH_COUNT_KEY,
        SECOND_CHANCE_KEY,
        WINNING_CHOICE_KEY,
    },
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use rand::{
    SeedableRng,
    rngs::StdRng,
};
use std::{
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};
use url::Url;

/// Clock that only moves when told to. Clones share the same reading.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn advance_ms(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LaunchEvent {
    Navigate(Url),
    Window(WindowRequest),
}

/// Records what would have been opened. A blocked launcher fails every call,
/// like a popup blocker or a missing browser.
#[derive(Clone, Debug, Default)]
pub struct RecordingLauncher {
    events: Arc<Mutex<Vec<LaunchEvent>>>,
    attempts: Arc<Mutex<usize>>,
    blocked: bool,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocked() -> Self {
        Self {
            blocked: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<LaunchEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    pub fn navigations(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, LaunchEvent::Navigate(_)))
            .count()
    }

    pub fn windows(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, LaunchEvent::Window(_)))
            .count()
    }

    fn record(&mut self, event: LaunchEvent) -> Result<()> {
        *self.attempts.lock().unwrap() += 1;
        if self.blocked {
            return Err(eyre!("blocked"));
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

impl Launcher for RecordingLauncher {
    fn navigate(&mut self, url: &Url) -> Result<()> {
        self.record(LaunchEvent::Navigate(url.clone()))
    }

    fn open_window(&mut self, request: &WindowRequest) -> Result<()> {
        self.record(LaunchEvent::Window(request.clone()))
    }
}

/// A storage medium that is never available.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Err(eyre!("storage unavailable while reading {key}"))
    }

    fn set(&mut self, key: &str, _value: &str) -> Result<()> {
        Err(eyre!("storage unavailable while writing {key}"))
    }
}

pub fn default_targets() -> Targets {
    Targets::new(
        Url::parse(config::DEFAULT_DESTINATION).unwrap(),
        Url::parse(config::DEFAULT_DISTRACTION).unwrap(),
    )
}

pub type TestSession = Session<InMemoryStore, RecordingLauncher, ManualClock>;

/// One visitor's device: a store that outlives sessions, a launcher and a
/// clock. Each `load` is a fresh page load against the same store.
#[derive(Clone, Debug, Default)]
pub struct TestContext {
    pub store: InMemoryStore,
    pub launcher: RecordingLauncher,
    pub clock: ManualClock,
    seed: u64,
}

impl TestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose record already holds `winner` and, if given, `state`.
    pub fn with_record(winner: Side, state: Option<GameState>) -> Self {
        let mut ctx = Self::new();
        ctx.store
            .set(WINNING_CHOICE_KEY, winner.as_str())
            .unwrap();
        if let Some(state) = state {
            ctx.store.set(GAME_STATE_KEY, state.as_str()).unwrap();
            if state >= GameState::SecondChance {
                ctx.store.set(REFRESH_COUNT_KEY, "3").unwrap();
                ctx.store.set(SECOND_CHANCE_KEY, "true").unwrap();
            } else if state == GameState::Attempted {
                ctx.store.set(REFRESH_COUNT_KEY, "1").unwrap();
            }
        }
        ctx
    }

    pub fn load(&mut self) -> TestSession {
        self.seed += 1;
        let mut rng = StdRng::seed_from_u64(self.seed);
        Session::load(
            self.store.clone(),
            OutcomeDispatcher::new(self.launcher.clone(), default_targets()),
            self.clock.clone(),
            &mut rng,
        )
    }

    /// Move virtual time forward and let `session` run whatever fell due.
    pub fn advance(&self, session: &mut TestSession, millis: u64) {
        self.clock.advance_ms(millis);
        session.tick();
    }
}
